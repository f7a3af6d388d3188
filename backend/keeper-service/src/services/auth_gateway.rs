use crate::error::{AuthRejection, KeeperError, Result};
use crate::security::TokenService;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Resolves a raw session token into the id of the authenticated owner.
#[derive(Clone)]
pub struct AuthGateway {
    tokens: Arc<TokenService>,
}

impl AuthGateway {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Authorize a request carrying `raw_token`.
    ///
    /// An absent or blank token is `MissingToken`; anything the token service
    /// refuses keeps its `TokenError` inside `Unauthorized`.
    pub fn authorize(&self, raw_token: Option<&str>) -> Result<Uuid> {
        let token = raw_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthRejection::MissingToken)?;

        self.tokens.verify(token).map_err(|e| {
            warn!(reason = %e, "Rejected session token");
            KeeperError::Unauthorized(AuthRejection::Token(e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::TokenError;
    use chrono::{Duration, Utc};

    fn gateway() -> (AuthGateway, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::new(b"gateway-test-secret").unwrap());
        (AuthGateway::new(Arc::clone(&tokens)), tokens)
    }

    #[test]
    fn test_missing_and_blank_tokens() {
        let (gateway, _) = gateway();

        for raw in [None, Some(""), Some("   ")] {
            assert!(matches!(
                gateway.authorize(raw),
                Err(KeeperError::Unauthorized(AuthRejection::MissingToken))
            ));
        }
    }

    #[test]
    fn test_valid_token_resolves_owner() {
        let (gateway, tokens) = gateway();
        let owner_id = Uuid::new_v4();
        let token = tokens.issue(owner_id).unwrap();

        assert_eq!(gateway.authorize(Some(&token)).unwrap(), owner_id);
    }

    #[test]
    fn test_invalid_and_expired_stay_distinguishable() {
        let (gateway, tokens) = gateway();

        assert!(matches!(
            gateway.authorize(Some("garbage")),
            Err(KeeperError::Unauthorized(AuthRejection::Token(TokenError::Invalid)))
        ));

        let stale = tokens
            .issue_at(Uuid::new_v4(), Utc::now() - Duration::hours(61))
            .unwrap();
        assert!(matches!(
            gateway.authorize(Some(&stale)),
            Err(KeeperError::Unauthorized(AuthRejection::Token(TokenError::Expired)))
        ));
    }
}
