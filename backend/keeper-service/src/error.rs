use crypto_core::TokenError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeeperError>;

/// Why a protected operation was refused.
///
/// Transports collapse every variant into a single unauthorized outcome; the
/// distinction is kept for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthRejection {
    #[error("no session token presented")]
    MissingToken,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("credential is not owned by the caller")]
    CredentialNotOwned,
}

#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthRejection),

    #[error("Username already exists")]
    AlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    #[error("Token signing error: {0}")]
    TokenSigning(String),
}

impl KeeperError {
    /// True for failures whose details must not reach the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            KeeperError::Database(_)
                | KeeperError::Hashing(_)
                | KeeperError::MalformedHash(_)
                | KeeperError::TokenSigning(_)
        )
    }
}

// Conversions from external error types
impl From<sqlx::Error> for KeeperError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        KeeperError::Database(err.to_string())
    }
}

impl From<TokenError> for KeeperError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => KeeperError::TokenSigning(msg),
            other => KeeperError::Unauthorized(AuthRejection::Token(other)),
        }
    }
}

impl From<validator::ValidationErrors> for KeeperError {
    fn from(err: validator::ValidationErrors) -> Self {
        KeeperError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_become_unauthorized() {
        let err: KeeperError = TokenError::Expired.into();
        assert!(matches!(
            err,
            KeeperError::Unauthorized(AuthRejection::Token(TokenError::Expired))
        ));

        let err: KeeperError = TokenError::Invalid.into();
        assert!(matches!(
            err,
            KeeperError::Unauthorized(AuthRejection::Token(TokenError::Invalid))
        ));
    }

    #[test]
    fn test_signing_failure_is_internal() {
        let err: KeeperError = TokenError::Signing("bad key".into()).into();
        assert!(matches!(err, KeeperError::TokenSigning(_)));
        assert!(err.is_internal());
    }

    #[test]
    fn test_domain_errors_are_not_internal() {
        assert!(!KeeperError::AlreadyExists.is_internal());
        assert!(!KeeperError::InvalidCredentials.is_internal());
        assert!(!KeeperError::Unauthorized(AuthRejection::MissingToken).is_internal());
        assert!(KeeperError::Database("boom".into()).is_internal());
    }
}
