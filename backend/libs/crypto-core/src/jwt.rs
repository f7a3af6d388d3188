/// Session token issuing and verification for keeper services
///
/// Tokens are HS256-signed JWTs carrying the owner id in `sub` together with
/// `iat` and `exp`. Every token is valid for [`TOKEN_VALIDITY_HOURS`] after
/// issuance and is never revoked.
///
/// ## Usage
///
/// The service is constructed once at startup and shared by reference:
///
/// ```rust
/// use crypto_core::jwt::TokenService;
/// use uuid::Uuid;
///
/// let tokens = TokenService::new(b"server-secret").expect("usable secret");
/// let owner_id = Uuid::new_v4();
/// let token = tokens.issue(owner_id).expect("signed token");
/// assert_eq!(tokens.verify(&token).expect("valid token"), owner_id);
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Lifetime of every session token.
pub const TOKEN_VALIDITY_HOURS: i64 = 60;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT claims carried by a session token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (owner id as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Bad signature, malformed structure or a subject that is not a UUID.
    #[error("token is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(String),
}

// ============================================================================
// Token Service
// ============================================================================

/// Issues and verifies session tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build a token service from the shared signing secret.
    ///
    /// ## Errors
    ///
    /// Returns `TokenError::Signing` when the secret is empty.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Signing("signing secret is empty".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validity: Duration::hours(TOKEN_VALIDITY_HOURS),
        })
    }

    /// How long an issued token stays valid.
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a token for `owner_id` valid from now.
    pub fn issue(&self, owner_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(owner_id, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`.
    pub fn issue_at(&self, owner_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: owner_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.validity).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return the owner id it was issued for.
    ///
    /// ## Errors
    ///
    /// - `TokenError::Expired` once the current time is past `exp`
    /// - `TokenError::Invalid` for a bad signature, malformed token or a
    ///   subject that does not parse as a UUID
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

// ============================================================================
// Tests
// ============================================================================
