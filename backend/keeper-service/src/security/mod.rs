/// Security module for authentication and authorization
///
/// Provides core security primitives for keeper-service:
/// - Password hashing and verification (Argon2id)
/// - Session token issuing and verification (HS256 via crypto-core)
///
/// ## Architecture
///
/// - **crypto-core::jwt**: Shared session token implementation
/// - **password**: Argon2id password hashing
// Re-export token functionality from shared crypto-core library
pub use crypto_core::jwt;
pub use crypto_core::jwt::{TokenError, TokenService};

pub mod password;

pub use password::PasswordHasher;
