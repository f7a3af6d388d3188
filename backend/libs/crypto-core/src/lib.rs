//! Shared security primitives for keeper services
//!
//! - `jwt`: session token issuing and verification (HS256)
//! - `correlation`: correlation id propagation for HTTP and gRPC

pub mod correlation;
pub mod jwt;

pub use correlation::{CorrelationId, GrpcCorrelationExtractor, CORRELATION_ID_HEADER};
pub use jwt::{TokenError, TokenService, TOKEN_VALIDITY_HOURS};
