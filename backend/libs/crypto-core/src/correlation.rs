//! Correlation ID utilities for request tracing
//!
//! Every inbound request is tagged with a correlation id so that log lines
//! from the HTTP and gRPC transports can be tied back to a single call.
//!
//! ## Implementation Pattern
//! 1. HTTP: read the `x-correlation-id` header or generate a UUID, echo it back
//! 2. gRPC: read the `x-correlation-id` metadata entry or generate one; the
//!    value is stored in the request extensions as [`CorrelationId`]
//! 3. Logging: handlers record the id as a `correlation_id` span field

use tonic::{metadata::MetadataValue, service::Interceptor, Request, Status};
use uuid::Uuid;

/// Header (HTTP) and metadata key (gRPC) carrying the correlation id
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

const MAX_CORRELATION_ID_LEN: usize = 128;

/// Correlation id attached to a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a caller supplied id; blank or oversized values are replaced
    /// with a generated one.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(id) if !id.is_empty() && id.len() <= MAX_CORRELATION_ID_LEN => {
                Self(id.to_string())
            }
            _ => Self::generate(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side gRPC interceptor that guarantees every request carries a
/// correlation id in both its metadata and its extensions.
#[derive(Clone, Copy, Default)]
pub struct GrpcCorrelationExtractor;

impl Interceptor for GrpcCorrelationExtractor {
    fn call(&mut self, mut req: Request<()>) -> Result<Request<()>, Status> {
        let existing = req
            .metadata()
            .get(CORRELATION_ID_HEADER)
            .and_then(|val| val.to_str().ok());
        let id = CorrelationId::from_header(existing);

        let value = MetadataValue::try_from(id.as_str())
            .map_err(|_| Status::internal("failed to set correlation id"))?;
        req.metadata_mut().insert(CORRELATION_ID_HEADER, value);
        req.extensions_mut().insert(id);

        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_is_uuid() {
        let id = CorrelationId::generate();
        assert_eq!(id.as_str().len(), 36);
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_from_header_keeps_caller_value() {
        let id = CorrelationId::from_header(Some("req-42"));
        assert_eq!(id.as_str(), "req-42");
    }

    #[test]
    fn test_from_header_replaces_blank_or_oversized() {
        assert_eq!(CorrelationId::from_header(Some("  ")).as_str().len(), 36);
        assert_eq!(CorrelationId::from_header(None).as_str().len(), 36);

        let long = "x".repeat(MAX_CORRELATION_ID_LEN + 1);
        assert_ne!(CorrelationId::from_header(Some(&long)).as_str(), long);
    }

    #[test]
    fn test_interceptor_generates_missing_id() {
        let req = GrpcCorrelationExtractor
            .call(Request::new(()))
            .expect("interceptor accepts request");

        let from_metadata = req
            .metadata()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .expect("metadata set");
        let from_extensions = req.extensions().get::<CorrelationId>().expect("extension set");

        assert_eq!(from_metadata, from_extensions.as_str());
    }

    #[test]
    fn test_interceptor_preserves_existing_id() {
        let mut req = Request::new(());
        req.metadata_mut()
            .insert(CORRELATION_ID_HEADER, MetadataValue::from_static("abc-123"));

        let req = GrpcCorrelationExtractor.call(req).expect("accepted");
        assert_eq!(
            req.extensions().get::<CorrelationId>(),
            Some(&CorrelationId("abc-123".to_string()))
        );
    }
}
