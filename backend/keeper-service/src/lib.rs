/// Keeper Service Library
///
/// Stores per-user secret records behind session tokens and exposes the same
/// operations over HTTP and gRPC.
///
/// ## Modules
///
/// - `client`: gRPC command-line client (`keeper-cli`)
/// - `config`: Service configuration
/// - `db`: Storage seams (users, credentials) with PostgreSQL and in-memory backends
/// - `error`: Error types
/// - `grpc`: gRPC server implementation
/// - `http`: HTTP API (axum)
/// - `models`: Data models
/// - `security`: Session tokens, password hashing
/// - `services`: Authorization gateway and the shared vault operations
/// - `validators`: Input validation
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod grpc;
pub mod http;
pub mod models;
pub mod security;
pub mod services;
pub mod validators;

// Re-export commonly used types
pub use error::{KeeperError, Result};
pub use grpc::KeeperGrpcServer;
pub use services::{KeeperOperations, KeeperService};
