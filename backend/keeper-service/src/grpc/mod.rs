/// gRPC server module for keeper-service
///
/// Exports:
/// - KeeperGrpcServer: gRPC adapter over the shared vault operations
/// - keeper: Generated protobuf types from keeper_service.proto
pub mod server;

pub use server::keeper;
pub use server::KeeperGrpcServer;
