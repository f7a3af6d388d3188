/// Business logic for keeper-service
pub mod auth_gateway;
pub mod keeper;

pub use auth_gateway::AuthGateway;
pub use keeper::{KeeperOperations, KeeperService};
