/// Storage seams for keeper-service
///
/// - `UserDirectory`: user identity records
/// - `CredentialStore`: owner-scoped secret records
///
/// Both have a PostgreSQL implementation (source of truth) and an in-memory
/// implementation used when no database is configured and by tests.
pub mod credentials;
pub mod memory;
pub mod users;

pub use credentials::PostgresCredentialStore;
pub use memory::MemoryStore;
pub use users::PostgresUserDirectory;

use crate::error::Result;
use crate::models::{Credential, User};
use uuid::Uuid;

/// Persists and looks up user identity records.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Insert a new user.
    ///
    /// Fails with `KeeperError::AlreadyExists` when the username is taken;
    /// the check is enforced by the store itself, not by a prior lookup.
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Fetch a user by exact (case-sensitive) username.
    ///
    /// Fails with `KeeperError::UserNotFound` when absent.
    async fn get_user_by_username(&self, username: &str) -> Result<User>;
}

/// Persists and looks up credentials, always scoped to an owner.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a new credential for `owner_id` and return its id
    async fn create(&self, owner_id: Uuid, data: &str, meta: &str) -> Result<Uuid>;

    /// Replace `data` and `meta` of a credential owned by `owner_id`.
    ///
    /// Fails with `Unauthorized(CredentialNotOwned)` when no credential with
    /// that id belongs to the owner, whether it is missing or owned by
    /// somebody else.
    async fn edit(&self, owner_id: Uuid, id: Uuid, data: &str, meta: &str) -> Result<()>;

    /// All credentials of `owner_id` in creation order
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Credential>>;
}
