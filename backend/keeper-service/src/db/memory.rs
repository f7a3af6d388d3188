/// In-memory storage for keeper-service
///
/// Implements both storage seams over a single lock so that username
/// uniqueness and owner references hold exactly as they do in PostgreSQL.
/// Data does not survive a restart.
use super::{CredentialStore, UserDirectory};
use crate::error::{AuthRejection, KeeperError, Result};
use crate::models::{Credential, User};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    users_by_name: HashMap<String, User>,
    user_ids: HashMap<Uuid, String>,
    // Kept in insertion order
    credentials: Vec<Credential>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users_by_name.len()
    }

    /// Number of stored credentials across all owners
    pub async fn credential_count(&self) -> usize {
        self.state.read().await.credentials.len()
    }
}

#[async_trait::async_trait]
impl UserDirectory for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write().await;

        if state.users_by_name.contains_key(&user.username) || state.user_ids.contains_key(&user.id)
        {
            return Err(KeeperError::AlreadyExists);
        }

        state.user_ids.insert(user.id, user.username.clone());
        state
            .users_by_name
            .insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.state
            .read()
            .await
            .users_by_name
            .get(username)
            .cloned()
            .ok_or(KeeperError::UserNotFound)
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn create(&self, owner_id: Uuid, data: &str, meta: &str) -> Result<Uuid> {
        let mut state = self.state.write().await;

        if !state.user_ids.contains_key(&owner_id) {
            return Err(KeeperError::Database(format!(
                "owner {} does not exist",
                owner_id
            )));
        }

        let id = Uuid::new_v4();
        state.credentials.push(Credential {
            id,
            owner_id,
            data: data.to_string(),
            meta: meta.to_string(),
        });
        Ok(id)
    }

    async fn edit(&self, owner_id: Uuid, id: Uuid, data: &str, meta: &str) -> Result<()> {
        let mut state = self.state.write().await;

        let credential = state
            .credentials
            .iter_mut()
            .find(|c| c.id == id && c.owner_id == owner_id)
            .ok_or(AuthRejection::CredentialNotOwned)?;

        credential.data = data.to_string();
        credential.meta = meta.to_string();
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Credential>> {
        Ok(self
            .state
            .read()
            .await
            .credentials
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryStore::new();
        store.create_user(&user("alice")).await.unwrap();

        let result = store.create_user(&user("alice")).await;
        assert!(matches!(result, Err(KeeperError::AlreadyExists)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let store = MemoryStore::new();
        store.create_user(&user("alice")).await.unwrap();
        store.create_user(&user("Alice")).await.unwrap();

        assert_eq!(store.user_count().await, 2);
        assert!(matches!(
            store.get_user_by_username("ALICE").await,
            Err(KeeperError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_credential_requires_existing_owner() {
        let store = MemoryStore::new();
        let result = store.create(Uuid::new_v4(), "data", "meta").await;

        assert!(matches!(result, Err(KeeperError::Database(_))));
        assert_eq!(store.credential_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_and_ordered() {
        let store = MemoryStore::new();
        let alice = user("alice");
        let bob = user("bob");
        store.create_user(&alice).await.unwrap();
        store.create_user(&bob).await.unwrap();

        let first = store.create(alice.id, "a1", "m1").await.unwrap();
        store.create(bob.id, "b1", "").await.unwrap();
        let second = store.create(alice.id, "a2", "m2").await.unwrap();

        let listed = store.list_by_owner(alice.id).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(listed.iter().all(|c| c.owner_id == alice.id));

        assert!(store.list_by_owner(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_is_owner_scoped() {
        let store = MemoryStore::new();
        let alice = user("alice");
        let bob = user("bob");
        store.create_user(&alice).await.unwrap();
        store.create_user(&bob).await.unwrap();
        let id = store.create(alice.id, "data1", "meta1").await.unwrap();

        let result = store.edit(bob.id, id, "stolen", "").await;
        assert!(matches!(
            result,
            Err(KeeperError::Unauthorized(AuthRejection::CredentialNotOwned))
        ));

        store.edit(alice.id, id, "data2", "meta2").await.unwrap();
        let listed = store.list_by_owner(alice.id).await.unwrap();
        assert_eq!(listed[0].data, "data2");
        assert_eq!(listed[0].meta, "meta2");
    }

    #[tokio::test]
    async fn test_edit_unknown_id_is_rejected() {
        let store = MemoryStore::new();
        let alice = user("alice");
        store.create_user(&alice).await.unwrap();

        let result = store.edit(alice.id, Uuid::new_v4(), "d", "m").await;
        assert!(matches!(
            result,
            Err(KeeperError::Unauthorized(AuthRejection::CredentialNotOwned))
        ));
    }
}
