/// Vault operations shared by the HTTP and gRPC transports
///
/// Both transports translate their requests into calls on
/// [`KeeperOperations`] and map the returned `KeeperError` into their own
/// failure representation.
use crate::db::{CredentialStore, UserDirectory};
use crate::error::{KeeperError, Result};
use crate::models::{AuthRequest, Credential, Session, User};
use crate::security::{PasswordHasher, TokenService};
use crate::services::AuthGateway;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

#[async_trait::async_trait]
pub trait KeeperOperations: Send + Sync {
    /// Create an account and start a session for it
    async fn register(&self, username: &str, password: &str) -> Result<Session>;

    /// Start a session for an existing account
    async fn login(&self, username: &str, password: &str) -> Result<Session>;

    /// Store a credential for the token's owner and return its id
    async fn add_credential(&self, token: Option<&str>, data: &str, meta: &str) -> Result<Uuid>;

    /// Replace data and meta of a credential the token's owner holds
    async fn edit_credential(
        &self,
        token: Option<&str>,
        id: &str,
        data: &str,
        meta: &str,
    ) -> Result<()>;

    /// List every credential of the token's owner
    async fn get_credentials(&self, token: Option<&str>) -> Result<Vec<Credential>>;
}

/// Default [`KeeperOperations`] implementation over injected stores
#[derive(Clone)]
pub struct KeeperService {
    users: Arc<dyn UserDirectory>,
    credentials: Arc<dyn CredentialStore>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenService>,
    gateway: AuthGateway,
}

impl KeeperService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        credentials: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenService>,
    ) -> Self {
        let gateway = AuthGateway::new(Arc::clone(&tokens));
        Self {
            users,
            credentials,
            hasher,
            tokens,
            gateway,
        }
    }

    fn start_session(&self, user_id: Uuid) -> Result<Session> {
        let token = self.tokens.issue(user_id)?;
        Ok(Session { user_id, token })
    }
}

fn validate_auth_input(username: &str, password: &str) -> Result<()> {
    AuthRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
    .validate()?;
    Ok(())
}

#[async_trait::async_trait]
impl KeeperOperations for KeeperService {
    async fn register(&self, username: &str, password: &str) -> Result<Session> {
        validate_auth_input(username, password)?;

        // Fast path only; the store's unique constraint is authoritative
        match self.users.get_user_by_username(username).await {
            Ok(_) => return Err(KeeperError::AlreadyExists),
            Err(KeeperError::UserNotFound) => {}
            Err(e) => return Err(e),
        }

        let password_hash = self.hasher.hash(password)?;
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
        };

        self.users.create_user(&user).await.map_err(|e| {
            if !matches!(e, KeeperError::AlreadyExists) {
                error!(error = %e, "Failed to create user");
            }
            e
        })?;

        let session = self.start_session(user.id)?;
        info!(user_id = %user.id, "User registered");
        Ok(session)
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let user = match self.users.get_user_by_username(username).await {
            Ok(user) => user,
            Err(KeeperError::UserNotFound) => {
                self.hasher.verify_dummy(password);
                warn!("Login failed: unknown username");
                return Err(KeeperError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !self.hasher.verify(&user.password_hash, password)? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(KeeperError::InvalidCredentials);
        }

        let session = self.start_session(user.id)?;
        info!(user_id = %user.id, "User logged in");
        Ok(session)
    }

    async fn add_credential(&self, token: Option<&str>, data: &str, meta: &str) -> Result<Uuid> {
        let owner_id = self.gateway.authorize(token)?;

        let id = self.credentials.create(owner_id, data, meta).await?;
        info!(owner_id = %owner_id, credential_id = %id, "Credential stored");
        Ok(id)
    }

    async fn edit_credential(
        &self,
        token: Option<&str>,
        id: &str,
        data: &str,
        meta: &str,
    ) -> Result<()> {
        let owner_id = self.gateway.authorize(token)?;
        let id = Uuid::parse_str(id.trim())
            .map_err(|_| KeeperError::Validation("credential id must be a UUID".to_string()))?;

        self.credentials
            .edit(owner_id, id, data, meta)
            .await
            .map_err(|e| {
                if matches!(e, KeeperError::Unauthorized(_)) {
                    warn!(owner_id = %owner_id, credential_id = %id, "Edit of credential not owned by caller");
                }
                e
            })?;

        info!(owner_id = %owner_id, credential_id = %id, "Credential updated");
        Ok(())
    }

    async fn get_credentials(&self, token: Option<&str>) -> Result<Vec<Credential>> {
        let owner_id = self.gateway.authorize(token)?;
        self.credentials.list_by_owner(owner_id).await
    }
}
