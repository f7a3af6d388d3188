/// gRPC server implementation for keeper-service
///
/// Implements all RPCs from keeper_service.proto:
/// - Authentication: Register, Login
/// - Credentials: AddCredentials, EditCredentials, GetCredentials
///
/// Domain failures are returned in the response `outcome` with an OK status.
use crate::error::{AuthRejection, KeeperError};
use crate::models::Credential;
use crate::services::KeeperOperations;
use crypto_core::CorrelationId;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{error, Instrument};

// Import generated protobuf types
pub mod keeper {
    pub mod vault {
        tonic::include_proto!("keeper.vault");
    }
}

use keeper::vault::keeper_service_server::KeeperService;
use keeper::vault::*;

/// Keeper service gRPC server
#[derive(Clone)]
pub struct KeeperGrpcServer {
    keeper: Arc<dyn KeeperOperations>,
}

impl KeeperGrpcServer {
    pub fn new(keeper: Arc<dyn KeeperOperations>) -> Self {
        Self { keeper }
    }
}

fn request_span<T>(request: &Request<T>, method: &'static str) -> tracing::Span {
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .map(|id| id.to_string())
        .unwrap_or_default();
    tracing::info_span!("grpc_request", method, correlation_id = %correlation_id)
}

/// Convert a domain error into the in-band failure payload
fn to_failure(err: &KeeperError) -> Failure {
    let (kind, message) = match err {
        KeeperError::Unauthorized(AuthRejection::CredentialNotOwned) => (
            ErrorKind::Unauthorized,
            "credential not found for this user".to_string(),
        ),
        KeeperError::Unauthorized(_) => (ErrorKind::Unauthorized, "unauthorized".to_string()),
        KeeperError::AlreadyExists => (
            ErrorKind::AlreadyExists,
            "user already registered".to_string(),
        ),
        KeeperError::UserNotFound | KeeperError::InvalidCredentials => (
            ErrorKind::InvalidCredentials,
            "invalid username or password".to_string(),
        ),
        KeeperError::Validation(msg) => (ErrorKind::Validation, msg.clone()),
        KeeperError::Database(_)
        | KeeperError::Hashing(_)
        | KeeperError::MalformedHash(_)
        | KeeperError::TokenSigning(_) => {
            // Don't leak internal details to callers
            error!(error = %err, "Internal error while serving gRPC request");
            (ErrorKind::Internal, "internal server error".to_string())
        }
    };

    Failure {
        kind: kind as i32,
        error: message,
    }
}

fn session_message(session: crate::models::Session) -> Session {
    Session {
        user_id: session.user_id.to_string(),
        token: session.token,
    }
}

fn stored_credentials(credential: Credential) -> StoredCredentials {
    StoredCredentials {
        id: credential.id.to_string(),
        owner_id: credential.owner_id.to_string(),
        data: credential.data,
        meta: credential.meta,
    }
}

fn missing_field(field: &str) -> KeeperError {
    KeeperError::Validation(format!("{} is required", field))
}

fn token_field(token: &str) -> Option<&str> {
    Some(token).filter(|t| !t.is_empty())
}

#[tonic::async_trait]
impl KeeperService for KeeperGrpcServer {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> std::result::Result<Response<RegisterResponse>, Status> {
        let span = request_span(&request, "Register");
        let req = request.into_inner();

        let result = async {
            let user = req.user_data.ok_or_else(|| missing_field("user_data"))?;
            self.keeper.register(&user.username, &user.password).await
        }
        .instrument(span)
        .await;

        let outcome = match result {
            Ok(session) => register_response::Outcome::Session(session_message(session)),
            Err(e) => register_response::Outcome::Failure(to_failure(&e)),
        };

        Ok(Response::new(RegisterResponse {
            outcome: Some(outcome),
        }))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> std::result::Result<Response<LoginResponse>, Status> {
        let span = request_span(&request, "Login");
        let req = request.into_inner();

        let result = async {
            let user = req.user_data.ok_or_else(|| missing_field("user_data"))?;
            self.keeper.login(&user.username, &user.password).await
        }
        .instrument(span)
        .await;

        let outcome = match result {
            Ok(session) => login_response::Outcome::Session(session_message(session)),
            Err(e) => login_response::Outcome::Failure(to_failure(&e)),
        };

        Ok(Response::new(LoginResponse {
            outcome: Some(outcome),
        }))
    }

    async fn add_credentials(
        &self,
        request: Request<AddCredentialsRequest>,
    ) -> std::result::Result<Response<AddCredentialsResponse>, Status> {
        let span = request_span(&request, "AddCredentials");
        let req = request.into_inner();

        let result = async {
            let token = token_field(&req.token);
            // Authorization is decided before the payload is inspected
            if token.is_none() {
                return Err(KeeperError::from(AuthRejection::MissingToken));
            }
            let credentials = req
                .credentials
                .ok_or_else(|| missing_field("credentials"))?;
            self.keeper
                .add_credential(token, &credentials.data, &credentials.meta)
                .await
        }
        .instrument(span)
        .await;

        let outcome = match result {
            Ok(id) => add_credentials_response::Outcome::Created(CredentialsCreated {
                id: id.to_string(),
            }),
            Err(e) => add_credentials_response::Outcome::Failure(to_failure(&e)),
        };

        Ok(Response::new(AddCredentialsResponse {
            outcome: Some(outcome),
        }))
    }

    async fn edit_credentials(
        &self,
        request: Request<EditCredentialsRequest>,
    ) -> std::result::Result<Response<EditCredentialsResponse>, Status> {
        let span = request_span(&request, "EditCredentials");
        let req = request.into_inner();

        let result = async {
            let token = token_field(&req.token);
            if token.is_none() {
                return Err(KeeperError::from(AuthRejection::MissingToken));
            }
            let credentials = req
                .credentials
                .ok_or_else(|| missing_field("credentials"))?;
            self.keeper
                .edit_credential(token, &req.id, &credentials.data, &credentials.meta)
                .await
        }
        .instrument(span)
        .await;

        let outcome = match result {
            Ok(()) => edit_credentials_response::Outcome::Updated(CredentialsUpdated {}),
            Err(e) => edit_credentials_response::Outcome::Failure(to_failure(&e)),
        };

        Ok(Response::new(EditCredentialsResponse {
            outcome: Some(outcome),
        }))
    }

    async fn get_credentials(
        &self,
        request: Request<GetCredentialsRequest>,
    ) -> std::result::Result<Response<GetCredentialsResponse>, Status> {
        let span = request_span(&request, "GetCredentials");
        let req = request.into_inner();

        let result = self
            .keeper
            .get_credentials(token_field(&req.token))
            .instrument(span)
            .await;

        let outcome = match result {
            Ok(credentials) => get_credentials_response::Outcome::List(CredentialsList {
                credentials: credentials.into_iter().map(stored_credentials).collect(),
            }),
            Err(e) => get_credentials_response::Outcome::Failure(to_failure(&e)),
        };

        Ok(Response::new(GetCredentialsResponse {
            outcome: Some(outcome),
        }))
    }
}
