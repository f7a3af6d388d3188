use crate::error::{AuthRejection, KeeperError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// HTTP view of a failed request
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Body of a register/login request could not be parsed
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// Body of a credential request could not be parsed
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_PAYLOAD", message)
    }

    /// Map an error from a credential route; validation failures there are 422
    pub fn from_credential_error(err: KeeperError) -> Self {
        match err {
            KeeperError::Validation(msg) => Self::unprocessable(msg),
            other => other.into(),
        }
    }
}

impl From<KeeperError> for ApiError {
    fn from(err: KeeperError) -> Self {
        match err {
            KeeperError::Unauthorized(AuthRejection::MissingToken) => {
                Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "unauthorized")
            }
            KeeperError::Unauthorized(AuthRejection::Token(_)) => Self::new(
                StatusCode::METHOD_NOT_ALLOWED,
                "INVALID_TOKEN",
                "token is invalid",
            ),
            KeeperError::Unauthorized(AuthRejection::CredentialNotOwned) => Self::new(
                StatusCode::UNAUTHORIZED,
                "CREDENTIAL_NOT_OWNED",
                "credential not found for this user",
            ),
            KeeperError::AlreadyExists => {
                Self::new(StatusCode::CONFLICT, "ALREADY_EXISTS", "user already registered")
            }
            KeeperError::UserNotFound | KeeperError::InvalidCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "invalid username or password",
            ),
            KeeperError::Validation(msg) => Self::bad_request(msg),
            KeeperError::Database(_)
            | KeeperError::Hashing(_)
            | KeeperError::MalformedHash(_)
            | KeeperError::TokenSigning(_) => {
                error!(error = %err, "Internal error while serving HTTP request");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            error: ApiErrorBody {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}
