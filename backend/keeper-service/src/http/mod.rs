/// HTTP API for keeper-service
///
/// Routes:
/// - `POST /register`, `POST /login`: start a session, set the `token` cookie
/// - `POST /credentials`, `POST /edit-credentials`, `GET /credentials`:
///   owner-scoped credential access, authorized by the `token` cookie
/// - `GET /health`: liveness check
///
/// Protected routes check token presence (401), then the payload (422), then
/// token validity (405).
mod error;

pub use error::{ApiError, ApiErrorBody, ApiErrorResponse};

use crate::error::{AuthRejection, KeeperError};
use crate::models::{AuthRequest, Credential, CredentialPayload, EditCredentialPayload, Session};
use crate::services::KeeperOperations;
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use crypto_core::{CorrelationId, CORRELATION_ID_HEADER};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};
use uuid::Uuid;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

/// Shared HTTP server state
#[derive(Clone)]
pub struct HttpServerState {
    pub keeper: Arc<dyn KeeperOperations>,
    /// Lifetime of the session cookie, matching token validity
    pub session_ttl: time::Duration,
    pub cookie_secure: bool,
}

#[derive(Debug, Serialize)]
pub struct CredentialCreated {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CredentialList {
    pub credentials: Vec<Credential>,
}

/// Build the HTTP router with all API endpoints
pub fn build_router(state: HttpServerState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/credentials", post(add_credentials).get(get_credentials))
        .route("/edit-credentials", post(edit_credentials))
        .layer(middleware::from_fn(correlation_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint (no auth required)
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Tag the request with a correlation id and echo it on the response
async fn correlation_middleware(mut request: Request, next: Next) -> Response {
    let id = CorrelationId::from_header(
        request
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    let span = tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        correlation_id = %id,
    );
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

fn session_cookie(state: &HttpServerState, token: String) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(state.session_ttl)
        .build()
}

/// Session token from the cookie jar, or a 401 when none was sent
fn require_token(jar: &CookieJar) -> Result<&str, ApiError> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| KeeperError::Unauthorized(AuthRejection::MissingToken).into())
}

fn parse_failure(rejection: JsonRejection) -> String {
    format!("failed to parse payload data: {}", rejection.body_text())
}

async fn register(
    State(state): State<Arc<HttpServerState>>,
    jar: CookieJar,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<Session>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(parse_failure(e)))?;

    let session = state.keeper.register(&req.username, &req.password).await?;
    let jar = jar.add(session_cookie(&state, session.token.clone()));

    Ok((StatusCode::CREATED, jar, Json(session)))
}

async fn login(
    State(state): State<Arc<HttpServerState>>,
    jar: CookieJar,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<Session>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(parse_failure(e)))?;

    let session = state.keeper.login(&req.username, &req.password).await?;
    let jar = jar.add(session_cookie(&state, session.token.clone()));

    Ok((StatusCode::ACCEPTED, jar, Json(session)))
}

async fn add_credentials(
    State(state): State<Arc<HttpServerState>>,
    jar: CookieJar,
    payload: Result<Json<CredentialPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CredentialCreated>), ApiError> {
    let token = require_token(&jar)?;
    let Json(payload) = payload.map_err(|e| ApiError::unprocessable(parse_failure(e)))?;

    let id = state
        .keeper
        .add_credential(Some(token), &payload.data, &payload.meta)
        .await
        .map_err(ApiError::from_credential_error)?;

    Ok((StatusCode::CREATED, Json(CredentialCreated { id })))
}

async fn edit_credentials(
    State(state): State<Arc<HttpServerState>>,
    jar: CookieJar,
    payload: Result<Json<EditCredentialPayload>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let token = require_token(&jar)?;
    let Json(payload) = payload.map_err(|e| ApiError::unprocessable(parse_failure(e)))?;

    state
        .keeper
        .edit_credential(Some(token), &payload.id, &payload.data, &payload.meta)
        .await
        .map_err(ApiError::from_credential_error)?;

    Ok(StatusCode::OK)
}

async fn get_credentials(
    State(state): State<Arc<HttpServerState>>,
    jar: CookieJar,
) -> Result<Json<CredentialList>, ApiError> {
    let token = require_token(&jar)?;

    let credentials = state
        .keeper
        .get_credentials(Some(token))
        .await
        .map_err(ApiError::from_credential_error)?;

    Ok(Json(CredentialList { credentials }))
}

/// Start the HTTP API server and run it until `shutdown` resolves
pub async fn start_http_server<F>(
    state: HttpServerState,
    host: &str,
    port: u16,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Starting HTTP API server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
