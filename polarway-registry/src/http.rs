//! REST surface over the auth and user actors, built on axum
//!
//! ```text
//! POST   /api/auth/login     {username, password}  → {token, user, expiresAt}
//! POST   /api/auth/logout    [Bearer]              → {message}
//! GET    /api/auth/verify    Bearer                → {user}
//! GET    /api/users          Bearer                → [record]
//! GET    /api/users/:id      Bearer                → record
//! POST   /api/users          Bearer + draft        → 201 record
//! PUT    /api/users/:id      Bearer + draft        → record
//! DELETE /api/users/:id      Bearer                → {message, user}
//! GET    /api/health                               → {status, timestamp}
//! ```
//!
//! Every `/api/users` route and `/api/auth/verify` goes through the
//! [`Authenticated`] extractor before any other work.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::auth::{AuthActor, AuthHandle, SessionView};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::maintenance::MaintenanceScheduler;
use crate::store::FileStore;
use crate::users::{UserActor, UserDraft, UserHandle};

/// Shared handler state: one handle per collection owner
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthHandle,
    pub users: UserHandle,
}

impl AppState {
    /// Open the store and spawn both actors on it
    pub async fn start(config: &RegistryConfig) -> Result<Self> {
        let store = Arc::new(FileStore::new(config).await?);
        let auth = AuthActor::spawn_with_store(Arc::clone(&store), config).await?;
        let users = UserActor::spawn_with_store(store, config);
        Ok(Self { auth, users })
    }
}

/// Build the router with CORS and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/verify", get(verify))
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the service until Ctrl-C
pub async fn serve(config: RegistryConfig) -> Result<()> {
    let state = AppState::start(&config).await?;

    let mut maintenance = MaintenanceScheduler::new(state.auth.clone());
    maintenance.start(&config);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, data_dir = %config.data_dir.display(), "Registry listening");
    info!("Health check: http://{}/api/health", config.listen_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    maintenance.stop();
    info!("Registry stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

// ─── Errors ───

impl RegistryError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::Unauthenticated | Self::TokenExpired => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = Json(json!({ "error": self.public_message() }));
        (self.status_code(), body).into_response()
    }
}

/// Malformed or non-JSON bodies are client errors
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| RegistryError::InvalidInput(rejection.body_text()))
}

// ─── Authentication ───

/// Second space-separated part of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.split(' ').nth(1)?;
    (!token.is_empty()).then(|| token.to_string())
}

/// A request whose bearer token verified against an active session
pub struct Authenticated(pub SessionView);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = RegistryError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(&parts.headers).ok_or(RegistryError::MissingToken)?;
        state.auth.verify(token).await.map(Authenticated)
    }
}

// ─── Auth Handlers ───

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let req = body(payload)?;
    let outcome = state
        .auth
        .login(req.username.unwrap_or_default(), req.password.unwrap_or_default())
        .await?;
    Ok(Json(outcome).into_response())
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    if let Some(token) = bearer_token(&headers) {
        state.auth.logout(token).await?;
    }
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

async fn verify(Authenticated(user): Authenticated) -> Json<Value> {
    Json(json!({ "user": user }))
}

// ─── User Handlers ───

async fn list_users(State(state): State<AppState>, _auth: Authenticated) -> Result<Response> {
    let users = state.users.list().await?;
    Ok(Json(users).into_response())
}

async fn get_user(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Response> {
    let user = state.users.get(id).await?;
    Ok(Json(user).into_response())
}

async fn create_user(
    State(state): State<AppState>,
    Authenticated(by): Authenticated,
    payload: std::result::Result<Json<UserDraft>, JsonRejection>,
) -> Result<Response> {
    let draft = body(payload)?;
    let user = state.users.create(draft, by).await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

async fn update_user(
    State(state): State<AppState>,
    Authenticated(by): Authenticated,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UserDraft>, JsonRejection>,
) -> Result<Response> {
    let draft = body(payload)?;
    let user = state.users.update(id, draft, by).await?;
    Ok(Json(user).into_response())
}

async fn delete_user(
    State(state): State<AppState>,
    Authenticated(by): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let user = state.users.delete(id, by).await?;
    Ok(Json(json!({ "message": "User deleted successfully", "user": user })))
}

// ─── Health ───

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc123")), Some("abc123".into()));
        assert_eq!(bearer_token(&headers_with("Bearer")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(RegistryError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(RegistryError::Conflict("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(RegistryError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(RegistryError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(RegistryError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(RegistryError::Unauthenticated.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(RegistryError::TokenExpired.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            RegistryError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
