use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::validate_required;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::constants::auth::SESSION_ACTOR_KEY;
use crate::domain::Actor;
use crate::services::auth_service::{ChangePasswordInput, SignupInput};
use crate::services::{AuthError, LoginResult, Profile};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub roll_number: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_string()),
            AuthError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Conflict(msg) => Self::Conflict(msg),
            AuthError::Forbidden(msg) => Self::Forbidden(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. Session cookie (from login, sign-in or sign-up)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
///
/// The resolved [`Actor`] is attached to the request for handlers.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // Check session first (fastest path for browsers)
    if let Ok(Some(actor)) = session.get::<Actor>(SESSION_ACTOR_KEY).await {
        tracing::Span::current().record("user_id", actor.to_string().as_str());
        request.extensions_mut().insert(actor);
        return Ok(next.run(request).await);
    }

    if let Some(key) = extract_api_key(&headers)
        && let Ok(Some(actor)) = state.auth_service().verify_api_key(&key).await
    {
        tracing::Span::current().record("user_id", actor.to_string().as_str());
        request.extensions_mut().insert(actor);
        return Ok(next.run(request).await);
    }

    Err(ApiError::Unauthorized("Not authenticated".to_string()))
}

/// Extract API key from headers
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    // Check X-Api-Key header
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    // Check Authorization: Bearer header
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

/// Admin gate for handlers that do not go through a service.
pub fn require_admin(actor: &Actor) -> Result<(), ApiError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin access required"))
    }
}

async fn start_session(session: &Session, result: &LoginResult) -> Result<(), ApiError> {
    session
        .insert(SESSION_ACTOR_KEY, &result.actor)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Admin login with username and password
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let username = validate_required("Username", &payload.username)?;
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .admin_login(username, &payload.password)
        .await?;

    start_session(&session, &result).await?;

    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/signin
/// Student sign-in with roll number and password
pub async fn signin(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SigninRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let roll_number = validate_required("Roll number", &payload.roll_number)?;
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .student_signin(roll_number, &payload.password)
        .await?;

    start_session(&session, &result).await?;

    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/signup
/// Register a student on the authorized list and sign them in
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SignupInput>,
) -> Result<(StatusCode, Json<ApiResponse<LoginResult>>), ApiError> {
    let result = state.auth_service().signup(payload).await?;

    start_session(&session, &result).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /auth/me
/// Current account, with the issue history for students
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = state.auth_service().profile(&actor).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ChangePasswordInput>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth_service()
        .change_password(&actor, payload)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

/// GET /auth/api-key
pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.auth_service().get_api_key(&actor).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}

/// POST /auth/api-key/regenerate
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.auth_service().regenerate_api_key(&actor).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}
