//! Allow-list and registered student endpoints (admin only).

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CountResponse};
use crate::domain::Actor;
use crate::entities::{authorized_students, users};
use crate::services::auth_service::AuthorizedStudentInput;

#[derive(Deserialize)]
pub struct ReplaceAuthorizedRequest {
    pub students: Vec<AuthorizedStudentInput>,
}

pub async fn list_authorized(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Vec<authorized_students::Model>>>, ApiError> {
    let students = state.auth_service().list_authorized(&actor).await?;
    Ok(Json(ApiResponse::success(students)))
}

/// PUT /students/authorized
/// Replaces the whole list; an empty list clears it.
pub async fn replace_authorized(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ReplaceAuthorizedRequest>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state
        .auth_service()
        .replace_authorized(&actor, payload.students)
        .await?;

    Ok(Json(ApiResponse::success(CountResponse {
        count: count as u64,
    })))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<Vec<users::Model>>>, ApiError> {
    let users = state.auth_service().list_users(&actor).await?;
    Ok(Json(ApiResponse::success(users)))
}
