use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::Actor;
use crate::entities::{event_registrations, hall_events};
use crate::services::HallEventError;
use crate::services::hall_event_service::{
    CreateHallEventInput, HallEventQuery, HallEventView,
};

impl From<HallEventError> for ApiError {
    fn from(err: HallEventError) -> Self {
        match err {
            HallEventError::NotFound => Self::NotFound("Event not found".to_string()),
            HallEventError::Validation(msg) => Self::validation(msg),
            HallEventError::Conflict(msg) => Self::Conflict(msg),
            HallEventError::Forbidden(msg) => Self::Forbidden(msg),
            HallEventError::Database(msg) => Self::DatabaseError(msg),
            HallEventError::Internal(msg) => Self::internal(msg),
        }
    }
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<HallEventQuery>,
) -> Result<Json<ApiResponse<Vec<HallEventView>>>, ApiError> {
    let events = state.hall_event_service().list(&actor, query).await?;
    Ok(Json(ApiResponse::success(events)))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateHallEventInput>,
) -> Result<(StatusCode, Json<ApiResponse<hall_events::Model>>), ApiError> {
    let event = state.hall_event_service().create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(event))))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("Event", id)?;
    state.hall_event_service().delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Event {id} deleted"
    )))))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ApiResponse<event_registrations::Model>>), ApiError> {
    let id = validate_id("Event", id)?;
    let registration = state.hall_event_service().register(&actor, id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(registration))))
}
