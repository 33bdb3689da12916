use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::{validate_id, validate_limit};
use super::{ApiError, ApiResponse, AppState, CountResponse, MessageResponse};
use crate::domain::Actor;
use crate::entities::notifications;
use crate::services::NotificationError;
use crate::services::notification_service::{NotificationQuery, UnreadCount};

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound => Self::NotFound("Notification not found".to_string()),
            NotificationError::Database(msg) => Self::DatabaseError(msg),
            NotificationError::Internal(msg) => Self::internal(msg),
        }
    }
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<Vec<notifications::Model>>>, ApiError> {
    if let Some(limit) = query.limit {
        validate_limit(limit)?;
    }

    let items = state.notification_service().list(&actor, query).await?;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<UnreadCount>>, ApiError> {
    let count = state.notification_service().unread_count(&actor).await?;
    Ok(Json(ApiResponse::success(count)))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("Notification", id)?;
    state.notification_service().mark_read(&actor, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Notification marked as read",
    ))))
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.notification_service().mark_all_read(&actor).await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}

pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("Notification", id)?;
    state.notification_service().remove(&actor, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Notification deleted",
    ))))
}
