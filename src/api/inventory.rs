use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::Actor;
use crate::entities::inventory;
use crate::services::InventoryError;
use crate::services::inventory_service::{CreateItemInput, UpdateItemInput};

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::NotFound => Self::NotFound("Item not found".to_string()),
            InventoryError::Validation(msg) => Self::validation(msg),
            InventoryError::Conflict(msg) => Self::Conflict(msg),
            InventoryError::Forbidden(msg) => Self::Forbidden(msg),
            InventoryError::Database(msg) => Self::DatabaseError(msg),
            InventoryError::Internal(msg) => Self::internal(msg),
        }
    }
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<inventory::Model>>>, ApiError> {
    let items = state.inventory_service().list().await?;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<inventory::Model>>, ApiError> {
    let id = validate_id("Item", id)?;
    let item = state.inventory_service().get(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateItemInput>,
) -> Result<(StatusCode, Json<ApiResponse<inventory::Model>>), ApiError> {
    let item = state.inventory_service().add(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateItemInput>,
) -> Result<Json<ApiResponse<inventory::Model>>, ApiError> {
    let id = validate_id("Item", id)?;
    let item = state
        .inventory_service()
        .update(&actor, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("Item", id)?;
    state.inventory_service().delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Item {id} deleted"
    )))))
}
