//! Issue, return and transfer endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState};
use crate::domain::Actor;
use crate::entities::{issues, return_requests, transfer_requests};
use crate::services::lending_service::{
    IssueInput, IssueQuery, RequestQuery, ReturnInput, TransferInput,
};
use crate::services::{LendingError, TransferOutcome};

impl From<LendingError> for ApiError {
    fn from(err: LendingError) -> Self {
        match err {
            LendingError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            LendingError::Validation(msg) => Self::validation(msg),
            LendingError::Conflict(msg) => Self::Conflict(msg),
            err @ (LendingError::Unavailable(_) | LendingError::AlreadyResolved) => {
                Self::Conflict(err.to_string())
            }
            LendingError::Forbidden(msg) => Self::Forbidden(msg),
            LendingError::Database(msg) => Self::DatabaseError(msg),
            LendingError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Issues
// ============================================================================

pub async fn list_issues(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<IssueQuery>,
) -> Result<Json<ApiResponse<Vec<issues::Model>>>, ApiError> {
    let issues = state.lending_service().list_issues(&actor, query).await?;
    Ok(Json(ApiResponse::success(issues)))
}

pub async fn get_issue(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<issues::Model>>, ApiError> {
    let id = validate_id("Issue", id)?;
    let issue = state.lending_service().get_issue(&actor, id).await?;
    Ok(Json(ApiResponse::success(issue)))
}

pub async fn issue_item(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<IssueInput>,
) -> Result<(StatusCode, Json<ApiResponse<issues::Model>>), ApiError> {
    validate_id("Item", payload.item_id)?;
    let issue = state.lending_service().issue_item(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(issue))))
}

// ============================================================================
// Returns
// ============================================================================

pub async fn list_returns(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<RequestQuery>,
) -> Result<Json<ApiResponse<Vec<return_requests::Model>>>, ApiError> {
    let requests = state.lending_service().list_returns(&actor, query).await?;
    Ok(Json(ApiResponse::success(requests)))
}

pub async fn request_return(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ReturnInput>,
) -> Result<(StatusCode, Json<ApiResponse<return_requests::Model>>), ApiError> {
    validate_id("Issue", payload.issue_id)?;
    let request = state
        .lending_service()
        .request_return(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(request))))
}

pub async fn approve_return(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<return_requests::Model>>, ApiError> {
    let id = validate_id("Return request", id)?;
    let request = state.lending_service().approve_return(&actor, id).await?;
    Ok(Json(ApiResponse::success(request)))
}

pub async fn reject_return(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<return_requests::Model>>, ApiError> {
    let id = validate_id("Return request", id)?;
    let request = state.lending_service().reject_return(&actor, id).await?;
    Ok(Json(ApiResponse::success(request)))
}

// ============================================================================
// Transfers
// ============================================================================

pub async fn list_transfers(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<RequestQuery>,
) -> Result<Json<ApiResponse<Vec<transfer_requests::Model>>>, ApiError> {
    let transfers = state.lending_service().list_transfers(&actor, query).await?;
    Ok(Json(ApiResponse::success(transfers)))
}

pub async fn request_transfer(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<TransferInput>,
) -> Result<(StatusCode, Json<ApiResponse<transfer_requests::Model>>), ApiError> {
    validate_id("Item", payload.item_id)?;
    let transfer = state
        .lending_service()
        .request_transfer(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(transfer))))
}

pub async fn approve_transfer(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TransferOutcome>>, ApiError> {
    let id = validate_id("Transfer request", id)?;
    let outcome = state.lending_service().approve_transfer(&actor, id).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn reject_transfer(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TransferOutcome>>, ApiError> {
    let id = validate_id("Transfer request", id)?;
    let outcome = state.lending_service().reject_transfer(&actor, id).await?;
    Ok(Json(ApiResponse::success(outcome)))
}
