//! System status endpoint.

use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::auth::require_admin;
use super::{ApiError, ApiResponse, AppState, SystemStatus};
use crate::domain::Actor;

/// `GET /api/system/status`
///
/// Admin only. Aggregates inventory totals and pending workflow counts.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    require_admin(&actor)?;

    let store = state.store();
    let database = store.ping().await.is_ok();

    let status = SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        database,
        inventory: store.inventory_summary().await?,
        active_issues: store.count_active_issues().await?,
        pending_returns: store.count_pending_returns().await?,
        pending_transfers: store.count_pending_transfers().await?,
        registered_students: store.count_users().await?,
        authorized_students: store.count_authorized_students().await?,
    };

    Ok(Json(ApiResponse::success(status)))
}
