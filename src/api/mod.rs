use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::domain::events::LendingEvent;
use crate::state::SharedState;

pub mod auth;
mod error;
pub mod events;
mod hall_events;
mod inventory;
mod lending;
mod notifications;
mod observability;
mod students;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn event_bus(&self) -> &tokio::sync::broadcast::Sender<LendingEvent> {
        &self.shared.event_bus
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn inventory_service(&self) -> &Arc<dyn crate::services::InventoryService> {
        &self.shared.inventory_service
    }

    #[must_use]
    pub fn lending_service(&self) -> &Arc<dyn crate::services::LendingService> {
        &self.shared.lending_service
    }

    #[must_use]
    pub fn notification_service(&self) -> &Arc<dyn crate::services::NotificationService> {
        &self.shared.notification_service
    }

    #[must_use]
    pub fn hall_event_service(&self) -> &Arc<dyn crate::services::HallEventService> {
        &self.shared.hall_event_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, session_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.security.session_expiry_minutes,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/logout", post(auth::logout))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/auth/api-key", get(auth::get_api_key))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/inventory", get(inventory::list_items))
        .route("/inventory", post(inventory::add_item))
        .route("/inventory/{id}", get(inventory::get_item))
        .route("/inventory/{id}", put(inventory::update_item))
        .route("/inventory/{id}", delete(inventory::delete_item))
        .route("/issues", get(lending::list_issues))
        .route("/issues", post(lending::issue_item))
        .route("/issues/{id}", get(lending::get_issue))
        .route("/returns", get(lending::list_returns))
        .route("/returns", post(lending::request_return))
        .route("/returns/{id}/approve", post(lending::approve_return))
        .route("/returns/{id}/reject", post(lending::reject_return))
        .route("/transfers", get(lending::list_transfers))
        .route("/transfers", post(lending::request_transfer))
        .route("/transfers/{id}/approve", post(lending::approve_transfer))
        .route("/transfers/{id}/reject", post(lending::reject_transfer))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route(
            "/notifications/{id}",
            delete(notifications::delete_notification),
        )
        .route("/students/authorized", get(students::list_authorized))
        .route("/students/authorized", put(students::replace_authorized))
        .route("/users", get(students::list_users))
        .route("/hall-events", get(hall_events::list_events))
        .route("/hall-events", post(hall_events::create_event))
        .route("/hall-events/{id}", delete(hall_events::delete_event))
        .route("/hall-events/{id}/register", post(hall_events::register))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .merge(events::router())
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
