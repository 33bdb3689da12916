//! Domain service for reading and clearing notifications.
//!
//! Notifications are written by the lending workflows; this service only
//! exposes the viewer's own inbox.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Actor;
use crate::entities::notifications;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for NotificationError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for NotificationError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UnreadCount {
    pub unread: u64,
}

#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    /// Newest first, scoped to the viewer's inbox.
    async fn list(
        &self,
        viewer: &Actor,
        query: NotificationQuery,
    ) -> Result<Vec<notifications::Model>, NotificationError>;

    async fn unread_count(&self, viewer: &Actor) -> Result<UnreadCount, NotificationError>;

    /// # Errors
    ///
    /// Returns [`NotificationError::NotFound`] if the id is not in the
    /// viewer's inbox.
    async fn mark_read(&self, viewer: &Actor, id: i32) -> Result<(), NotificationError>;

    /// Returns how many notifications changed.
    async fn mark_all_read(&self, viewer: &Actor) -> Result<u64, NotificationError>;

    async fn remove(&self, viewer: &Actor, id: i32) -> Result<(), NotificationError>;
}
