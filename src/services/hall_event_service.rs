//! Domain service for dormitory events and sign-ups.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Actor;
use crate::entities::{event_registrations, hall_events};

#[derive(Debug, Error)]
pub enum HallEventError {
    #[error("Event not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for HallEventError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for HallEventError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHallEventInput {
    pub title: String,
    pub description: Option<String>,
    /// `YYYY-MM-DD`
    pub event_date: String,
    pub event_time: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub max_participants: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HallEventQuery {
    /// Only events dated today or later.
    #[serde(default)]
    pub upcoming: bool,
}

/// An event with its sign-up state for the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct HallEventView {
    #[serde(flatten)]
    pub event: hall_events::Model,
    pub registrations: i64,
    pub registered: bool,
}

#[async_trait::async_trait]
pub trait HallEventService: Send + Sync {
    async fn list(
        &self,
        viewer: &Actor,
        query: HallEventQuery,
    ) -> Result<Vec<HallEventView>, HallEventError>;

    /// Admin only.
    async fn create(
        &self,
        actor: &Actor,
        input: CreateHallEventInput,
    ) -> Result<hall_events::Model, HallEventError>;

    /// Admin only. Registrations go with the event.
    async fn delete(&self, actor: &Actor, id: i32) -> Result<(), HallEventError>;

    /// Students only.
    ///
    /// # Errors
    ///
    /// Returns [`HallEventError::Conflict`] when already registered or the
    /// event is full.
    async fn register(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<event_registrations::Model, HallEventError>;
}
