//! Domain service for the equipment catalogue.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::Actor;
use crate::entities::inventory;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Item not found")]
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

impl From<sea_orm::DbErr> for InventoryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for InventoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i32>,
    pub condition: Option<String>,
    /// Empty string clears the notes.
    pub notes: Option<String>,
}

#[async_trait::async_trait]
pub trait InventoryService: Send + Sync {
    async fn list(&self) -> Result<Vec<inventory::Model>, InventoryError>;

    async fn get(&self, id: i32) -> Result<inventory::Model, InventoryError>;

    /// Admin only. New items start fully available.
    async fn add(
        &self,
        actor: &Actor,
        input: CreateItemInput,
    ) -> Result<inventory::Model, InventoryError>;

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Validation`] if the new quantity is below the
    /// number of units currently issued.
    async fn update(
        &self,
        actor: &Actor,
        id: i32,
        input: UpdateItemInput,
    ) -> Result<inventory::Model, InventoryError>;

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Conflict`] while any unit is issued.
    async fn delete(&self, actor: &Actor, id: i32) -> Result<(), InventoryError>;
}
