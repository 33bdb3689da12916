//! `SeaORM` implementation of the `InventoryService` trait.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use crate::constants::limits::MAX_NAME_LENGTH;
use crate::db::{ItemChanges, ItemRemoval, ItemUpdate, NewItem, Store};
use crate::domain::events::LendingEvent;
use crate::domain::{self, Actor};
use crate::entities::inventory;
use crate::services::inventory_service::{
    CreateItemInput, InventoryError, InventoryService, UpdateItemInput,
};

pub struct SeaOrmInventoryService {
    store: Store,
    event_bus: broadcast::Sender<LendingEvent>,
}

impl SeaOrmInventoryService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<LendingEvent>) -> Self {
        Self { store, event_bus }
    }

    fn require_admin(actor: &Actor) -> Result<(), InventoryError> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(InventoryError::Forbidden(
                "Only admins can manage inventory".to_string(),
            ))
        }
    }
}

fn required(field: &str, value: &str) -> Result<String, InventoryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(InventoryError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(InventoryError::Validation(format!(
            "{field} cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(value.to_string())
}

fn positive_quantity(quantity: i32) -> Result<i32, InventoryError> {
    if quantity > 0 {
        Ok(quantity)
    } else {
        Err(InventoryError::Validation(
            "Quantity must be greater than zero".to_string(),
        ))
    }
}

#[async_trait]
impl InventoryService for SeaOrmInventoryService {
    async fn list(&self) -> Result<Vec<inventory::Model>, InventoryError> {
        Ok(self.store.list_inventory().await?)
    }

    async fn get(&self, id: i32) -> Result<inventory::Model, InventoryError> {
        self.store
            .get_item(id)
            .await?
            .ok_or(InventoryError::NotFound)
    }

    async fn add(
        &self,
        actor: &Actor,
        input: CreateItemInput,
    ) -> Result<inventory::Model, InventoryError> {
        Self::require_admin(actor)?;

        let item = NewItem {
            name: required("Name", &input.name)?,
            category: required("Category", &input.category)?,
            quantity: positive_quantity(input.quantity)?,
            condition: domain::clean_text(input.condition),
            notes: domain::clean_text(input.notes),
        };

        let item = self.store.add_item(item).await?;

        let _ = self
            .event_bus
            .send(LendingEvent::InventoryChanged { item_id: item.id });
        Ok(item)
    }

    async fn update(
        &self,
        actor: &Actor,
        id: i32,
        input: UpdateItemInput,
    ) -> Result<inventory::Model, InventoryError> {
        Self::require_admin(actor)?;

        let changes = ItemChanges {
            name: input.name.as_deref().map(|v| required("Name", v)).transpose()?,
            category: input
                .category
                .as_deref()
                .map(|v| required("Category", v))
                .transpose()?,
            quantity: input.quantity.map(positive_quantity).transpose()?,
            condition: domain::clean_text(input.condition),
            notes: input.notes.map(|n| n.trim().to_string()),
        };

        match self.store.update_item(id, changes).await? {
            ItemUpdate::Updated(item) => {
                let _ = self
                    .event_bus
                    .send(LendingEvent::InventoryChanged { item_id: item.id });
                Ok(item)
            }
            ItemUpdate::NotFound => Err(InventoryError::NotFound),
            ItemUpdate::BelowIssued { issued } => Err(InventoryError::Validation(format!(
                "Quantity cannot be lower than the {issued} units currently issued"
            ))),
        }
    }

    async fn delete(&self, actor: &Actor, id: i32) -> Result<(), InventoryError> {
        Self::require_admin(actor)?;

        match self.store.delete_item(id).await? {
            ItemRemoval::Removed => {
                info!("{actor} removed inventory item {id}");
                let _ = self
                    .event_bus
                    .send(LendingEvent::InventoryRemoved { item_id: id });
                Ok(())
            }
            ItemRemoval::NotFound => Err(InventoryError::NotFound),
            ItemRemoval::InUse { active_issues } => Err(InventoryError::Conflict(format!(
                "Item is still issued to {active_issues} student(s)"
            ))),
        }
    }
}
