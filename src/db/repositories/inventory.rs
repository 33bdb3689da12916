use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use tracing::info;

use crate::constants::DEFAULT_CONDITION;
use crate::domain::{self, IssueStatus};
use crate::entities::{inventory, issues, prelude::*};

#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i32>,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

/// Result of an update that may shrink the stock.
#[derive(Debug)]
pub enum ItemUpdate {
    Updated(inventory::Model),
    NotFound,
    /// The new quantity is below the number of units currently out.
    BelowIssued { issued: i32 },
}

#[derive(Debug)]
pub enum ItemRemoval {
    Removed,
    NotFound,
    InUse { active_issues: u64 },
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct InventorySummary {
    pub items: u64,
    pub total_units: i64,
    pub available_units: i64,
}

pub struct InventoryRepository {
    conn: DatabaseConnection,
}

impl InventoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<inventory::Model>> {
        Inventory::find()
            .order_by_asc(inventory::Column::Category)
            .order_by_asc(inventory::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list inventory")
    }

    pub async fn get(&self, id: i32) -> Result<Option<inventory::Model>> {
        Inventory::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query inventory item")
    }

    pub async fn add(&self, item: NewItem) -> Result<inventory::Model> {
        let now = domain::now();

        let model = inventory::ActiveModel {
            name: Set(item.name),
            category: Set(item.category),
            quantity: Set(item.quantity),
            available: Set(item.quantity),
            condition: Set(item
                .condition
                .unwrap_or_else(|| DEFAULT_CONDITION.to_string())),
            added_date: Set(domain::today()),
            notes: Set(item.notes),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert inventory item")?;

        info!("Added inventory item {} ({})", model.id, model.name);
        Ok(model)
    }

    /// Applies `changes`; a quantity change moves `available` by the same delta.
    ///
    /// The stock columns are written with a single conditional update guarded
    /// on the quantity read in the same transaction, so a concurrent issue
    /// cannot push `available` below zero.
    pub async fn update(&self, id: i32, changes: ItemChanges) -> Result<ItemUpdate> {
        let txn = self.conn.begin().await?;

        let touched = Inventory::update_many()
            .col_expr(inventory::Column::UpdatedAt, Expr::value(domain::now()))
            .filter(inventory::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        if touched.rows_affected == 0 {
            return Ok(ItemUpdate::NotFound);
        }

        let Some(current) = Inventory::find_by_id(id).one(&txn).await? else {
            return Ok(ItemUpdate::NotFound);
        };

        if let Some(quantity) = changes.quantity {
            let delta = quantity - current.quantity;
            let issued = current.quantity - current.available;

            if current.available + delta < 0 {
                return Ok(ItemUpdate::BelowIssued { issued });
            }

            Inventory::update_many()
                .col_expr(inventory::Column::Quantity, Expr::value(quantity))
                .col_expr(
                    inventory::Column::Available,
                    Expr::col(inventory::Column::Available).add(delta),
                )
                .filter(inventory::Column::Id.eq(id))
                .exec(&txn)
                .await?;
        }

        let mut active: inventory::ActiveModel = Inventory::find_by_id(id)
            .one(&txn)
            .await?
            .context("Inventory item vanished during update")?
            .into();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(category) = changes.category {
            active.category = Set(category);
        }
        if let Some(condition) = changes.condition {
            active.condition = Set(condition);
        }
        if let Some(notes) = changes.notes {
            active.notes = Set(if notes.is_empty() { None } else { Some(notes) });
        }

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(
            "Updated inventory item {} (quantity {}, available {})",
            updated.id, updated.quantity, updated.available
        );
        Ok(ItemUpdate::Updated(updated))
    }

    pub async fn delete(&self, id: i32) -> Result<ItemRemoval> {
        let txn = self.conn.begin().await?;

        // Write first so the SQLite write lock is held before counting issues.
        let touched = Inventory::update_many()
            .col_expr(inventory::Column::UpdatedAt, Expr::value(domain::now()))
            .filter(inventory::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        if touched.rows_affected == 0 {
            return Ok(ItemRemoval::NotFound);
        }

        let active_issues = Issues::find()
            .filter(issues::Column::ItemId.eq(id))
            .filter(issues::Column::Status.eq(IssueStatus::Issued.as_str()))
            .count(&txn)
            .await?;

        if active_issues > 0 {
            return Ok(ItemRemoval::InUse { active_issues });
        }

        // History rows reference the item; they go with it.
        TransferRequests::delete_many()
            .filter(crate::entities::transfer_requests::Column::ItemId.eq(id))
            .exec(&txn)
            .await?;
        Issues::delete_many()
            .filter(issues::Column::ItemId.eq(id))
            .exec(&txn)
            .await?;
        Inventory::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!("Removed inventory item {id}");
        Ok(ItemRemoval::Removed)
    }

    pub async fn summary(&self) -> Result<InventorySummary> {
        let items = self.list().await?;

        Ok(items
            .iter()
            .fold(InventorySummary::default(), |mut acc, item| {
                acc.items += 1;
                acc.total_units += i64::from(item.quantity);
                acc.available_units += i64::from(item.available);
                acc
            }))
    }
}
