use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
    sea_query::SimpleExpr,
};

use crate::domain::{self, NotificationKind};
use crate::entities::{notifications, prelude::*};

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub message: String,
    pub data: serde_json::Value,
    /// Roll number, or `None` for the admin inbox.
    pub recipient: Option<String>,
}

/// Notification rows are always addressed to one inbox; every query here is
/// scoped by it.
pub struct NotificationRepository {
    conn: DatabaseConnection,
}

fn inbox(recipient: Option<&str>) -> SimpleExpr {
    match recipient {
        Some(roll_number) => notifications::Column::Recipient.eq(roll_number),
        None => notifications::Column::Recipient.is_null(),
    }
}

impl NotificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts on any connection, so workflows can write inside their transaction.
    pub async fn insert<C: ConnectionTrait>(
        db: &C,
        notification: NewNotification,
    ) -> Result<notifications::Model, DbErr> {
        notifications::ActiveModel {
            kind: Set(notification.kind.as_str().to_string()),
            message: Set(notification.message),
            read: Set(false),
            data: Set(Some(notification.data)),
            recipient: Set(notification.recipient),
            created_at: Set(domain::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn list(
        &self,
        recipient: Option<&str>,
        unread_only: bool,
        limit: u64,
    ) -> Result<Vec<notifications::Model>> {
        let mut query = Notifications::find().filter(inbox(recipient));

        if unread_only {
            query = query.filter(notifications::Column::Read.eq(false));
        }

        query
            .order_by_desc(notifications::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list notifications")
    }

    pub async fn unread_count(&self, recipient: Option<&str>) -> Result<u64> {
        Ok(Notifications::find()
            .filter(inbox(recipient))
            .filter(notifications::Column::Read.eq(false))
            .count(&self.conn)
            .await?)
    }

    /// Returns false when no notification with `id` exists in the inbox.
    pub async fn mark_read(&self, id: i32, recipient: Option<&str>) -> Result<bool> {
        let result = Notifications::update_many()
            .col_expr(notifications::Column::Read, Expr::value(true))
            .filter(notifications::Column::Id.eq(id))
            .filter(inbox(recipient))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn mark_all_read(&self, recipient: Option<&str>) -> Result<u64> {
        let result = Notifications::update_many()
            .col_expr(notifications::Column::Read, Expr::value(true))
            .filter(inbox(recipient))
            .filter(notifications::Column::Read.eq(false))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn remove(&self, id: i32, recipient: Option<&str>) -> Result<bool> {
        let result = Notifications::delete_many()
            .filter(notifications::Column::Id.eq(id))
            .filter(inbox(recipient))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
