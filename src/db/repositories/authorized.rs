use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use crate::domain;
use crate::entities::{authorized_students, prelude::*};

/// SQLite caps bound parameters per statement; three per row.
const INSERT_CHUNK: usize = 300;

#[derive(Debug, Clone)]
pub struct AuthorizedEntry {
    pub roll_number: String,
    pub name: String,
}

/// The sign-up allow-list.
pub struct AuthorizedRepository {
    conn: DatabaseConnection,
}

impl AuthorizedRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<authorized_students::Model>> {
        AuthorizedStudents::find()
            .order_by_asc(authorized_students::Column::RollNumber)
            .all(&self.conn)
            .await
            .context("Failed to list authorized students")
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(AuthorizedStudents::find().count(&self.conn).await?)
    }

    pub async fn find(&self, roll_number: &str) -> Result<Option<authorized_students::Model>> {
        AuthorizedStudents::find()
            .filter(authorized_students::Column::RollNumber.eq(roll_number))
            .one(&self.conn)
            .await
            .context("Failed to query authorized student")
    }

    /// Replaces the whole list atomically. Entries must already be
    /// normalized and free of duplicate roll numbers.
    pub async fn replace_all(&self, entries: Vec<AuthorizedEntry>) -> Result<usize> {
        let count = entries.len();
        let now = domain::now();
        let txn = self.conn.begin().await?;

        AuthorizedStudents::delete_many().exec(&txn).await?;

        let models: Vec<authorized_students::ActiveModel> = entries
            .into_iter()
            .map(|entry| authorized_students::ActiveModel {
                roll_number: Set(entry.roll_number),
                name: Set(entry.name),
                created_at: Set(now.clone()),
                ..Default::default()
            })
            .collect();

        for chunk in models.chunks(INSERT_CHUNK) {
            AuthorizedStudents::insert_many(chunk.to_vec())
                .exec(&txn)
                .await
                .context("Failed to insert authorized students")?;
        }

        txn.commit().await?;
        info!("Replaced authorized student list ({count} entries)");
        Ok(count)
    }
}
