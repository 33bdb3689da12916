use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::domain::IssueStatus;
use crate::entities::{issues, prelude::*};

#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    /// Roll number of the holder.
    pub student_id: Option<String>,
    pub item_id: Option<i32>,
}

pub struct IssueRepository {
    conn: DatabaseConnection,
}

impl IssueRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, filter: &IssueFilter) -> Result<Vec<issues::Model>> {
        let mut query = Issues::find();

        if let Some(status) = filter.status {
            query = query.filter(issues::Column::Status.eq(status.as_str()));
        }
        if let Some(student_id) = &filter.student_id {
            query = query.filter(issues::Column::StudentId.eq(student_id.as_str()));
        }
        if let Some(item_id) = filter.item_id {
            query = query.filter(issues::Column::ItemId.eq(item_id));
        }

        query
            .order_by_desc(issues::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list issues")
    }

    pub async fn get(&self, id: i32) -> Result<Option<issues::Model>> {
        Issues::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query issue")
    }

    /// Oldest active issue of `item_id` held by `student_id`.
    pub async fn active_for(&self, student_id: &str, item_id: i32) -> Result<Option<issues::Model>> {
        Issues::find()
            .filter(issues::Column::StudentId.eq(student_id))
            .filter(issues::Column::ItemId.eq(item_id))
            .filter(issues::Column::Status.eq(IssueStatus::Issued.as_str()))
            .order_by_asc(issues::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query active issue")
    }

    pub async fn count_active(&self) -> Result<u64> {
        Ok(Issues::find()
            .filter(issues::Column::Status.eq(IssueStatus::Issued.as_str()))
            .count(&self.conn)
            .await?)
    }
}
