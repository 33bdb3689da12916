//! Read side of return and transfer requests. State changes live in
//! [`super::lending`].

use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use crate::domain::RequestStatus;
use crate::entities::{prelude::*, return_requests, transfer_requests};

pub struct RequestRepository {
    conn: DatabaseConnection,
}

impl RequestRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Return requests
    // ========================================================================

    pub async fn list_returns(
        &self,
        status: Option<RequestStatus>,
        student_id: Option<&str>,
    ) -> Result<Vec<return_requests::Model>> {
        let mut query = ReturnRequests::find();

        if let Some(status) = status {
            query = query.filter(return_requests::Column::Status.eq(status.as_str()));
        }
        if let Some(student_id) = student_id {
            query = query.filter(return_requests::Column::StudentId.eq(student_id));
        }

        query
            .order_by_desc(return_requests::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list return requests")
    }

    pub async fn get_return(&self, id: i32) -> Result<Option<return_requests::Model>> {
        ReturnRequests::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query return request")
    }

    pub async fn pending_return_for_issue(
        &self,
        issue_id: i32,
    ) -> Result<Option<return_requests::Model>> {
        ReturnRequests::find()
            .filter(return_requests::Column::IssueId.eq(issue_id))
            .filter(return_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query pending return request")
    }

    pub async fn count_pending_returns(&self) -> Result<u64> {
        Ok(ReturnRequests::find()
            .filter(return_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .count(&self.conn)
            .await?)
    }

    // ========================================================================
    // Transfer requests
    // ========================================================================

    /// Transfers, optionally limited to those where `participant` is the
    /// sender or the recipient.
    pub async fn list_transfers(
        &self,
        status: Option<RequestStatus>,
        participant: Option<&str>,
    ) -> Result<Vec<transfer_requests::Model>> {
        let mut query = TransferRequests::find();

        if let Some(status) = status {
            query = query.filter(transfer_requests::Column::Status.eq(status.as_str()));
        }
        if let Some(roll_number) = participant {
            query = query.filter(
                Condition::any()
                    .add(transfer_requests::Column::FromUserId.eq(roll_number))
                    .add(transfer_requests::Column::ToUserId.eq(roll_number)),
            );
        }

        query
            .order_by_desc(transfer_requests::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list transfer requests")
    }

    pub async fn get_transfer(&self, id: i32) -> Result<Option<transfer_requests::Model>> {
        TransferRequests::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query transfer request")
    }

    pub async fn pending_transfer_for_issue(
        &self,
        issue_id: i32,
    ) -> Result<Option<transfer_requests::Model>> {
        TransferRequests::find()
            .filter(transfer_requests::Column::IssueId.eq(issue_id))
            .filter(transfer_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query pending transfer request")
    }

    pub async fn count_pending_transfers(&self) -> Result<u64> {
        Ok(TransferRequests::find()
            .filter(transfer_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .count(&self.conn)
            .await?)
    }
}
