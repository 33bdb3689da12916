//! Transactional lending workflows.
//!
//! Every workflow opens with a conditional write so SQLite takes its write
//! lock before anything is read, and every guard is re-checked inside the
//! transaction. Returning early drops the transaction, which rolls it back.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait, sea_query::Expr,
};
use serde_json::json;
use tracing::{info, warn};

use super::is_unique_violation;
use super::notification::{NewNotification, NotificationRepository};
use crate::domain::{self, IssueStatus, NotificationKind, RequestStatus};
use crate::entities::{
    inventory, issues, prelude::*, return_requests, transfer_requests, users,
};

pub const RETURN_ALREADY_PENDING: &str = "A return request is already pending for this item";
pub const TRANSFER_ALREADY_PENDING: &str = "A transfer request is already pending for this item";

/// Expected rejections of a workflow step.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Item is not available")]
    Unavailable,

    #[error("Request has already been resolved")]
    AlreadyResolved,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub item_id: i32,
    pub student: users::Model,
    pub notes: Option<String>,
    /// 0 disables the limit.
    pub max_active: u32,
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub issue: issues::Model,
    pub recipient: users::Model,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransferApproval {
    pub transfer: transfer_requests::Model,
    pub new_issue: issues::Model,
}

pub struct LendingRepository {
    conn: DatabaseConnection,
}

impl LendingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Issue
    // ========================================================================

    pub async fn issue_item(&self, request: IssueRequest) -> WorkflowResult<issues::Model> {
        let IssueRequest {
            item_id,
            student,
            notes,
            max_active,
        } = request;

        let txn = self.conn.begin().await?;

        let taken = Inventory::update_many()
            .col_expr(
                inventory::Column::Available,
                Expr::col(inventory::Column::Available).sub(1),
            )
            .col_expr(inventory::Column::UpdatedAt, Expr::value(domain::now()))
            .filter(inventory::Column::Id.eq(item_id))
            .filter(inventory::Column::Available.gt(0))
            .exec(&txn)
            .await?;

        let item = Inventory::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or(WorkflowError::NotFound("Item"))?;

        if taken.rows_affected == 0 {
            return Err(WorkflowError::Unavailable);
        }

        if max_active > 0 {
            let held = Issues::find()
                .filter(issues::Column::StudentId.eq(student.roll_number.as_str()))
                .filter(issues::Column::Status.eq(IssueStatus::Issued.as_str()))
                .count(&txn)
                .await?;

            if held >= u64::from(max_active) {
                return Err(WorkflowError::Conflict(format!(
                    "Students may hold at most {max_active} items at once"
                )));
            }
        }

        let issue = issues::ActiveModel {
            item_id: Set(item.id),
            item_name: Set(item.name.clone()),
            student_id: Set(student.roll_number.clone()),
            student_name: Set(student.name.clone()),
            phone_number: Set(student.phone_number.clone()),
            room_number: Set(student.room_number.clone()),
            issue_date: Set(domain::today()),
            return_date: Set(None),
            status: Set(IssueStatus::Issued.as_str().to_string()),
            notes: Set(notes),
            created_at: Set(domain::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        NotificationRepository::insert(
            &txn,
            NewNotification {
                kind: NotificationKind::Issue,
                message: format!(
                    "{} ({}) issued {}",
                    student.name, student.roll_number, item.name
                ),
                data: json!({
                    "issue_id": issue.id,
                    "item_id": item.id,
                    "student_id": student.roll_number,
                }),
                recipient: None,
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            "Issued {} (item {}) to {}, {} left",
            item.name,
            item.id,
            issue.student_id,
            item.available
        );
        Ok(issue)
    }

    // ========================================================================
    // Returns
    // ========================================================================

    pub async fn request_return(
        &self,
        issue: &issues::Model,
        notes: Option<String>,
    ) -> WorkflowResult<return_requests::Model> {
        let txn = self.conn.begin().await?;

        let request = return_requests::ActiveModel {
            issue_id: Set(issue.id),
            item_id: Set(issue.item_id),
            item_name: Set(issue.item_name.clone()),
            student_id: Set(issue.student_id.clone()),
            student_name: Set(issue.student_name.clone()),
            request_date: Set(domain::today()),
            status: Set(RequestStatus::Pending.as_str().to_string()),
            notes: Set(notes),
            resolved_at: Set(None),
            created_at: Set(domain::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| pending_conflict(e, RETURN_ALREADY_PENDING))?;

        ensure_issued(&txn, issue.id).await?;

        NotificationRepository::insert(
            &txn,
            NewNotification {
                kind: NotificationKind::ReturnRequest,
                message: format!(
                    "{} ({}) requested to return {}",
                    issue.student_name, issue.student_id, issue.item_name
                ),
                data: json!({
                    "return_request_id": request.id,
                    "issue_id": issue.id,
                    "item_id": issue.item_id,
                    "student_id": issue.student_id,
                }),
                recipient: None,
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            "Return requested for issue {} by {}",
            issue.id, issue.student_id
        );
        Ok(request)
    }

    /// Marks the issue returned and puts the unit back into the pool.
    pub async fn approve_return(&self, request_id: i32) -> WorkflowResult<return_requests::Model> {
        let txn = self.conn.begin().await?;

        let request = settle_return(&txn, request_id, RequestStatus::Approved).await?;

        close_issue(&txn, request.issue_id, "This item is no longer issued").await?;

        let restocked = Inventory::update_many()
            .col_expr(
                inventory::Column::Available,
                Expr::col(inventory::Column::Available).add(1),
            )
            .col_expr(inventory::Column::UpdatedAt, Expr::value(domain::now()))
            .filter(inventory::Column::Id.eq(request.item_id))
            .filter(
                Expr::col(inventory::Column::Available).lt(Expr::col(inventory::Column::Quantity)),
            )
            .exec(&txn)
            .await?;

        if restocked.rows_affected == 0 {
            warn!(
                "Return {} would exceed stock of item {}",
                request.id, request.item_id
            );
            return Err(WorkflowError::Conflict(
                "Item stock is already complete".to_string(),
            ));
        }

        NotificationRepository::insert(
            &txn,
            NewNotification {
                kind: NotificationKind::ReturnRequest,
                message: format!("Your return of {} was approved", request.item_name),
                data: json!({
                    "return_request_id": request.id,
                    "issue_id": request.issue_id,
                    "status": RequestStatus::Approved,
                }),
                recipient: Some(request.student_id.clone()),
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            "Approved return {} for issue {}",
            request.id, request.issue_id
        );
        Ok(request)
    }

    pub async fn reject_return(&self, request_id: i32) -> WorkflowResult<return_requests::Model> {
        let txn = self.conn.begin().await?;

        let request = settle_return(&txn, request_id, RequestStatus::Rejected).await?;

        NotificationRepository::insert(
            &txn,
            NewNotification {
                kind: NotificationKind::ReturnRequest,
                message: format!("Your return of {} was rejected", request.item_name),
                data: json!({
                    "return_request_id": request.id,
                    "issue_id": request.issue_id,
                    "status": RequestStatus::Rejected,
                }),
                recipient: Some(request.student_id.clone()),
            },
        )
        .await?;

        txn.commit().await?;

        info!("Rejected return {}", request.id);
        Ok(request)
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    pub async fn request_transfer(
        &self,
        request: TransferRequest,
    ) -> WorkflowResult<transfer_requests::Model> {
        let TransferRequest {
            issue,
            recipient,
            notes,
        } = request;

        let txn = self.conn.begin().await?;

        let transfer = transfer_requests::ActiveModel {
            item_id: Set(issue.item_id),
            item_name: Set(issue.item_name.clone()),
            issue_id: Set(issue.id),
            from_user_id: Set(issue.student_id.clone()),
            from_user_name: Set(issue.student_name.clone()),
            to_user_id: Set(recipient.roll_number.clone()),
            to_user_name: Set(recipient.name.clone()),
            request_date: Set(domain::today()),
            status: Set(RequestStatus::Pending.as_str().to_string()),
            notes: Set(notes),
            resolved_at: Set(None),
            created_at: Set(domain::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| pending_conflict(e, TRANSFER_ALREADY_PENDING))?;

        ensure_issued(&txn, issue.id).await?;
        ensure_no_pending_return(&txn, issue.id).await?;

        NotificationRepository::insert(
            &txn,
            NewNotification {
                kind: NotificationKind::TransferRequest,
                message: format!(
                    "{} wants to transfer {} to you",
                    issue.student_name, issue.item_name
                ),
                data: json!({
                    "transfer_id": transfer.id,
                    "item_id": transfer.item_id,
                    "issue_id": transfer.issue_id,
                    "from_user_id": transfer.from_user_id,
                    "to_user_id": transfer.to_user_id,
                }),
                recipient: Some(recipient.roll_number.clone()),
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            "Transfer {} requested: {} -> {} ({})",
            transfer.id, transfer.from_user_id, transfer.to_user_id, transfer.item_name
        );
        Ok(transfer)
    }

    /// Hands the sender's unit to the recipient. Stock is untouched.
    pub async fn approve_transfer(&self, transfer_id: i32) -> WorkflowResult<TransferApproval> {
        let txn = self.conn.begin().await?;

        let transfer = settle_transfer(&txn, transfer_id, RequestStatus::Approved).await?;

        ensure_no_pending_return(&txn, transfer.issue_id).await?;
        close_issue(&txn, transfer.issue_id, "The sender no longer holds this item").await?;

        let recipient = Users::find()
            .filter(users::Column::RollNumber.eq(transfer.to_user_id.as_str()))
            .one(&txn)
            .await?
            .ok_or(WorkflowError::NotFound("Recipient"))?;

        let new_issue = issues::ActiveModel {
            item_id: Set(transfer.item_id),
            item_name: Set(transfer.item_name.clone()),
            student_id: Set(recipient.roll_number),
            student_name: Set(recipient.name),
            phone_number: Set(recipient.phone_number),
            room_number: Set(recipient.room_number),
            issue_date: Set(domain::today()),
            return_date: Set(None),
            status: Set(IssueStatus::Issued.as_str().to_string()),
            notes: Set(Some(format!(
                "Transferred from {} ({})",
                transfer.from_user_name, transfer.from_user_id
            ))),
            created_at: Set(domain::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        NotificationRepository::insert(
            &txn,
            NewNotification {
                kind: NotificationKind::TransferRequest,
                message: format!(
                    "{} accepted your transfer of {}",
                    transfer.to_user_name, transfer.item_name
                ),
                data: json!({
                    "transfer_id": transfer.id,
                    "issue_id": transfer.issue_id,
                    "new_issue_id": new_issue.id,
                    "status": RequestStatus::Approved,
                }),
                recipient: Some(transfer.from_user_id.clone()),
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            "Transfer {} approved: issue {} closed, issue {} opened for {}",
            transfer.id, transfer.issue_id, new_issue.id, new_issue.student_id
        );
        Ok(TransferApproval {
            transfer,
            new_issue,
        })
    }

    pub async fn reject_transfer(
        &self,
        transfer_id: i32,
    ) -> WorkflowResult<transfer_requests::Model> {
        let txn = self.conn.begin().await?;

        let transfer = settle_transfer(&txn, transfer_id, RequestStatus::Rejected).await?;

        NotificationRepository::insert(
            &txn,
            NewNotification {
                kind: NotificationKind::TransferRequest,
                message: format!(
                    "{} declined your transfer of {}",
                    transfer.to_user_name, transfer.item_name
                ),
                data: json!({
                    "transfer_id": transfer.id,
                    "issue_id": transfer.issue_id,
                    "status": RequestStatus::Rejected,
                }),
                recipient: Some(transfer.from_user_id.clone()),
            },
        )
        .await?;

        txn.commit().await?;

        info!("Transfer {} rejected", transfer.id);
        Ok(transfer)
    }
}

fn pending_conflict(err: DbErr, message: &str) -> WorkflowError {
    if is_unique_violation(&err) {
        warn!("Duplicate pending request rejected by index: {message}");
        WorkflowError::Conflict(message.to_string())
    } else {
        WorkflowError::Database(err)
    }
}

async fn ensure_issued(txn: &DatabaseTransaction, issue_id: i32) -> WorkflowResult<()> {
    let issue = Issues::find_by_id(issue_id)
        .one(txn)
        .await?
        .ok_or(WorkflowError::NotFound("Issue"))?;

    if issue.status == IssueStatus::Issued.as_str() {
        Ok(())
    } else {
        Err(WorkflowError::Conflict(
            "This item has already been returned".to_string(),
        ))
    }
}

async fn ensure_no_pending_return(txn: &DatabaseTransaction, issue_id: i32) -> WorkflowResult<()> {
    let pending = ReturnRequests::find()
        .filter(return_requests::Column::IssueId.eq(issue_id))
        .filter(return_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
        .count(txn)
        .await?;

    if pending == 0 {
        Ok(())
    } else {
        Err(WorkflowError::Conflict(
            "A return request is pending for this item".to_string(),
        ))
    }
}

/// `issued -> returned`; any other current status is a conflict.
async fn close_issue(
    txn: &DatabaseTransaction,
    issue_id: i32,
    conflict: &str,
) -> WorkflowResult<()> {
    let closed = Issues::update_many()
        .col_expr(
            issues::Column::Status,
            Expr::value(IssueStatus::Returned.as_str()),
        )
        .col_expr(issues::Column::ReturnDate, Expr::value(domain::today()))
        .filter(issues::Column::Id.eq(issue_id))
        .filter(issues::Column::Status.eq(IssueStatus::Issued.as_str()))
        .exec(txn)
        .await?;

    if closed.rows_affected == 0 {
        warn!("Issue {issue_id} was not open when closing it");
        return Err(WorkflowError::Conflict(conflict.to_string()));
    }
    Ok(())
}

async fn settle_return(
    txn: &DatabaseTransaction,
    request_id: i32,
    status: RequestStatus,
) -> WorkflowResult<return_requests::Model> {
    debug_assert!(status.is_terminal(), "settling to a non-terminal status");

    let settled = ReturnRequests::update_many()
        .col_expr(return_requests::Column::Status, Expr::value(status.as_str()))
        .col_expr(return_requests::Column::ResolvedAt, Expr::value(domain::now()))
        .filter(return_requests::Column::Id.eq(request_id))
        .filter(return_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
        .exec(txn)
        .await?;

    let request = ReturnRequests::find_by_id(request_id)
        .one(txn)
        .await?
        .ok_or(WorkflowError::NotFound("Return request"))?;

    if settled.rows_affected == 0 {
        return Err(WorkflowError::AlreadyResolved);
    }
    Ok(request)
}

async fn settle_transfer(
    txn: &DatabaseTransaction,
    transfer_id: i32,
    status: RequestStatus,
) -> WorkflowResult<transfer_requests::Model> {
    debug_assert!(status.is_terminal(), "settling to a non-terminal status");

    let settled = TransferRequests::update_many()
        .col_expr(
            transfer_requests::Column::Status,
            Expr::value(status.as_str()),
        )
        .col_expr(
            transfer_requests::Column::ResolvedAt,
            Expr::value(domain::now()),
        )
        .filter(transfer_requests::Column::Id.eq(transfer_id))
        .filter(transfer_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
        .exec(txn)
        .await?;

    let transfer = TransferRequests::find_by_id(transfer_id)
        .one(txn)
        .await?
        .ok_or(WorkflowError::NotFound("Transfer request"))?;

    if settled.rows_affected == 0 {
        return Err(WorkflowError::AlreadyResolved);
    }
    Ok(transfer)
}
