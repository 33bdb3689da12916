//! Domain service for the issue, return and transfer workflows.

use serde::Deserialize;
use thiserror::Error;

use crate::db::WorkflowError;
use crate::domain::{Actor, IssueStatus, RequestStatus};
use crate::entities::{issues, return_requests, transfer_requests};

/// Errors specific to lending operations.
#[derive(Debug, Error)]
pub enum LendingError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0} is not available")]
    Unavailable(String),

    #[error("Request has already been resolved")]
    AlreadyResolved,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for LendingError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for LendingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<WorkflowError> for LendingError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound(what) => Self::NotFound(what.to_string()),
            WorkflowError::Unavailable => Self::Unavailable("Item".to_string()),
            WorkflowError::AlreadyResolved => Self::AlreadyResolved,
            WorkflowError::Conflict(message) => Self::Conflict(message),
            WorkflowError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueInput {
    pub item_id: i32,
    /// Roll number to issue to. Only admins may set it; students always
    /// issue to themselves.
    pub student_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnInput {
    pub issue_id: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferInput {
    pub item_id: i32,
    /// Recipient roll number, matched case-insensitively.
    pub to_user_id: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueQuery {
    pub status: Option<IssueStatus>,
    /// Only the caller's own issues.
    #[serde(default)]
    pub mine: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestQuery {
    pub status: Option<RequestStatus>,
}

/// Result of an approved transfer: the settled request and the recipient's
/// new issue record.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransferOutcome {
    #[serde(flatten)]
    pub transfer: transfer_requests::Model,
    pub new_issue: Option<issues::Model>,
}

/// Domain service trait for lending.
#[async_trait::async_trait]
pub trait LendingService: Send + Sync {
    /// Issues one unit of an item.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Unavailable`] when no unit is left; nothing is
    /// written in that case.
    async fn issue_item(
        &self,
        actor: &Actor,
        input: IssueInput,
    ) -> Result<issues::Model, LendingError>;

    async fn list_issues(
        &self,
        actor: &Actor,
        query: IssueQuery,
    ) -> Result<Vec<issues::Model>, LendingError>;

    async fn get_issue(&self, actor: &Actor, id: i32) -> Result<issues::Model, LendingError>;

    /// Asks for an issued item to be taken back. Only the holder may ask.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Conflict`] if a return is already pending.
    async fn request_return(
        &self,
        actor: &Actor,
        input: ReturnInput,
    ) -> Result<return_requests::Model, LendingError>;

    async fn list_returns(
        &self,
        actor: &Actor,
        query: RequestQuery,
    ) -> Result<Vec<return_requests::Model>, LendingError>;

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::AlreadyResolved`] when the request is not pending.
    async fn approve_return(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<return_requests::Model, LendingError>;

    /// Admin only.
    async fn reject_return(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<return_requests::Model, LendingError>;

    async fn request_transfer(
        &self,
        actor: &Actor,
        input: TransferInput,
    ) -> Result<transfer_requests::Model, LendingError>;

    async fn list_transfers(
        &self,
        actor: &Actor,
        query: RequestQuery,
    ) -> Result<Vec<transfer_requests::Model>, LendingError>;

    /// Recipient or admin.
    ///
    /// # Errors
    ///
    /// Returns [`LendingError::Conflict`] if the sender no longer holds the
    /// item or has a pending return for it.
    async fn approve_transfer(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<TransferOutcome, LendingError>;

    /// Recipient or admin.
    async fn reject_transfer(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<TransferOutcome, LendingError>;
}
