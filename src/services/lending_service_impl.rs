//! `SeaORM` implementation of the `LendingService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{IssueFilter, IssueRequest, Store, TransferRequest};
use crate::domain::events::LendingEvent;
use crate::domain::{self, Actor, IssueStatus, RequestStatus, normalize_roll_number};
use crate::entities::{issues, return_requests, transfer_requests, users};
use crate::services::lending_service::{
    IssueInput, IssueQuery, LendingError, LendingService, RequestQuery, ReturnInput,
    TransferInput, TransferOutcome,
};

pub struct SeaOrmLendingService {
    store: Store,
    config: Arc<RwLock<Config>>,
    event_bus: broadcast::Sender<LendingEvent>,
}

impl SeaOrmLendingService {
    #[must_use]
    pub const fn new(
        store: Store,
        config: Arc<RwLock<Config>>,
        event_bus: broadcast::Sender<LendingEvent>,
    ) -> Self {
        Self {
            store,
            config,
            event_bus,
        }
    }

    fn publish(&self, events: impl IntoIterator<Item = LendingEvent>) {
        for event in events {
            // No subscribers is fine.
            let _ = self.event_bus.send(event);
        }
    }

    async fn clean_notes(&self, notes: Option<String>) -> Result<Option<String>, LendingError> {
        let max = self.config.read().await.lending.max_notes_length;
        let notes = domain::clean_text(notes);

        if let Some(n) = &notes
            && n.chars().count() > max
        {
            return Err(LendingError::Validation(format!(
                "Notes cannot exceed {max} characters"
            )));
        }
        Ok(notes)
    }

    async fn student(&self, roll_number: &str) -> Result<users::Model, LendingError> {
        self.store
            .get_user(roll_number)
            .await?
            .ok_or_else(|| LendingError::NotFound("Student".to_string()))
    }

    fn require_admin(actor: &Actor, action: &str) -> Result<(), LendingError> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(LendingError::Forbidden(format!("Only admins can {action}")))
        }
    }

    /// The recipient of a transfer, or an admin, may resolve it.
    async fn transfer_for_resolver(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<transfer_requests::Model, LendingError> {
        let transfer = self
            .store
            .get_transfer_request(id)
            .await?
            .ok_or_else(|| LendingError::NotFound("Transfer request".to_string()))?;

        match actor.roll_number() {
            None => Ok(transfer),
            Some(roll) if roll == transfer.to_user_id => Ok(transfer),
            Some(_) => Err(LendingError::Forbidden(
                "Only the recipient can resolve this transfer".to_string(),
            )),
        }
    }

    async fn issue_item_inner(
        &self,
        actor: &Actor,
        input: IssueInput,
    ) -> Result<issues::Model, LendingError> {
        let notes = self.clean_notes(input.notes).await?;

        let roll_number = match (actor, input.student_id) {
            (Actor::Student { roll_number, .. }, None) => roll_number.clone(),
            (Actor::Student { roll_number, .. }, Some(target))
                if normalize_roll_number(&target) == *roll_number =>
            {
                roll_number.clone()
            }
            (Actor::Student { .. }, Some(_)) => {
                return Err(LendingError::Forbidden(
                    "Students can only issue items to themselves".to_string(),
                ));
            }
            (Actor::Admin { .. }, Some(target)) => normalize_roll_number(&target),
            (Actor::Admin { .. }, None) => {
                return Err(LendingError::Validation(
                    "student_id is required when issuing as admin".to_string(),
                ));
            }
        };

        let student = self.student(&roll_number).await?;
        let max_active = self.config.read().await.lending.max_active_issues_per_student;

        let issue = self
            .store
            .issue_item(IssueRequest {
                item_id: input.item_id,
                student,
                notes,
                max_active,
            })
            .await?;

        self.publish([
            LendingEvent::ItemIssued {
                issue_id: issue.id,
                item_id: issue.item_id,
                item_name: issue.item_name.clone(),
                student_id: issue.student_id.clone(),
            },
            LendingEvent::InventoryChanged {
                item_id: issue.item_id,
            },
            LendingEvent::NotificationCreated { recipient: None },
        ]);
        Ok(issue)
    }

    async fn request_return_inner(
        &self,
        actor: &Actor,
        input: ReturnInput,
    ) -> Result<return_requests::Model, LendingError> {
        let notes = self.clean_notes(input.notes).await?;

        let issue = self
            .store
            .get_issue(input.issue_id)
            .await?
            .ok_or_else(|| LendingError::NotFound("Issue".to_string()))?;

        if actor.roll_number() != Some(issue.student_id.as_str()) {
            return Err(LendingError::Forbidden(
                "Only the holder can request a return".to_string(),
            ));
        }

        if issue.status != IssueStatus::Issued.as_str() {
            return Err(LendingError::Conflict(
                "This item has already been returned".to_string(),
            ));
        }

        if self.store.pending_return_for_issue(issue.id).await?.is_some() {
            return Err(LendingError::Conflict(
                crate::db::repositories::lending::RETURN_ALREADY_PENDING.to_string(),
            ));
        }

        let request = self.store.request_return(&issue, notes).await?;

        self.publish([
            LendingEvent::ReturnRequested {
                request_id: request.id,
                issue_id: request.issue_id,
                student_id: request.student_id.clone(),
            },
            LendingEvent::NotificationCreated { recipient: None },
        ]);
        Ok(request)
    }

    async fn approve_return_inner(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<return_requests::Model, LendingError> {
        Self::require_admin(actor, "approve returns")?;

        let request = self.store.approve_return(id).await?;

        info!("{actor} approved return {}", request.id);
        self.publish([
            LendingEvent::ReturnResolved {
                request_id: request.id,
                issue_id: request.issue_id,
                status: RequestStatus::Approved.to_string(),
            },
            LendingEvent::InventoryChanged {
                item_id: request.item_id,
            },
            LendingEvent::NotificationCreated {
                recipient: Some(request.student_id.clone()),
            },
        ]);
        Ok(request)
    }

    async fn reject_return_inner(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<return_requests::Model, LendingError> {
        Self::require_admin(actor, "reject returns")?;

        let request = self.store.reject_return(id).await?;

        info!("{actor} rejected return {}", request.id);
        self.publish([
            LendingEvent::ReturnResolved {
                request_id: request.id,
                issue_id: request.issue_id,
                status: RequestStatus::Rejected.to_string(),
            },
            LendingEvent::NotificationCreated {
                recipient: Some(request.student_id.clone()),
            },
        ]);
        Ok(request)
    }

    async fn request_transfer_inner(
        &self,
        actor: &Actor,
        input: TransferInput,
    ) -> Result<transfer_requests::Model, LendingError> {
        let Some(from_roll) = actor.roll_number() else {
            return Err(LendingError::Forbidden(
                "Only students can transfer items".to_string(),
            ));
        };

        let notes = self.clean_notes(input.notes).await?;
        let to_roll = normalize_roll_number(&input.to_user_id);

        if to_roll.is_empty() {
            return Err(LendingError::Validation(
                "Recipient roll number is required".to_string(),
            ));
        }
        if to_roll == from_roll {
            return Err(LendingError::Validation(
                "You cannot transfer an item to yourself".to_string(),
            ));
        }

        let issue = self
            .store
            .active_issue_for(from_roll, input.item_id)
            .await?
            .ok_or_else(|| {
                LendingError::Validation("You do not currently hold this item".to_string())
            })?;

        let recipient = self
            .store
            .get_user(&to_roll)
            .await?
            .ok_or_else(|| LendingError::NotFound("Recipient".to_string()))?;

        if self.store.pending_transfer_for_issue(issue.id).await?.is_some() {
            return Err(LendingError::Conflict(
                crate::db::repositories::lending::TRANSFER_ALREADY_PENDING.to_string(),
            ));
        }

        let transfer = self
            .store
            .request_transfer(TransferRequest {
                issue,
                recipient,
                notes,
            })
            .await?;

        self.publish([
            LendingEvent::TransferRequested {
                transfer_id: transfer.id,
                item_id: transfer.item_id,
                from_user_id: transfer.from_user_id.clone(),
                to_user_id: transfer.to_user_id.clone(),
            },
            LendingEvent::NotificationCreated {
                recipient: Some(transfer.to_user_id.clone()),
            },
        ]);
        Ok(transfer)
    }

    async fn approve_transfer_inner(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<TransferOutcome, LendingError> {
        self.transfer_for_resolver(actor, id).await?;

        let approval = self.store.approve_transfer(id).await?;

        info!("{actor} approved transfer {}", approval.transfer.id);
        self.publish([
            LendingEvent::TransferResolved {
                transfer_id: approval.transfer.id,
                status: RequestStatus::Approved.to_string(),
                new_issue_id: Some(approval.new_issue.id),
            },
            LendingEvent::NotificationCreated {
                recipient: Some(approval.transfer.from_user_id.clone()),
            },
        ]);
        Ok(TransferOutcome {
            transfer: approval.transfer,
            new_issue: Some(approval.new_issue),
        })
    }

    async fn reject_transfer_inner(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<TransferOutcome, LendingError> {
        self.transfer_for_resolver(actor, id).await?;

        let transfer = self.store.reject_transfer(id).await?;

        info!("{actor} rejected transfer {}", transfer.id);
        self.publish([
            LendingEvent::TransferResolved {
                transfer_id: transfer.id,
                status: RequestStatus::Rejected.to_string(),
                new_issue_id: None,
            },
            LendingEvent::NotificationCreated {
                recipient: Some(transfer.from_user_id.clone()),
            },
        ]);
        Ok(TransferOutcome {
            transfer,
            new_issue: None,
        })
    }
}

fn record<T>(operation: &'static str, result: &Result<T, LendingError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(LendingError::Conflict(_) | LendingError::AlreadyResolved) => "conflict",
        Err(LendingError::Unavailable(_)) => "unavailable",
        Err(LendingError::Database(_) | LendingError::Internal(_)) => "error",
        Err(_) => "rejected",
    };
    metrics::counter!(
        "lending_transitions_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);

    if let Err(err @ (LendingError::Conflict(_) | LendingError::AlreadyResolved)) = result {
        warn!("{operation} rejected: {err}");
    }
}

#[async_trait]
impl LendingService for SeaOrmLendingService {
    async fn issue_item(
        &self,
        actor: &Actor,
        input: IssueInput,
    ) -> Result<issues::Model, LendingError> {
        let result = self.issue_item_inner(actor, input).await;
        record("issue", &result);
        result
    }

    async fn list_issues(
        &self,
        actor: &Actor,
        query: IssueQuery,
    ) -> Result<Vec<issues::Model>, LendingError> {
        // Admins hold nothing themselves.
        if query.mine && actor.is_admin() {
            return Ok(Vec::new());
        }

        let filter = IssueFilter {
            status: query.status,
            student_id: if query.mine { actor.inbox() } else { None },
            item_id: None,
        };

        Ok(self.store.list_issues(&filter).await?)
    }

    async fn get_issue(&self, _actor: &Actor, id: i32) -> Result<issues::Model, LendingError> {
        self.store
            .get_issue(id)
            .await?
            .ok_or_else(|| LendingError::NotFound("Issue".to_string()))
    }

    async fn request_return(
        &self,
        actor: &Actor,
        input: ReturnInput,
    ) -> Result<return_requests::Model, LendingError> {
        let result = self.request_return_inner(actor, input).await;
        record("request_return", &result);
        result
    }

    async fn list_returns(
        &self,
        actor: &Actor,
        query: RequestQuery,
    ) -> Result<Vec<return_requests::Model>, LendingError> {
        Ok(self
            .store
            .list_return_requests(query.status, actor.roll_number())
            .await?)
    }

    async fn approve_return(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<return_requests::Model, LendingError> {
        let result = self.approve_return_inner(actor, id).await;
        record("approve_return", &result);
        result
    }

    async fn reject_return(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<return_requests::Model, LendingError> {
        let result = self.reject_return_inner(actor, id).await;
        record("reject_return", &result);
        result
    }

    async fn request_transfer(
        &self,
        actor: &Actor,
        input: TransferInput,
    ) -> Result<transfer_requests::Model, LendingError> {
        let result = self.request_transfer_inner(actor, input).await;
        record("request_transfer", &result);
        result
    }

    async fn list_transfers(
        &self,
        actor: &Actor,
        query: RequestQuery,
    ) -> Result<Vec<transfer_requests::Model>, LendingError> {
        Ok(self
            .store
            .list_transfer_requests(query.status, actor.roll_number())
            .await?)
    }

    async fn approve_transfer(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<TransferOutcome, LendingError> {
        let result = self.approve_transfer_inner(actor, id).await;
        record("approve_transfer", &result);
        result
    }

    async fn reject_transfer(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<TransferOutcome, LendingError> {
        let result = self.reject_transfer_inner(actor, id).await;
        record("reject_transfer", &result);
        result
    }
}
