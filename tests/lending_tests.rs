//! Workflow tests driven through the services against a real SQLite file.

use hall3::config::Config;
use hall3::domain::{Actor, IssueStatus};
use hall3::services::auth_service::{AuthorizedStudentInput, SignupInput};
use hall3::services::hall_event_service::{CreateHallEventInput, HallEventQuery};
use hall3::services::inventory_service::{CreateItemInput, UpdateItemInput};
use hall3::services::notification_service::NotificationQuery;
use hall3::services::{HallEventError, InventoryError, LendingError, NotificationError};
use hall3::services::lending_service::{IssueInput, IssueQuery, ReturnInput, TransferInput};
use hall3::state::SharedState;
use std::sync::Arc;

fn admin() -> Actor {
    Actor::Admin {
        username: "admin".to_string(),
    }
}

async fn setup() -> Arc<SharedState> {
    let db_path =
        std::env::temp_dir().join(format!("hall3-lending-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    Arc::new(
        SharedState::new(config)
            .await
            .expect("failed to create shared state"),
    )
}

/// Authorizes and signs up the given students, returning their actors.
async fn students(state: &SharedState, people: &[(&str, &str)]) -> Vec<Actor> {
    let entries = people
        .iter()
        .map(|(roll_number, name)| AuthorizedStudentInput {
            roll_number: (*roll_number).to_string(),
            name: (*name).to_string(),
        })
        .collect();
    state
        .auth_service
        .replace_authorized(&admin(), entries)
        .await
        .unwrap();

    let mut actors = Vec::new();
    for (roll_number, name) in people {
        let result = state
            .auth_service
            .signup(SignupInput {
                roll_number: (*roll_number).to_string(),
                name: (*name).to_string(),
                phone_number: "9876543210".to_string(),
                room_number: "C-101".to_string(),
                password: "secret".to_string(),
                confirm_password: None,
            })
            .await
            .unwrap();
        actors.push(result.actor);
    }
    actors
}

async fn add_item(state: &SharedState, name: &str, quantity: i32) -> i32 {
    state
        .inventory_service
        .add(
            &admin(),
            CreateItemInput {
                name: name.to_string(),
                category: "Cricket".to_string(),
                quantity,
                condition: None,
                notes: None,
            },
        )
        .await
        .unwrap()
        .id
}

async fn available(state: &SharedState, item_id: i32) -> i32 {
    state
        .inventory_service
        .get(item_id)
        .await
        .unwrap()
        .available
}

fn issue_to_self(item_id: i32) -> IssueInput {
    IssueInput {
        item_id,
        student_id: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_transfer_then_return_scenario() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao"), ("21CS1002", "Vikram Iyer")]).await;
    let (a, b) = (&actors[0], &actors[1]);
    let lending = &state.lending_service;

    let bat = add_item(&state, "Cricket Bat", 2).await;

    let issue = lending.issue_item(a, issue_to_self(bat)).await.unwrap();
    assert_eq!(available(&state, bat).await, 1);

    let transfer = lending
        .request_transfer(
            a,
            TransferInput {
                item_id: bat,
                to_user_id: "21cs1002".to_string(),
                notes: Some("  after practice ".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(transfer.issue_id, issue.id);
    assert_eq!(transfer.notes.as_deref(), Some("after practice"));

    let outcome = lending.approve_transfer(b, transfer.id).await.unwrap();
    assert_eq!(outcome.transfer.status, "approved");
    let new_issue = outcome.new_issue.expect("recipient issue");
    assert_eq!(new_issue.student_id, "21CS1002");
    assert_eq!(new_issue.status, IssueStatus::Issued.as_str());
    assert_eq!(available(&state, bat).await, 1);

    let old = lending.get_issue(&admin(), issue.id).await.unwrap();
    assert_eq!(old.status, IssueStatus::Returned.as_str());
    assert!(old.return_date.is_some());

    let request = lending
        .request_return(
            b,
            ReturnInput {
                issue_id: new_issue.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    lending.approve_return(&admin(), request.id).await.unwrap();

    let closed = lending.get_issue(&admin(), new_issue.id).await.unwrap();
    assert_eq!(closed.status, IssueStatus::Returned.as_str());
    assert_eq!(available(&state, bat).await, 2);

    let active = lending
        .list_issues(
            &admin(),
            IssueQuery {
                status: Some(IssueStatus::Issued),
                mine: false,
            },
        )
        .await
        .unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn test_issue_rejected_when_nothing_available() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao"), ("21CS1002", "Vikram Iyer")]).await;
    let lending = &state.lending_service;

    let ball = add_item(&state, "Tennis Ball", 1).await;
    lending.issue_item(&actors[0], issue_to_self(ball)).await.unwrap();

    let err = lending
        .issue_item(&actors[1], issue_to_self(ball))
        .await
        .unwrap_err();
    assert!(matches!(err, LendingError::Unavailable(_)));
    assert_eq!(available(&state, ball).await, 0);

    let theirs = lending
        .list_issues(
            &actors[1],
            IssueQuery {
                status: None,
                mine: true,
            },
        )
        .await
        .unwrap();
    assert!(theirs.is_empty());
}

#[tokio::test]
async fn test_concurrent_issues_on_last_unit() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao"), ("21CS1002", "Vikram Iyer")]).await;

    let racket = add_item(&state, "Badminton Racket", 1).await;

    let handles: Vec<_> = actors
        .into_iter()
        .map(|actor| {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .lending_service
                    .issue_item(&actor, issue_to_self(racket))
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    let mut unavailable = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LendingError::Unavailable(_)) => unavailable += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(unavailable, 1);
    assert_eq!(available(&state, racket).await, 0);
}

#[tokio::test]
async fn test_return_approved_at_most_once() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao")]).await;
    let lending = &state.lending_service;

    let bat = add_item(&state, "Cricket Bat", 2).await;
    let issue = lending.issue_item(&actors[0], issue_to_self(bat)).await.unwrap();

    let request = lending
        .request_return(
            &actors[0],
            ReturnInput {
                issue_id: issue.id,
                notes: None,
            },
        )
        .await
        .unwrap();

    let duplicate = lending
        .request_return(
            &actors[0],
            ReturnInput {
                issue_id: issue.id,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(duplicate, LendingError::Conflict(_)));

    lending.approve_return(&admin(), request.id).await.unwrap();
    assert_eq!(available(&state, bat).await, 2);

    let stored = state
        .store
        .get_return_request(request.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "approved");
    assert!(stored.resolved_at.is_some());

    let again = lending
        .approve_return(&admin(), request.id)
        .await
        .unwrap_err();
    assert!(matches!(again, LendingError::AlreadyResolved));

    let reject = lending
        .reject_return(&admin(), request.id)
        .await
        .unwrap_err();
    assert!(matches!(reject, LendingError::AlreadyResolved));
    assert_eq!(available(&state, bat).await, 2);
}

#[tokio::test]
async fn test_transfer_after_return_is_rejected() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao"), ("21CS1002", "Vikram Iyer")]).await;
    let (a, b) = (&actors[0], &actors[1]);
    let lending = &state.lending_service;

    let bat = add_item(&state, "Cricket Bat", 2).await;
    let issue = lending.issue_item(a, issue_to_self(bat)).await.unwrap();

    let transfer = lending
        .request_transfer(
            a,
            TransferInput {
                item_id: bat,
                to_user_id: "21CS1002".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    let request = lending
        .request_return(
            a,
            ReturnInput {
                issue_id: issue.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    lending.approve_return(&admin(), request.id).await.unwrap();
    assert_eq!(available(&state, bat).await, 2);

    let err = lending.approve_transfer(b, transfer.id).await.unwrap_err();
    assert!(matches!(err, LendingError::Conflict(_)));

    assert_eq!(available(&state, bat).await, 2);
    let held_by_b = lending
        .list_issues(
            b,
            IssueQuery {
                status: None,
                mine: true,
            },
        )
        .await
        .unwrap();
    assert!(held_by_b.is_empty());

    let pending = state
        .store
        .get_transfer_request(transfer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.status, "pending");
}

#[tokio::test]
async fn test_transfer_guards() {
    let state = setup().await;
    let actors = students(
        &state,
        &[
            ("21CS1001", "Asha Rao"),
            ("21CS1002", "Vikram Iyer"),
            ("21CS1003", "Meera Nair"),
        ],
    )
    .await;
    let (a, b, c) = (&actors[0], &actors[1], &actors[2]);
    let lending = &state.lending_service;

    let bat = add_item(&state, "Cricket Bat", 2).await;

    let not_holding = lending
        .request_transfer(
            a,
            TransferInput {
                item_id: bat,
                to_user_id: "21CS1002".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(not_holding, LendingError::Validation(_)));

    lending.issue_item(a, issue_to_self(bat)).await.unwrap();

    let to_self = lending
        .request_transfer(
            a,
            TransferInput {
                item_id: bat,
                to_user_id: "21CS1001".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(to_self, LendingError::Validation(_)));

    let transfer = lending
        .request_transfer(
            a,
            TransferInput {
                item_id: bat,
                to_user_id: "21CS1002".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    let outsider = lending.approve_transfer(c, transfer.id).await.unwrap_err();
    assert!(matches!(outsider, LendingError::Forbidden(_)));

    let rejected = lending.reject_transfer(b, transfer.id).await.unwrap();
    assert_eq!(rejected.transfer.status, "rejected");
    assert!(rejected.new_issue.is_none());
    assert_eq!(available(&state, bat).await, 1);

    let inbox = state
        .notification_service
        .unread_count(a)
        .await
        .unwrap();
    assert_eq!(inbox.unread, 1);
}

#[tokio::test]
async fn test_quantity_update_shifts_available() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao"), ("21CS1002", "Vikram Iyer")]).await;
    let inventory = &state.inventory_service;

    let cones = add_item(&state, "Training Cone", 3).await;
    for actor in &actors {
        state
            .lending_service
            .issue_item(actor, issue_to_self(cones))
            .await
            .unwrap();
    }
    assert_eq!(available(&state, cones).await, 1);

    let raised = inventory
        .update(
            &admin(),
            cones,
            UpdateItemInput {
                quantity: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(raised.quantity, 5);
    assert_eq!(raised.available, 3);

    let err = inventory
        .update(
            &admin(),
            cones,
            UpdateItemInput {
                quantity: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Validation(_)));
    assert_eq!(available(&state, cones).await, 3);

    let lowered = inventory
        .update(
            &admin(),
            cones,
            UpdateItemInput {
                quantity: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(lowered.available, 0);
}

#[tokio::test]
async fn test_delete_blocked_while_issued() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao")]).await;
    let lending = &state.lending_service;

    let net = add_item(&state, "Volleyball Net", 1).await;
    let issue = lending.issue_item(&actors[0], issue_to_self(net)).await.unwrap();

    let err = state
        .inventory_service
        .delete(&admin(), net)
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Conflict(_)));

    // A rejected request stays behind as history.
    let rejected = lending
        .request_return(
            &actors[0],
            ReturnInput {
                issue_id: issue.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    lending.reject_return(&admin(), rejected.id).await.unwrap();

    let request = lending
        .request_return(
            &actors[0],
            ReturnInput {
                issue_id: issue.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    lending.approve_return(&admin(), request.id).await.unwrap();

    state.inventory_service.delete(&admin(), net).await.unwrap();

    let gone = state.inventory_service.get(net).await.unwrap_err();
    assert!(matches!(gone, InventoryError::NotFound));
}

#[tokio::test]
async fn test_notifications_scoped_to_inbox() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao")]).await;
    let notifications = &state.notification_service;

    let bat = add_item(&state, "Cricket Bat", 1).await;
    state
        .lending_service
        .issue_item(&actors[0], issue_to_self(bat))
        .await
        .unwrap();

    let inbox = notifications
        .list(&admin(), NotificationQuery::default())
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    let id = inbox[0].id;
    assert!(inbox[0].recipient.is_none());

    let theirs = notifications
        .list(&actors[0], NotificationQuery::default())
        .await
        .unwrap();
    assert!(theirs.is_empty());

    let err = notifications.mark_read(&actors[0], id).await.unwrap_err();
    assert!(matches!(err, NotificationError::NotFound));
    let err = notifications.remove(&actors[0], id).await.unwrap_err();
    assert!(matches!(err, NotificationError::NotFound));
    assert_eq!(notifications.mark_all_read(&actors[0]).await.unwrap(), 0);
    assert_eq!(notifications.unread_count(&admin()).await.unwrap().unread, 1);

    notifications.mark_read(&admin(), id).await.unwrap();
    assert_eq!(notifications.unread_count(&admin()).await.unwrap().unread, 0);
    notifications.remove(&admin(), id).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_return_approvals() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao")]).await;

    let ball = add_item(&state, "Football", 2).await;
    let issue = state
        .lending_service
        .issue_item(&actors[0], issue_to_self(ball))
        .await
        .unwrap();
    let request = state
        .lending_service
        .request_return(
            &actors[0],
            ReturnInput {
                issue_id: issue.id,
                notes: None,
            },
        )
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .lending_service
                    .approve_return(&admin(), request.id)
                    .await
            })
        })
        .collect();

    let mut approved = 0;
    let mut resolved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => approved += 1,
            Err(LendingError::AlreadyResolved) => resolved += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(approved, 1);
    assert_eq!(resolved, 7);
    assert_eq!(available(&state, ball).await, 2);
}

#[tokio::test]
async fn test_concurrent_return_requests() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao")]).await;

    let ball = add_item(&state, "Football", 1).await;
    let issue = state
        .lending_service
        .issue_item(&actors[0], issue_to_self(ball))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            let actor = actors[0].clone();
            tokio::spawn(async move {
                state
                    .lending_service
                    .request_return(
                        &actor,
                        ReturnInput {
                            issue_id: issue.id,
                            notes: None,
                        },
                    )
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(LendingError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_event_dates_stored_canonical() {
    let state = setup().await;
    let actors = students(&state, &[("21CS1001", "Asha Rao")]).await;
    let events = &state.hall_event_service;

    let event = |title: &str, event_date: &str| CreateHallEventInput {
        title: title.to_string(),
        description: None,
        event_date: event_date.to_string(),
        event_time: None,
        location: None,
        link: None,
        max_participants: None,
    };

    let past = events
        .create(&admin(), event("Inter-hall Cricket", "2020-1-5"))
        .await
        .unwrap();
    assert_eq!(past.event_date, "2020-01-05");

    let later = events
        .create(&admin(), event("Annual Sports Day", "2099-10-2"))
        .await
        .unwrap();
    let sooner = events
        .create(&admin(), event("Chess Night", " 2099-9-30 "))
        .await
        .unwrap();
    assert_eq!(later.event_date, "2099-10-02");
    assert_eq!(sooner.event_date, "2099-09-30");

    let upcoming = events
        .list(&actors[0], HallEventQuery { upcoming: true })
        .await
        .unwrap();
    let titles: Vec<_> = upcoming.iter().map(|view| view.event.title.as_str()).collect();
    assert_eq!(titles, ["Chess Night", "Annual Sports Day"]);

    let err = events
        .create(&admin(), event("Nonsense", "2099-13-01"))
        .await
        .unwrap_err();
    assert!(matches!(err, HallEventError::Validation(_)));
}
