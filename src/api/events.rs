use axum::{
    Extension, Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{self, Stream};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tracing::warn;

use crate::api::AppState;
use crate::domain::Actor;
use crate::domain::events::LendingEvent;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(sse_handler))
}

/// Events naming students reach those students and admins; notification
/// events only reach the inbox they were written to.
fn visible_to(event: &LendingEvent, viewer: &Actor) -> bool {
    let Some(roll) = viewer.roll_number() else {
        return !matches!(
            event,
            LendingEvent::NotificationCreated {
                recipient: Some(_)
            }
        );
    };

    match event {
        LendingEvent::NotificationCreated { recipient } => recipient.as_deref() == Some(roll),
        LendingEvent::ItemIssued { student_id, .. }
        | LendingEvent::ReturnRequested { student_id, .. } => student_id == roll,
        LendingEvent::TransferRequested {
            from_user_id,
            to_user_id,
            ..
        } => from_user_id == roll || to_user_id == roll,
        LendingEvent::UserRegistered { roll_number } => roll_number == roll,
        LendingEvent::AuthorizedStudentsReplaced { .. } => false,
        _ => true,
    }
}

async fn sse_handler(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_bus().subscribe();

    let stream = stream::unfold((rx, actor), |(mut rx, actor)| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if !visible_to(&event, &actor) {
                        continue;
                    }
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    return Some((Ok(Event::default().data(json)), (rx, actor)));
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Client lagged by {} messages", count);

                    return Some((
                        Ok(Event::default().event("warning").data("Missed some events")),
                        (rx, actor),
                    ));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(roll_number: &str) -> Actor {
        Actor::Student {
            roll_number: roll_number.to_string(),
            name: "Student".to_string(),
        }
    }

    #[test]
    fn test_notification_events_follow_recipient() {
        let admin = Actor::Admin {
            username: "admin".to_string(),
        };
        let asha = student("21CS1001");

        let admin_note = LendingEvent::NotificationCreated { recipient: None };
        let student_note = LendingEvent::NotificationCreated {
            recipient: Some("21CS1001".to_string()),
        };

        assert!(visible_to(&admin_note, &admin));
        assert!(!visible_to(&admin_note, &asha));
        assert!(visible_to(&student_note, &asha));
        assert!(!visible_to(&student_note, &admin));
        assert!(visible_to(&LendingEvent::InventoryChanged { item_id: 1 }, &asha));
    }

    #[test]
    fn test_student_events_reach_participants_and_admins() {
        let admin = Actor::Admin {
            username: "admin".to_string(),
        };
        let transfer = LendingEvent::TransferRequested {
            transfer_id: 1,
            item_id: 2,
            from_user_id: "21CS1001".to_string(),
            to_user_id: "21CS1002".to_string(),
        };
        let issued = LendingEvent::ItemIssued {
            issue_id: 3,
            item_id: 2,
            item_name: "Cricket Bat".to_string(),
            student_id: "21CS1001".to_string(),
        };

        assert!(visible_to(&transfer, &admin));
        assert!(visible_to(&transfer, &student("21CS1001")));
        assert!(visible_to(&transfer, &student("21CS1002")));
        assert!(!visible_to(&transfer, &student("21CS1003")));

        assert!(visible_to(&issued, &admin));
        assert!(visible_to(&issued, &student("21CS1001")));
        assert!(!visible_to(&issued, &student("21CS1002")));

        let replaced = LendingEvent::AuthorizedStudentsReplaced { count: 4 };
        assert!(visible_to(&replaced, &admin));
        assert!(!visible_to(&replaced, &student("21CS1001")));
    }
}
