//! Change events broadcast on the in-process event bus.
//!
//! Every event is sent after its transaction commits, so subscribers never
//! observe a change that was rolled back.

use serde::Serialize;

/// Events sent to connected clients via SSE (Server-Sent Events).
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum LendingEvent {
    InventoryChanged {
        item_id: i32,
    },
    InventoryRemoved {
        item_id: i32,
    },

    ItemIssued {
        issue_id: i32,
        item_id: i32,
        item_name: String,
        student_id: String,
    },

    ReturnRequested {
        request_id: i32,
        issue_id: i32,
        student_id: String,
    },
    ReturnResolved {
        request_id: i32,
        issue_id: i32,
        status: String,
    },

    TransferRequested {
        transfer_id: i32,
        item_id: i32,
        from_user_id: String,
        to_user_id: String,
    },
    TransferResolved {
        transfer_id: i32,
        status: String,
        new_issue_id: Option<i32>,
    },

    NotificationCreated {
        recipient: Option<String>,
    },

    AuthorizedStudentsReplaced {
        count: usize,
    },
    UserRegistered {
        roll_number: String,
    },

    HallEventChanged {
        event_id: i32,
    },
}
