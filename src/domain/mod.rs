//! Domain primitives for the lending workflow.
//!
//! Status columns are stored as plain strings; the enums here are the only
//! place their spellings are defined.

pub mod events;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of an issue record. `Issued` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Issued,
    Returned,
}

impl IssueStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Returned => "returned",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issued" => Ok(Self::Issued),
            "returned" => Ok(Self::Returned),
            other => Err(format!("Unknown issue status: {other}")),
        }
    }
}

/// Shared by return and transfer requests: `Pending -> {Approved, Rejected}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("Unknown request status: {other}")),
        }
    }
}

/// Notification type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Issue,
    ReturnRequest,
    TransferRequest,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::ReturnRequest => "return_request",
            Self::TransferRequest => "transfer_request",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller of an operation.
///
/// Stored in the session as JSON, so field names are part of the session format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    Admin { username: String },
    Student { roll_number: String, name: String },
}

impl Actor {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    /// Roll number for students, `None` for admins.
    #[must_use]
    pub fn roll_number(&self) -> Option<&str> {
        match self {
            Self::Admin { .. } => None,
            Self::Student { roll_number, .. } => Some(roll_number),
        }
    }

    /// Notification inbox key: the roll number, or `None` for the admin inbox.
    #[must_use]
    pub fn inbox(&self) -> Option<String> {
        self.roll_number().map(str::to_string)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin { username } => write!(f, "admin:{username}"),
            Self::Student { roll_number, .. } => write!(f, "student:{roll_number}"),
        }
    }
}

/// Roll numbers compare case-insensitively; they are stored upper-cased.
#[must_use]
pub fn normalize_roll_number(roll_number: &str) -> String {
    roll_number.trim().to_uppercase()
}

/// Names on the allow-list compare case-insensitively and ignore outer whitespace.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Trims optional free text; blank becomes `None`.
#[must_use]
pub fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Current date as `YYYY-MM-DD`.
#[must_use]
pub fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

/// Current timestamp as RFC 3339.
#[must_use]
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [IssueStatus::Issued, IssueStatus::Returned] {
            assert_eq!(status.as_str().parse::<IssueStatus>().unwrap(), status);
        }
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>().unwrap(), status);
        }
        assert!("lost".parse::<IssueStatus>().is_err());
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn roll_numbers_are_normalized() {
        assert_eq!(normalize_roll_number("  21cs10001 "), "21CS10001");
        assert!(names_match("Asha Rao", " asha rao"));
        assert!(!names_match("Asha Rao", "Asha R"));
    }

    #[test]
    fn actor_session_format() {
        let actor = Actor::Student {
            roll_number: "21CS10001".to_string(),
            name: "Asha".to_string(),
        };
        let json = serde_json::to_value(&actor).unwrap();
        assert_eq!(json["role"], "student");
        assert_eq!(json["roll_number"], "21CS10001");
        assert_eq!(actor.inbox().as_deref(), Some("21CS10001"));

        let admin = Actor::Admin {
            username: "admin".to_string(),
        };
        assert!(admin.is_admin());
        assert_eq!(admin.inbox(), None);
        assert_eq!(admin.to_string(), "admin:admin");
    }

    #[test]
    fn blank_text_is_dropped() {
        assert_eq!(clean_text(Some("  ".to_string())), None);
        assert_eq!(clean_text(Some(" bat ".to_string())).as_deref(), Some("bat"));
        assert_eq!(clean_text(None), None);
    }

    #[test]
    fn today_is_a_plain_date() {
        let date = today();
        assert_eq!(date.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok());
    }
}
