use sea_orm::{DbErr, SqlErr};

pub mod admin;
pub mod authorized;
pub mod hall_event;
pub mod inventory;
pub mod issue;
pub mod lending;
pub mod notification;
pub mod password;
pub mod requests;
pub mod user;

/// True when `err` was raised by a unique index, including the partial
/// indexes that allow one pending request per issue.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
