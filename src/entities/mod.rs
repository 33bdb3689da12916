pub mod prelude;

pub mod admins;
pub mod authorized_students;
pub mod event_registrations;
pub mod hall_events;
pub mod inventory;
pub mod issues;
pub mod notifications;
pub mod return_requests;
pub mod transfer_requests;
pub mod users;
