pub use super::admins::Entity as Admins;
pub use super::authorized_students::Entity as AuthorizedStudents;
pub use super::event_registrations::Entity as EventRegistrations;
pub use super::hall_events::Entity as HallEvents;
pub use super::inventory::Entity as Inventory;
pub use super::issues::Entity as Issues;
pub use super::notifications::Entity as Notifications;
pub use super::return_requests::Entity as ReturnRequests;
pub use super::transfer_requests::Entity as TransferRequests;
pub use super::users::Entity as Users;
