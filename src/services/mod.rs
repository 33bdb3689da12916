pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, Profile};
pub use auth_service_impl::SeaOrmAuthService;

pub mod inventory_service;
pub mod inventory_service_impl;
pub use inventory_service::{InventoryError, InventoryService};
pub use inventory_service_impl::SeaOrmInventoryService;

pub mod lending_service;
pub mod lending_service_impl;
pub use lending_service::{LendingError, LendingService, TransferOutcome};
pub use lending_service_impl::SeaOrmLendingService;

pub mod notification_service;
pub mod notification_service_impl;
pub use notification_service::{NotificationError, NotificationService};
pub use notification_service_impl::SeaOrmNotificationService;

pub mod hall_event_service;
pub mod hall_event_service_impl;
pub use hall_event_service::{HallEventError, HallEventService};
pub use hall_event_service_impl::SeaOrmHallEventService;
