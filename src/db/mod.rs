use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{
    authorized_students, hall_events, inventory, issues, notifications,
    return_requests, transfer_requests, users,
};

pub mod migrator;
pub mod repositories;

pub use repositories::admin::Admin;
pub use repositories::authorized::AuthorizedEntry;
pub use repositories::hall_event::{NewHallEvent, Registration};
pub use repositories::inventory::{
    InventorySummary, ItemChanges, ItemRemoval, ItemUpdate, NewItem,
};
pub use repositories::issue::IssueFilter;
pub use repositories::lending::{
    IssueRequest, TransferApproval, TransferRequest, WorkflowError, WorkflowResult,
};
pub use repositories::user::NewUser;

use crate::domain::RequestStatus;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn inventory_repo(&self) -> repositories::inventory::InventoryRepository {
        repositories::inventory::InventoryRepository::new(self.conn.clone())
    }

    fn issue_repo(&self) -> repositories::issue::IssueRepository {
        repositories::issue::IssueRepository::new(self.conn.clone())
    }

    fn request_repo(&self) -> repositories::requests::RequestRepository {
        repositories::requests::RequestRepository::new(self.conn.clone())
    }

    fn lending_repo(&self) -> repositories::lending::LendingRepository {
        repositories::lending::LendingRepository::new(self.conn.clone())
    }

    fn notification_repo(&self) -> repositories::notification::NotificationRepository {
        repositories::notification::NotificationRepository::new(self.conn.clone())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn authorized_repo(&self) -> repositories::authorized::AuthorizedRepository {
        repositories::authorized::AuthorizedRepository::new(self.conn.clone())
    }

    fn hall_event_repo(&self) -> repositories::hall_event::HallEventRepository {
        repositories::hall_event::HallEventRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    pub async fn list_inventory(&self) -> Result<Vec<inventory::Model>> {
        self.inventory_repo().list().await
    }

    pub async fn get_item(&self, id: i32) -> Result<Option<inventory::Model>> {
        self.inventory_repo().get(id).await
    }

    pub async fn add_item(&self, item: NewItem) -> Result<inventory::Model> {
        self.inventory_repo().add(item).await
    }

    pub async fn update_item(&self, id: i32, changes: ItemChanges) -> Result<ItemUpdate> {
        self.inventory_repo().update(id, changes).await
    }

    pub async fn delete_item(&self, id: i32) -> Result<ItemRemoval> {
        self.inventory_repo().delete(id).await
    }

    pub async fn inventory_summary(&self) -> Result<InventorySummary> {
        self.inventory_repo().summary().await
    }

    // ========================================================================
    // Issues and requests
    // ========================================================================

    pub async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<issues::Model>> {
        self.issue_repo().list(filter).await
    }

    pub async fn get_issue(&self, id: i32) -> Result<Option<issues::Model>> {
        self.issue_repo().get(id).await
    }

    pub async fn active_issue_for(
        &self,
        student_id: &str,
        item_id: i32,
    ) -> Result<Option<issues::Model>> {
        self.issue_repo().active_for(student_id, item_id).await
    }

    pub async fn count_active_issues(&self) -> Result<u64> {
        self.issue_repo().count_active().await
    }

    pub async fn list_return_requests(
        &self,
        status: Option<RequestStatus>,
        student_id: Option<&str>,
    ) -> Result<Vec<return_requests::Model>> {
        self.request_repo().list_returns(status, student_id).await
    }

    pub async fn get_return_request(&self, id: i32) -> Result<Option<return_requests::Model>> {
        self.request_repo().get_return(id).await
    }

    pub async fn pending_return_for_issue(
        &self,
        issue_id: i32,
    ) -> Result<Option<return_requests::Model>> {
        self.request_repo().pending_return_for_issue(issue_id).await
    }

    pub async fn count_pending_returns(&self) -> Result<u64> {
        self.request_repo().count_pending_returns().await
    }

    pub async fn list_transfer_requests(
        &self,
        status: Option<RequestStatus>,
        participant: Option<&str>,
    ) -> Result<Vec<transfer_requests::Model>> {
        self.request_repo()
            .list_transfers(status, participant)
            .await
    }

    pub async fn get_transfer_request(
        &self,
        id: i32,
    ) -> Result<Option<transfer_requests::Model>> {
        self.request_repo().get_transfer(id).await
    }

    pub async fn pending_transfer_for_issue(
        &self,
        issue_id: i32,
    ) -> Result<Option<transfer_requests::Model>> {
        self.request_repo().pending_transfer_for_issue(issue_id).await
    }

    pub async fn count_pending_transfers(&self) -> Result<u64> {
        self.request_repo().count_pending_transfers().await
    }

    // ========================================================================
    // Lending workflows
    // ========================================================================

    pub async fn issue_item(&self, request: IssueRequest) -> WorkflowResult<issues::Model> {
        self.lending_repo().issue_item(request).await
    }

    pub async fn request_return(
        &self,
        issue: &issues::Model,
        notes: Option<String>,
    ) -> WorkflowResult<return_requests::Model> {
        self.lending_repo().request_return(issue, notes).await
    }

    pub async fn approve_return(&self, id: i32) -> WorkflowResult<return_requests::Model> {
        self.lending_repo().approve_return(id).await
    }

    pub async fn reject_return(&self, id: i32) -> WorkflowResult<return_requests::Model> {
        self.lending_repo().reject_return(id).await
    }

    pub async fn request_transfer(
        &self,
        request: TransferRequest,
    ) -> WorkflowResult<transfer_requests::Model> {
        self.lending_repo().request_transfer(request).await
    }

    pub async fn approve_transfer(&self, id: i32) -> WorkflowResult<TransferApproval> {
        self.lending_repo().approve_transfer(id).await
    }

    pub async fn reject_transfer(&self, id: i32) -> WorkflowResult<transfer_requests::Model> {
        self.lending_repo().reject_transfer(id).await
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    pub async fn list_notifications(
        &self,
        recipient: Option<&str>,
        unread_only: bool,
        limit: u64,
    ) -> Result<Vec<notifications::Model>> {
        self.notification_repo()
            .list(recipient, unread_only, limit)
            .await
    }

    pub async fn unread_notification_count(&self, recipient: Option<&str>) -> Result<u64> {
        self.notification_repo().unread_count(recipient).await
    }

    pub async fn mark_notification_read(&self, id: i32, recipient: Option<&str>) -> Result<bool> {
        self.notification_repo().mark_read(id, recipient).await
    }

    pub async fn mark_all_notifications_read(&self, recipient: Option<&str>) -> Result<u64> {
        self.notification_repo().mark_all_read(recipient).await
    }

    pub async fn remove_notification(&self, id: i32, recipient: Option<&str>) -> Result<bool> {
        self.notification_repo().remove(id, recipient).await
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn get_admin(&self, username: &str) -> Result<Option<Admin>> {
        self.admin_repo().get_by_username(username).await
    }

    pub async fn verify_admin_password(&self, username: &str, password: &str) -> Result<bool> {
        self.admin_repo().verify_password(username, password).await
    }

    pub async fn update_admin_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.admin_repo()
            .update_password(username, new_password, config)
            .await
    }

    pub async fn verify_admin_api_key(&self, api_key: &str) -> Result<Option<Admin>> {
        self.admin_repo().verify_api_key(api_key).await
    }

    pub async fn regenerate_admin_api_key(&self, username: &str) -> Result<String> {
        self.admin_repo().regenerate_api_key(username).await
    }

    pub async fn create_user(&self, user: NewUser, config: &SecurityConfig) -> Result<users::Model> {
        self.user_repo().create(user, config).await
    }

    pub async fn get_user(&self, roll_number: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_roll_number(roll_number).await
    }

    pub async fn list_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list().await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn verify_user_password(&self, roll_number: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(roll_number, password).await
    }

    pub async fn update_user_password(
        &self,
        roll_number: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(roll_number, new_password, config)
            .await
    }

    pub async fn verify_user_api_key(&self, api_key: &str) -> Result<Option<users::Model>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn regenerate_user_api_key(&self, roll_number: &str) -> Result<String> {
        self.user_repo().regenerate_api_key(roll_number).await
    }

    pub async fn list_authorized_students(&self) -> Result<Vec<authorized_students::Model>> {
        self.authorized_repo().list().await
    }

    pub async fn count_authorized_students(&self) -> Result<u64> {
        self.authorized_repo().count().await
    }

    pub async fn find_authorized_student(
        &self,
        roll_number: &str,
    ) -> Result<Option<authorized_students::Model>> {
        self.authorized_repo().find(roll_number).await
    }

    pub async fn replace_authorized_students(&self, entries: Vec<AuthorizedEntry>) -> Result<usize> {
        self.authorized_repo().replace_all(entries).await
    }

    // ========================================================================
    // Hall events
    // ========================================================================

    pub async fn list_hall_events(&self, from_date: Option<&str>) -> Result<Vec<hall_events::Model>> {
        self.hall_event_repo().list(from_date).await
    }

    pub async fn create_hall_event(&self, event: NewHallEvent) -> Result<hall_events::Model> {
        self.hall_event_repo().create(event).await
    }

    pub async fn delete_hall_event(&self, id: i32) -> Result<bool> {
        self.hall_event_repo().delete(id).await
    }

    pub async fn hall_event_registration_counts(
        &self,
    ) -> Result<std::collections::HashMap<i32, i64>> {
        self.hall_event_repo().registration_counts().await
    }

    pub async fn hall_events_registered_by(&self, user_id: &str) -> Result<Vec<i32>> {
        self.hall_event_repo().registrations_of(user_id).await
    }

    pub async fn register_for_hall_event(
        &self,
        event_id: i32,
        user_id: &str,
        user_name: &str,
    ) -> Result<Registration> {
        self.hall_event_repo()
            .register(event_id, user_id, user_name)
            .await
    }
}
