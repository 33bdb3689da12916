//! `SeaORM` implementation of the `NotificationService` trait.

use async_trait::async_trait;

use crate::constants::limits::DEFAULT_NOTIFICATION_LIMIT;
use crate::db::Store;
use crate::domain::Actor;
use crate::entities::notifications;
use crate::services::notification_service::{
    NotificationError, NotificationQuery, NotificationService, UnreadCount,
};

pub struct SeaOrmNotificationService {
    store: Store,
}

impl SeaOrmNotificationService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NotificationService for SeaOrmNotificationService {
    async fn list(
        &self,
        viewer: &Actor,
        query: NotificationQuery,
    ) -> Result<Vec<notifications::Model>, NotificationError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
            .clamp(1, DEFAULT_NOTIFICATION_LIMIT * 10);

        Ok(self
            .store
            .list_notifications(viewer.roll_number(), query.unread, limit)
            .await?)
    }

    async fn unread_count(&self, viewer: &Actor) -> Result<UnreadCount, NotificationError> {
        let unread = self
            .store
            .unread_notification_count(viewer.roll_number())
            .await?;
        Ok(UnreadCount { unread })
    }

    async fn mark_read(&self, viewer: &Actor, id: i32) -> Result<(), NotificationError> {
        if self
            .store
            .mark_notification_read(id, viewer.roll_number())
            .await?
        {
            Ok(())
        } else {
            Err(NotificationError::NotFound)
        }
    }

    async fn mark_all_read(&self, viewer: &Actor) -> Result<u64, NotificationError> {
        Ok(self
            .store
            .mark_all_notifications_read(viewer.roll_number())
            .await?)
    }

    async fn remove(&self, viewer: &Actor, id: i32) -> Result<(), NotificationError> {
        if self
            .store
            .remove_notification(id, viewer.roll_number())
            .await?
        {
            Ok(())
        } else {
            Err(NotificationError::NotFound)
        }
    }
}
