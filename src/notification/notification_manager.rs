use crate::error::Result;
use crate::widget::NotificationProvider;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::notification_models::Notification;
use super::notification_repository::NotificationTarget;

/// Entry point for notification operations over a storage target.
#[derive(Clone)]
pub struct NotificationManager {
    target: Arc<dyn NotificationTarget>,
}

impl NotificationManager {
    pub fn new(target: Arc<dyn NotificationTarget>) -> Self {
        Self { target }
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn create(
        &self,
        notification_type: &str,
        data: Value,
        user_id: i64,
    ) -> Result<Notification> {
        let notification = self.target.create(notification_type, data, user_id).await?;

        tracing::info!(notification_id = ?notification.id, "notification created");
        Ok(notification)
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn update(
        &self,
        id: i64,
        notification_type: &str,
        data: Value,
        user_id: i64,
    ) -> Result<Notification> {
        let notification = self.target.update(id, notification_type, data, user_id).await?;

        tracing::debug!("notification updated");
        Ok(notification)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_notification(&self, id: i64, user_id: i64) -> Result<Notification> {
        self.target.find_notification(id, user_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_as_read(&self, id: i64, user_id: i64) -> Result<()> {
        let affected = self.target.mark_as_read(id, user_id).await?;

        tracing::debug!(affected, "notification marked as read");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_as_deleted(&self, id: i64, user_id: i64) -> Result<()> {
        let affected = self.target.mark_as_deleted(id, user_id).await?;

        tracing::debug!(affected, "notification marked as deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn clear_all(&self, user_id: i64) -> Result<()> {
        let affected = self.target.clear_all(user_id).await?;

        tracing::info!(affected, "notifications cleared");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: i64) -> Result<()> {
        let affected = self.target.mark_all_read(user_id).await?;

        tracing::debug!(affected, "all notifications marked as read");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn count_unread(&self, user_id: i64) -> Result<i64> {
        self.target.count_unread(user_id).await
    }
}

#[async_trait]
impl NotificationProvider for NotificationManager {
    async fn get_notifications(&self, user_id: i64) -> Result<Vec<Notification>> {
        let notifications = self.target.find_notifications(user_id).await?;

        tracing::debug!(user_id, count = notifications.len(), "retrieved notifications");
        Ok(notifications)
    }
}
