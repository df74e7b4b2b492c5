pub mod notification_list;

pub use notification_list::{ContainerTemplate, NotificationList, RenderSettings};

use crate::error::Result;
use crate::notification::notification_models::Notification;
use async_trait::async_trait;

/// Source of the notifications a list renders.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    async fn get_notifications(&self, user_id: i64) -> Result<Vec<Notification>>;
}
