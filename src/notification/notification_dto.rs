use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use super::notification_models::Notification;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 255))]
    pub notification_type: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateNotificationRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 255))]
    pub notification_type: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub notification_type: String,
    #[schema(value_type = Object)]
    pub data: Value,
    pub user_id: i64,
    pub created_at: i64,
    pub is_read: bool,
    /// Display text from the message catalog.
    #[schema(value_type = Object)]
    pub text: Value,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        let text = notification.compiled_text();
        Self {
            id: notification.id,
            notification_type: notification.notification_type,
            data: notification.data,
            user_id: notification.user_id,
            created_at: notification.created_at,
            is_read: notification.is_read,
            text,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread: i64,
}
