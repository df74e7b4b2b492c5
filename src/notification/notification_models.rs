use super::notification_catalog::MessageCatalog;
use serde_json::{json, Value};
use sqlx::FromRow;
use std::sync::Arc;

/// One user-facing notification.
///
/// `id` is `None` until the record is first persisted. The catalog it was
/// built with supplies its display text.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Option<i64>,
    pub notification_type: String,
    pub data: Value,
    pub user_id: i64,
    pub created_at: i64,
    pub is_read: bool,
    pub is_deleted: bool,
    catalog: Arc<MessageCatalog>,
}

impl Notification {
    pub fn new(
        notification_type: impl Into<String>,
        data: Value,
        user_id: i64,
        created_at: i64,
        catalog: Arc<MessageCatalog>,
    ) -> Self {
        Self {
            id: None,
            notification_type: notification_type.into(),
            data,
            user_id,
            created_at,
            is_read: false,
            is_deleted: false,
            catalog,
        }
    }

    /// Display text from the catalog: a string, or an object for keyed
    /// catalog entries.
    pub fn compiled_text(&self) -> Value {
        self.catalog.compile(&self.notification_type, &self.data)
    }

    /// Field-addressable view used by template lookups.
    pub fn fields(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.notification_type,
            "data": self.data,
            "userId": self.user_id,
            "createdAt": self.created_at,
            "timestamp": self.created_at,
            "isRead": self.is_read,
            "isDeleted": self.is_deleted,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: i64,
    #[sqlx(rename = "type")]
    pub notification_type: String,
    pub data: String,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub is_read: bool,
    pub is_deleted: bool,
}

impl NotificationRow {
    /// Decodes the stored payload and attaches `catalog`.
    pub fn hydrate(self, catalog: Arc<MessageCatalog>) -> Result<Notification, serde_json::Error> {
        let data = serde_json::from_str(&self.data)?;

        Ok(Notification {
            id: Some(self.id),
            notification_type: self.notification_type,
            data,
            user_id: self.user_id,
            created_at: self.created_at,
            is_read: self.is_read,
            is_deleted: self.is_deleted,
            catalog,
        })
    }
}
