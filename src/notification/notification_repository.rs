use crate::db::DbPool;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use super::notification_catalog::MessageCatalog;
use super::notification_models::{Notification, NotificationRow};

pub const DEFAULT_TABLE: &str = "notifications";

static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Storage backend for notifications.
///
/// Deletion is always logical: deleted rows keep existing but are never
/// returned by the lookups. Flag mutations report how many rows changed and
/// treat "nothing matched" as success.
#[async_trait]
pub trait NotificationTarget: Send + Sync {
    async fn create(
        &self,
        notification_type: &str,
        data: Value,
        user_id: i64,
    ) -> Result<Notification>;

    /// Replaces type and data of a live notification owned by `user_id`.
    async fn update(
        &self,
        id: i64,
        notification_type: &str,
        data: Value,
        user_id: i64,
    ) -> Result<Notification>;

    async fn mark_as_read(&self, id: i64, user_id: i64) -> Result<u64>;

    async fn mark_as_deleted(&self, id: i64, user_id: i64) -> Result<u64>;

    async fn clear_all(&self, user_id: i64) -> Result<u64>;

    async fn mark_all_read(&self, user_id: i64) -> Result<u64>;

    /// Live notifications of `user_id`, newest first.
    async fn find_notifications(&self, user_id: i64) -> Result<Vec<Notification>>;

    async fn find_notification(&self, id: i64, user_id: i64) -> Result<Notification>;

    async fn count_unread(&self, user_id: i64) -> Result<i64>;
}

#[derive(Clone)]
pub struct DatabaseTarget {
    pool: DbPool,
    catalog: Arc<MessageCatalog>,
    table: String,
}

impl DatabaseTarget {
    pub fn new(pool: DbPool, catalog: Arc<MessageCatalog>) -> Self {
        Self {
            pool,
            catalog,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    /// Stores notifications in `table` instead of the default one. The table
    /// must share the schema of `migrations/`.
    pub fn with_table(mut self, table: &str) -> Result<Self> {
        if !TABLE_NAME_RE.is_match(table) {
            return Err(AppError::Validation(format!(
                "invalid notification table name: {table:?}"
            )));
        }

        self.table = table.to_string();
        Ok(self)
    }

    async fn find_notification_instance(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Notification>> {
        let sql = format!(
            "SELECT * FROM {}
             WHERE id = ? AND user_id = ? AND is_deleted = FALSE",
            self.table
        );
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| self.hydrate(row)).transpose()
    }

    fn hydrate(&self, row: NotificationRow) -> Result<Notification> {
        Ok(row.hydrate(self.catalog.clone())?)
    }

    /// Sets `column` and `updated_at` on the rows matching `filter`.
    async fn set_flag(&self, column: &str, filter: &str, binds: &[i64]) -> Result<u64> {
        let sql = format!(
            "UPDATE {} SET {} = TRUE, updated_at = ? WHERE {}",
            self.table, column, filter
        );
        let mut query = sqlx::query(&sql).bind(Utc::now().timestamp());
        for value in binds {
            query = query.bind(*value);
        }

        Ok(query.execute(&self.pool).await?.rows_affected())
    }

    /// Inserts unsaved notifications and assigns the generated id; rewrites
    /// saved ones in place.
    async fn save_notification(&self, notification: &mut Notification) -> Result<()> {
        let data = serde_json::to_string(&notification.data)?;

        match notification.id {
            Some(id) => {
                let sql = format!(
                    "UPDATE {}
                     SET type = ?, data = ?, user_id = ?, created_at = ?, is_read = ?,
                         updated_at = ?
                     WHERE id = ?",
                    self.table
                );
                sqlx::query(&sql)
                    .bind(&notification.notification_type)
                    .bind(&data)
                    .bind(notification.user_id)
                    .bind(notification.created_at)
                    .bind(notification.is_read)
                    .bind(Utc::now().timestamp())
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
            }
            None => {
                let sql = format!(
                    "INSERT INTO {} (type, data, user_id, created_at, is_read, is_deleted)
                     VALUES (?, ?, ?, ?, ?, ?)
                     RETURNING id",
                    self.table
                );
                let id: i64 = sqlx::query_scalar(&sql)
                    .bind(&notification.notification_type)
                    .bind(&data)
                    .bind(notification.user_id)
                    .bind(notification.created_at)
                    .bind(notification.is_read)
                    .bind(notification.is_deleted)
                    .fetch_one(&self.pool)
                    .await?;

                notification.id = Some(id);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationTarget for DatabaseTarget {
    async fn create(
        &self,
        notification_type: &str,
        data: Value,
        user_id: i64,
    ) -> Result<Notification> {
        let mut notification = Notification::new(
            notification_type,
            data,
            user_id,
            Utc::now().timestamp(),
            self.catalog.clone(),
        );

        self.save_notification(&mut notification).await?;
        Ok(notification)
    }

    async fn update(
        &self,
        id: i64,
        notification_type: &str,
        data: Value,
        user_id: i64,
    ) -> Result<Notification> {
        let mut notification = self.find_notification(id, user_id).await?;
        notification.notification_type = notification_type.to_string();
        notification.data = data;

        self.save_notification(&mut notification).await?;
        Ok(notification)
    }

    async fn mark_as_read(&self, id: i64, user_id: i64) -> Result<u64> {
        self.set_flag("is_read", "id = ? AND user_id = ?", &[id, user_id]).await
    }

    async fn mark_as_deleted(&self, id: i64, user_id: i64) -> Result<u64> {
        self.set_flag("is_deleted", "id = ? AND user_id = ?", &[id, user_id]).await
    }

    async fn clear_all(&self, user_id: i64) -> Result<u64> {
        self.set_flag("is_deleted", "user_id = ? AND is_deleted = FALSE", &[user_id]).await
    }

    async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
        self.set_flag("is_read", "user_id = ? AND is_read = FALSE", &[user_id]).await
    }

    async fn find_notifications(&self, user_id: i64) -> Result<Vec<Notification>> {
        let sql = format!(
            "SELECT * FROM {}
             WHERE user_id = ? AND is_deleted = FALSE
             ORDER BY created_at DESC, id DESC",
            self.table
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    async fn find_notification(&self, id: i64, user_id: i64) -> Result<Notification> {
        self.find_notification_instance(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
    }

    async fn count_unread(&self, user_id: i64) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}
             WHERE user_id = ? AND is_read = FALSE AND is_deleted = FALSE",
            self.table
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use serde_json::json;

    async fn target() -> DatabaseTarget {
        DatabaseTarget::new(test_pool().await, Arc::default())
    }

    fn ids(notifications: &[Notification]) -> Vec<i64> {
        notifications.iter().filter_map(|n| n.id).collect()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_round_trips_payload() {
        let target = target().await;
        let payload = json!({ "task": { "id": 5, "title": "Ship" }, "tags": ["a", "b"] });

        let created = target.create("reminder", payload.clone(), 1).await.unwrap();
        let id = created.id.expect("id assigned on insert");
        assert!(!created.is_read);

        let found = target.find_notification(id, 1).await.unwrap();
        assert_eq!(found.data, payload);
        assert_eq!(found.notification_type, "reminder");
        assert_eq!(found.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_created_at() {
        let target = target().await;
        let created = target.create("info", json!({ "v": 1 }), 1).await.unwrap();
        let id = created.id.unwrap();

        let updated = target.update(id, "warning", json!({ "v": 2 }), 1).await.unwrap();
        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.created_at, created.created_at);

        let found = target.find_notification(id, 1).await.unwrap();
        assert_eq!(found.notification_type, "warning");
        assert_eq!(found.data, json!({ "v": 2 }));
    }

    #[tokio::test]
    async fn test_update_missing_notification_is_not_found() {
        let target = target().await;
        let err = target.update(404, "info", json!(null), 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_of_deleted_notification_is_not_found() {
        let target = target().await;
        let id = target.create("info", json!({}), 1).await.unwrap().id.unwrap();
        target.mark_as_deleted(id, 1).await.unwrap();

        let err = target.update(id, "info", json!({}), 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mark_as_read_is_idempotent() {
        let target = target().await;
        let id = target.create("info", json!({}), 1).await.unwrap().id.unwrap();

        target.mark_as_read(id, 1).await.unwrap();
        target.mark_as_read(id, 1).await.unwrap();

        assert!(target.find_notification(id, 1).await.unwrap().is_read);
        assert_eq!(target.count_unread(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_flag_mutation_without_match_is_noop() {
        let target = target().await;
        assert_eq!(target.mark_as_read(77, 1).await.unwrap(), 0);
        assert_eq!(target.mark_as_deleted(77, 1).await.unwrap(), 0);
        assert_eq!(target.clear_all(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_notification() {
        let target = target().await;
        let keep = target.create("info", json!({}), 1).await.unwrap().id.unwrap();
        let gone = target.create("info", json!({}), 1).await.unwrap().id.unwrap();

        target.mark_as_deleted(gone, 1).await.unwrap();

        let listed = target.find_notifications(1).await.unwrap();
        assert_eq!(ids(&listed), vec![keep]);
        assert!(matches!(
            target.find_notification(gone, 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_all_empties_only_that_user() {
        let target = target().await;
        target.create("info", json!({}), 1).await.unwrap();
        target.create("info", json!({}), 1).await.unwrap();
        let other = target.create("info", json!({}), 2).await.unwrap().id.unwrap();

        assert_eq!(target.clear_all(1).await.unwrap(), 2);

        assert!(target.find_notifications(1).await.unwrap().is_empty());
        assert_eq!(ids(&target.find_notifications(2).await.unwrap()), vec![other]);
    }

    #[tokio::test]
    async fn test_cross_user_mutations_have_no_effect() {
        let target = target().await;
        let id = target.create("info", json!({ "v": 1 }), 1).await.unwrap().id.unwrap();

        assert!(matches!(
            target.update(id, "hijack", json!({}), 2).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(target.mark_as_read(id, 2).await.unwrap(), 0);
        assert_eq!(target.mark_as_deleted(id, 2).await.unwrap(), 0);

        let found = target.find_notification(id, 1).await.unwrap();
        assert_eq!(found.notification_type, "info");
        assert!(!found.is_read);
    }

    #[tokio::test]
    async fn test_mark_all_read_touches_only_unread_rows() {
        let target = target().await;
        let first = target.create("info", json!({}), 1).await.unwrap().id.unwrap();
        target.create("info", json!({}), 1).await.unwrap();
        target.create("info", json!({}), 2).await.unwrap();
        target.mark_as_read(first, 1).await.unwrap();

        assert_eq!(target.mark_all_read(1).await.unwrap(), 1);
        assert_eq!(target.mark_all_read(1).await.unwrap(), 0);

        assert_eq!(target.count_unread(1).await.unwrap(), 0);
        assert_eq!(target.count_unread(2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_notifications_newest_first() {
        let target = target().await;
        let a = target.create("info", json!({}), 1).await.unwrap().id.unwrap();
        let b = target.create("info", json!({}), 1).await.unwrap().id.unwrap();
        let c = target.create("info", json!({}), 1).await.unwrap().id.unwrap();

        assert_eq!(ids(&target.find_notifications(1).await.unwrap()), vec![c, b, a]);
    }

    #[tokio::test]
    async fn test_malformed_stored_payload_is_decode_error() {
        let target = target().await;
        let id = target.create("info", json!({}), 1).await.unwrap().id.unwrap();

        sqlx::query("UPDATE notifications SET data = '{broken' WHERE id = ?")
            .bind(id)
            .execute(&target.pool)
            .await
            .unwrap();

        assert!(matches!(
            target.find_notifications(1).await,
            Err(AppError::Decode(_))
        ));
    }

    async fn updated_at(target: &DatabaseTarget, id: i64) -> Option<i64> {
        sqlx::query_scalar("SELECT updated_at FROM notifications WHERE id = ?")
            .bind(id)
            .fetch_one(&target.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_mutations_stamp_updated_at() {
        let target = target().await;
        let id = target.create("info", json!({}), 1).await.unwrap().id.unwrap();
        assert_eq!(updated_at(&target, id).await, None);

        target.update(id, "info", json!({ "v": 2 }), 1).await.unwrap();
        assert!(updated_at(&target, id).await.is_some());

        let read = target.create("info", json!({}), 1).await.unwrap().id.unwrap();
        target.mark_as_read(read, 1).await.unwrap();
        assert!(updated_at(&target, read).await.is_some());

        let deleted = target.create("info", json!({}), 1).await.unwrap().id.unwrap();
        target.mark_as_deleted(deleted, 1).await.unwrap();
        assert!(updated_at(&target, deleted).await.is_some());

        let bulk_read = target.create("info", json!({}), 2).await.unwrap().id.unwrap();
        target.mark_all_read(2).await.unwrap();
        assert!(updated_at(&target, bulk_read).await.is_some());

        let cleared = target.create("info", json!({}), 3).await.unwrap().id.unwrap();
        target.clear_all(3).await.unwrap();
        assert!(updated_at(&target, cleared).await.is_some());
    }

    #[tokio::test]
    async fn test_mark_all_read_keeps_updated_at_of_read_rows() {
        let target = target().await;
        let read = target.create("info", json!({}), 1).await.unwrap().id.unwrap();
        let unread = target.create("info", json!({}), 1).await.unwrap().id.unwrap();
        target.mark_as_read(read, 1).await.unwrap();

        sqlx::query("UPDATE notifications SET updated_at = 1 WHERE id = ?")
            .bind(read)
            .execute(&target.pool)
            .await
            .unwrap();

        target.mark_all_read(1).await.unwrap();

        assert_eq!(updated_at(&target, read).await, Some(1));
        assert!(updated_at(&target, unread).await.unwrap() > 1);
    }

    #[tokio::test]
    async fn test_custom_table_is_used() {
        let pool = test_pool().await;
        sqlx::query(
            "CREATE TABLE user_alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                data TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        let target = DatabaseTarget::new(pool.clone(), Arc::default())
            .with_table("user_alerts")
            .unwrap();
        let id = target.create("info", json!({ "k": 1 }), 1).await.unwrap().id.unwrap();
        target.mark_as_read(id, 1).await.unwrap();

        assert!(target.find_notification(id, 1).await.unwrap().is_read);
        let default_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(default_rows, 0);
    }

    #[tokio::test]
    async fn test_invalid_table_name_is_rejected() {
        let target = target().await;
        assert!(matches!(
            target.clone().with_table("alerts; DROP TABLE notifications"),
            Err(AppError::Validation(_))
        ));
        assert!(target.with_table("").is_err());
    }
}
