use crate::notification::{notification_repository::DEFAULT_TABLE, NotificationManager};
use crate::widget::RenderSettings;
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub notification_manager: NotificationManager,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub notification_table: String,
    /// JSON file mapping notification types to display text.
    pub notification_types_path: Option<String>,
    pub render: RenderSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://notifications.db?mode=rwc".to_string(),
            database_max_connections: 5,
            host: "127.0.0.1".to_string(),
            port: 3000,
            notification_table: DEFAULT_TABLE.to_string(),
            notification_types_path: None,
            render: RenderSettings::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            database_url: var_or("DATABASE_URL", defaults.database_url),
            database_max_connections: var_or(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections.to_string(),
            )
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            host: var_or("HOST", defaults.host),
            port: var_or("PORT", defaults.port.to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            notification_table: var_or("NOTIFICATION_TABLE", defaults.notification_table),
            notification_types_path: std::env::var("NOTIFICATION_TYPES_PATH").ok(),
            render: RenderSettings {
                item_template: var_or("NOTIFICATION_ITEM_TEMPLATE", defaults.render.item_template),
                container_template: var_or(
                    "NOTIFICATION_CONTAINER_TEMPLATE",
                    defaults.render.container_template,
                ),
                timestamp_format: var_or(
                    "NOTIFICATION_TIMESTAMP_FORMAT",
                    defaults.render.timestamp_format,
                ),
                list_glue: var_or("NOTIFICATION_LIST_GLUE", defaults.render.list_glue),
                empty_text: var_or("NOTIFICATION_EMPTY_TEXT", defaults.render.empty_text),
            },
        })
    }
}

fn var_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}
