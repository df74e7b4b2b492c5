use crate::error::Result;
use crate::notification::notification_models::Notification;
use crate::template;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::fmt::{self, Write};
use std::sync::Arc;

use super::NotificationProvider;

pub type SectionFn = Arc<dyn Fn(&Notification, &NotificationList) -> String + Send + Sync>;
pub type ContainerFn = Arc<dyn Fn(&[Notification], &NotificationList) -> String + Send + Sync>;

/// Outer layout of a rendered list.
///
/// `Template` understands `{notifications}` (the rendered items joined by the
/// list glue) and `{emptyText}` (the empty text, only when there are no
/// notifications). `Render` output is used as-is.
#[derive(Clone)]
pub enum ContainerTemplate {
    Template(String),
    Render(ContainerFn),
}

impl fmt::Debug for ContainerTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerTemplate::Template(t) => f.debug_tuple("Template").field(t).finish(),
            ContainerTemplate::Render(_) => f.write_str("Render(..)"),
        }
    }
}

/// String settings of a notification list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Accepts `{text}`, `{text.key}`, `{notification.field}`,
    /// `{section.name}` and `{timestamp}`.
    pub item_template: String,
    pub container_template: String,
    /// chrono strftime pattern, applied in UTC.
    pub timestamp_format: String,
    pub list_glue: String,
    pub empty_text: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            item_template: "{notification.type} at {timestamp}".to_string(),
            container_template: "{notifications}{emptyText}".to_string(),
            timestamp_format: "%m/%d/%Y %H:%M:%S".to_string(),
            list_glue: "\n".to_string(),
            empty_text: "No notifications available.".to_string(),
        }
    }
}

#[derive(Clone)]
enum Replacement {
    Lookup(String),
    Section(SectionFn),
}

/// Renders one user's notifications to text.
///
/// The item template is compiled once when the list is built; rendering only
/// fills in the compiled bindings.
pub struct NotificationList {
    provider: Arc<dyn NotificationProvider>,
    user_id: i64,
    item_template: String,
    container_template: ContainerTemplate,
    timestamp_format: String,
    list_glue: String,
    empty_text: String,
    replacements: HashMap<String, Replacement>,
}

impl NotificationList {
    pub fn builder(
        provider: Arc<dyn NotificationProvider>,
        user_id: i64,
    ) -> NotificationListBuilder {
        NotificationListBuilder {
            provider,
            user_id,
            settings: RenderSettings::default(),
            container_render: None,
            sections: HashMap::new(),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn list_glue(&self) -> &str {
        &self.list_glue
    }

    pub fn empty_text(&self) -> &str {
        &self.empty_text
    }

    pub async fn run(&self) -> Result<String> {
        let notifications = self.provider.get_notifications(self.user_id).await?;
        Ok(self.render_notifications(&notifications))
    }

    pub fn render_notifications(&self, notifications: &[Notification]) -> String {
        let container = match &self.container_template {
            ContainerTemplate::Render(render) => return render(notifications, self),
            ContainerTemplate::Template(container) => container,
        };

        let items = notifications
            .iter()
            .map(|n| self.render_notification_text(n))
            .collect::<Vec<_>>()
            .join(&self.list_glue);

        let empty_text = if notifications.is_empty() {
            self.empty_text.clone()
        } else {
            String::new()
        };

        let replacements = HashMap::from([
            ("{notifications}".to_string(), items),
            ("{emptyText}".to_string(), empty_text),
        ]);

        template::substitute(container, &replacements)
    }

    pub fn render_notification_text(&self, notification: &Notification) -> String {
        let context = json!({
            "text": notification.compiled_text(),
            "notification": notification.fields(),
        });

        let mut replacements = self
            .replacements
            .iter()
            .map(|(token, replacement)| {
                let value = match replacement {
                    Replacement::Lookup(path) => template::lookup(&context, path)
                        .map(template::value_text)
                        .unwrap_or_else(|| path.clone()),
                    Replacement::Section(section) => section(notification, self),
                };
                (token.clone(), value)
            })
            .collect::<HashMap<_, _>>();

        replacements.insert(
            "{timestamp}".to_string(),
            self.format_timestamp(notification.created_at),
        );

        template::substitute(&self.item_template, &replacements)
    }

    /// Falls back to the raw number when the timestamp is out of range or
    /// the pattern is invalid.
    pub fn format_timestamp(&self, timestamp: i64) -> String {
        let Some(datetime) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
            return timestamp.to_string();
        };

        let mut out = String::new();
        match write!(out, "{}", datetime.format(&self.timestamp_format)) {
            Ok(()) => out,
            Err(_) => timestamp.to_string(),
        }
    }
}

pub struct NotificationListBuilder {
    provider: Arc<dyn NotificationProvider>,
    user_id: i64,
    settings: RenderSettings,
    container_render: Option<ContainerFn>,
    sections: HashMap<String, SectionFn>,
}

impl NotificationListBuilder {
    pub fn settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn item_template(mut self, template: impl Into<String>) -> Self {
        self.settings.item_template = template.into();
        self
    }

    pub fn container_template(mut self, template: impl Into<String>) -> Self {
        self.settings.container_template = template.into();
        self.container_render = None;
        self
    }

    /// Replaces the container template with a function.
    pub fn container_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&[Notification], &NotificationList) -> String + Send + Sync + 'static,
    {
        self.container_render = Some(Arc::new(render));
        self
    }

    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.settings.timestamp_format = format.into();
        self
    }

    pub fn list_glue(mut self, glue: impl Into<String>) -> Self {
        self.settings.list_glue = glue.into();
        self
    }

    pub fn empty_text(mut self, text: impl Into<String>) -> Self {
        self.settings.empty_text = text.into();
        self
    }

    /// Registers a section, usable in the item template as `{section.<name>}`.
    pub fn section<F>(mut self, name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Notification, &NotificationList) -> String + Send + Sync + 'static,
    {
        self.sections.insert(name.into(), Arc::new(render));
        self
    }

    pub fn build(self) -> NotificationList {
        let replacements = compile_replacements(&self.settings.item_template, &self.sections);

        let container_template = match self.container_render {
            Some(render) => ContainerTemplate::Render(render),
            None => ContainerTemplate::Template(self.settings.container_template),
        };

        NotificationList {
            provider: self.provider,
            user_id: self.user_id,
            item_template: self.settings.item_template,
            container_template,
            timestamp_format: self.settings.timestamp_format,
            list_glue: self.settings.list_glue,
            empty_text: self.settings.empty_text,
            replacements,
        }
    }
}

fn compile_replacements(
    item_template: &str,
    sections: &HashMap<String, SectionFn>,
) -> HashMap<String, Replacement> {
    template::tokens(item_template)
        .into_iter()
        .map(|name| {
            let section = name
                .strip_prefix("section.")
                .and_then(|key| sections.get(key));

            let replacement = match section {
                Some(render) => Replacement::Section(render.clone()),
                None => Replacement::Lookup(name.to_string()),
            };
            (format!("{{{name}}}"), replacement)
        })
        .collect()
}
