use crate::template;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Display text registered for one notification type.
///
/// `{key}` placeholders are filled from the top-level fields of the
/// notification's `data`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MessageText {
    Plain(String),
    Keyed(BTreeMap<String, String>),
}

/// Notification type -> display text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MessageCatalog {
    types: HashMap<String, MessageText>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, notification_type: impl Into<String>, text: MessageText) -> Self {
        self.types.insert(notification_type.into(), text);
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Compiled text for a notification: a string for plain entries, an
    /// object of compiled strings for keyed ones. Unregistered types fall
    /// back to the type name.
    pub fn compile(&self, notification_type: &str, data: &Value) -> Value {
        match self.types.get(notification_type) {
            Some(MessageText::Plain(text)) => Value::String(fill(text, data)),
            Some(MessageText::Keyed(texts)) => Value::Object(
                texts
                    .iter()
                    .map(|(key, text)| (key.clone(), Value::String(fill(text, data))))
                    .collect::<Map<String, Value>>(),
            ),
            None => Value::String(notification_type.to_string()),
        }
    }
}

fn fill(text: &str, data: &Value) -> String {
    let replacements = template::tokens(text)
        .into_iter()
        .filter_map(|name| {
            data.get(name)
                .map(|value| (format!("{{{name}}}"), template::value_text(value)))
        })
        .collect::<HashMap<_, _>>();

    template::substitute(text, &replacements)
}
