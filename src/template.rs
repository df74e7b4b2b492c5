//! `{token}` placeholder helpers shared by the message catalog and the
//! notification list renderer.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

/// `{name}` where `name` holds no braces, so `{x{timestamp}` still exposes
/// `{timestamp}`.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

/// Names of every `{name}` placeholder in `template`, in order of appearance.
pub fn tokens(template: &str) -> Vec<&str> {
    TOKEN_RE
        .captures_iter(template)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Replaces each `{name}` whose full token is a key of `replacements`.
///
/// Works in a single pass: substituted text is never scanned again, and
/// tokens without a replacement are copied through untouched.
pub fn substitute(template: &str, replacements: &HashMap<String, String>) -> String {
    TOKEN_RE
        .replace_all(template, |c: &Captures| {
            replacements
                .get(&c[0])
                .cloned()
                .unwrap_or_else(|| c[0].to_string())
        })
        .into_owned()
}

/// Resolves a dotted path such as `notification.data.title` against a JSON
/// object. Array elements are addressed by index.
pub fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Text form of a resolved value.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
