//! Output formatting for rvw.
//!
//! Text output is one line per record, `id` first, then `key:value` pairs.
//! JSON output is pretty-printed and lists are wrapped in an envelope.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Machine-readable JSON
    Json,
    /// Concise one-line-per-record text
    #[default]
    Text,
}

impl OutputFormat {
    #[must_use]
    pub const fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Formatter that can output data in text or JSON format
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format data according to the configured output format
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
            OutputFormat::Text => Ok(render_text(&serde_json::to_value(data)?)),
        }
    }

    /// Format a list with a custom empty message.
    ///
    /// JSON wraps the array as `{ <collection_name>: [...], count, ..extra }`.
    /// Text prints one line per item, then each `footer` line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn format_list<T: Serialize>(
        &self,
        data: &[T],
        empty_message: &str,
        collection_name: &str,
        extra: &[(&str, Value)],
        footer: &[String],
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut envelope = serde_json::Map::new();
                envelope.insert(collection_name.to_string(), serde_json::to_value(data)?);
                envelope.insert("count".to_string(), serde_json::json!(data.len()));
                for (key, value) in extra {
                    envelope.insert((*key).to_string(), value.clone());
                }
                Ok(serde_json::to_string_pretty(&Value::Object(envelope))?)
            }
            OutputFormat::Text => {
                let mut lines = Vec::new();
                if data.is_empty() {
                    lines.push(empty_message.to_string());
                } else {
                    lines.push(self.format(&data)?);
                }
                lines.extend(footer.iter().cloned());
                Ok(lines.join("\n"))
            }
        }
    }
}

/// Render a JSON value as concise text
fn render_text(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut parts = Vec::new();
            if let Some(id) = map.get("id") {
                parts.push(render_field_value(id));
            }
            for (key, val) in map {
                if key == "id" {
                    continue;
                }
                match val {
                    Value::Array(arr) if arr.is_empty() => {}
                    Value::Null => {}
                    _ => parts.push(format!("{key}:{}", render_field_value(val))),
                }
            }
            parts.join("  ")
        }
        Value::Array(arr) => arr.iter().map(render_text).collect::<Vec<_>>().join("\n"),
        _ => render_field_value(value),
    }
}

/// Render a single field value as concise text
fn render_field_value(value: &Value) -> String {
    match value {
        Value::String(s) => {
            if s.contains(' ') || s.contains('\n') {
                format!("\"{}\"", s.replace('\n', "\\n"))
            } else {
                s.clone()
            }
        }
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(render_field_value).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k}:{}", render_field_value(v)))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}
