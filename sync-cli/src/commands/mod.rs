//! CLI command implementations.

pub mod discard;
pub mod enqueue;
pub mod pending;
pub mod purge;
pub mod run;
pub mod submit;
pub mod sync;

use anyhow::{Context, Result};
use lodge_sync_types::{unix_millis, Payload};
use std::path::Path;

/// Read a payload from an inline JSON argument or a file.
pub async fn read_payload(json: Option<&str>, file: Option<&Path>) -> Result<Payload> {
    let text = match (json, file) {
        (Some(json), _) => json.to_string(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("Must specify a JSON payload or --file"),
    };
    parse_payload(&text)
}

/// Parse a JSON object payload.
pub fn parse_payload(text: &str) -> Result<Payload> {
    let value: serde_json::Value = serde_json::from_str(text).context("Payload is not valid JSON")?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!(
            "Payload must be a JSON object, got {}",
            match other {
                serde_json::Value::Array(_) => "an array",
                serde_json::Value::String(_) => "a string",
                serde_json::Value::Number(_) => "a number",
                serde_json::Value::Bool(_) => "a boolean",
                _ => "null",
            }
        ),
    }
}

/// Format a unix-millisecond timestamp relative to now.
pub fn format_age(millis: u64) -> String {
    let diff = unix_millis().saturating_sub(millis) / 1000;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}
