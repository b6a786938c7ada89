//! Usage log ingestion
//!
//! Log subscription events arrive as `{"awslogs": {"data": <base64 gzip JSON>}}`.
//! Lines tagged with the usage marker are batched into one text object per event.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Datelike, Timelike, Utc};
use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::store::{ObjectStore, StoreError};

/// Marker that tags usage lines in application logs
pub const DEFAULT_MARKER: &str = "[USAGE]";

/// Errors from log ingestion
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid log event: {0}")]
    InvalidEvent(String),

    #[error("Failed to decode log payload: {0}")]
    Decode(String),

    #[error("Failed to store usage lines: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    awslogs: EncodedLogs,
}

#[derive(Debug, Deserialize)]
struct EncodedLogs {
    data: String,
}

/// Decoded subscription payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPayload {
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub log_group: Option<String>,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub message: String,
}

/// What one event produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub lines: usize,
    pub key: Option<String>,
}

impl IngestOutcome {
    /// Handler-style response body
    pub fn to_response(&self) -> Value {
        let body = match &self.key {
            Some(key) => format!("Stored {} usage lines at {}", self.lines, key),
            None => "No usage lines found".to_string(),
        };
        json!({"statusCode": 200, "body": body})
    }
}

/// Decode the base64 gzip JSON carried in an event
pub fn decode_event(event: &Value) -> Result<LogPayload, IngestError> {
    let envelope: Envelope =
        serde_json::from_value(event.clone()).map_err(|e| IngestError::InvalidEvent(e.to_string()))?;
    let compressed = STANDARD
        .decode(envelope.awslogs.data.trim())
        .map_err(|e| IngestError::Decode(format!("base64: {}", e)))?;

    let mut text = String::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_string(&mut text)
        .map_err(|e| IngestError::Decode(format!("gzip: {}", e)))?;

    serde_json::from_str(&text).map_err(|e| IngestError::Decode(format!("json: {}", e)))
}

/// Messages containing `marker`, in arrival order
pub fn usage_lines<'a>(payload: &'a LogPayload, marker: &str) -> Vec<&'a str> {
    payload
        .log_events
        .iter()
        .map(|e| e.message.trim_end_matches(['\r', '\n']))
        .filter(|m| m.contains(marker))
        .collect()
}

/// Object key for a batch written at `now`
pub fn object_key(now: DateTime<Utc>) -> String {
    format!(
        "logs/{}/{:02}/{:02}/{:02}/{}.txt",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.timestamp_millis()
    )
}

/// Decode `event`, keep usage lines and write them as one object
pub async fn ingest_log_event(
    event: &Value,
    store: &dyn ObjectStore,
    marker: &str,
    now: DateTime<Utc>,
) -> Result<IngestOutcome, IngestError> {
    let payload = decode_event(event)?;
    let lines = usage_lines(&payload, marker);
    log::debug!(
        "Decoded {} log events from {}, {} usage lines",
        payload.log_events.len(),
        payload.log_group.as_deref().unwrap_or("unknown group"),
        lines.len()
    );

    if lines.is_empty() {
        return Ok(IngestOutcome { lines: 0, key: None });
    }

    let key = object_key(now);
    let body = lines.join("\n");
    store.put_object(&key, body.into_bytes(), "text/plain").await?;
    log::info!("Stored {} usage lines at {}/{}", lines.len(), store.bucket(), key);

    Ok(IngestOutcome {
        lines: lines.len(),
        key: Some(key),
    })
}
