//! CLI module for avtools - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for listing tools,
//! calling them, probing storage and ingesting logs.

pub mod commands;

pub use commands::Cli;

use serde_json::{Map, Value};

/// Merge `--params` JSON with `-p key=value` pairs into one object
///
/// Pair values that parse as JSON scalars (numbers, booleans, null) keep
/// that type; anything else is taken as a string.
pub fn build_params(json: Option<&str>, pairs: &[String]) -> Result<Value, String> {
    let mut params = match json {
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err("--params must be a JSON object".to_string()),
            Err(e) => return Err(format!("--params is not valid JSON: {}", e)),
        },
        None => Map::new(),
    };

    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("parameter '{}' must be key=value", pair))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("parameter '{}' has an empty key", pair));
        }
        params.insert(key.to_string(), scalar(raw));
    }

    Ok(Value::Object(params))
}

fn scalar(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => v,
        _ => Value::String(raw.to_string()),
    }
}
