//! Routing validated requests to upstream function calls

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

use super::types::{DataType, Interval, Month, OutputFlags, OutputOptions};

/// Errors raised while routing a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Discriminator value with no upstream function
    #[error("{0}")]
    UnknownVariant(String),

    /// A request that violates an invariant the schema should have enforced
    #[error("Routing validation failed: {0}")]
    InvalidRequest(String),
}

impl RoutingError {
    pub fn unknown(kind: &str, value: &str) -> Self {
        Self::UnknownVariant(format!("Unknown {}: {}", kind, value))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

/// Upstream parameter mapping (excluding `function` and credentials)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApiParams(BTreeMap<String, String>);

impl ApiParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Display) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn insert_opt<V: Display>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Booleans go upstream as the literals "true" / "false"
    pub fn insert_bool(&mut self, key: &str, value: bool) {
        self.insert(key, if value { "true" } else { "false" });
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A request ready for the upstream API
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedRequest {
    pub function: &'static str,
    pub params: ApiParams,
    pub datatype: DataType,
    pub flags: OutputFlags,
}

/// Maps a validated request to an upstream call
pub trait Route {
    /// Upstream function name for this request's variant
    fn api_function_name(&self) -> Result<&'static str, RoutingError>;

    /// Parameters relevant to the variant, with defaults applied
    fn transform_params(&self) -> ApiParams;

    /// Re-check invariants the type system does not encode
    fn validate_routing(&self) -> Result<(), RoutingError>;

    /// Output format and delivery flags
    fn output(&self) -> OutputOptions;

    fn output_flags(&self) -> OutputFlags {
        self.output().flags
    }

    fn route(&self) -> Result<RoutedRequest, RoutingError> {
        self.validate_routing()?;
        let function = self.api_function_name()?;
        let params = self.transform_params();
        let output = self.output();
        log::debug!("Routed request to {} with {} params", function, params.len());
        Ok(RoutedRequest {
            function,
            params,
            datatype: output.datatype,
            flags: output.flags,
        })
    }
}

/// Fail when a required identifier is blank
pub(crate) fn ensure_present(field: &str, value: &str, context: &str) -> Result<(), RoutingError> {
    if value.trim().is_empty() {
        return Err(RoutingError::invalid(format!("'{}' is required for {}", field, context)));
    }
    Ok(())
}

pub(crate) fn ensure_flags(flags: OutputFlags) -> Result<(), RoutingError> {
    if flags.is_conflicting() {
        return Err(RoutingError::invalid(
            "force_inline and force_file are mutually exclusive",
        ));
    }
    Ok(())
}

pub(crate) fn ensure_month_intraday(month: Option<Month>, interval: Interval) -> Result<(), RoutingError> {
    if month.is_some() && !interval.is_intraday() {
        return Err(RoutingError::invalid(format!(
            "'month' is only supported for intraday intervals, not {}",
            interval
        )));
    }
    Ok(())
}
