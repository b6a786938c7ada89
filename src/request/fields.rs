//! Field extraction with aggregated validation errors
//!
//! A `FieldReader` walks a parameter map on behalf of one variant. Every field
//! the variant reads is marked consumed; anything the caller supplied that the
//! variant never read is reported as forbidden when the reader finishes.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use super::types::{DataType, MarketDate, Month, OutputFlags, OutputOptions, Quarter};
use super::Choice;

/// Loosely typed request parameters
pub type Params = serde_json::Map<String, Value>;

/// One or more field-level violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Request validation failed: {}", .errors.join("; "))]
pub struct ValidationErrors {
    errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn single(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// True if any message names the field
    pub fn mentions(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.contains(field))
    }

    pub fn into_vec(self) -> Vec<String> {
        self.errors
    }
}

/// Reads fields for one variant and accumulates violations by category
pub struct FieldReader<'a> {
    params: &'a Params,
    known: &'static [&'static str],
    context: String,
    consumed: HashSet<&'static str>,
    missing: Vec<String>,
    forbidden: Vec<String>,
    invalid: Vec<String>,
    flags: OutputFlags,
}

impl<'a> FieldReader<'a> {
    /// Create a reader over `params`; `known` lists every field the tool accepts
    pub fn new(params: &'a Params, known: &'static [&'static str]) -> Self {
        Self {
            params,
            known,
            context: String::new(),
            consumed: HashSet::new(),
            missing: Vec::new(),
            forbidden: Vec::new(),
            invalid: Vec::new(),
            flags: OutputFlags::default(),
        }
    }

    /// Read the discriminator; any failure here stops validation immediately
    pub fn discriminator<T: Choice>(&mut self, field: &'static str) -> Result<T, ValidationErrors> {
        self.consumed.insert(field);
        let expected = format!("{} must be one of: {}", field, T::names().join(", "));
        let value = match self.present(field) {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(ValidationErrors::single(format!("{} (got {})", expected, other))),
            None => return Err(ValidationErrors::single(format!("'{}' is required; {}", field, expected))),
        };
        let choice = T::parse(value)
            .ok_or_else(|| ValidationErrors::single(format!("{} (got '{}')", expected, value)))?;
        self.context = format!("{}='{}'", field, value);
        Ok(choice)
    }

    /// Read `datatype`, `force_inline` and `force_file`
    pub fn output_options(&mut self, default: DataType) -> OutputOptions {
        self.output_options_in(default, DataType::ALL)
    }

    /// Like `output_options`, for tools whose upstream supports a subset of formats
    pub fn output_options_in(&mut self, default: DataType, allowed: &[DataType]) -> OutputOptions {
        let datatype = self.optional_choice_in("datatype", allowed, default);
        let force_inline = self.optional_bool("force_inline", false);
        let force_file = self.optional_bool("force_file", false);
        self.flags = OutputFlags::new(force_inline, force_file);
        OutputOptions {
            datatype,
            flags: self.flags,
        }
    }

    /// Record a range/format violation found by the caller
    pub fn invalid(&mut self, message: impl Into<String>) {
        self.invalid.push(message.into());
    }

    /// Record a field that is supplied but not allowed in this context
    pub fn forbid(&mut self, field: &'static str, reason: &str) {
        self.consumed.insert(field);
        if self.present(field).is_some() {
            self.forbidden.push(format!("'{}' is not allowed {}", field, reason));
        }
    }

    /// Whether the caller supplied a non-null value
    pub fn is_supplied(&self, field: &str) -> bool {
        self.present(field).is_some()
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.params.get(field).filter(|v| !v.is_null())
    }

    fn take(&mut self, field: &'static str) -> Option<&'a Value> {
        self.consumed.insert(field);
        self.present(field)
    }

    fn require(&mut self, field: &'static str) -> Option<&'a Value> {
        let value = self.take(field);
        if value.is_none() {
            let message = if self.context.is_empty() {
                format!("'{}' is required", field)
            } else {
                format!("'{}' is required: {} requires it", field, self.context)
            };
            self.missing.push(message);
        }
        value
    }

    fn as_text(&mut self, field: &'static str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) if s.trim().is_empty() => {
                self.invalid.push(format!("'{}' must not be empty", field));
                None
            }
            Value::String(s) => Some(s.trim().to_string()),
            _ => {
                self.invalid.push(format!("'{}' must be a string", field));
                None
            }
        }
    }

    fn as_choice<T: Choice>(&mut self, field: &'static str, value: &Value, allowed: &[T]) -> Option<T> {
        let text = self.as_text(field, value)?;
        let names: Vec<&str> = allowed.iter().map(|v| v.as_str()).collect();
        match T::parse(&text).filter(|v| allowed.contains(v)) {
            Some(choice) => Some(choice),
            None => {
                self.invalid.push(format!(
                    "'{}' must be one of: {} (got '{}')",
                    field,
                    names.join(", "),
                    text
                ));
                None
            }
        }
    }

    fn as_integer(&mut self, field: &'static str, value: &Value, min: u32, max: u32) -> Option<u32> {
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n >= min as i64 && n <= max as i64 => Some(n as u32),
            Some(n) => {
                self.invalid
                    .push(format!("'{}' must be between {} and {} (got {})", field, min, max, n));
                None
            }
            None => {
                self.invalid.push(format!("'{}' must be an integer", field));
                None
            }
        }
    }

    fn as_number(&mut self, field: &'static str, value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n.is_finite() => Some(n),
            Some(_) => {
                self.invalid.push(format!("'{}' must be a finite number", field));
                None
            }
            None => {
                self.invalid.push(format!("'{}' must be a number", field));
                None
            }
        }
    }

    fn as_bool(&mut self, field: &'static str, value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => {
                self.invalid.push(format!("'{}' must be a boolean", field));
                None
            }
        }
    }

    pub fn required_str(&mut self, field: &'static str) -> Option<String> {
        let value = self.require(field)?;
        self.as_text(field, value)
    }

    pub fn optional_str(&mut self, field: &'static str) -> Option<String> {
        let value = self.take(field)?;
        self.as_text(field, value)
    }

    pub fn required_choice<T: Choice>(&mut self, field: &'static str) -> Option<T> {
        self.required_choice_in(field, T::ALL)
    }

    pub fn required_choice_in<T: Choice>(&mut self, field: &'static str, allowed: &[T]) -> Option<T> {
        let value = self.require(field)?;
        self.as_choice(field, value, allowed)
    }

    pub fn optional_choice<T: Choice>(&mut self, field: &'static str, default: T) -> T {
        self.optional_choice_in(field, T::ALL, default)
    }

    pub fn optional_choice_in<T: Choice>(&mut self, field: &'static str, allowed: &[T], default: T) -> T {
        match self.take(field) {
            Some(value) => self.as_choice(field, value, allowed).unwrap_or(default),
            None => default,
        }
    }

    pub fn required_u32(&mut self, field: &'static str, min: u32, max: u32) -> Option<u32> {
        let value = self.require(field)?;
        self.as_integer(field, value, min, max)
    }

    pub fn optional_u32(&mut self, field: &'static str, default: u32, min: u32, max: u32) -> u32 {
        match self.take(field) {
            Some(value) => self.as_integer(field, value, min, max).unwrap_or(default),
            None => default,
        }
    }

    /// Optional number strictly between `min` and `max`
    pub fn optional_f64_between(&mut self, field: &'static str, default: f64, min: f64, max: f64) -> f64 {
        let Some(value) = self.take(field) else {
            return default;
        };
        match self.as_number(field, value) {
            Some(n) if n > min && n < max => n,
            Some(n) => {
                self.invalid.push(format!(
                    "'{}' must be greater than {} and less than {} (got {})",
                    field, min, max, n
                ));
                default
            }
            None => default,
        }
    }

    /// Optional number strictly greater than zero
    pub fn optional_positive_f64(&mut self, field: &'static str, default: f64) -> f64 {
        let Some(value) = self.take(field) else {
            return default;
        };
        match self.as_number(field, value) {
            Some(n) if n > 0.0 => n,
            Some(n) => {
                self.invalid
                    .push(format!("'{}' must be greater than 0 (got {})", field, n));
                default
            }
            None => default,
        }
    }

    pub fn optional_bool(&mut self, field: &'static str, default: bool) -> bool {
        match self.take(field) {
            Some(value) => self.as_bool(field, value).unwrap_or(default),
            None => default,
        }
    }

    /// Read `month`, allowed only when `intraday` is true
    pub fn optional_month(&mut self, field: &'static str, intraday: bool) -> Option<Month> {
        if !intraday {
            self.forbid(field, "unless the interval is intraday (1min, 5min, 15min, 30min, 60min)");
            return None;
        }
        let text = self.optional_str(field)?;
        match Month::parse(&text) {
            Ok(month) => Some(month),
            Err(reason) => {
                self.invalid.push(format!("'{}' {}", field, reason));
                None
            }
        }
    }

    pub fn optional_market_date(&mut self, field: &'static str) -> Option<MarketDate> {
        let text = self.optional_str(field)?;
        match MarketDate::parse(&text) {
            Ok(date) => Some(date),
            Err(reason) => {
                self.invalid.push(format!("'{}' {}", field, reason));
                None
            }
        }
    }

    pub fn required_quarter(&mut self, field: &'static str) -> Option<Quarter> {
        let text = self.required_str(field)?;
        match Quarter::parse(&text) {
            Ok(quarter) => Some(quarter),
            Err(reason) => {
                self.invalid.push(format!("'{}' {}", field, reason));
                None
            }
        }
    }

    /// Collect every violation in reporting order
    fn collect(mut self) -> Vec<String> {
        let mut supplied: Vec<&String> = self
            .params
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, _)| k)
            .collect();
        supplied.sort();

        for key in supplied {
            if self.consumed.contains(key.as_str()) {
                continue;
            }
            if self.known.iter().any(|k| *k == key.as_str()) {
                self.forbidden
                    .push(format!("'{}' is not allowed when {}", key, self.context));
            } else {
                self.forbidden.push(format!("'{}' is not a recognized parameter", key));
            }
        }

        let mut errors = self.missing;
        errors.extend(self.forbidden);
        errors.extend(self.invalid);
        if self.flags.is_conflicting() {
            errors.push("force_inline and force_file are mutually exclusive".to_string());
        }
        errors
    }

    /// Finish validation, returning the built value when no rule was violated
    pub fn finish<T>(self, built: Option<T>) -> Result<T, ValidationErrors> {
        let context = self.context.clone();
        let errors = self.collect();
        match built {
            Some(value) if errors.is_empty() => Ok(value),
            _ if !errors.is_empty() => Err(ValidationErrors::new(errors)),
            _ => Err(ValidationErrors::single(format!("incomplete request for {}", context))),
        }
    }
}
