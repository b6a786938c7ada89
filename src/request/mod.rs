//! Request schemas and routers
//!
//! Every tool takes a loosely typed parameter map, validates it into a typed
//! request (one enum variant per discriminator value), and routes the request
//! to an upstream function name plus parameter set.

/// Declares a closed set of string literals as a `Choice` enum.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::request::Choice for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::request::Choice::as_str(self))
            }
        }
    };
}

mod fields;
mod indicator;
mod routing;
mod types;

pub mod commodity;
pub mod company;
pub mod crypto;
pub mod economic;
pub mod forex;
pub mod market_data;
pub mod moving_average;
pub mod oscillator;
pub mod statement;
pub mod time_series;
pub mod trend;
pub mod volatility;
pub mod volume;

pub use fields::{FieldReader, Params, ValidationErrors};
pub use indicator::IndicatorBase;
pub use routing::{ApiParams, Route, RoutedRequest, RoutingError};
pub use types::{
    DataType, Interval, MarketDate, Month, OutputFlags, OutputOptions, OutputSize, Quarter, SeriesType,
};

use serde_json::Value;

/// A closed set of string literals accepted for a field
pub trait Choice: Copy + PartialEq + Sized + 'static {
    /// Every accepted value, in documentation order
    const ALL: &'static [Self];

    /// Wire representation
    fn as_str(&self) -> &'static str;

    /// Parse an exact literal
    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }

    /// Literal names, used in error messages and input schemas
    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.as_str()).collect()
    }
}

/// A request type exposed as a tool
pub trait ToolRequest: Route + Sized + Send + Sync + 'static {
    /// Tool name as invoked by callers
    const TOOL_NAME: &'static str;

    /// Human-readable description
    const DESCRIPTION: &'static str;

    /// Validate loosely typed parameters into a request
    fn from_params(params: &Params) -> Result<Self, ValidationErrors>;

    /// JSON Schema for the accepted parameters
    fn input_schema() -> Value;
}

/// JSON Schema property for a choice field
pub(crate) fn choice_property<T: Choice>(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "enum": T::names(),
        "description": description,
    })
}

/// Properties shared by every tool: output format and delivery flags
pub(crate) fn output_properties(default: DataType) -> serde_json::Map<String, Value> {
    let mut props = serde_json::Map::new();
    props.insert(
        "datatype".into(),
        serde_json::json!({
            "type": "string",
            "enum": DataType::names(),
            "description": format!("Response format (default: {})", default),
        }),
    );
    props.insert(
        "force_inline".into(),
        serde_json::json!({
            "type": "boolean",
            "description": "Always return the response inline",
        }),
    );
    props.insert(
        "force_file".into(),
        serde_json::json!({
            "type": "boolean",
            "description": "Always store the response as a file and return a reference",
        }),
    );
    props
}

/// Assemble an object schema from a discriminator and extra properties
pub(crate) fn object_schema(
    discriminator: &str,
    discriminator_property: Value,
    properties: &[Value],
    default_datatype: DataType,
) -> Value {
    let mut props = output_properties(default_datatype);
    props.insert(discriminator.to_string(), discriminator_property);
    for extra in properties {
        if let Value::Object(extra) = extra {
            props.extend(extra.clone());
        }
    }
    serde_json::json!({
        "type": "object",
        "properties": props,
        "required": [discriminator],
    })
}

/// Build a parameter map from a JSON object literal
#[cfg(test)]
pub(crate) fn test_params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}
