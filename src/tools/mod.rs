//! Tool system for market data requests
//!
//! Each request domain is exposed as a tool with a name, description and
//! JSON input schema. The executor validates, routes, calls upstream and
//! delivers the result, turning every failure into a JSON error object.

mod executor;
mod output;
mod request_tool;

pub use executor::ToolExecutor;
pub use output::{DEFAULT_MAX_INLINE_BYTES, OutputDelivery};
pub use request_tool::RequestTool;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::AvError;
use crate::request::Params;
use crate::upstream::{Entitlement, MarketDataApi};

/// Everything a tool needs for one invocation
pub struct ToolContext<'a> {
    pub api: &'a dyn MarketDataApi,
    pub delivery: &'a OutputDelivery,
    pub entitlement: Option<Entitlement>,
}

/// A tool callers can invoke by name
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as invoked by callers
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool, returning the response text
    async fn execute(&self, params: &Params, ctx: &ToolContext<'_>) -> Result<String, AvError>;
}

/// Tool metadata as listed to callers
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::time_series::TimeSeriesRequest;

    #[test]
    fn test_tool_definition_of() {
        let tool = RequestTool::<TimeSeriesRequest>::new();
        let def = ToolDefinition::of(&tool);
        assert_eq!(def.name, "time_series");
        assert!(def.description.contains("quotes"));
        assert_eq!(def.input_schema["type"], "object");

        let rendered = serde_json::to_value(&def).unwrap();
        assert_eq!(rendered["input_schema"]["required"][0], "series_type");
    }
}
