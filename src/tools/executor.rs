//! Tool executor - manages tool registration and execution

use std::collections::HashMap;

use serde_json::Value;

use super::{RequestTool, Tool, ToolContext, ToolDefinition};
use crate::error::AvError;
use crate::request::commodity::CommodityRequest;
use crate::request::company::CompanyRequest;
use crate::request::crypto::CryptoRequest;
use crate::request::economic::EconomicRequest;
use crate::request::forex::ForexRequest;
use crate::request::market_data::MarketDataRequest;
use crate::request::moving_average::MovingAverageRequest;
use crate::request::oscillator::OscillatorRequest;
use crate::request::statement::StatementRequest;
use crate::request::time_series::TimeSeriesRequest;
use crate::request::trend::TrendRequest;
use crate::request::volatility::VolatilityRequest;
use crate::request::volume::VolumeRequest;
use crate::request::{Params, ToolRequest, ValidationErrors};

/// Manages tool registration and dispatch
pub struct ToolExecutor {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolExecutor {
    /// Create executor with every market data tool
    pub fn standard() -> Self {
        let mut executor = Self::new();

        // Core stock data
        executor.register::<TimeSeriesRequest>();

        // Technical indicators
        executor.register::<MovingAverageRequest>();
        executor.register::<OscillatorRequest>();
        executor.register::<TrendRequest>();
        executor.register::<VolatilityRequest>();
        executor.register::<VolumeRequest>();

        // Other asset classes and macro data
        executor.register::<CryptoRequest>();
        executor.register::<ForexRequest>();
        executor.register::<EconomicRequest>();
        executor.register::<CommodityRequest>();

        // Market listings and fundamentals
        executor.register::<MarketDataRequest>();
        executor.register::<StatementRequest>();
        executor.register::<CompanyRequest>();

        executor
    }

    /// Create an empty executor (for custom tool sets)
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    fn register<R: ToolRequest>(&mut self) {
        self.add_tool(Box::new(RequestTool::<R>::new()));
    }

    /// Add a tool to the executor
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Tool definitions, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| ToolDefinition::of(t.as_ref())).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Definition for one tool
    pub fn definition(&self, name: &str) -> Option<ToolDefinition> {
        self.tools.get(name).map(|t| ToolDefinition::of(t.as_ref()))
    }

    /// Run a tool, returning either its output or an error object as text
    pub async fn execute(&self, name: &str, input: &Value, ctx: &ToolContext<'_>) -> String {
        match self.try_execute(name, input, ctx).await {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Tool {} failed: {}", name, e);
                e.to_json().to_string()
            }
        }
    }

    /// Run a tool, propagating failures
    pub async fn try_execute(&self, name: &str, input: &Value, ctx: &ToolContext<'_>) -> Result<String, AvError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AvError::UnknownTool(name.to_string()))?;

        let empty = Params::new();
        let params = match input {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(AvError::Validation(ValidationErrors::single(format!(
                    "Tool input must be a JSON object (got {})",
                    json_type(other)
                ))));
            }
        };

        tool.execute(params, ctx).await
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::standard()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
