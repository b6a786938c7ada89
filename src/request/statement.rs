//! Company financial statements

use serde_json::{json, Value};

use super::routing::{ensure_flags, ensure_present, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, OutputOptions, Params, ToolRequest,
    ValidationErrors,
};

choice_enum! {
    pub enum StatementType {
        IncomeStatement => "income_statement",
        BalanceSheet => "balance_sheet",
        CashFlow => "cash_flow",
        Earnings => "earnings",
    }
}

impl StatementType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::IncomeStatement => "INCOME_STATEMENT",
            Self::BalanceSheet => "BALANCE_SHEET",
            Self::CashFlow => "CASH_FLOW",
            Self::Earnings => "EARNINGS",
        }
    }
}

const FIELDS: &[&str] = &["statement_type", "symbol", "datatype", "force_inline", "force_file"];

pub fn api_function_name(statement_type: &str) -> Result<&'static str, RoutingError> {
    StatementType::parse(statement_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("statement type", statement_type))
}

/// A validated financial statement request
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRequest {
    statement_type: StatementType,
    symbol: String,
    output: OutputOptions,
}

impl StatementRequest {
    pub fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl ToolRequest for StatementRequest {
    const TOOL_NAME: &'static str = "statement";
    const DESCRIPTION: &'static str = "Annual and quarterly income statement, balance sheet, cash flow and earnings";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let statement_type = reader.discriminator::<StatementType>("statement_type")?;
        let output = reader.output_options_in(DataType::Json, &[DataType::Json]);
        let symbol = reader.required_str("symbol");
        let built = symbol.map(|symbol| Self {
            statement_type,
            symbol,
            output,
        });
        reader.finish(built)
    }

    fn input_schema() -> Value {
        let mut schema = object_schema(
            "statement_type",
            choice_property::<StatementType>("Financial statement"),
            &[json!({"symbol": {"type": "string", "description": "Ticker symbol, e.g. IBM"}})],
            DataType::Json,
        );
        schema["properties"]["datatype"]["enum"] = json!([DataType::Json.as_str()]);
        schema["required"] = json!(["statement_type", "symbol"]);
        schema
    }
}

impl Route for StatementRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.statement_type.function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        params.insert("symbol", &self.symbol);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        ensure_flags(self.output.flags)?;
        ensure_present("symbol", &self.symbol, self.statement_type.as_str())
    }

    fn output(&self) -> OutputOptions {
        self.output
    }
}
