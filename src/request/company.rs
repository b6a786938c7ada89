//! Company fundamentals, ETF profiles, corporate actions and transcripts

use serde_json::{json, Value};

use super::routing::{ensure_flags, ensure_present, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, OutputOptions, Params, Quarter, ToolRequest,
    ValidationErrors,
};

choice_enum! {
    pub enum CompanyDataType {
        CompanyOverview => "company_overview",
        EtfProfile => "etf_profile",
        Dividends => "dividends",
        Splits => "splits",
        InsiderTransactions => "insider_transactions",
        EarningsCallTranscript => "earnings_call_transcript",
    }
}

impl CompanyDataType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::CompanyOverview => "OVERVIEW",
            Self::EtfProfile => "ETF_PROFILE",
            Self::Dividends => "DIVIDENDS",
            Self::Splits => "SPLITS",
            Self::InsiderTransactions => "INSIDER_TRANSACTIONS",
            Self::EarningsCallTranscript => "EARNINGS_CALL_TRANSCRIPT",
        }
    }
}

const FIELDS: &[&str] = &["data_type", "symbol", "quarter", "datatype", "force_inline", "force_file"];

pub fn api_function_name(data_type: &str) -> Result<&'static str, RoutingError> {
    CompanyDataType::parse(data_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("company data type", data_type))
}

/// A validated company data request
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRequest {
    data_type: CompanyDataType,
    symbol: String,
    quarter: Option<Quarter>,
    output: OutputOptions,
}

impl CompanyRequest {
    pub fn data_type(&self) -> CompanyDataType {
        self.data_type
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Set only for earnings call transcripts
    pub fn quarter(&self) -> Option<Quarter> {
        self.quarter
    }
}

impl ToolRequest for CompanyRequest {
    const TOOL_NAME: &'static str = "company";
    const DESCRIPTION: &'static str =
        "Company overview, ETF profile, dividends, splits, insider transactions and earnings call transcripts";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let data_type = reader.discriminator::<CompanyDataType>("data_type")?;
        let output = reader.output_options_in(DataType::Json, &[DataType::Json]);
        let symbol = reader.required_str("symbol");

        let built = if data_type == CompanyDataType::EarningsCallTranscript {
            let quarter = reader.required_quarter("quarter");
            symbol.zip(quarter).map(|(symbol, quarter)| Self {
                data_type,
                symbol,
                quarter: Some(quarter),
                output,
            })
        } else {
            symbol.map(|symbol| Self {
                data_type,
                symbol,
                quarter: None,
                output,
            })
        };
        reader.finish(built)
    }

    fn input_schema() -> Value {
        let mut schema = object_schema(
            "data_type",
            choice_property::<CompanyDataType>("Kind of company data"),
            &[json!({
                "symbol": {"type": "string", "description": "Ticker symbol, e.g. IBM"},
                "quarter": {
                    "type": "string",
                    "description": "earnings_call_transcript only: YYYYQn, e.g. 2024Q1 (2010Q1 or later)"
                }
            })],
            DataType::Json,
        );
        schema["properties"]["datatype"]["enum"] = json!([DataType::Json.as_str()]);
        schema["required"] = json!(["data_type", "symbol"]);
        schema
    }
}

impl Route for CompanyRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.data_type.function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        params.insert("symbol", &self.symbol);
        params.insert_opt("quarter", self.quarter);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        ensure_flags(self.output.flags)?;
        ensure_present("symbol", &self.symbol, self.data_type.as_str())?;
        let is_transcript = self.data_type == CompanyDataType::EarningsCallTranscript;
        if is_transcript != self.quarter.is_some() {
            return Err(RoutingError::invalid(
                "'quarter' is required for earnings_call_transcript and not allowed otherwise",
            ));
        }
        Ok(())
    }

    fn output(&self) -> OutputOptions {
        self.output
    }
}
