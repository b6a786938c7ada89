//! Energy, metal and agricultural commodity prices

use serde_json::{json, Value};

use super::economic::Frequency;
use super::routing::{ensure_flags, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, OutputOptions, Params, ToolRequest,
    ValidationErrors,
};

choice_enum! {
    pub enum CommodityType {
        Wti => "wti",
        Brent => "brent",
        NaturalGas => "natural_gas",
        Copper => "copper",
        Aluminum => "aluminum",
        Wheat => "wheat",
        Corn => "corn",
        Cotton => "cotton",
        Sugar => "sugar",
        Coffee => "coffee",
        AllCommodities => "all_commodities",
    }
}

impl CommodityType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Wti => "WTI",
            Self::Brent => "BRENT",
            Self::NaturalGas => "NATURAL_GAS",
            Self::Copper => "COPPER",
            Self::Aluminum => "ALUMINUM",
            Self::Wheat => "WHEAT",
            Self::Corn => "CORN",
            Self::Cotton => "COTTON",
            Self::Sugar => "SUGAR",
            Self::Coffee => "COFFEE",
            Self::AllCommodities => "ALL_COMMODITIES",
        }
    }

    /// Intervals the upstream series is published at
    pub fn intervals(&self) -> &'static [Frequency] {
        match self {
            Self::Wti | Self::Brent | Self::NaturalGas => ENERGY_INTERVALS,
            _ => MARKET_INTERVALS,
        }
    }
}

const ENERGY_INTERVALS: &[Frequency] = &[Frequency::Daily, Frequency::Weekly, Frequency::Monthly];
const MARKET_INTERVALS: &[Frequency] = &[Frequency::Monthly, Frequency::Quarterly, Frequency::Annual];

const FIELDS: &[&str] = &["commodity_type", "interval", "datatype", "force_inline", "force_file"];

pub fn api_function_name(commodity_type: &str) -> Result<&'static str, RoutingError> {
    CommodityType::parse(commodity_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("commodity type", commodity_type))
}

/// A validated commodity request
#[derive(Debug, Clone, PartialEq)]
pub struct CommodityRequest {
    commodity_type: CommodityType,
    interval: Frequency,
    output: OutputOptions,
}

impl CommodityRequest {
    pub fn commodity_type(&self) -> CommodityType {
        self.commodity_type
    }

    pub fn interval(&self) -> Frequency {
        self.interval
    }
}

impl ToolRequest for CommodityRequest {
    const TOOL_NAME: &'static str = "commodity";
    const DESCRIPTION: &'static str = "Commodity prices: crude oil (WTI, Brent), natural gas, metals, agriculture and the global index";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let commodity_type = reader.discriminator::<CommodityType>("commodity_type")?;
        let output = reader.output_options(DataType::Json);
        let interval = reader.optional_choice_in("interval", commodity_type.intervals(), Frequency::Monthly);
        reader.finish(Some(Self {
            commodity_type,
            interval,
            output,
        }))
    }

    fn input_schema() -> Value {
        object_schema(
            "commodity_type",
            choice_property::<CommodityType>("Commodity"),
            &[json!({
                "interval": {
                    "type": "string",
                    "enum": Frequency::names(),
                    "description": "wti, brent, natural_gas: daily|weekly|monthly; others: monthly|quarterly|annual (default: monthly)"
                }
            })],
            DataType::Json,
        )
    }
}

impl Route for CommodityRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.commodity_type.function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        params.insert("interval", self.interval);
        params.insert("datatype", self.output.datatype);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        ensure_flags(self.output.flags)?;
        if !self.commodity_type.intervals().contains(&self.interval) {
            return Err(RoutingError::invalid(format!(
                "interval '{}' is not supported for {}",
                self.interval, self.commodity_type
            )));
        }
        Ok(())
    }

    fn output(&self) -> OutputOptions {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_params;

    fn parse(value: serde_json::Value) -> Result<CommodityRequest, ValidationErrors> {
        CommodityRequest::from_params(&test_params(value))
    }

    #[test]
    fn test_default_interval_is_monthly() {
        for kind in CommodityType::ALL {
            let routed = parse(json!({"commodity_type": kind.as_str()})).unwrap().route().unwrap();
            assert_eq!(routed.function, kind.function_name());
            assert_eq!(routed.params.get("interval"), Some("monthly"));
            assert_eq!(routed.params.get("datatype"), Some("json"));
        }
    }

    #[test]
    fn test_energy_accepts_daily() {
        assert!(parse(json!({"commodity_type": "wti", "interval": "daily"})).is_ok());
        assert!(parse(json!({"commodity_type": "natural_gas", "interval": "weekly"})).is_ok());
        assert!(parse(json!({"commodity_type": "brent", "interval": "annual"}))
            .unwrap_err()
            .mentions("interval"));
    }

    #[test]
    fn test_market_commodities_accept_quarterly() {
        let routed = parse(json!({"commodity_type": "coffee", "interval": "quarterly"}))
            .unwrap()
            .route()
            .unwrap();
        assert_eq!(routed.params.get("interval"), Some("quarterly"));
        let err = parse(json!({"commodity_type": "copper", "interval": "daily"})).unwrap_err();
        assert_eq!(
            err.messages(),
            &["'interval' must be one of: monthly, quarterly, annual (got 'daily')".to_string()]
        );
    }

    #[test]
    fn test_unknown_field() {
        let err = parse(json!({"commodity_type": "corn", "symbol": "ZC"})).unwrap_err();
        assert!(err.mentions("'symbol' is not a recognized parameter"));
    }

    #[test]
    fn test_api_function_name_total() {
        assert_eq!(api_function_name("all_commodities").unwrap(), "ALL_COMMODITIES");
        assert_eq!(
            api_function_name("gold").unwrap_err().to_string(),
            "Unknown commodity type: gold"
        );
    }
}
