//! US economic indicators

use serde_json::{json, Value};

use super::routing::{ensure_flags, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, OutputOptions, Params, ToolRequest,
    ValidationErrors,
};

choice_enum! {
    pub enum EconomicIndicator {
        RealGdp => "real_gdp",
        RealGdpPerCapita => "real_gdp_per_capita",
        TreasuryYield => "treasury_yield",
        FederalFundsRate => "federal_funds_rate",
        Cpi => "cpi",
        Inflation => "inflation",
        RetailSales => "retail_sales",
        Durables => "durables",
        Unemployment => "unemployment",
        NonfarmPayroll => "nonfarm_payroll",
    }
}

impl EconomicIndicator {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::RealGdp => "REAL_GDP",
            Self::RealGdpPerCapita => "REAL_GDP_PER_CAPITA",
            Self::TreasuryYield => "TREASURY_YIELD",
            Self::FederalFundsRate => "FEDERAL_FUNDS_RATE",
            Self::Cpi => "CPI",
            Self::Inflation => "INFLATION",
            Self::RetailSales => "RETAIL_SALES",
            Self::Durables => "DURABLES",
            Self::Unemployment => "UNEMPLOYMENT",
            Self::NonfarmPayroll => "NONFARM_PAYROLL",
        }
    }
}

choice_enum! {
    /// Sampling frequency for macro and commodity series
    pub enum Frequency {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Quarterly => "quarterly",
        Semiannual => "semiannual",
        Annual => "annual",
    }
}

choice_enum! {
    pub enum Maturity {
        ThreeMonth => "3month",
        TwoYear => "2year",
        FiveYear => "5year",
        SevenYear => "7year",
        TenYear => "10year",
        ThirtyYear => "30year",
    }
}

const GDP_INTERVALS: &[Frequency] = &[Frequency::Annual, Frequency::Quarterly];
const RATE_INTERVALS: &[Frequency] = &[Frequency::Daily, Frequency::Weekly, Frequency::Monthly];
const CPI_INTERVALS: &[Frequency] = &[Frequency::Monthly, Frequency::Semiannual];

const FIELDS: &[&str] = &[
    "indicator_type",
    "interval",
    "maturity",
    "datatype",
    "force_inline",
    "force_file",
];

pub fn api_function_name(indicator_type: &str) -> Result<&'static str, RoutingError> {
    EconomicIndicator::parse(indicator_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("economic indicator", indicator_type))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Economic {
    RealGdp { interval: Frequency },
    TreasuryYield { interval: Frequency, maturity: Maturity },
    FederalFundsRate { interval: Frequency },
    Cpi { interval: Frequency },
    /// Series published at a single fixed frequency
    Fixed(EconomicIndicator),
}

impl Economic {
    pub fn indicator_type(&self) -> EconomicIndicator {
        match self {
            Self::RealGdp { .. } => EconomicIndicator::RealGdp,
            Self::TreasuryYield { .. } => EconomicIndicator::TreasuryYield,
            Self::FederalFundsRate { .. } => EconomicIndicator::FederalFundsRate,
            Self::Cpi { .. } => EconomicIndicator::Cpi,
            Self::Fixed(indicator) => *indicator,
        }
    }

    pub fn interval(&self) -> Option<Frequency> {
        match self {
            Self::RealGdp { interval }
            | Self::TreasuryYield { interval, .. }
            | Self::FederalFundsRate { interval }
            | Self::Cpi { interval } => Some(*interval),
            Self::Fixed(_) => None,
        }
    }

    fn read(kind: EconomicIndicator, reader: &mut FieldReader<'_>) -> Option<Self> {
        match kind {
            EconomicIndicator::RealGdp => Some(Self::RealGdp {
                interval: reader.optional_choice_in("interval", GDP_INTERVALS, Frequency::Annual),
            }),
            EconomicIndicator::TreasuryYield => {
                let interval = reader.optional_choice_in("interval", RATE_INTERVALS, Frequency::Monthly);
                reader
                    .required_choice::<Maturity>("maturity")
                    .map(|maturity| Self::TreasuryYield { interval, maturity })
            }
            EconomicIndicator::FederalFundsRate => Some(Self::FederalFundsRate {
                interval: reader.optional_choice_in("interval", RATE_INTERVALS, Frequency::Monthly),
            }),
            EconomicIndicator::Cpi => Some(Self::Cpi {
                interval: reader.optional_choice_in("interval", CPI_INTERVALS, Frequency::Monthly),
            }),
            fixed => Some(Self::Fixed(fixed)),
        }
    }
}

/// A validated economic indicator request
#[derive(Debug, Clone, PartialEq)]
pub struct EconomicRequest {
    economic: Economic,
    output: OutputOptions,
}

impl EconomicRequest {
    pub fn indicator_type(&self) -> EconomicIndicator {
        self.economic.indicator_type()
    }

    pub fn economic(&self) -> &Economic {
        &self.economic
    }
}

impl ToolRequest for EconomicRequest {
    const TOOL_NAME: &'static str = "economic";
    const DESCRIPTION: &'static str =
        "US economic indicators: GDP, treasury yields, federal funds rate, CPI, inflation, retail sales, durables, unemployment, payrolls";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let kind = reader.discriminator::<EconomicIndicator>("indicator_type")?;
        let output = reader.output_options(DataType::Json);
        let economic = Economic::read(kind, &mut reader);
        let built = economic.map(|economic| Self { economic, output });
        reader.finish(built)
    }

    fn input_schema() -> Value {
        object_schema(
            "indicator_type",
            choice_property::<EconomicIndicator>("Economic indicator"),
            &[json!({
                "interval": {
                    "type": "string",
                    "enum": Frequency::names(),
                    "description": "real_gdp: annual|quarterly (default annual); treasury_yield, federal_funds_rate: daily|weekly|monthly (default monthly); cpi: monthly|semiannual (default monthly)"
                },
                "maturity": {
                    "type": "string",
                    "enum": Maturity::names(),
                    "description": "treasury_yield only (required)"
                }
            })],
            DataType::Json,
        )
    }
}

impl Route for EconomicRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.indicator_type().function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        params.insert_opt("interval", self.economic.interval());
        if let Economic::TreasuryYield { maturity, .. } = self.economic {
            params.insert("maturity", maturity);
        }
        params.insert("datatype", self.output.datatype);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        ensure_flags(self.output.flags)?;
        let allowed = match &self.economic {
            Economic::RealGdp { .. } => GDP_INTERVALS,
            Economic::TreasuryYield { .. } | Economic::FederalFundsRate { .. } => RATE_INTERVALS,
            Economic::Cpi { .. } => CPI_INTERVALS,
            Economic::Fixed(_) => return Ok(()),
        };
        match self.economic.interval() {
            Some(interval) if !allowed.contains(&interval) => Err(RoutingError::invalid(format!(
                "interval '{}' is not supported for {}",
                interval,
                self.indicator_type()
            ))),
            _ => Ok(()),
        }
    }

    fn output(&self) -> OutputOptions {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_params;

    fn parse(value: serde_json::Value) -> Result<EconomicRequest, ValidationErrors> {
        EconomicRequest::from_params(&test_params(value))
    }

    #[test]
    fn test_treasury_yield_requires_maturity() {
        let err = parse(json!({"indicator_type": "treasury_yield"})).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err.messages()[0].contains("maturity"));
        assert!(err.messages()[0].contains("requires"));
    }

    #[test]
    fn test_treasury_yield_defaults() {
        let routed = parse(json!({"indicator_type": "treasury_yield", "maturity": "10year"}))
            .unwrap()
            .route()
            .unwrap();
        assert_eq!(routed.function, "TREASURY_YIELD");
        assert_eq!(routed.params.get("interval"), Some("monthly"));
        assert_eq!(routed.params.get("maturity"), Some("10year"));
        assert_eq!(routed.params.get("datatype"), Some("json"));
    }

    #[test]
    fn test_interval_sets_per_indicator() {
        let routed = parse(json!({"indicator_type": "real_gdp"})).unwrap().route().unwrap();
        assert_eq!(routed.params.get("interval"), Some("annual"));
        assert!(parse(json!({"indicator_type": "real_gdp", "interval": "monthly"}))
            .unwrap_err()
            .mentions("interval"));

        assert!(parse(json!({"indicator_type": "cpi", "interval": "semiannual"})).is_ok());
        assert!(parse(json!({"indicator_type": "cpi", "interval": "daily"})).is_err());
        assert!(parse(json!({"indicator_type": "federal_funds_rate", "interval": "daily"})).is_ok());
    }

    #[test]
    fn test_fixed_series_take_no_fields() {
        for kind in [
            "real_gdp_per_capita",
            "inflation",
            "retail_sales",
            "durables",
            "unemployment",
            "nonfarm_payroll",
        ] {
            let routed = parse(json!({"indicator_type": kind})).unwrap().route().unwrap();
            assert_eq!(routed.function, kind.to_uppercase());
            assert!(!routed.params.contains_key("interval"));
            let err = parse(json!({"indicator_type": kind, "interval": "monthly"})).unwrap_err();
            assert_eq!(
                err.messages(),
                &[format!("'interval' is not allowed when indicator_type='{}'", kind)]
            );
        }
    }

    #[test]
    fn test_maturity_forbidden_elsewhere() {
        let err = parse(json!({"indicator_type": "cpi", "maturity": "2year"})).unwrap_err();
        assert!(err.mentions("maturity"));
    }

    #[test]
    fn test_api_function_name_total() {
        for kind in EconomicIndicator::ALL {
            assert_eq!(api_function_name(kind.as_str()).unwrap(), kind.function_name());
        }
        assert!(api_function_name("gdp").is_err());
    }

    #[test]
    fn test_validate_routing_rejects_foreign_interval() {
        let request = EconomicRequest {
            economic: Economic::Cpi {
                interval: Frequency::Daily,
            },
            output: OutputOptions::new(DataType::Json),
        };
        assert!(request.route().is_err());
    }
}
