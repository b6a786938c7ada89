//! Foreign exchange rates and FX time series

use serde_json::{json, Value};

use super::routing::{ensure_flags, ensure_present, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, Interval, OutputOptions, OutputSize, Params,
    ToolRequest, ValidationErrors,
};

choice_enum! {
    pub enum Timeframe {
        ExchangeRate => "exchange_rate",
        Intraday => "intraday",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
    }
}

impl Timeframe {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::ExchangeRate => "CURRENCY_EXCHANGE_RATE",
            Self::Intraday => "FX_INTRADAY",
            Self::Daily => "FX_DAILY",
            Self::Weekly => "FX_WEEKLY",
            Self::Monthly => "FX_MONTHLY",
        }
    }
}

const FIELDS: &[&str] = &[
    "timeframe",
    "from_symbol",
    "to_symbol",
    "interval",
    "outputsize",
    "datatype",
    "force_inline",
    "force_file",
];

pub fn api_function_name(timeframe: &str) -> Result<&'static str, RoutingError> {
    Timeframe::parse(timeframe)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("forex timeframe", timeframe))
}

/// A currency pair, e.g. EUR/USD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyPair {
    from_symbol: String,
    to_symbol: String,
}

impl CurrencyPair {
    pub fn from_symbol(&self) -> &str {
        &self.from_symbol
    }

    pub fn to_symbol(&self) -> &str {
        &self.to_symbol
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Forex {
    ExchangeRate(CurrencyPair),
    Intraday {
        pair: CurrencyPair,
        interval: Interval,
        outputsize: OutputSize,
    },
    Daily { pair: CurrencyPair, outputsize: OutputSize },
    Weekly(CurrencyPair),
    Monthly(CurrencyPair),
}

impl Forex {
    pub fn timeframe(&self) -> Timeframe {
        match self {
            Self::ExchangeRate(_) => Timeframe::ExchangeRate,
            Self::Intraday { .. } => Timeframe::Intraday,
            Self::Daily { .. } => Timeframe::Daily,
            Self::Weekly(_) => Timeframe::Weekly,
            Self::Monthly(_) => Timeframe::Monthly,
        }
    }

    pub fn pair(&self) -> &CurrencyPair {
        match self {
            Self::ExchangeRate(pair) | Self::Weekly(pair) | Self::Monthly(pair) => pair,
            Self::Intraday { pair, .. } | Self::Daily { pair, .. } => pair,
        }
    }

    fn read(kind: Timeframe, reader: &mut FieldReader<'_>) -> Option<Self> {
        let from_symbol = reader.required_str("from_symbol");
        let to_symbol = reader.required_str("to_symbol");
        let pair = from_symbol
            .zip(to_symbol)
            .map(|(from_symbol, to_symbol)| CurrencyPair { from_symbol, to_symbol });

        match kind {
            Timeframe::ExchangeRate => pair.map(Self::ExchangeRate),
            Timeframe::Intraday => {
                let interval = reader.required_choice_in("interval", Interval::INTRADAY);
                let outputsize = reader.optional_choice("outputsize", OutputSize::Compact);
                pair.zip(interval).map(|(pair, interval)| Self::Intraday {
                    pair,
                    interval,
                    outputsize,
                })
            }
            Timeframe::Daily => {
                let outputsize = reader.optional_choice("outputsize", OutputSize::Compact);
                pair.map(|pair| Self::Daily { pair, outputsize })
            }
            Timeframe::Weekly => pair.map(Self::Weekly),
            Timeframe::Monthly => pair.map(Self::Monthly),
        }
    }
}

/// A validated forex request
#[derive(Debug, Clone, PartialEq)]
pub struct ForexRequest {
    forex: Forex,
    output: OutputOptions,
}

impl ForexRequest {
    pub fn timeframe(&self) -> Timeframe {
        self.forex.timeframe()
    }

    pub fn forex(&self) -> &Forex {
        &self.forex
    }
}

impl ToolRequest for ForexRequest {
    const TOOL_NAME: &'static str = "forex";
    const DESCRIPTION: &'static str = "Foreign exchange rates and FX intraday, daily, weekly, monthly series";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let kind = reader.discriminator::<Timeframe>("timeframe")?;
        let output = reader.output_options(DataType::Csv);
        let forex = Forex::read(kind, &mut reader);
        let built = forex.map(|forex| Self { forex, output });
        reader.finish(built)
    }

    fn input_schema() -> Value {
        object_schema(
            "timeframe",
            choice_property::<Timeframe>("Exchange rate or series timeframe"),
            &[json!({
                "from_symbol": {"type": "string", "description": "Base currency, e.g. EUR"},
                "to_symbol": {"type": "string", "description": "Quote currency, e.g. USD"},
                "interval": {
                    "type": "string",
                    "enum": Interval::INTRADAY.iter().map(|i| i.as_str()).collect::<Vec<_>>(),
                    "description": "intraday only"
                },
                "outputsize": {"type": "string", "enum": OutputSize::names(), "description": "intraday and daily (default: compact)"}
            })],
            DataType::Csv,
        )
    }
}

impl Route for ForexRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.timeframe().function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        let pair = self.forex.pair();
        // the exchange rate endpoint is shared with crypto and names the pair differently
        if let Forex::ExchangeRate(_) = self.forex {
            params.insert("from_currency", &pair.from_symbol);
            params.insert("to_currency", &pair.to_symbol);
        } else {
            params.insert("from_symbol", &pair.from_symbol);
            params.insert("to_symbol", &pair.to_symbol);
        }
        match &self.forex {
            Forex::Intraday {
                interval, outputsize, ..
            } => {
                params.insert("interval", interval);
                params.insert("outputsize", outputsize);
            }
            Forex::Daily { outputsize, .. } => params.insert("outputsize", outputsize),
            _ => {}
        }
        params.insert("datatype", self.output.datatype);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        ensure_flags(self.output.flags)?;
        let context = self.timeframe().as_str();
        let pair = self.forex.pair();
        ensure_present("from_symbol", &pair.from_symbol, context)?;
        ensure_present("to_symbol", &pair.to_symbol, context)
    }

    fn output(&self) -> OutputOptions {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_params;

    fn with(kind: &str, extra: serde_json::Value) -> Result<ForexRequest, ValidationErrors> {
        let mut params = test_params(json!({"timeframe": kind, "from_symbol": "EUR", "to_symbol": "USD"}));
        params.extend(test_params(extra));
        ForexRequest::from_params(&params)
    }

    #[test]
    fn test_exchange_rate_renames_pair() {
        let routed = with("exchange_rate", json!({})).unwrap().route().unwrap();
        assert_eq!(routed.function, "CURRENCY_EXCHANGE_RATE");
        assert_eq!(routed.params.get("from_currency"), Some("EUR"));
        assert_eq!(routed.params.get("to_currency"), Some("USD"));
        assert!(!routed.params.contains_key("from_symbol"));
    }

    #[test]
    fn test_intraday() {
        let routed = with("intraday", json!({"interval": "15min", "outputsize": "full"}))
            .unwrap()
            .route()
            .unwrap();
        assert_eq!(routed.function, "FX_INTRADAY");
        assert_eq!(routed.params.get("from_symbol"), Some("EUR"));
        assert_eq!(routed.params.get("interval"), Some("15min"));
        assert_eq!(routed.params.get("outputsize"), Some("full"));
        assert!(with("intraday", json!({})).unwrap_err().mentions("interval"));
    }

    #[test]
    fn test_daily_outputsize_default() {
        let routed = with("daily", json!({})).unwrap().route().unwrap();
        assert_eq!(routed.function, "FX_DAILY");
        assert_eq!(routed.params.get("outputsize"), Some("compact"));
        assert!(with("daily", json!({"interval": "5min"})).unwrap_err().mentions("interval"));
    }

    #[test]
    fn test_weekly_monthly_forbid_outputsize() {
        for (kind, function) in [("weekly", "FX_WEEKLY"), ("monthly", "FX_MONTHLY")] {
            let routed = with(kind, json!({})).unwrap().route().unwrap();
            assert_eq!(routed.function, function);
            assert!(with(kind, json!({"outputsize": "full"})).unwrap_err().mentions("outputsize"));
        }
    }

    #[test]
    fn test_missing_pair() {
        let err = ForexRequest::from_params(&test_params(json!({"timeframe": "weekly"}))).unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(err.mentions("from_symbol"));
        assert!(err.mentions("to_symbol"));
    }

    #[test]
    fn test_unknown_timeframe() {
        assert_eq!(
            api_function_name("hourly").unwrap_err().to_string(),
            "Unknown forex timeframe: hourly"
        );
        for kind in Timeframe::ALL {
            assert_eq!(api_function_name(kind.as_str()).unwrap(), kind.function_name());
        }
    }
}
