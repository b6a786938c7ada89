//! Core stock time series, quotes, symbol search and market status

use serde_json::{json, Value};

use super::routing::{ensure_flags, ensure_present, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, Interval, Month, OutputOptions, OutputSize,
    Params, ToolRequest, ValidationErrors,
};

choice_enum! {
    pub enum TimeSeriesType {
        Intraday => "intraday",
        Daily => "daily",
        DailyAdjusted => "daily_adjusted",
        Weekly => "weekly",
        WeeklyAdjusted => "weekly_adjusted",
        Monthly => "monthly",
        MonthlyAdjusted => "monthly_adjusted",
        Quote => "quote",
        BulkQuotes => "bulk_quotes",
        Search => "search",
        MarketStatus => "market_status",
    }
}

impl TimeSeriesType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Intraday => "TIME_SERIES_INTRADAY",
            Self::Daily => "TIME_SERIES_DAILY",
            Self::DailyAdjusted => "TIME_SERIES_DAILY_ADJUSTED",
            Self::Weekly => "TIME_SERIES_WEEKLY",
            Self::WeeklyAdjusted => "TIME_SERIES_WEEKLY_ADJUSTED",
            Self::Monthly => "TIME_SERIES_MONTHLY",
            Self::MonthlyAdjusted => "TIME_SERIES_MONTHLY_ADJUSTED",
            Self::Quote => "GLOBAL_QUOTE",
            Self::BulkQuotes => "REALTIME_BULK_QUOTES",
            Self::Search => "SYMBOL_SEARCH",
            Self::MarketStatus => "MARKET_STATUS",
        }
    }
}

/// Upstream limit on symbols per bulk quote call
pub const MAX_BULK_SYMBOLS: usize = 100;

const FIELDS: &[&str] = &[
    "series_type",
    "symbol",
    "symbols",
    "keywords",
    "interval",
    "adjusted",
    "extended_hours",
    "month",
    "outputsize",
    "datatype",
    "force_inline",
    "force_file",
];

pub fn api_function_name(series_type: &str) -> Result<&'static str, RoutingError> {
    TimeSeriesType::parse(series_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("time series type", series_type))
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimeSeries {
    Intraday {
        symbol: String,
        interval: Interval,
        adjusted: bool,
        extended_hours: bool,
        month: Option<Month>,
        outputsize: OutputSize,
    },
    /// daily and daily_adjusted
    Daily {
        series: TimeSeriesType,
        symbol: String,
        outputsize: OutputSize,
    },
    /// weekly, monthly (plus adjusted) and quote
    Symbol { series: TimeSeriesType, symbol: String },
    BulkQuotes { symbols: Vec<String> },
    Search { keywords: String },
    MarketStatus,
}

impl TimeSeries {
    pub fn series_type(&self) -> TimeSeriesType {
        match self {
            Self::Intraday { .. } => TimeSeriesType::Intraday,
            Self::Daily { series, .. } | Self::Symbol { series, .. } => *series,
            Self::BulkQuotes { .. } => TimeSeriesType::BulkQuotes,
            Self::Search { .. } => TimeSeriesType::Search,
            Self::MarketStatus => TimeSeriesType::MarketStatus,
        }
    }

    fn read(kind: TimeSeriesType, reader: &mut FieldReader<'_>) -> Option<Self> {
        match kind {
            TimeSeriesType::Intraday => {
                let symbol = reader.required_str("symbol");
                let interval = reader.required_choice_in("interval", Interval::INTRADAY);
                let adjusted = reader.optional_bool("adjusted", true);
                let extended_hours = reader.optional_bool("extended_hours", true);
                let month = reader.optional_month("month", true);
                let outputsize = reader.optional_choice("outputsize", OutputSize::Compact);
                symbol.zip(interval).map(|(symbol, interval)| Self::Intraday {
                    symbol,
                    interval,
                    adjusted,
                    extended_hours,
                    month,
                    outputsize,
                })
            }
            TimeSeriesType::Daily | TimeSeriesType::DailyAdjusted => {
                let symbol = reader.required_str("symbol");
                let outputsize = reader.optional_choice("outputsize", OutputSize::Compact);
                symbol.map(|symbol| Self::Daily {
                    series: kind,
                    symbol,
                    outputsize,
                })
            }
            TimeSeriesType::BulkQuotes => {
                let symbols = reader.required_str("symbols")?;
                let symbols = split_symbols(&symbols);
                if symbols.is_empty() {
                    reader.invalid("'symbols' must list at least one symbol");
                    return None;
                }
                if symbols.len() > MAX_BULK_SYMBOLS {
                    reader.invalid(format!(
                        "'symbols' accepts at most {} symbols (got {})",
                        MAX_BULK_SYMBOLS,
                        symbols.len()
                    ));
                    return None;
                }
                Some(Self::BulkQuotes { symbols })
            }
            TimeSeriesType::Search => reader
                .required_str("keywords")
                .map(|keywords| Self::Search { keywords }),
            TimeSeriesType::MarketStatus => Some(Self::MarketStatus),
            series => reader
                .required_str("symbol")
                .map(|symbol| Self::Symbol { series, symbol }),
        }
    }
}

fn split_symbols(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// A validated time series request
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRequest {
    series: TimeSeries,
    output: OutputOptions,
}

impl TimeSeriesRequest {
    pub fn series_type(&self) -> TimeSeriesType {
        self.series.series_type()
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }
}

impl ToolRequest for TimeSeriesRequest {
    const TOOL_NAME: &'static str = "time_series";
    const DESCRIPTION: &'static str =
        "Stock time series (intraday, daily, weekly, monthly), quotes, bulk quotes, symbol search and market status";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let kind = reader.discriminator::<TimeSeriesType>("series_type")?;
        let output = reader.output_options(DataType::Csv);
        let series = TimeSeries::read(kind, &mut reader);
        let built = series.map(|series| Self { series, output });
        reader.finish(built)
    }

    fn input_schema() -> Value {
        object_schema(
            "series_type",
            choice_property::<TimeSeriesType>("Kind of time series or quote data"),
            &[json!({
                "symbol": {"type": "string", "description": "Ticker symbol (all series except bulk_quotes, search, market_status)"},
                "symbols": {
                    "type": "string",
                    "description": format!("bulk_quotes only: comma separated list, at most {} symbols", MAX_BULK_SYMBOLS)
                },
                "keywords": {"type": "string", "description": "search only"},
                "interval": {
                    "type": "string",
                    "enum": Interval::INTRADAY.iter().map(|i| i.as_str()).collect::<Vec<_>>(),
                    "description": "intraday only"
                },
                "adjusted": {"type": "boolean", "description": "intraday only (default: true)"},
                "extended_hours": {"type": "boolean", "description": "intraday only (default: true)"},
                "month": {"type": "string", "description": "intraday only: YYYY-MM (2000-01 or later)"},
                "outputsize": {
                    "type": "string",
                    "enum": OutputSize::names(),
                    "description": "intraday, daily, daily_adjusted (default: compact)"
                }
            })],
            DataType::Csv,
        )
    }
}

impl Route for TimeSeriesRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.series_type().function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        match &self.series {
            TimeSeries::Intraday {
                symbol,
                interval,
                adjusted,
                extended_hours,
                month,
                outputsize,
            } => {
                params.insert("symbol", symbol);
                params.insert("interval", interval);
                params.insert_bool("adjusted", *adjusted);
                params.insert_bool("extended_hours", *extended_hours);
                params.insert_opt("month", *month);
                params.insert("outputsize", outputsize);
            }
            TimeSeries::Daily {
                symbol, outputsize, ..
            } => {
                params.insert("symbol", symbol);
                params.insert("outputsize", outputsize);
            }
            TimeSeries::Symbol { symbol, .. } => params.insert("symbol", symbol),
            TimeSeries::BulkQuotes { symbols } => params.insert("symbol", symbols.join(",")),
            TimeSeries::Search { keywords } => params.insert("keywords", keywords),
            TimeSeries::MarketStatus => {}
        }
        params.insert("datatype", self.output.datatype);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        ensure_flags(self.output.flags)?;
        let context = self.series_type().as_str();
        match &self.series {
            TimeSeries::Intraday { symbol, interval, .. } => {
                ensure_present("symbol", symbol, context)?;
                if !interval.is_intraday() {
                    return Err(RoutingError::invalid(format!(
                        "intraday series requires an intraday interval, not {}",
                        interval
                    )));
                }
                Ok(())
            }
            TimeSeries::Daily { symbol, .. } | TimeSeries::Symbol { symbol, .. } => {
                ensure_present("symbol", symbol, context)
            }
            TimeSeries::BulkQuotes { symbols } => {
                if symbols.is_empty() || symbols.len() > MAX_BULK_SYMBOLS {
                    return Err(RoutingError::invalid(format!(
                        "bulk_quotes requires between 1 and {} symbols",
                        MAX_BULK_SYMBOLS
                    )));
                }
                Ok(())
            }
            TimeSeries::Search { keywords } => ensure_present("keywords", keywords, context),
            TimeSeries::MarketStatus => Ok(()),
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

    fn parse(value: serde_json::Value) -> Result<TimeSeriesRequest, ValidationErrors> {
        TimeSeriesRequest::from_params(&test_params(value))
    }

    #[test]
    fn test_intraday_defaults() {
        let request = parse(json!({"series_type": "intraday", "symbol": "IBM", "interval": "5min"})).unwrap();
        let routed = request.route().unwrap();
        assert_eq!(routed.function, "TIME_SERIES_INTRADAY");
        assert_eq!(routed.params.get("adjusted"), Some("true"));
        assert_eq!(routed.params.get("extended_hours"), Some("true"));
        assert_eq!(routed.params.get("outputsize"), Some("compact"));
        assert_eq!(routed.params.get("datatype"), Some("csv"));
        assert!(!routed.params.contains_key("month"));
    }

    #[test]
    fn test_intraday_booleans_sent_as_literals() {
        let request = parse(json!({
            "series_type": "intraday",
            "symbol": "IBM",
            "interval": "60min",
            "adjusted": false,
            "extended_hours": "false",
            "month": "2023-11"
        }))
        .unwrap();
        let routed = request.route().unwrap();
        assert_eq!(routed.params.get("adjusted"), Some("false"));
        assert_eq!(routed.params.get("extended_hours"), Some("false"));
        assert_eq!(routed.params.get("month"), Some("2023-11"));
    }

    #[test]
    fn test_intraday_rejects_daily_interval() {
        let err = parse(json!({"series_type": "intraday", "symbol": "IBM", "interval": "daily"})).unwrap_err();
        assert!(err.mentions("interval"));
    }

    #[test]
    fn test_daily_forbids_intraday_fields() {
        let err = parse(json!({"series_type": "daily", "symbol": "IBM", "interval": "5min"})).unwrap_err();
        assert_eq!(
            err.messages(),
            &["'interval' is not allowed when series_type='daily'".to_string()]
        );
        let routed = parse(json!({"series_type": "daily_adjusted", "symbol": "IBM", "outputsize": "full"}))
            .unwrap()
            .route()
            .unwrap();
        assert_eq!(routed.function, "TIME_SERIES_DAILY_ADJUSTED");
        assert_eq!(routed.params.get("outputsize"), Some("full"));
    }

    #[test]
    fn test_weekly_monthly_and_quote() {
        for (kind, function) in [
            ("weekly", "TIME_SERIES_WEEKLY"),
            ("weekly_adjusted", "TIME_SERIES_WEEKLY_ADJUSTED"),
            ("monthly", "TIME_SERIES_MONTHLY"),
            ("monthly_adjusted", "TIME_SERIES_MONTHLY_ADJUSTED"),
            ("quote", "GLOBAL_QUOTE"),
        ] {
            let routed = parse(json!({"series_type": kind, "symbol": "MSFT"})).unwrap().route().unwrap();
            assert_eq!(routed.function, function);
            assert_eq!(routed.params.get("symbol"), Some("MSFT"));
            assert!(parse(json!({"series_type": kind, "symbol": "MSFT", "outputsize": "full"}))
                .unwrap_err()
                .mentions("outputsize"));
        }
    }

    #[test]
    fn test_bulk_quotes_sends_symbol_key() {
        let request = parse(json!({"series_type": "bulk_quotes", "symbols": "AAPL,MSFT"})).unwrap();
        let routed = request.route().unwrap();
        assert_eq!(routed.function, "REALTIME_BULK_QUOTES");
        assert_eq!(routed.params.get("symbol"), Some("AAPL,MSFT"));
        assert!(!routed.params.contains_key("symbols"));
    }

    #[test]
    fn test_bulk_quotes_limit() {
        let symbols: Vec<String> = (0..101).map(|i| format!("S{}", i)).collect();
        let err = parse(json!({"series_type": "bulk_quotes", "symbols": symbols.join(",")})).unwrap_err();
        assert!(err.mentions("at most 100"));
        let err = parse(json!({"series_type": "bulk_quotes", "symbols": " , "})).unwrap_err();
        assert!(err.mentions("symbols"));
    }

    #[test]
    fn test_bulk_quotes_rejects_symbol() {
        let err = parse(json!({"series_type": "bulk_quotes", "symbols": "AAPL", "symbol": "IBM"})).unwrap_err();
        assert!(err.mentions("'symbol' is not allowed"));
    }

    #[test]
    fn test_search_and_market_status() {
        let routed = parse(json!({"series_type": "search", "keywords": "tesla"})).unwrap().route().unwrap();
        assert_eq!(routed.function, "SYMBOL_SEARCH");
        assert_eq!(routed.params.get("keywords"), Some("tesla"));

        let routed = parse(json!({"series_type": "market_status"})).unwrap().route().unwrap();
        assert_eq!(routed.function, "MARKET_STATUS");
        assert_eq!(routed.params.len(), 1);

        let err = parse(json!({"series_type": "search"})).unwrap_err();
        assert_eq!(
            err.messages(),
            &["'keywords' is required: series_type='search' requires it".to_string()]
        );
    }

    #[test]
    fn test_force_flags_mutually_exclusive() {
        let err = parse(json!({
            "series_type": "market_status",
            "force_inline": true,
            "force_file": true
        }))
        .unwrap_err();
        assert!(err.mentions("mutually exclusive"));
    }

    #[test]
    fn test_api_function_name_total() {
        for kind in TimeSeriesType::ALL {
            assert_eq!(api_function_name(kind.as_str()).unwrap(), kind.function_name());
        }
        assert_eq!(
            api_function_name("hourly").unwrap_err().to_string(),
            "Unknown time series type: hourly"
        );
    }

    #[test]
    fn test_validate_routing_rejects_blank_symbol() {
        let request = TimeSeriesRequest {
            series: TimeSeries::Symbol {
                series: TimeSeriesType::Quote,
                symbol: " ".to_string(),
            },
            output: OutputOptions::new(DataType::Json),
        };
        assert!(matches!(request.route(), Err(RoutingError::InvalidRequest(_))));
    }
}
