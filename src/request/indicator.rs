//! Fields shared by every technical indicator request

use serde_json::{json, Value};

use super::fields::FieldReader;
use super::routing::{ensure_month_intraday, ensure_present, ApiParams, RoutingError};
use super::types::{Interval, Month};
use super::Choice;

/// Upper bound for `time_period` style fields
pub(crate) const MAX_PERIOD: u32 = 1000;

/// Symbol, interval and optional intraday month
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorBase {
    symbol: String,
    interval: Interval,
    month: Option<Month>,
}

impl IndicatorBase {
    /// Read the shared fields; `month` is only accepted with intraday intervals
    pub(crate) fn read(reader: &mut FieldReader<'_>, intervals: &[Interval]) -> Option<Self> {
        let symbol = reader.required_str("symbol");
        let interval = reader.required_choice_in("interval", intervals);
        let intraday = interval.map(|i| i.is_intraday()).unwrap_or(true);
        let month = reader.optional_month("month", intraday);
        match (symbol, interval) {
            (Some(symbol), Some(interval)) => Some(Self {
                symbol,
                interval,
                month,
            }),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn month(&self) -> Option<Month> {
        self.month
    }

    pub(crate) fn write(&self, params: &mut ApiParams) {
        params.insert("symbol", &self.symbol);
        params.insert("interval", self.interval);
        if self.interval.is_intraday() {
            params.insert_opt("month", self.month);
        }
    }

    pub(crate) fn validate(&self, context: &str) -> Result<(), RoutingError> {
        ensure_present("symbol", &self.symbol, context)?;
        ensure_month_intraday(self.month, self.interval)
    }

    /// Schema properties for the shared fields
    pub(crate) fn schema_properties() -> Value {
        json!({
            "symbol": {"type": "string", "description": "Ticker symbol, e.g. IBM"},
            "interval": {
                "type": "string",
                "enum": Interval::names(),
                "description": "Bar interval"
            },
            "month": {
                "type": "string",
                "description": "YYYY-MM, intraday intervals only (2000-01 or later)"
            }
        })
    }
}

#[cfg(test)]
impl IndicatorBase {
    pub(crate) fn for_test(symbol: &str, interval: Interval, month: Option<Month>) -> Self {
        Self {
            symbol: symbol.to_string(),
            interval,
            month,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Params;
    use serde_json::json;

    const INDICATOR_FIELDS: &[&str] = &["symbol", "interval", "month", "datatype", "force_inline", "force_file"];

    fn read(value: serde_json::Value) -> Option<IndicatorBase> {
        let params: Params = value.as_object().unwrap().clone();
        let mut reader = FieldReader::new(&params, INDICATOR_FIELDS);
        IndicatorBase::read(&mut reader, Interval::ALL)
    }

    #[test]
    fn test_read_daily() {
        let base = read(json!({"symbol": "IBM", "interval": "daily"})).unwrap();
        assert_eq!(base.symbol(), "IBM");
        assert_eq!(base.interval(), Interval::Daily);
        assert!(base.month().is_none());
    }

    #[test]
    fn test_read_intraday_month() {
        let base = read(json!({"symbol": "IBM", "interval": "5min", "month": "2023-07"})).unwrap();
        assert_eq!(base.month().unwrap().to_string(), "2023-07");
    }

    #[test]
    fn test_month_only_written_for_intraday() {
        let month = Month::parse("2023-07").ok();
        let mut params = ApiParams::new();
        IndicatorBase::for_test("IBM", Interval::Daily, month).write(&mut params);
        assert!(!params.contains_key("month"));

        let mut params = ApiParams::new();
        IndicatorBase::for_test("IBM", Interval::OneMin, month).write(&mut params);
        assert_eq!(params.get("month"), Some("2023-07"));
    }

    #[test]
    fn test_validate_catches_daily_month() {
        let month = Month::parse("2023-07").ok();
        let base = IndicatorBase::for_test("IBM", Interval::Weekly, month);
        assert!(base.validate("sma").is_err());
    }
}
