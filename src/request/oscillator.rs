//! Momentum oscillators (MACD, stochastics, RSI and friends)

use serde_json::{json, Value};

use super::indicator::{IndicatorBase, MAX_PERIOD};
use super::routing::{ensure_flags, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, Interval, OutputOptions, Params, SeriesType,
    ToolRequest, ValidationErrors,
};

choice_enum! {
    pub enum OscillatorType {
        Macd => "macd",
        Macdext => "macdext",
        Stoch => "stoch",
        Stochf => "stochf",
        Rsi => "rsi",
        Stochrsi => "stochrsi",
        Willr => "willr",
        Mom => "mom",
        Roc => "roc",
        Rocr => "rocr",
        Cmo => "cmo",
        Trix => "trix",
        Apo => "apo",
        Ppo => "ppo",
        Bop => "bop",
        Cci => "cci",
        Mfi => "mfi",
        Ultosc => "ultosc",
    }
}

impl OscillatorType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Macd => "MACD",
            Self::Macdext => "MACDEXT",
            Self::Stoch => "STOCH",
            Self::Stochf => "STOCHF",
            Self::Rsi => "RSI",
            Self::Stochrsi => "STOCHRSI",
            Self::Willr => "WILLR",
            Self::Mom => "MOM",
            Self::Roc => "ROC",
            Self::Rocr => "ROCR",
            Self::Cmo => "CMO",
            Self::Trix => "TRIX",
            Self::Apo => "APO",
            Self::Ppo => "PPO",
            Self::Bop => "BOP",
            Self::Cci => "CCI",
            Self::Mfi => "MFI",
            Self::Ultosc => "ULTOSC",
        }
    }
}

const FIELDS: &[&str] = &[
    "indicator_type",
    "symbol",
    "interval",
    "month",
    "time_period",
    "series_type",
    "fastperiod",
    "slowperiod",
    "signalperiod",
    "fastmatype",
    "slowmatype",
    "signalmatype",
    "matype",
    "fastkperiod",
    "slowkperiod",
    "slowdperiod",
    "slowkmatype",
    "slowdmatype",
    "fastdperiod",
    "fastdmatype",
    "timeperiod1",
    "timeperiod2",
    "timeperiod3",
    "datatype",
    "force_inline",
    "force_file",
];

/// Moving average types are encoded 0 (SMA) through 8 (MAMA)
const MAX_MATYPE: u32 = 8;

pub fn api_function_name(indicator_type: &str) -> Result<&'static str, RoutingError> {
    OscillatorType::parse(indicator_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("oscillator type", indicator_type))
}

/// Variant-specific parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Oscillator {
    Macd {
        series_type: SeriesType,
        fastperiod: u32,
        slowperiod: u32,
        signalperiod: u32,
    },
    Macdext {
        series_type: SeriesType,
        fastperiod: u32,
        slowperiod: u32,
        signalperiod: u32,
        fastmatype: u32,
        slowmatype: u32,
        signalmatype: u32,
    },
    Stoch {
        fastkperiod: u32,
        slowkperiod: u32,
        slowdperiod: u32,
        slowkmatype: u32,
        slowdmatype: u32,
    },
    Stochf {
        fastkperiod: u32,
        fastdperiod: u32,
        fastdmatype: u32,
    },
    /// RSI, MOM, ROC, ROCR, CMO, TRIX
    PeriodSeries {
        indicator: OscillatorType,
        time_period: u32,
        series_type: SeriesType,
    },
    Stochrsi {
        time_period: u32,
        series_type: SeriesType,
        fastkperiod: u32,
        fastdperiod: u32,
        fastdmatype: u32,
    },
    /// WILLR, CCI, MFI
    Period {
        indicator: OscillatorType,
        time_period: u32,
    },
    /// APO, PPO
    PriceOscillator {
        indicator: OscillatorType,
        series_type: SeriesType,
        fastperiod: u32,
        slowperiod: u32,
        matype: u32,
    },
    Bop,
    Ultosc {
        timeperiod1: u32,
        timeperiod2: u32,
        timeperiod3: u32,
    },
}

impl Oscillator {
    pub fn indicator_type(&self) -> OscillatorType {
        match self {
            Self::Macd { .. } => OscillatorType::Macd,
            Self::Macdext { .. } => OscillatorType::Macdext,
            Self::Stoch { .. } => OscillatorType::Stoch,
            Self::Stochf { .. } => OscillatorType::Stochf,
            Self::PeriodSeries { indicator, .. } => *indicator,
            Self::Stochrsi { .. } => OscillatorType::Stochrsi,
            Self::Period { indicator, .. } => *indicator,
            Self::PriceOscillator { indicator, .. } => *indicator,
            Self::Bop => OscillatorType::Bop,
            Self::Ultosc { .. } => OscillatorType::Ultosc,
        }
    }

    fn read(kind: OscillatorType, reader: &mut FieldReader<'_>) -> Option<Self> {
        use OscillatorType as T;

        match kind {
            T::Macd => {
                let series_type = reader.required_choice::<SeriesType>("series_type");
                let fastperiod = reader.optional_u32("fastperiod", 12, 1, MAX_PERIOD);
                let slowperiod = reader.optional_u32("slowperiod", 26, 1, MAX_PERIOD);
                let signalperiod = reader.optional_u32("signalperiod", 9, 1, MAX_PERIOD);
                series_type.map(|series_type| Self::Macd {
                    series_type,
                    fastperiod,
                    slowperiod,
                    signalperiod,
                })
            }
            T::Macdext => {
                let series_type = reader.required_choice::<SeriesType>("series_type");
                let fastperiod = reader.optional_u32("fastperiod", 12, 1, MAX_PERIOD);
                let slowperiod = reader.optional_u32("slowperiod", 26, 1, MAX_PERIOD);
                let signalperiod = reader.optional_u32("signalperiod", 9, 1, MAX_PERIOD);
                let fastmatype = reader.optional_u32("fastmatype", 0, 0, MAX_MATYPE);
                let slowmatype = reader.optional_u32("slowmatype", 0, 0, MAX_MATYPE);
                let signalmatype = reader.optional_u32("signalmatype", 0, 0, MAX_MATYPE);
                series_type.map(|series_type| Self::Macdext {
                    series_type,
                    fastperiod,
                    slowperiod,
                    signalperiod,
                    fastmatype,
                    slowmatype,
                    signalmatype,
                })
            }
            T::Stoch => Some(Self::Stoch {
                fastkperiod: reader.optional_u32("fastkperiod", 5, 1, MAX_PERIOD),
                slowkperiod: reader.optional_u32("slowkperiod", 3, 1, MAX_PERIOD),
                slowdperiod: reader.optional_u32("slowdperiod", 3, 1, MAX_PERIOD),
                slowkmatype: reader.optional_u32("slowkmatype", 0, 0, MAX_MATYPE),
                slowdmatype: reader.optional_u32("slowdmatype", 0, 0, MAX_MATYPE),
            }),
            T::Stochf => Some(Self::Stochf {
                fastkperiod: reader.optional_u32("fastkperiod", 5, 1, MAX_PERIOD),
                fastdperiod: reader.optional_u32("fastdperiod", 3, 1, MAX_PERIOD),
                fastdmatype: reader.optional_u32("fastdmatype", 0, 0, MAX_MATYPE),
            }),
            T::Rsi | T::Mom | T::Roc | T::Rocr | T::Cmo | T::Trix => {
                let time_period = reader.required_u32("time_period", 1, MAX_PERIOD);
                let series_type = reader.required_choice::<SeriesType>("series_type");
                time_period
                    .zip(series_type)
                    .map(|(time_period, series_type)| Self::PeriodSeries {
                        indicator: kind,
                        time_period,
                        series_type,
                    })
            }
            T::Stochrsi => {
                let time_period = reader.required_u32("time_period", 1, MAX_PERIOD);
                let series_type = reader.required_choice::<SeriesType>("series_type");
                let fastkperiod = reader.optional_u32("fastkperiod", 5, 1, MAX_PERIOD);
                let fastdperiod = reader.optional_u32("fastdperiod", 3, 1, MAX_PERIOD);
                let fastdmatype = reader.optional_u32("fastdmatype", 0, 0, MAX_MATYPE);
                time_period
                    .zip(series_type)
                    .map(|(time_period, series_type)| Self::Stochrsi {
                        time_period,
                        series_type,
                        fastkperiod,
                        fastdperiod,
                        fastdmatype,
                    })
            }
            T::Willr | T::Cci | T::Mfi => reader
                .required_u32("time_period", 1, MAX_PERIOD)
                .map(|time_period| Self::Period {
                    indicator: kind,
                    time_period,
                }),
            T::Apo | T::Ppo => {
                let series_type = reader.required_choice::<SeriesType>("series_type");
                let fastperiod = reader.optional_u32("fastperiod", 12, 1, MAX_PERIOD);
                let slowperiod = reader.optional_u32("slowperiod", 26, 1, MAX_PERIOD);
                let matype = reader.optional_u32("matype", 0, 0, MAX_MATYPE);
                series_type.map(|series_type| Self::PriceOscillator {
                    indicator: kind,
                    series_type,
                    fastperiod,
                    slowperiod,
                    matype,
                })
            }
            T::Bop => Some(Self::Bop),
            T::Ultosc => Some(Self::Ultosc {
                timeperiod1: reader.optional_u32("timeperiod1", 7, 1, MAX_PERIOD),
                timeperiod2: reader.optional_u32("timeperiod2", 14, 1, MAX_PERIOD),
                timeperiod3: reader.optional_u32("timeperiod3", 28, 1, MAX_PERIOD),
            }),
        }
    }

    fn write(&self, params: &mut ApiParams) {
        match self {
            Self::Macd {
                series_type,
                fastperiod,
                slowperiod,
                signalperiod,
            } => {
                params.insert("series_type", series_type);
                params.insert("fastperiod", fastperiod);
                params.insert("slowperiod", slowperiod);
                params.insert("signalperiod", signalperiod);
            }
            Self::Macdext {
                series_type,
                fastperiod,
                slowperiod,
                signalperiod,
                fastmatype,
                slowmatype,
                signalmatype,
            } => {
                params.insert("series_type", series_type);
                params.insert("fastperiod", fastperiod);
                params.insert("slowperiod", slowperiod);
                params.insert("signalperiod", signalperiod);
                params.insert("fastmatype", fastmatype);
                params.insert("slowmatype", slowmatype);
                params.insert("signalmatype", signalmatype);
            }
            Self::Stoch {
                fastkperiod,
                slowkperiod,
                slowdperiod,
                slowkmatype,
                slowdmatype,
            } => {
                params.insert("fastkperiod", fastkperiod);
                params.insert("slowkperiod", slowkperiod);
                params.insert("slowdperiod", slowdperiod);
                params.insert("slowkmatype", slowkmatype);
                params.insert("slowdmatype", slowdmatype);
            }
            Self::Stochf {
                fastkperiod,
                fastdperiod,
                fastdmatype,
            } => {
                params.insert("fastkperiod", fastkperiod);
                params.insert("fastdperiod", fastdperiod);
                params.insert("fastdmatype", fastdmatype);
            }
            Self::PeriodSeries {
                time_period,
                series_type,
                ..
            } => {
                params.insert("time_period", time_period);
                params.insert("series_type", series_type);
            }
            Self::Stochrsi {
                time_period,
                series_type,
                fastkperiod,
                fastdperiod,
                fastdmatype,
            } => {
                params.insert("time_period", time_period);
                params.insert("series_type", series_type);
                params.insert("fastkperiod", fastkperiod);
                params.insert("fastdperiod", fastdperiod);
                params.insert("fastdmatype", fastdmatype);
            }
            Self::Period { time_period, .. } => {
                params.insert("time_period", time_period);
            }
            Self::PriceOscillator {
                series_type,
                fastperiod,
                slowperiod,
                matype,
                ..
            } => {
                params.insert("series_type", series_type);
                params.insert("fastperiod", fastperiod);
                params.insert("slowperiod", slowperiod);
                params.insert("matype", matype);
            }
            Self::Bop => {}
            Self::Ultosc {
                timeperiod1,
                timeperiod2,
                timeperiod3,
            } => {
                params.insert("timeperiod1", timeperiod1);
                params.insert("timeperiod2", timeperiod2);
                params.insert("timeperiod3", timeperiod3);
            }
        }
    }
}

/// A validated oscillator request
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorRequest {
    base: IndicatorBase,
    oscillator: Oscillator,
    output: OutputOptions,
}

impl OscillatorRequest {
    pub fn indicator_type(&self) -> OscillatorType {
        self.oscillator.indicator_type()
    }

    pub fn base(&self) -> &IndicatorBase {
        &self.base
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }
}

impl ToolRequest for OscillatorRequest {
    const TOOL_NAME: &'static str = "oscillator";
    const DESCRIPTION: &'static str =
        "Momentum oscillators: MACD, MACDEXT, STOCH, STOCHF, RSI, STOCHRSI, WILLR, MOM, ROC, ROCR, CMO, TRIX, APO, PPO, BOP, CCI, MFI, ULTOSC";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let kind = reader.discriminator::<OscillatorType>("indicator_type")?;
        let output = reader.output_options(DataType::Csv);
        let base = IndicatorBase::read(&mut reader, Interval::ALL);
        let oscillator = Oscillator::read(kind, &mut reader);

        let periods = match &oscillator {
            Some(Oscillator::Macd {
                fastperiod, slowperiod, ..
            })
            | Some(Oscillator::Macdext {
                fastperiod, slowperiod, ..
            })
            | Some(Oscillator::PriceOscillator {
                fastperiod, slowperiod, ..
            }) => Some((*fastperiod, *slowperiod)),
            _ => None,
        };
        if let Some((fast, slow)) = periods {
            if fast >= slow {
                reader.invalid(format!(
                    "'fastperiod' ({}) must be less than 'slowperiod' ({})",
                    fast, slow
                ));
            }
        }

        let built = match (base, oscillator) {
            (Some(base), Some(oscillator)) => Some(Self {
                base,
                oscillator,
                output,
            }),
            _ => None,
        };
        reader.finish(built)
    }

    fn input_schema() -> Value {
        let period = |description: &str| json!({"type": "integer", "description": description});
        object_schema(
            "indicator_type",
            choice_property::<OscillatorType>("Oscillator to compute"),
            &[
                IndicatorBase::schema_properties(),
                json!({
                    "time_period": period("rsi, stochrsi, willr, mom, roc, rocr, cmo, trix, cci, mfi"),
                    "series_type": {
                        "type": "string",
                        "enum": SeriesType::names(),
                        "description": "macd, macdext, rsi, stochrsi, mom, roc, rocr, cmo, trix, apo, ppo"
                    },
                    "fastperiod": period("macd, macdext, apo, ppo (default: 12)"),
                    "slowperiod": period("macd, macdext, apo, ppo (default: 26)"),
                    "signalperiod": period("macd, macdext (default: 9)"),
                    "fastmatype": period("macdext, 0-8 (default: 0)"),
                    "slowmatype": period("macdext, 0-8 (default: 0)"),
                    "signalmatype": period("macdext, 0-8 (default: 0)"),
                    "matype": period("apo, ppo, 0-8 (default: 0)"),
                    "fastkperiod": period("stoch, stochf, stochrsi (default: 5)"),
                    "slowkperiod": period("stoch (default: 3)"),
                    "slowdperiod": period("stoch (default: 3)"),
                    "slowkmatype": period("stoch, 0-8 (default: 0)"),
                    "slowdmatype": period("stoch, 0-8 (default: 0)"),
                    "fastdperiod": period("stochf, stochrsi (default: 3)"),
                    "fastdmatype": period("stochf, stochrsi, 0-8 (default: 0)"),
                    "timeperiod1": period("ultosc (default: 7)"),
                    "timeperiod2": period("ultosc (default: 14)"),
                    "timeperiod3": period("ultosc (default: 28)")
                }),
            ],
            DataType::Csv,
        )
    }
}

impl Route for OscillatorRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.indicator_type().function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        self.base.write(&mut params);
        self.oscillator.write(&mut params);
        params.insert("datatype", self.output.datatype);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        self.base.validate(self.indicator_type().as_str())?;
        ensure_flags(self.output.flags)
    }

    fn output(&self) -> OutputOptions {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_params;

    fn validate(value: serde_json::Value) -> Result<OscillatorRequest, ValidationErrors> {
        OscillatorRequest::from_params(&test_params(value))
    }

    fn base() -> serde_json::Map<String, serde_json::Value> {
        test_params(json!({"symbol": "IBM", "interval": "daily"}))
    }

    fn with(kind: &str, extra: serde_json::Value) -> Result<OscillatorRequest, ValidationErrors> {
        let mut params = base();
        params.insert("indicator_type".into(), json!(kind));
        params.extend(test_params(extra));
        OscillatorRequest::from_params(&params)
    }

    #[test]
    fn test_macd_defaults() {
        let request = with("macd", json!({"series_type": "close"})).unwrap();
        let routed = request.route().unwrap();
        assert_eq!(routed.function, "MACD");
        assert_eq!(routed.params.get("fastperiod"), Some("12"));
        assert_eq!(routed.params.get("slowperiod"), Some("26"));
        assert_eq!(routed.params.get("signalperiod"), Some("9"));
        assert!(!routed.params.contains_key("time_period"));
    }

    #[test]
    fn test_macdext_matypes() {
        let request = with("macdext", json!({"series_type": "close", "fastmatype": 1})).unwrap();
        let routed = request.route().unwrap();
        assert_eq!(routed.function, "MACDEXT");
        assert_eq!(routed.params.get("fastmatype"), Some("1"));
        assert_eq!(routed.params.get("slowmatype"), Some("0"));

        let err = with("macdext", json!({"series_type": "close", "fastmatype": 9})).unwrap_err();
        assert!(err.mentions("fastmatype"));
    }

    #[test]
    fn test_macd_forbids_matype_fields() {
        let err = with("macd", json!({"series_type": "close", "fastmatype": 1})).unwrap_err();
        assert_eq!(
            err.messages(),
            &["'fastmatype' is not allowed when indicator_type='macd'".to_string()]
        );
    }

    #[test]
    fn test_fastperiod_below_slowperiod() {
        let err = with("ppo", json!({"series_type": "close", "fastperiod": 30, "slowperiod": 10})).unwrap_err();
        assert!(err.mentions("fastperiod"));
    }

    #[test]
    fn test_stoch_needs_no_extra_fields() {
        let request = with("stoch", json!({})).unwrap();
        let routed = request.route().unwrap();
        assert_eq!(routed.function, "STOCH");
        assert_eq!(routed.params.get("fastkperiod"), Some("5"));
        assert_eq!(routed.params.get("slowdmatype"), Some("0"));
        assert!(!routed.params.contains_key("series_type"));
    }

    #[test]
    fn test_stoch_forbids_series_type() {
        let err = with("stoch", json!({"series_type": "close"})).unwrap_err();
        assert!(err.mentions("series_type"));
    }

    #[test]
    fn test_period_series_variants() {
        for kind in ["rsi", "mom", "roc", "rocr", "cmo", "trix"] {
            let request = with(kind, json!({"time_period": 14, "series_type": "high"})).unwrap();
            let routed = request.route().unwrap();
            assert_eq!(routed.function, kind.to_uppercase());
            assert_eq!(routed.params.get("time_period"), Some("14"));
            assert_eq!(routed.params.get("series_type"), Some("high"));

            let err = with(kind, json!({"series_type": "high"})).unwrap_err();
            assert!(err.mentions("time_period"), "{}", kind);
        }
    }

    #[test]
    fn test_period_only_variants_forbid_series_type() {
        for kind in ["willr", "cci", "mfi"] {
            assert!(with(kind, json!({"time_period": 14})).is_ok());
            let err = with(kind, json!({"time_period": 14, "series_type": "close"})).unwrap_err();
            assert!(err.mentions("series_type"), "{}", kind);
        }
    }

    #[test]
    fn test_stochrsi() {
        let request = with("stochrsi", json!({"time_period": 14, "series_type": "close", "fastkperiod": 6})).unwrap();
        let routed = request.route().unwrap();
        assert_eq!(routed.params.get("fastkperiod"), Some("6"));
        assert_eq!(routed.params.get("fastdperiod"), Some("3"));
    }

    #[test]
    fn test_bop_and_ultosc() {
        let routed = with("bop", json!({})).unwrap().route().unwrap();
        assert_eq!(routed.function, "BOP");
        assert_eq!(routed.params.len(), 3);

        let routed = with("ultosc", json!({"timeperiod2": 10})).unwrap().route().unwrap();
        assert_eq!(routed.params.get("timeperiod1"), Some("7"));
        assert_eq!(routed.params.get("timeperiod2"), Some("10"));
        assert_eq!(routed.params.get("timeperiod3"), Some("28"));

        let err = with("bop", json!({"time_period": 3})).unwrap_err();
        assert!(err.mentions("time_period"));
    }

    #[test]
    fn test_force_flags_mutually_exclusive() {
        let err = with("bop", json!({"force_inline": true, "force_file": true})).unwrap_err();
        assert!(err.mentions("mutually exclusive"));
    }

    #[test]
    fn test_missing_symbol() {
        let err = validate(json!({"indicator_type": "bop", "interval": "daily"})).unwrap_err();
        assert!(err.mentions("symbol"));
    }

    #[test]
    fn test_api_function_name_total() {
        for kind in OscillatorType::ALL {
            assert_eq!(api_function_name(kind.as_str()).unwrap(), kind.function_name());
        }
        assert!(api_function_name("aroon")
            .unwrap_err()
            .to_string()
            .contains("Unknown oscillator type"));
    }

    #[test]
    fn test_validate_routing_blank_symbol() {
        let request = OscillatorRequest {
            base: IndicatorBase::for_test(" ", Interval::Daily, None),
            oscillator: Oscillator::Bop,
            output: OutputOptions::new(DataType::Json),
        };
        assert!(request.route().is_err());
    }
}
