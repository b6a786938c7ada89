//! Moving average indicators (SMA through VWAP)

use serde_json::{json, Value};

use super::indicator::{IndicatorBase, MAX_PERIOD};
use super::routing::{ensure_flags, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, Interval, OutputOptions, Params, SeriesType,
    ToolRequest, ValidationErrors,
};

choice_enum! {
    pub enum MovingAverageType {
        Sma => "sma",
        Ema => "ema",
        Wma => "wma",
        Dema => "dema",
        Tema => "tema",
        Trima => "trima",
        Kama => "kama",
        Mama => "mama",
        T3 => "t3",
        Vwap => "vwap",
    }
}

impl MovingAverageType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Sma => "SMA",
            Self::Ema => "EMA",
            Self::Wma => "WMA",
            Self::Dema => "DEMA",
            Self::Tema => "TEMA",
            Self::Trima => "TRIMA",
            Self::Kama => "KAMA",
            Self::Mama => "MAMA",
            Self::T3 => "T3",
            Self::Vwap => "VWAP",
        }
    }
}

/// Default MESA fast and slow limits
pub const DEFAULT_MAMA_LIMIT: f64 = 0.01;

const FIELDS: &[&str] = &[
    "indicator_type",
    "symbol",
    "interval",
    "month",
    "time_period",
    "series_type",
    "fastlimit",
    "slowlimit",
    "datatype",
    "force_inline",
    "force_file",
];

pub fn api_function_name(indicator_type: &str) -> Result<&'static str, RoutingError> {
    MovingAverageType::parse(indicator_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("moving average type", indicator_type))
}

/// Variant-specific parameters
#[derive(Debug, Clone, PartialEq)]
pub enum MovingAverage {
    /// SMA, EMA, WMA, DEMA, TEMA, TRIMA, KAMA, T3
    Periodic {
        indicator: MovingAverageType,
        time_period: u32,
        series_type: SeriesType,
    },
    Mama {
        series_type: SeriesType,
        fastlimit: f64,
        slowlimit: f64,
    },
    Vwap,
}

impl MovingAverage {
    pub fn indicator_type(&self) -> MovingAverageType {
        match self {
            Self::Periodic { indicator, .. } => *indicator,
            Self::Mama { .. } => MovingAverageType::Mama,
            Self::Vwap => MovingAverageType::Vwap,
        }
    }

    fn read(kind: MovingAverageType, reader: &mut FieldReader<'_>) -> Option<Self> {
        match kind {
            MovingAverageType::Mama => {
                let series_type = reader.required_choice::<SeriesType>("series_type");
                let fastlimit = reader.optional_f64_between("fastlimit", DEFAULT_MAMA_LIMIT, 0.0, 1.0);
                let slowlimit = reader.optional_f64_between("slowlimit", DEFAULT_MAMA_LIMIT, 0.0, 1.0);
                series_type.map(|series_type| Self::Mama {
                    series_type,
                    fastlimit,
                    slowlimit,
                })
            }
            MovingAverageType::Vwap => Some(Self::Vwap),
            indicator => {
                let time_period = reader.required_u32("time_period", 1, MAX_PERIOD);
                let series_type = reader.required_choice::<SeriesType>("series_type");
                time_period
                    .zip(series_type)
                    .map(|(time_period, series_type)| Self::Periodic {
                        indicator,
                        time_period,
                        series_type,
                    })
            }
        }
    }
}

/// A validated moving average request
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageRequest {
    base: IndicatorBase,
    average: MovingAverage,
    output: OutputOptions,
}

impl MovingAverageRequest {
    pub fn indicator_type(&self) -> MovingAverageType {
        self.average.indicator_type()
    }

    pub fn base(&self) -> &IndicatorBase {
        &self.base
    }

    pub fn average(&self) -> &MovingAverage {
        &self.average
    }
}

impl ToolRequest for MovingAverageRequest {
    const TOOL_NAME: &'static str = "moving_average";
    const DESCRIPTION: &'static str =
        "Moving average indicators: SMA, EMA, WMA, DEMA, TEMA, TRIMA, KAMA, MAMA, T3 and VWAP";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let kind = reader.discriminator::<MovingAverageType>("indicator_type")?;
        let output = reader.output_options(DataType::Csv);
        let intervals = match kind {
            MovingAverageType::Vwap => Interval::INTRADAY,
            _ => Interval::ALL,
        };
        let base = IndicatorBase::read(&mut reader, intervals);
        let average = MovingAverage::read(kind, &mut reader);

        let built = match (base, average) {
            (Some(base), Some(average)) => Some(Self { base, average, output }),
            _ => None,
        };
        reader.finish(built)
    }

    fn input_schema() -> Value {
        object_schema(
            "indicator_type",
            choice_property::<MovingAverageType>("Moving average to compute"),
            &[
                IndicatorBase::schema_properties(),
                json!({
                    "time_period": {
                        "type": "integer",
                        "description": "Data points per average; required except for mama and vwap"
                    },
                    "series_type": {
                        "type": "string",
                        "enum": SeriesType::names(),
                        "description": "Price series; required except for vwap"
                    },
                    "fastlimit": {"type": "number", "description": "mama only (default: 0.01)"},
                    "slowlimit": {"type": "number", "description": "mama only (default: 0.01)"}
                }),
            ],
            DataType::Csv,
        )
    }
}

impl Route for MovingAverageRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.indicator_type().function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        self.base.write(&mut params);
        match &self.average {
            MovingAverage::Periodic {
                time_period,
                series_type,
                ..
            } => {
                params.insert("time_period", time_period);
                params.insert("series_type", series_type);
            }
            MovingAverage::Mama {
                series_type,
                fastlimit,
                slowlimit,
            } => {
                params.insert("series_type", series_type);
                params.insert("fastlimit", fastlimit);
                params.insert("slowlimit", slowlimit);
            }
            MovingAverage::Vwap => {}
        }
        params.insert("datatype", self.output.datatype);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        self.base.validate(self.indicator_type().as_str())?;
        ensure_flags(self.output.flags)?;
        match &self.average {
            MovingAverage::Vwap if !self.base.interval().is_intraday() => Err(RoutingError::invalid(
                "VWAP is only available for intraday intervals",
            )),
            MovingAverage::Periodic { time_period: 0, .. } => {
                Err(RoutingError::invalid("'time_period' must be positive"))
            }
            MovingAverage::Mama {
                fastlimit, slowlimit, ..
            } if !(0.0 < *fastlimit && *fastlimit < 1.0 && 0.0 < *slowlimit && *slowlimit < 1.0) => {
                Err(RoutingError::invalid("MAMA limits must lie strictly between 0 and 1"))
            }
            _ => Ok(()),
        }
    }

    fn output(&self) -> OutputOptions {
        self.output
    }
}
