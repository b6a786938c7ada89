//! Volatility indicators: Bollinger bands, true range, midpoints

use serde_json::{json, Value};

use super::indicator::{IndicatorBase, MAX_PERIOD};
use super::routing::{ensure_flags, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, Interval, OutputOptions, Params, SeriesType,
    ToolRequest, ValidationErrors,
};

choice_enum! {
    pub enum VolatilityType {
        Bbands => "bbands",
        Atr => "atr",
        Natr => "natr",
        Trange => "trange",
        Midpoint => "midpoint",
        Midprice => "midprice",
    }
}

impl VolatilityType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Bbands => "BBANDS",
            Self::Atr => "ATR",
            Self::Natr => "NATR",
            Self::Trange => "TRANGE",
            Self::Midpoint => "MIDPOINT",
            Self::Midprice => "MIDPRICE",
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
    "nbdevup",
    "nbdevdn",
    "matype",
    "datatype",
    "force_inline",
    "force_file",
];

const MAX_DEVIATIONS: u32 = 10;
const MAX_MATYPE: u32 = 8;

pub fn api_function_name(indicator_type: &str) -> Result<&'static str, RoutingError> {
    VolatilityType::parse(indicator_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("volatility indicator", indicator_type))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Volatility {
    Bbands {
        time_period: u32,
        series_type: SeriesType,
        nbdevup: u32,
        nbdevdn: u32,
        matype: u32,
    },
    /// ATR, NATR, MIDPRICE
    Period { indicator: VolatilityType, time_period: u32 },
    Midpoint { time_period: u32, series_type: SeriesType },
    Trange,
}

impl Volatility {
    pub fn indicator_type(&self) -> VolatilityType {
        match self {
            Self::Bbands { .. } => VolatilityType::Bbands,
            Self::Period { indicator, .. } => *indicator,
            Self::Midpoint { .. } => VolatilityType::Midpoint,
            Self::Trange => VolatilityType::Trange,
        }
    }

    fn read(kind: VolatilityType, reader: &mut FieldReader<'_>) -> Option<Self> {
        match kind {
            VolatilityType::Bbands => {
                let time_period = reader.required_u32("time_period", 1, MAX_PERIOD);
                let series_type = reader.required_choice::<SeriesType>("series_type");
                let nbdevup = reader.optional_u32("nbdevup", 2, 1, MAX_DEVIATIONS);
                let nbdevdn = reader.optional_u32("nbdevdn", 2, 1, MAX_DEVIATIONS);
                let matype = reader.optional_u32("matype", 0, 0, MAX_MATYPE);
                time_period
                    .zip(series_type)
                    .map(|(time_period, series_type)| Self::Bbands {
                        time_period,
                        series_type,
                        nbdevup,
                        nbdevdn,
                        matype,
                    })
            }
            VolatilityType::Midpoint => {
                let time_period = reader.required_u32("time_period", 1, MAX_PERIOD);
                let series_type = reader.required_choice::<SeriesType>("series_type");
                time_period
                    .zip(series_type)
                    .map(|(time_period, series_type)| Self::Midpoint {
                        time_period,
                        series_type,
                    })
            }
            VolatilityType::Trange => Some(Self::Trange),
            indicator => reader
                .required_u32("time_period", 1, MAX_PERIOD)
                .map(|time_period| Self::Period { indicator, time_period }),
        }
    }
}

/// A validated volatility indicator request
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityRequest {
    base: IndicatorBase,
    volatility: Volatility,
    output: OutputOptions,
}

impl VolatilityRequest {
    pub fn indicator_type(&self) -> VolatilityType {
        self.volatility.indicator_type()
    }

    pub fn volatility(&self) -> &Volatility {
        &self.volatility
    }
}

impl ToolRequest for VolatilityRequest {
    const TOOL_NAME: &'static str = "volatility";
    const DESCRIPTION: &'static str = "Volatility indicators: BBANDS, ATR, NATR, TRANGE, MIDPOINT, MIDPRICE";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let kind = reader.discriminator::<VolatilityType>("indicator_type")?;
        let output = reader.output_options(DataType::Csv);
        let base = IndicatorBase::read(&mut reader, Interval::ALL);
        let volatility = Volatility::read(kind, &mut reader);

        let built = match (base, volatility) {
            (Some(base), Some(volatility)) => Some(Self {
                base,
                volatility,
                output,
            }),
            _ => None,
        };
        reader.finish(built)
    }

    fn input_schema() -> Value {
        object_schema(
            "indicator_type",
            choice_property::<VolatilityType>("Volatility indicator to compute"),
            &[
                IndicatorBase::schema_properties(),
                json!({
                    "time_period": {"type": "integer", "description": "Required except for trange"},
                    "series_type": {
                        "type": "string",
                        "enum": SeriesType::names(),
                        "description": "Required for bbands and midpoint"
                    },
                    "nbdevup": {"type": "integer", "description": "bbands upper band deviations (default: 2)"},
                    "nbdevdn": {"type": "integer", "description": "bbands lower band deviations (default: 2)"},
                    "matype": {"type": "integer", "description": "bbands moving average type 0-8 (default: 0)"}
                }),
            ],
            DataType::Csv,
        )
    }
}

impl Route for VolatilityRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.indicator_type().function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        self.base.write(&mut params);
        match &self.volatility {
            Volatility::Bbands {
                time_period,
                series_type,
                nbdevup,
                nbdevdn,
                matype,
            } => {
                params.insert("time_period", time_period);
                params.insert("series_type", series_type);
                params.insert("nbdevup", nbdevup);
                params.insert("nbdevdn", nbdevdn);
                params.insert("matype", matype);
            }
            Volatility::Period { time_period, .. } => params.insert("time_period", time_period),
            Volatility::Midpoint {
                time_period,
                series_type,
            } => {
                params.insert("time_period", time_period);
                params.insert("series_type", series_type);
            }
            Volatility::Trange => {}
        }
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
