//! Trend indicators: directional movement, Aroon, parabolic SAR, Hilbert transform

use serde_json::{json, Value};

use super::indicator::{IndicatorBase, MAX_PERIOD};
use super::routing::{ensure_flags, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, Interval, OutputOptions, Params, SeriesType,
    ToolRequest, ValidationErrors,
};

choice_enum! {
    pub enum TrendType {
        Adx => "adx",
        Adxr => "adxr",
        Dx => "dx",
        MinusDi => "minus_di",
        PlusDi => "plus_di",
        MinusDm => "minus_dm",
        PlusDm => "plus_dm",
        Aroon => "aroon",
        Aroonosc => "aroonosc",
        Sar => "sar",
        HtTrendline => "ht_trendline",
        HtTrendmode => "ht_trendmode",
        HtDcperiod => "ht_dcperiod",
        HtDcphase => "ht_dcphase",
        HtPhasor => "ht_phasor",
        HtSine => "ht_sine",
    }
}

impl TrendType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Adx => "ADX",
            Self::Adxr => "ADXR",
            Self::Dx => "DX",
            Self::MinusDi => "MINUS_DI",
            Self::PlusDi => "PLUS_DI",
            Self::MinusDm => "MINUS_DM",
            Self::PlusDm => "PLUS_DM",
            Self::Aroon => "AROON",
            Self::Aroonosc => "AROONOSC",
            Self::Sar => "SAR",
            Self::HtTrendline => "HT_TRENDLINE",
            Self::HtTrendmode => "HT_TRENDMODE",
            Self::HtDcperiod => "HT_DCPERIOD",
            Self::HtDcphase => "HT_DCPHASE",
            Self::HtPhasor => "HT_PHASOR",
            Self::HtSine => "HT_SINE",
        }
    }

    fn is_hilbert(&self) -> bool {
        matches!(
            self,
            Self::HtTrendline | Self::HtTrendmode | Self::HtDcperiod | Self::HtDcphase | Self::HtPhasor | Self::HtSine
        )
    }
}

pub const DEFAULT_SAR_ACCELERATION: f64 = 0.01;
pub const DEFAULT_SAR_MAXIMUM: f64 = 0.20;

const FIELDS: &[&str] = &[
    "indicator_type",
    "symbol",
    "interval",
    "month",
    "time_period",
    "series_type",
    "acceleration",
    "maximum",
    "datatype",
    "force_inline",
    "force_file",
];

pub fn api_function_name(indicator_type: &str) -> Result<&'static str, RoutingError> {
    TrendType::parse(indicator_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("trend indicator", indicator_type))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Trend {
    /// ADX family and Aroon
    Period { indicator: TrendType, time_period: u32 },
    Sar { acceleration: f64, maximum: f64 },
    /// HT_* indicators
    Hilbert { indicator: TrendType, series_type: SeriesType },
}

impl Trend {
    pub fn indicator_type(&self) -> TrendType {
        match self {
            Self::Period { indicator, .. } | Self::Hilbert { indicator, .. } => *indicator,
            Self::Sar { .. } => TrendType::Sar,
        }
    }

    fn read(kind: TrendType, reader: &mut FieldReader<'_>) -> Option<Self> {
        if kind == TrendType::Sar {
            let acceleration = reader.optional_positive_f64("acceleration", DEFAULT_SAR_ACCELERATION);
            let maximum = reader.optional_positive_f64("maximum", DEFAULT_SAR_MAXIMUM);
            if acceleration > maximum {
                reader.invalid(format!(
                    "'acceleration' ({}) must not exceed 'maximum' ({})",
                    acceleration, maximum
                ));
            }
            return Some(Self::Sar { acceleration, maximum });
        }
        if kind.is_hilbert() {
            return reader
                .required_choice::<SeriesType>("series_type")
                .map(|series_type| Self::Hilbert {
                    indicator: kind,
                    series_type,
                });
        }
        reader
            .required_u32("time_period", 1, MAX_PERIOD)
            .map(|time_period| Self::Period {
                indicator: kind,
                time_period,
            })
    }
}

/// A validated trend indicator request
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRequest {
    base: IndicatorBase,
    trend: Trend,
    output: OutputOptions,
}

impl TrendRequest {
    pub fn indicator_type(&self) -> TrendType {
        self.trend.indicator_type()
    }

    pub fn base(&self) -> &IndicatorBase {
        &self.base
    }

    pub fn trend(&self) -> &Trend {
        &self.trend
    }
}

impl ToolRequest for TrendRequest {
    const TOOL_NAME: &'static str = "trend";
    const DESCRIPTION: &'static str =
        "Trend indicators: ADX, ADXR, DX, +/-DI, +/-DM, AROON, AROONOSC, SAR and Hilbert transform (HT_*)";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let kind = reader.discriminator::<TrendType>("indicator_type")?;
        let output = reader.output_options(DataType::Csv);
        let base = IndicatorBase::read(&mut reader, Interval::ALL);
        let trend = Trend::read(kind, &mut reader);

        let built = match (base, trend) {
            (Some(base), Some(trend)) => Some(Self { base, trend, output }),
            _ => None,
        };
        reader.finish(built)
    }

    fn input_schema() -> Value {
        object_schema(
            "indicator_type",
            choice_property::<TrendType>("Trend indicator to compute"),
            &[
                IndicatorBase::schema_properties(),
                json!({
                    "time_period": {"type": "integer", "description": "Required for adx, adxr, dx, *_di, *_dm, aroon, aroonosc"},
                    "series_type": {
                        "type": "string",
                        "enum": SeriesType::names(),
                        "description": "Required for ht_* indicators"
                    },
                    "acceleration": {"type": "number", "description": "sar only (default: 0.01)"},
                    "maximum": {"type": "number", "description": "sar only (default: 0.20)"}
                }),
            ],
            DataType::Csv,
        )
    }
}

impl Route for TrendRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.indicator_type().function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        self.base.write(&mut params);
        match &self.trend {
            Trend::Period { time_period, .. } => params.insert("time_period", time_period),
            Trend::Sar { acceleration, maximum } => {
                params.insert("acceleration", acceleration);
                params.insert("maximum", maximum);
            }
            Trend::Hilbert { series_type, .. } => params.insert("series_type", series_type),
        }
        params.insert("datatype", self.output.datatype);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        self.base.validate(self.indicator_type().as_str())?;
        ensure_flags(self.output.flags)?;
        if let Trend::Sar { acceleration, maximum } = self.trend {
            if acceleration <= 0.0 || maximum <= 0.0 || acceleration > maximum {
                return Err(RoutingError::invalid(
                    "SAR requires 0 < acceleration <= maximum",
                ));
            }
        }
        Ok(())
    }

    fn output(&self) -> OutputOptions {
        self.output
    }
}
