//! Volume indicators: Chaikin A/D line and oscillator, on-balance volume

use serde_json::{json, Value};

use super::indicator::{IndicatorBase, MAX_PERIOD};
use super::routing::{ensure_flags, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, Interval, OutputOptions, Params, ToolRequest,
    ValidationErrors,
};

choice_enum! {
    pub enum VolumeType {
        Ad => "ad",
        Adosc => "adosc",
        Obv => "obv",
    }
}

impl VolumeType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Ad => "AD",
            Self::Adosc => "ADOSC",
            Self::Obv => "OBV",
        }
    }
}

const FIELDS: &[&str] = &[
    "indicator_type",
    "symbol",
    "interval",
    "month",
    "fastperiod",
    "slowperiod",
    "datatype",
    "force_inline",
    "force_file",
];

pub fn api_function_name(indicator_type: &str) -> Result<&'static str, RoutingError> {
    VolumeType::parse(indicator_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("volume indicator", indicator_type))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Volume {
    Ad,
    Adosc { fastperiod: u32, slowperiod: u32 },
    Obv,
}

impl Volume {
    pub fn indicator_type(&self) -> VolumeType {
        match self {
            Self::Ad => VolumeType::Ad,
            Self::Adosc { .. } => VolumeType::Adosc,
            Self::Obv => VolumeType::Obv,
        }
    }
}

/// A validated volume indicator request
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeRequest {
    base: IndicatorBase,
    volume: Volume,
    output: OutputOptions,
}

impl VolumeRequest {
    pub fn indicator_type(&self) -> VolumeType {
        self.volume.indicator_type()
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }
}

impl ToolRequest for VolumeRequest {
    const TOOL_NAME: &'static str = "volume";
    const DESCRIPTION: &'static str = "Volume indicators: AD, ADOSC, OBV";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let kind = reader.discriminator::<VolumeType>("indicator_type")?;
        let output = reader.output_options(DataType::Csv);
        let base = IndicatorBase::read(&mut reader, Interval::ALL);
        let volume = match kind {
            VolumeType::Ad => Volume::Ad,
            VolumeType::Obv => Volume::Obv,
            VolumeType::Adosc => {
                let fastperiod = reader.optional_u32("fastperiod", 3, 1, MAX_PERIOD);
                let slowperiod = reader.optional_u32("slowperiod", 10, 1, MAX_PERIOD);
                if fastperiod >= slowperiod {
                    reader.invalid(format!(
                        "'fastperiod' ({}) must be less than 'slowperiod' ({})",
                        fastperiod, slowperiod
                    ));
                }
                Volume::Adosc { fastperiod, slowperiod }
            }
        };

        let built = base.map(|base| Self { base, volume, output });
        reader.finish(built)
    }

    fn input_schema() -> Value {
        object_schema(
            "indicator_type",
            choice_property::<VolumeType>("Volume indicator to compute"),
            &[
                IndicatorBase::schema_properties(),
                json!({
                    "fastperiod": {"type": "integer", "description": "adosc only (default: 3)"},
                    "slowperiod": {"type": "integer", "description": "adosc only (default: 10)"}
                }),
            ],
            DataType::Csv,
        )
    }
}

impl Route for VolumeRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.indicator_type().function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        self.base.write(&mut params);
        if let Volume::Adosc { fastperiod, slowperiod } = self.volume {
            params.insert("fastperiod", fastperiod);
            params.insert("slowperiod", slowperiod);
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
