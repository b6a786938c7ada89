//! Market-wide listings, calendars and movers

use serde_json::{json, Value};

use super::routing::{ensure_flags, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, MarketDate, OutputOptions, Params, ToolRequest,
    ValidationErrors,
};

choice_enum! {
    pub enum MarketDataType {
        ListingStatus => "listing_status",
        EarningsCalendar => "earnings_calendar",
        IpoCalendar => "ipo_calendar",
        TopGainersLosers => "top_gainers_losers",
    }
}

impl MarketDataType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::ListingStatus => "LISTING_STATUS",
            Self::EarningsCalendar => "EARNINGS_CALENDAR",
            Self::IpoCalendar => "IPO_CALENDAR",
            Self::TopGainersLosers => "TOP_GAINERS_LOSERS",
        }
    }

    /// The only format upstream serves for this endpoint
    pub fn datatype(&self) -> DataType {
        match self {
            Self::TopGainersLosers => DataType::Json,
            _ => DataType::Csv,
        }
    }
}

choice_enum! {
    pub enum ListingState {
        Active => "active",
        Delisted => "delisted",
    }
}

choice_enum! {
    pub enum Horizon {
        ThreeMonth => "3month",
        SixMonth => "6month",
        TwelveMonth => "12month",
    }
}

const FIELDS: &[&str] = &[
    "data_type",
    "date",
    "state",
    "symbol",
    "horizon",
    "datatype",
    "force_inline",
    "force_file",
];

pub fn api_function_name(data_type: &str) -> Result<&'static str, RoutingError> {
    MarketDataType::parse(data_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("market data type", data_type))
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarketData {
    ListingStatus { date: Option<MarketDate>, state: ListingState },
    EarningsCalendar { symbol: Option<String>, horizon: Horizon },
    IpoCalendar,
    TopGainersLosers,
}

impl MarketData {
    pub fn data_type(&self) -> MarketDataType {
        match self {
            Self::ListingStatus { .. } => MarketDataType::ListingStatus,
            Self::EarningsCalendar { .. } => MarketDataType::EarningsCalendar,
            Self::IpoCalendar => MarketDataType::IpoCalendar,
            Self::TopGainersLosers => MarketDataType::TopGainersLosers,
        }
    }
}

/// A validated market data request
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataRequest {
    data: MarketData,
    output: OutputOptions,
}

impl MarketDataRequest {
    pub fn data_type(&self) -> MarketDataType {
        self.data.data_type()
    }

    pub fn data(&self) -> &MarketData {
        &self.data
    }
}

impl ToolRequest for MarketDataRequest {
    const TOOL_NAME: &'static str = "market_data";
    const DESCRIPTION: &'static str =
        "Market-wide data: listing status, earnings calendar, IPO calendar, top gainers and losers";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let kind = reader.discriminator::<MarketDataType>("data_type")?;
        let format = kind.datatype();
        let output = reader.output_options_in(format, &[format]);
        let data = match kind {
            MarketDataType::ListingStatus => MarketData::ListingStatus {
                date: reader.optional_market_date("date"),
                state: reader.optional_choice("state", ListingState::Active),
            },
            MarketDataType::EarningsCalendar => MarketData::EarningsCalendar {
                symbol: reader.optional_str("symbol"),
                horizon: reader.optional_choice("horizon", Horizon::ThreeMonth),
            },
            MarketDataType::IpoCalendar => MarketData::IpoCalendar,
            MarketDataType::TopGainersLosers => MarketData::TopGainersLosers,
        };
        reader.finish(Some(Self { data, output }))
    }

    fn input_schema() -> Value {
        object_schema(
            "data_type",
            choice_property::<MarketDataType>("Kind of market-wide data"),
            &[json!({
                "date": {"type": "string", "description": "listing_status only: YYYY-MM-DD, 2010-01-01 or later"},
                "state": {
                    "type": "string",
                    "enum": ListingState::names(),
                    "description": "listing_status only (default: active)"
                },
                "symbol": {"type": "string", "description": "earnings_calendar only"},
                "horizon": {
                    "type": "string",
                    "enum": Horizon::names(),
                    "description": "earnings_calendar only (default: 3month)"
                }
            })],
            DataType::Csv,
        )
    }
}

impl Route for MarketDataRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.data_type().function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        match &self.data {
            MarketData::ListingStatus { date, state } => {
                params.insert_opt("date", *date);
                params.insert("state", state);
            }
            MarketData::EarningsCalendar { symbol, horizon } => {
                params.insert_opt("symbol", symbol.as_deref());
                params.insert("horizon", horizon);
            }
            MarketData::IpoCalendar | MarketData::TopGainersLosers => {}
        }
        params.insert("datatype", self.output.datatype);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        ensure_flags(self.output.flags)?;
        let expected = self.data_type().datatype();
        if self.output.datatype != expected {
            return Err(RoutingError::invalid(format!(
                "{} is only available as {}",
                self.data_type(),
                expected
            )));
        }
        Ok(())
    }

    fn output(&self) -> OutputOptions {
        self.output
    }
}
