//! Digital currency exchange rates and time series

use serde_json::{json, Value};

use super::routing::{ensure_flags, ensure_present, ApiParams, Route, RoutingError};
use super::{
    choice_property, object_schema, Choice, DataType, FieldReader, Interval, OutputOptions, OutputSize, Params,
    ToolRequest, ValidationErrors,
};

choice_enum! {
    pub enum CryptoDataType {
        ExchangeRate => "exchange_rate",
        Intraday => "intraday",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
    }
}

impl CryptoDataType {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::ExchangeRate => "CURRENCY_EXCHANGE_RATE",
            Self::Intraday => "CRYPTO_INTRADAY",
            Self::Daily => "DIGITAL_CURRENCY_DAILY",
            Self::Weekly => "DIGITAL_CURRENCY_WEEKLY",
            Self::Monthly => "DIGITAL_CURRENCY_MONTHLY",
        }
    }
}

const FIELDS: &[&str] = &[
    "data_type",
    "from_currency",
    "to_currency",
    "symbol",
    "market",
    "interval",
    "outputsize",
    "datatype",
    "force_inline",
    "force_file",
];

pub fn api_function_name(data_type: &str) -> Result<&'static str, RoutingError> {
    CryptoDataType::parse(data_type)
        .map(|t| t.function_name())
        .ok_or_else(|| RoutingError::unknown("crypto data type", data_type))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Crypto {
    ExchangeRate {
        from_currency: String,
        to_currency: String,
    },
    Intraday {
        symbol: String,
        market: String,
        interval: Interval,
        outputsize: OutputSize,
    },
    /// daily, weekly and monthly series
    Series {
        data_type: CryptoDataType,
        symbol: String,
        market: String,
    },
}

impl Crypto {
    pub fn data_type(&self) -> CryptoDataType {
        match self {
            Self::ExchangeRate { .. } => CryptoDataType::ExchangeRate,
            Self::Intraday { .. } => CryptoDataType::Intraday,
            Self::Series { data_type, .. } => *data_type,
        }
    }

    fn read(kind: CryptoDataType, reader: &mut FieldReader<'_>) -> Option<Self> {
        if kind == CryptoDataType::ExchangeRate {
            let from_currency = reader.required_str("from_currency");
            let to_currency = reader.required_str("to_currency");
            return from_currency
                .zip(to_currency)
                .map(|(from_currency, to_currency)| Self::ExchangeRate {
                    from_currency,
                    to_currency,
                });
        }

        let symbol = reader.required_str("symbol");
        let market = reader.required_str("market");
        if kind == CryptoDataType::Intraday {
            let interval = reader.required_choice_in("interval", Interval::INTRADAY);
            let outputsize = reader.optional_choice("outputsize", OutputSize::Compact);
            return match (symbol, market, interval) {
                (Some(symbol), Some(market), Some(interval)) => Some(Self::Intraday {
                    symbol,
                    market,
                    interval,
                    outputsize,
                }),
                _ => None,
            };
        }
        symbol.zip(market).map(|(symbol, market)| Self::Series {
            data_type: kind,
            symbol,
            market,
        })
    }
}

/// A validated crypto request
#[derive(Debug, Clone, PartialEq)]
pub struct CryptoRequest {
    crypto: Crypto,
    output: OutputOptions,
}

impl CryptoRequest {
    pub fn data_type(&self) -> CryptoDataType {
        self.crypto.data_type()
    }

    pub fn crypto(&self) -> &Crypto {
        &self.crypto
    }
}

impl ToolRequest for CryptoRequest {
    const TOOL_NAME: &'static str = "crypto";
    const DESCRIPTION: &'static str = "Cryptocurrency exchange rates and intraday, daily, weekly, monthly series";

    fn from_params(params: &Params) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(params, FIELDS);
        let kind = reader.discriminator::<CryptoDataType>("data_type")?;
        let output = reader.output_options(DataType::Csv);
        let crypto = Crypto::read(kind, &mut reader);
        let built = crypto.map(|crypto| Self { crypto, output });
        reader.finish(built)
    }

    fn input_schema() -> Value {
        object_schema(
            "data_type",
            choice_property::<CryptoDataType>("Kind of crypto data"),
            &[json!({
                "from_currency": {"type": "string", "description": "exchange_rate only, e.g. BTC"},
                "to_currency": {"type": "string", "description": "exchange_rate only, e.g. USD"},
                "symbol": {"type": "string", "description": "Digital currency symbol, e.g. ETH"},
                "market": {"type": "string", "description": "Exchange market, e.g. USD"},
                "interval": {
                    "type": "string",
                    "enum": Interval::INTRADAY.iter().map(|i| i.as_str()).collect::<Vec<_>>(),
                    "description": "intraday only"
                },
                "outputsize": {"type": "string", "enum": OutputSize::names(), "description": "intraday only (default: compact)"}
            })],
            DataType::Csv,
        )
    }
}

impl Route for CryptoRequest {
    fn api_function_name(&self) -> Result<&'static str, RoutingError> {
        Ok(self.data_type().function_name())
    }

    fn transform_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        match &self.crypto {
            Crypto::ExchangeRate {
                from_currency,
                to_currency,
            } => {
                params.insert("from_currency", from_currency);
                params.insert("to_currency", to_currency);
            }
            Crypto::Intraday {
                symbol,
                market,
                interval,
                outputsize,
            } => {
                params.insert("symbol", symbol);
                params.insert("market", market);
                params.insert("interval", interval);
                params.insert("outputsize", outputsize);
            }
            Crypto::Series { symbol, market, .. } => {
                params.insert("symbol", symbol);
                params.insert("market", market);
            }
        }
        params.insert("datatype", self.output.datatype);
        params
    }

    fn validate_routing(&self) -> Result<(), RoutingError> {
        ensure_flags(self.output.flags)?;
        let context = self.data_type().as_str();
        match &self.crypto {
            Crypto::ExchangeRate {
                from_currency,
                to_currency,
            } => {
                ensure_present("from_currency", from_currency, context)?;
                ensure_present("to_currency", to_currency, context)
            }
            Crypto::Intraday { symbol, market, .. } | Crypto::Series { symbol, market, .. } => {
                ensure_present("symbol", symbol, context)?;
                ensure_present("market", market, context)
            }
        }
    }

    fn output(&self) -> OutputOptions {
        self.output
    }
}
