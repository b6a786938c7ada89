//! Field value types shared across request schemas

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Choice;

choice_enum! {
    /// Response format requested from the upstream API
    pub enum DataType {
        Json => "json",
        Csv => "csv",
    }
}

impl DataType {
    /// File extension for stored responses
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// MIME type for stored responses
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

choice_enum! {
    /// Amount of history returned by time series endpoints
    pub enum OutputSize {
        Compact => "compact",
        Full => "full",
    }
}

choice_enum! {
    /// Price field an indicator is computed over
    pub enum SeriesType {
        Close => "close",
        Open => "open",
        High => "high",
        Low => "low",
    }
}

choice_enum! {
    /// Bar interval for time series and technical indicators
    pub enum Interval {
        OneMin => "1min",
        FiveMin => "5min",
        FifteenMin => "15min",
        ThirtyMin => "30min",
        SixtyMin => "60min",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
    }
}

impl Interval {
    /// Intraday intervals, the only ones that accept a `month`
    pub const INTRADAY: &'static [Interval] = &[
        Interval::OneMin,
        Interval::FiveMin,
        Interval::FifteenMin,
        Interval::ThirtyMin,
        Interval::SixtyMin,
    ];

    pub fn is_intraday(&self) -> bool {
        Self::INTRADAY.contains(self)
    }
}

/// Mutually exclusive hints for how the caller wants the result delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFlags {
    pub force_inline: bool,
    pub force_file: bool,
}

impl OutputFlags {
    pub fn new(force_inline: bool, force_file: bool) -> Self {
        Self {
            force_inline,
            force_file,
        }
    }

    pub fn is_conflicting(&self) -> bool {
        self.force_inline && self.force_file
    }
}

/// Output format plus delivery flags, common to every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub datatype: DataType,
    pub flags: OutputFlags,
}

impl OutputOptions {
    pub fn new(datatype: DataType) -> Self {
        Self {
            datatype,
            flags: OutputFlags::default(),
        }
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// A `YYYY-MM` month used to page intraday history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Earliest year the upstream API serves intraday history for
    pub const MIN_YEAR: i32 = 2000;

    /// Parse `YYYY-MM`; the error is a reason phrase without the field name
    pub fn parse(value: &str) -> Result<Self, String> {
        let bytes = value.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' || !all_digits(&value[..4]) || !all_digits(&value[5..]) {
            return Err(format!("must use the YYYY-MM format (got '{}')", value));
        }
        let year: i32 = value[..4]
            .parse()
            .map_err(|_| format!("must use the YYYY-MM format (got '{}')", value))?;
        let month: u32 = value[5..]
            .parse()
            .map_err(|_| format!("must use the YYYY-MM format (got '{}')", value))?;

        if year < Self::MIN_YEAR {
            return Err(format!("year must be {} or later (got {})", Self::MIN_YEAR, year));
        }
        if !(1..=12).contains(&month) {
            return Err(format!("month must be between 01 and 12 (got {:02})", month));
        }

        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A `YYYY-MM-DD` date used by listing and calendar endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketDate(NaiveDate);

impl MarketDate {
    /// Earliest year listing history is available for
    pub const MIN_YEAR: i32 = 2010;

    pub fn parse(value: &str) -> Result<Self, String> {
        let bytes = value.as_bytes();
        let shaped = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && all_digits(&value[..4])
            && all_digits(&value[5..7])
            && all_digits(&value[8..]);
        if !shaped {
            return Err(format!("must use the YYYY-MM-DD format (got '{}')", value));
        }

        let month: u32 = value[5..7].parse().unwrap_or(0);
        if !(1..=12).contains(&month) {
            return Err(format!("month must be between 01 and 12 (got {:02})", month));
        }

        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| format!("is not a valid calendar date (got '{}')", value))?;
        if date.year() < Self::MIN_YEAR {
            return Err(format!("year must be {} or later (got {})", Self::MIN_YEAR, date.year()));
        }

        Ok(Self(date))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for MarketDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// A fiscal quarter written `YYYYQn`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quarter {
    year: i32,
    quarter: u8,
}

impl Quarter {
    /// Earliest year transcripts are available for
    pub const MIN_YEAR: i32 = 2010;

    pub fn parse(value: &str) -> Result<Self, String> {
        let bytes = value.as_bytes();
        if bytes.len() != 6 || bytes[4] != b'Q' || !all_digits(&value[..4]) || !all_digits(&value[5..]) {
            return Err(format!("must use the YYYYQn format, e.g. 2024Q1 (got '{}')", value));
        }
        let year: i32 = value[..4]
            .parse()
            .map_err(|_| format!("must use the YYYYQn format, e.g. 2024Q1 (got '{}')", value))?;
        let quarter = bytes[5] - b'0';

        if year < Self::MIN_YEAR {
            return Err(format!("year must be {} or later (got {})", Self::MIN_YEAR, year));
        }
        if !(1..=4).contains(&quarter) {
            return Err(format!("quarter must be between 1 and 4 (got {})", quarter));
        }

        Ok(Self { year, quarter })
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}Q{}", self.year, self.quarter)
    }
}
