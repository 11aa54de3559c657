//! Month-granularity dates.
//!
//! Every date on the subscription API is a calendar month written as `MM-YYYY`
//! (`"01-2024"`). Internally a month is a `NaiveDate` pinned to the first day,
//! which is what gets stored in the `DATE` columns.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::{
    gen::SchemaGenerator,
    schema::{InstanceType, Metadata, Schema, SchemaObject, StringValidation},
    JsonSchema,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;
use validator::ValidationError;

/// Human readable form of the accepted layout, used in error messages.
pub const MONTH_FORMAT: &str = "MM-YYYY";

const MONTH_PATTERN_SRC: &str = r"^([0-9]{2})-([0-9]{4})$";

static MONTH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(MONTH_PATTERN_SRC).expect("month pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date format '{input}', expected MM-YYYY")]
pub struct MonthParseError {
    input: String,
}

impl MonthParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }

    /// The rejected text.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// A calendar month (year + month, no day or time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear(NaiveDate);

impl MonthYear {
    /// Parse a strict `MM-YYYY` string.
    ///
    /// The month must be two digits in `01..=12` and the year exactly four
    /// digits. No trimming is done.
    pub fn parse(input: &str) -> Result<Self, MonthParseError> {
        let captures = MONTH_PATTERN
            .captures(input)
            .ok_or_else(|| MonthParseError::new(input))?;

        let month: u32 = captures[1]
            .parse()
            .map_err(|_| MonthParseError::new(input))?;
        let year: i32 = captures[2]
            .parse()
            .map_err(|_| MonthParseError::new(input))?;

        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| MonthParseError::new(input))
    }

    /// Month containing `date`; the day component is dropped.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.0.month(), self.0.year())
    }
}

impl FromStr for MonthYear {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<MonthYear> for NaiveDate {
    fn from(month: MonthYear) -> Self {
        month.0
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MonthYear::parse(&raw).map_err(de::Error::custom)
    }
}

impl JsonSchema for MonthYear {
    fn schema_name() -> String {
        "MonthYear".to_string()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            string: Some(Box::new(StringValidation {
                pattern: Some(MONTH_PATTERN_SRC.to_string()),
                ..Default::default()
            })),
            metadata: Some(Box::new(Metadata {
                description: Some(format!("Calendar month in {} format", MONTH_FORMAT)),
                examples: vec![serde_json::json!("01-2024")],
                ..Default::default()
            })),
            ..Default::default()
        }
        .into()
    }
}

/// `validator` hook for string fields that must hold a `MM-YYYY` month.
pub fn validate_month(value: &str) -> Result<(), ValidationError> {
    MonthYear::parse(value).map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("month_format");
        error.message = Some(err.to_string().into());
        error
    })
}
