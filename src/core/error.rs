//! Error types for rate fetching and conversion.

use crate::core::currency::{CurrencyCode, RateTable};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while fetching rates from the exchange rate source.
#[derive(Error, Debug)]
pub enum RateError {
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(CurrencyCode),

    #[error("No rate published for {currency} on {date}")]
    NoDataForDate {
        currency: CurrencyCode,
        date: NaiveDate,
    },

    #[error("No table {table} published on {date}")]
    NoTableForDate { table: RateTable, date: NaiveDate },

    #[error("Date {0} is in the future")]
    FutureDate(NaiveDate),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for RateError {
    fn from(err: reqwest::Error) -> Self {
        RateError::NetworkError(err.to_string())
    }
}

/// Errors raised by the converter.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Invalid amount: {0} (must be greater than zero)")]
    InvalidAmount(Decimal),

    #[error("Missing rate for {0}")]
    MissingRate(CurrencyCode),

    #[error("Rate mismatch: expected a {expected} rate, got {found}")]
    RateMismatch {
        expected: CurrencyCode,
        found: CurrencyCode,
    },

    #[error("Converting {amount} {from} to {to} exceeds the supported decimal range")]
    Overflow {
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
    },
}
