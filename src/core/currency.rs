//! Currency identifiers and NBP rate tables

use crate::core::error::RateError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Three letter ISO 4217 style code, always stored upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Polish zloty, the currency every NBP rate is quoted against.
    pub const PLN: CurrencyCode = CurrencyCode(*b"PLN");
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");

    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    pub fn is_base(&self) -> bool {
        *self == Self::PLN
    }
}

impl FromStr for CurrencyCode {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(RateError::InvalidCurrencyCode(s.to_string()));
        }

        let mut code = [0u8; 3];
        for (dst, src) in code.iter_mut().zip(bytes) {
            *dst = src.to_ascii_uppercase();
        }
        Ok(CurrencyCode(code))
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// NBP publishes mid rates in two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum RateTable {
    /// Major currencies, published every business day.
    A,
    /// Remaining currencies, published on Wednesdays.
    B,
}

impl RateTable {
    /// Lookup order used when the table of a currency is unknown.
    pub const ALL: [RateTable; 2] = [RateTable::A, RateTable::B];
}

impl Display for RateTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateTable::A => "A",
                RateTable::B => "B",
            }
        )
    }
}

impl FromStr for RateTable {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(RateTable::A),
            "B" => Ok(RateTable::B),
            _ => Err(anyhow::anyhow!("Invalid rate table: {}", s)),
        }
    }
}
