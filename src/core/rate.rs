//! Exchange rate records and the provider abstraction

use crate::core::currency::{CurrencyCode, RateTable};
use crate::core::error::RateError;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;

/// One published mid rate: PLN per one unit of `currency` on `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRecord {
    currency: CurrencyCode,
    date: NaiveDate,
    mid: Decimal,
    table: Option<RateTable>,
    name: Option<String>,
}

impl RateRecord {
    pub fn new(currency: CurrencyCode, date: NaiveDate, mid: Decimal) -> Result<Self, RateError> {
        if mid <= Decimal::ZERO {
            return Err(RateError::MalformedResponse(format!(
                "Non-positive mid rate {mid} for {currency} on {date}"
            )));
        }
        Ok(Self {
            currency,
            date,
            mid,
            table: None,
            name: None,
        })
    }

    /// The base currency quoted against itself.
    pub fn base(date: NaiveDate) -> Self {
        Self {
            currency: CurrencyCode::PLN,
            date,
            mid: Decimal::ONE,
            table: None,
            name: Some("polski złoty".to_string()),
        }
    }

    pub fn with_table(mut self, table: RateTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn mid(&self) -> Decimal {
        self.mid
    }

    pub fn table(&self) -> Option<RateTable> {
        self.table
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Rates of one currency over a date range, ordered by date ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSeries {
    currency: CurrencyCode,
    start: NaiveDate,
    end: NaiveDate,
    records: Vec<RateRecord>,
}

impl RateSeries {
    /// Builds a series, sorting records by date and keeping the last record per date.
    pub fn new(
        currency: CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
        mut records: Vec<RateRecord>,
    ) -> Self {
        records.sort_by_key(|r| r.date);
        records.reverse();
        records.dedup_by_key(|r| r.date);
        records.reverse();
        Self {
            currency,
            start,
            end,
            records,
        }
    }

    /// Flat series of the base currency on every business day in range.
    pub fn base(start: NaiveDate, end: NaiveDate) -> Self {
        let records = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .map(RateRecord::base)
            .collect();
        Self::new(CurrencyCode::PLN, start, end, records)
    }

    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn records(&self) -> &[RateRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Most recent record in the series.
    pub fn latest(&self) -> Option<&RateRecord> {
        self.records.last()
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Mid rate of `currency` on `date`, or the latest published one.
    async fn fetch_rate(
        &self,
        currency: CurrencyCode,
        date: Option<NaiveDate>,
    ) -> Result<RateRecord, RateError>;

    /// All published mid rates of `currency` between `start` and `end` inclusive.
    async fn fetch_series(
        &self,
        currency: CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateSeries, RateError>;

    /// Every currency of a rate table on `date`, or the latest table.
    async fn fetch_table(
        &self,
        table: RateTable,
        date: Option<NaiveDate>,
    ) -> Result<Vec<RateRecord>, RateError>;
}
