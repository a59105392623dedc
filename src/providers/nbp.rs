use crate::core::{CurrencyCode, RateError, RateProvider, RateRecord, RateSeries, RateTable};
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

/// Longest range, in days, the NBP API serves in a single query.
const MAX_RANGE_DAYS: i64 = 367;

/// First day of the NBP mid-rate archive; nothing earlier is ever served.
fn first_publication() -> NaiveDate {
    NaiveDate::from_ymd_opt(2002, 1, 2).unwrap_or(NaiveDate::MIN)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn ensure_not_future(date: NaiveDate) -> Result<(), RateError> {
    if date > today() {
        return Err(RateError::FutureDate(date));
    }
    Ok(())
}

/// Splits `start..=end` into consecutive inclusive windows of at most `MAX_RANGE_DAYS`.
pub(crate) fn date_windows(start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut windows = Vec::new();
    let mut window_start = start;
    while window_start <= end {
        let window_end = (window_start + Duration::days(MAX_RANGE_DAYS - 1)).min(end);
        windows.push((window_start, window_end));
        window_start = window_end + Duration::days(1);
    }
    windows
}

#[derive(Debug, Deserialize)]
struct NbpRatesResponse {
    currency: String,
    code: String,
    rates: Vec<NbpRate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NbpRate {
    effective_date: NaiveDate,
    mid: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NbpTableResponse {
    effective_date: NaiveDate,
    rates: Vec<NbpTableRate>,
}

#[derive(Debug, Deserialize)]
struct NbpTableRate {
    currency: String,
    code: String,
    mid: Decimal,
}

impl NbpRatesResponse {
    fn into_records(
        self,
        expected: CurrencyCode,
        table: RateTable,
    ) -> Result<Vec<RateRecord>, RateError> {
        let code: CurrencyCode = self.code.parse().map_err(|_| {
            RateError::MalformedResponse(format!("Invalid currency code in response: {}", self.code))
        })?;
        if code != expected {
            return Err(RateError::MalformedResponse(format!(
                "Expected rates for {expected}, got {code}"
            )));
        }

        self.rates
            .into_iter()
            .map(|rate| {
                RateRecord::new(code, rate.effective_date, rate.mid)
                    .map(|r| r.with_table(table).with_name(self.currency.clone()))
            })
            .collect()
    }
}

pub struct NbpProvider {
    base_url: String,
    client: reqwest::Client,
}

impl NbpProvider {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .user_agent("nbpfx/0.1")
            .timeout(timeout)
            .build()?;
        Ok(NbpProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn rate_url(&self, table: RateTable, currency: CurrencyCode, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => format!(
                "{}/exchangerates/rates/{}/{}/{}/",
                self.base_url, table, currency, date
            ),
            None => format!(
                "{}/exchangerates/rates/{}/{}/",
                self.base_url, table, currency
            ),
        }
    }

    fn series_url(
        &self,
        table: RateTable,
        currency: CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> String {
        format!(
            "{}/exchangerates/rates/{}/{}/{}/{}/",
            self.base_url, table, currency, start, end
        )
    }

    fn table_url(&self, table: RateTable, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => format!("{}/exchangerates/tables/{}/{}/", self.base_url, table, date),
            None => format!("{}/exchangerates/tables/{}/", self.base_url, table),
        }
    }

    /// GETs and decodes `url`. A 404 is not an error: NBP answers it for
    /// unknown codes and for dates without a publication.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, RateError> {
        debug!("Requesting rate data from {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RateError::NetworkError(format!("Request error: {e} URL: {url}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("No data at {}", url);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RateError::NetworkError(format!(
                "HTTP error: {status} URL: {url}"
            )));
        }

        let response_text = response.text().await?;
        match serde_json::from_str(&response_text) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse NBP response"
                );
                Err(RateError::MalformedResponse(format!(
                    "Failed to parse response from {url}: {e}"
                )))
            }
        }
    }

    /// Whether any table currently publishes `currency`.
    async fn is_published(&self, currency: CurrencyCode) -> Result<bool, RateError> {
        for table in RateTable::ALL {
            let url = self.rate_url(table, currency, None);
            if self.get_json::<NbpRatesResponse>(&url).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl RateProvider for NbpProvider {
    #[instrument(name = "NbpRateFetch", skip(self), fields(currency = %currency))]
    async fn fetch_rate(
        &self,
        currency: CurrencyCode,
        date: Option<NaiveDate>,
    ) -> Result<RateRecord, RateError> {
        if let Some(date) = date {
            ensure_not_future(date)?;
        }
        if currency.is_base() {
            return Ok(RateRecord::base(date.unwrap_or_else(today)));
        }

        for table in RateTable::ALL {
            let url = self.rate_url(table, currency, date);
            if let Some(body) = self.get_json::<NbpRatesResponse>(&url).await? {
                let mut records = body.into_records(currency, table)?;
                return records.pop().ok_or_else(|| {
                    RateError::MalformedResponse(format!("Empty rate list for {currency}"))
                });
            }
        }

        match date {
            Some(date) if self.is_published(currency).await? => {
                Err(RateError::NoDataForDate { currency, date })
            }
            _ => Err(RateError::UnknownCurrency(currency)),
        }
    }

    #[instrument(name = "NbpSeriesFetch", skip(self), fields(currency = %currency))]
    async fn fetch_series(
        &self,
        currency: CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateSeries, RateError> {
        if start > end {
            return Err(RateError::InvalidRange { start, end });
        }
        ensure_not_future(end)?;
        if currency.is_base() {
            return Ok(RateSeries::base(start, end));
        }

        let windows = date_windows(start.max(first_publication()), end);
        for table in RateTable::ALL {
            let mut found = false;
            let mut records = Vec::new();
            for (window_start, window_end) in &windows {
                let url = self.series_url(table, currency, *window_start, *window_end);
                if let Some(body) = self.get_json::<NbpRatesResponse>(&url).await? {
                    found = true;
                    records.extend(body.into_records(currency, table)?);
                }
            }
            if found {
                debug!(count = records.len(), %table, "Fetched rate series");
                return Ok(RateSeries::new(currency, start, end, records));
            }
        }

        if self.is_published(currency).await? {
            debug!("No rates published for {} between {} and {}", currency, start, end);
            Ok(RateSeries::new(currency, start, end, Vec::new()))
        } else {
            Err(RateError::UnknownCurrency(currency))
        }
    }

    #[instrument(name = "NbpTableFetch", skip(self))]
    async fn fetch_table(
        &self,
        table: RateTable,
        date: Option<NaiveDate>,
    ) -> Result<Vec<RateRecord>, RateError> {
        if let Some(date) = date {
            ensure_not_future(date)?;
        }

        let url = self.table_url(table, date);
        let tables = match self.get_json::<Vec<NbpTableResponse>>(&url).await? {
            Some(tables) => tables,
            None => {
                return Err(match date {
                    Some(date) => RateError::NoTableForDate { table, date },
                    None => RateError::MalformedResponse(format!("No table {table} returned")),
                });
            }
        };

        let body = tables.into_iter().next().ok_or_else(|| {
            RateError::MalformedResponse(format!("Empty table list for table {table}"))
        })?;

        let mut records = body
            .rates
            .into_iter()
            .map(|rate| {
                let code: CurrencyCode = rate.code.parse().map_err(|_| {
                    RateError::MalformedResponse(format!(
                        "Invalid currency code in table {table}: {}",
                        rate.code
                    ))
                })?;
                RateRecord::new(code, body.effective_date, rate.mid)
                    .map(|r| r.with_table(table).with_name(rate.currency))
            })
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by_key(|r| r.currency());
        Ok(records)
    }
}
