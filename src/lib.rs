pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{ConversionRequest, CurrencyCode, RateTable};
use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Date window of the `history` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    /// The last N days up to today; `None` uses the configured period.
    LastDays(Option<u32>),
    Between { start: NaiveDate, end: NaiveDate },
}

impl HistoryRange {
    /// Start and end dates of the window; fails when `days` reaches past the calendar.
    pub fn resolve(&self, default_days: u32, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        match *self {
            HistoryRange::LastDays(days) => {
                let days = days.unwrap_or(default_days);
                let start = today
                    .checked_sub_signed(Duration::days(i64::from(days)))
                    .with_context(|| format!("History period of {days} days is too long"))?;
                Ok((start, today))
            }
            HistoryRange::Between { start, end } => Ok((start, end)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Rate {
        currency: CurrencyCode,
        date: Option<NaiveDate>,
    },
    Convert {
        amount: Option<Decimal>,
        from: Option<CurrencyCode>,
        to: Option<CurrencyCode>,
        date: Option<NaiveDate>,
    },
    History {
        from: CurrencyCode,
        to: Option<CurrencyCode>,
        range: HistoryRange,
    },
    Table {
        table: RateTable,
        date: Option<NaiveDate>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("nbpfx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = providers::NbpProvider::new(
        &config.provider.base_url,
        std::time::Duration::from_secs(config.provider.timeout_secs),
    )?;

    match command {
        AppCommand::Rate { currency, date } => cli::rate::run(&provider, currency, date).await,
        AppCommand::Convert {
            amount,
            from,
            to,
            date,
        } => {
            let request = ConversionRequest::new(
                amount.unwrap_or(config.defaults.amount),
                from.unwrap_or(config.defaults.from),
                to.unwrap_or(config.defaults.to),
            );
            cli::convert::run(&provider, &request, date, config.defaults.precision).await
        }
        AppCommand::History { from, to, range } => {
            let today = Local::now().date_naive();
            let (start, end) = range.resolve(config.defaults.period_days, today)?;
            let to = to.unwrap_or(CurrencyCode::PLN);
            cli::history::run(&provider, from, to, start, end).await
        }
        AppCommand::Table { table, date } => cli::table::run(&provider, table, date).await,
    }
}
