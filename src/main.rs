use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use nbpfx::core::log::init_logging;
use nbpfx::core::{CurrencyCode, RateTable};
use nbpfx::{AppCommand, HistoryRange};
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true, visible_alias = "debug")]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the NBP mid rate of a currency
    Rate {
        /// Currency code, e.g. USD
        currency: CurrencyCode,
        /// Publication date (YYYY-MM-DD), latest when omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert
        amount: Option<Decimal>,
        /// Source currency code
        from: Option<CurrencyCode>,
        /// Target currency code
        to: Option<CurrencyCode>,
        /// Use the rates published on this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Display historical rates of a currency pair
    History {
        /// Source currency code
        from: CurrencyCode,
        /// Target currency code, PLN when omitted
        to: Option<CurrencyCode>,
        /// Number of days up to today
        #[arg(long, conflicts_with_all = ["start", "end"])]
        days: Option<u32>,
        /// First day of the range (YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,
        /// Last day of the range (YYYY-MM-DD)
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
    },
    /// List every currency of an NBP rate table
    Table {
        /// Table A or B
        #[arg(default_value = "A")]
        table: RateTable,
        /// Publication date (YYYY-MM-DD), latest when omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Rate { currency, date } => AppCommand::Rate { currency, date },
            Commands::Convert {
                amount,
                from,
                to,
                date,
            } => AppCommand::Convert {
                amount,
                from,
                to,
                date,
            },
            Commands::History {
                from,
                to,
                days,
                start,
                end,
            } => {
                let range = match (start, end) {
                    (Some(start), Some(end)) => HistoryRange::Between { start, end },
                    _ => HistoryRange::LastDays(days),
                };
                AppCommand::History { from, to, range }
            }
            Commands::Table { table, date } => AppCommand::Table { table, date },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => nbpfx::cli::setup::setup(cli.config_path.as_deref()),
        Some(cmd) => nbpfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from(["nbpfx", "convert", "100", "usd", "eur"]).unwrap();
        let command: AppCommand = cli.command.unwrap().into();
        assert_eq!(
            command,
            AppCommand::Convert {
                amount: Some(Decimal::ONE_HUNDRED),
                from: Some("USD".parse().unwrap()),
                to: Some("EUR".parse().unwrap()),
                date: None,
            }
        );
    }

    #[test]
    fn test_parse_history_range() {
        let cli = Cli::try_parse_from([
            "nbpfx",
            "history",
            "CHF",
            "--start",
            "2024-01-01",
            "--end",
            "2024-03-31",
        ])
        .unwrap();
        let command: AppCommand = cli.command.unwrap().into();
        assert!(matches!(
            command,
            AppCommand::History {
                to: None,
                range: HistoryRange::Between { .. },
                ..
            }
        ));

        assert!(Cli::try_parse_from(["nbpfx", "history", "CHF", "--start", "2024-01-01"]).is_err());
        assert!(Cli::try_parse_from(["nbpfx", "rate", "dollars"]).is_err());
    }

    #[test]
    fn test_debug_alias() {
        let cli = Cli::try_parse_from(["nbpfx", "--debug", "table", "b"]).unwrap();
        assert!(cli.verbose);
    }
}
