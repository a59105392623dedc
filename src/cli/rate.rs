use super::ui;
use crate::core::{CurrencyCode, RateProvider, RateRecord};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::Cell;

const RATE_PRECISION: u32 = 4;

fn render(record: &RateRecord) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
        ui::header_cell("Table"),
        ui::header_cell("Date"),
        ui::header_cell("Mid (PLN)"),
    ]);
    table.add_row(vec![
        Cell::new(record.currency()),
        Cell::new(record.name().unwrap_or("")),
        Cell::new(record.table().map_or("-".to_string(), |t| t.to_string())),
        Cell::new(record.date()),
        ui::rate_cell(record.mid(), RATE_PRECISION),
    ]);
    table.to_string()
}

pub async fn run(
    provider: &dyn RateProvider,
    currency: CurrencyCode,
    date: Option<NaiveDate>,
) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching {currency} rate..."));
    let record = provider.fetch_rate(currency, date).await;
    pb.finish_and_clear();

    let record = record.with_context(|| format!("Failed to fetch rate for {currency}"))?;
    println!("{}", render(&record));
    Ok(())
}
