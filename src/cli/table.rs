use super::ui;
use crate::core::{RateProvider, RateRecord, RateTable};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::Cell;

const RATE_PRECISION: u32 = 4;

fn render(table_id: RateTable, records: &[RateRecord]) -> String {
    let effective = records
        .first()
        .map_or("-".to_string(), |r| r.date().to_string());
    let mut output = format!(
        "{}\n\n",
        ui::style_text(
            &format!("NBP table {table_id} of {effective}"),
            ui::StyleType::Title
        )
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
        ui::header_cell("Mid (PLN)"),
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(record.currency()),
            Cell::new(record.name().unwrap_or("")),
            ui::rate_cell(record.mid(), RATE_PRECISION),
        ]);
    }
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{} {}",
        ui::style_text("Currencies:", ui::StyleType::TotalLabel),
        records.len()
    ));
    output
}

pub async fn run(
    provider: &dyn RateProvider,
    table: RateTable,
    date: Option<NaiveDate>,
) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching table {table}..."));
    let records = provider.fetch_table(table, date).await;
    pb.finish_and_clear();

    let records = records.with_context(|| format!("Failed to fetch table {table}"))?;
    println!("{}", render(table, &records));
    Ok(())
}
