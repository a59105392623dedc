use super::ui;
use crate::core::history::{PairPoint, SeriesStats, cross_series};
use crate::core::{CurrencyCode, RateProvider};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::Cell;
use rust_decimal::Decimal;

const RATE_PRECISION: u32 = 4;
/// Rows listed in the table; the sparkline always covers the whole range.
const MAX_TABLE_ROWS: usize = 15;

pub struct HistoryView {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points: Vec<PairPoint>,
}

/// Fetches both series concurrently and pairs them on common dates.
pub async fn fetch_history(
    provider: &dyn RateProvider,
    from: CurrencyCode,
    to: CurrencyCode,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HistoryView> {
    let (from_series, to_series) = futures::try_join!(
        provider.fetch_series(from, start, end),
        provider.fetch_series(to, start, end),
    )
    .with_context(|| format!("Failed to fetch history for {from}/{to}"))?;

    Ok(HistoryView {
        from,
        to,
        start,
        end,
        points: cross_series(&from_series, &to_series),
    })
}

fn render(view: &HistoryView, width: usize) -> String {
    let title = format!("{}/{} exchange rate", view.from, view.to);
    let mut output = format!("{}\n", ui::style_text(&title, ui::StyleType::Title));

    let Some(stats) = SeriesStats::from_points(&view.points) else {
        output.push_str(&ui::style_text(
            &format!("No data available for {} to {}", view.start, view.end),
            ui::StyleType::Error,
        ));
        return output;
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell(&format!("{}/{}", view.from, view.to)),
        ui::header_cell("Change"),
    ]);

    let skip = view.points.len().saturating_sub(MAX_TABLE_ROWS);
    let mut previous = skip.checked_sub(1).map(|i| view.points[i].rate);
    for point in view.points.iter().skip(skip) {
        let change = match previous {
            Some(prev) => ui::change_cell((point.rate - prev) / prev * Decimal::ONE_HUNDRED),
            None => Cell::new(""),
        };
        table.add_row(vec![
            Cell::new(point.date),
            ui::rate_cell(point.rate, RATE_PRECISION),
            change,
        ]);
        previous = Some(point.rate);
    }
    output.push_str(&table.to_string());

    let rates: Vec<_> = view.points.iter().map(|p| p.rate).collect();
    output.push_str(&format!(
        "\n\n{}  {}\n",
        ui::sparkline(&rates, width.saturating_sub(4).max(10)),
        ui::style_text(
            &format!("{} .. {}", stats.first.date, stats.last.date),
            ui::StyleType::Subtle
        )
    ));

    output.push_str(&format!(
        "\n{} {} ({})   {} {} ({})   {} {}   {} {}%\n",
        ui::style_text("Min:", ui::StyleType::TotalLabel),
        ui::format_decimal(stats.min.rate, RATE_PRECISION),
        stats.min.date,
        ui::style_text("Max:", ui::StyleType::TotalLabel),
        ui::format_decimal(stats.max.rate, RATE_PRECISION),
        stats.max.date,
        ui::style_text("Avg:", ui::StyleType::TotalLabel),
        ui::format_decimal(stats.average, RATE_PRECISION),
        ui::style_text("Change:", ui::StyleType::TotalLabel),
        ui::format_decimal(stats.change_pct(), 2),
    ));
    output.push_str(&ui::style_text(
        &format!("Period: {} to {}", view.start, view.end),
        ui::StyleType::Subtle,
    ));
    output
}

pub async fn run(
    provider: &dyn RateProvider,
    from: CurrencyCode,
    to: CurrencyCode,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching {from}/{to} history..."));
    let view = fetch_history(provider, from, to, start, end).await;
    pb.finish_and_clear();

    println!("{}", render(&view?, ui::term_width()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn view(points: Vec<PairPoint>) -> HistoryView {
        HistoryView {
            from: "EUR".parse().unwrap(),
            to: "USD".parse().unwrap(),
            start: day(1),
            end: day(30),
            points,
        }
    }

    #[test]
    fn test_render_history() {
        let points = vec![
            PairPoint {
                date: day(3),
                rate: dec!(1.0850),
            },
            PairPoint {
                date: day(4),
                rate: dec!(1.0900),
            },
            PairPoint {
                date: day(5),
                rate: dec!(1.0800),
            },
        ];
        let output = render(&view(points), 80);
        assert!(output.contains("EUR/USD exchange rate"));
        assert!(output.contains("2024-06-04"));
        assert!(output.contains("1.0900"));
        assert!(output.contains("Min:"));
        assert!(output.contains("1.0800 (2024-06-05)"));
        assert!(output.contains("Period: 2024-06-01 to 2024-06-30"));
    }

    #[test]
    fn test_render_long_history_lists_latest_rows() {
        let points: Vec<PairPoint> = (1..=30)
            .map(|d| PairPoint {
                date: day(d),
                rate: dec!(4) + Decimal::from(d) / dec!(100),
            })
            .collect();
        let output = render(&view(points), 80);
        assert!(!output.contains("2024-06-10 "));
        assert!(output.contains("2024-06-30"));
        // Earliest row listed still shows a change against its predecessor
        assert!(output.contains("2024-06-16"));
    }

    #[test]
    fn test_render_empty_history() {
        let output = render(&view(Vec::new()), 80);
        assert!(output.contains("No data available for 2024-06-01 to 2024-06-30"));
    }
}
