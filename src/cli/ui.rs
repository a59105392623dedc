use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right aligned cell for a rate, padded to `precision` digits.
pub fn rate_cell(rate: Decimal, precision: u32) -> Cell {
    Cell::new(format_decimal(rate, precision)).set_alignment(CellAlignment::Right)
}

/// Creates a cell for displaying percentage change with color coding.
pub fn change_cell(change: Decimal) -> Cell {
    let text = format!("{}%", format_decimal(change, 2));
    let color = if change >= Decimal::ZERO {
        Color::Green
    } else {
        Color::Red
    };
    Cell::new(text)
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

/// Rounds half away from zero and always shows `precision` fractional digits.
pub fn format_decimal(value: Decimal, precision: u32) -> String {
    let mut rounded =
        value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(precision);
    rounded.to_string()
}

/// Spinner shown while waiting on the network.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

const SPARK_TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One block character per value, scaled between the series min and max.
/// Long series are averaged down to at most `width` buckets.
pub fn sparkline(values: &[Decimal], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let bucket_size = values.len().div_ceil(width);
    let buckets: Vec<f64> = values
        .chunks(bucket_size)
        .map(|chunk| {
            let sum: Decimal = chunk.iter().sum();
            (sum / Decimal::from(chunk.len())).to_f64().unwrap_or(0.0)
        })
        .collect();

    let min = buckets.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = buckets.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    buckets
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                SPARK_TICKS[SPARK_TICKS.len() / 2]
            } else {
                let idx = ((v - min) / span * (SPARK_TICKS.len() - 1) as f64).round() as usize;
                SPARK_TICKS[idx.min(SPARK_TICKS.len() - 1)]
            }
        })
        .collect()
}

/// Width of the terminal, 80 when it cannot be determined.
pub fn term_width() -> usize {
    console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80)
}
