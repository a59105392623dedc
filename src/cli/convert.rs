use super::ui;
use crate::core::{
    ConversionRequest, ConversionResult, CurrencyCode, RateError, RateProvider, RateRecord,
    convert,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;

async fn fetch_optional(
    provider: &dyn RateProvider,
    currency: Option<CurrencyCode>,
    date: Option<NaiveDate>,
) -> Result<Option<RateRecord>, RateError> {
    match currency {
        Some(currency) => provider.fetch_rate(currency, date).await.map(Some),
        None => Ok(None),
    }
}

/// Fetches whichever rates the request needs, concurrently, and converts.
pub async fn convert_with_provider(
    provider: &dyn RateProvider,
    request: &ConversionRequest,
    date: Option<NaiveDate>,
) -> Result<ConversionResult> {
    let (source_code, target_code) = request.required_rates();
    let (source_rate, target_rate) = futures::try_join!(
        fetch_optional(provider, source_code, date),
        fetch_optional(provider, target_code, date),
    )
    .with_context(|| format!("Failed to fetch rates for {} -> {}", request.from, request.to))?;

    let result = convert(request, source_rate.as_ref(), target_rate.as_ref())?;
    Ok(result)
}

fn render(result: &ConversionResult, precision: u32) -> String {
    let converted = format!("{} {}", ui::format_decimal(result.amount, precision), result.to);
    let mut output = format!(
        "{} {} = {}",
        result.original_amount.normalize(),
        result.from,
        ui::style_text(&converted, ui::StyleType::TotalValue)
    );
    if result.from != result.to {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!(
                    "1 {} = {} {}",
                    result.from,
                    ui::format_decimal(result.rate_used, 4),
                    result.to
                ),
                ui::StyleType::Subtle
            )
        ));
    }
    if let Some(date) = result.rate_date {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(&format!("NBP mid rates of {date}"), ui::StyleType::Subtle)
        ));
    }
    output
}

pub async fn run(
    provider: &dyn RateProvider,
    request: &ConversionRequest,
    date: Option<NaiveDate>,
    precision: u32,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching rates...");
    let result = convert_with_provider(provider, request, date).await;
    pb.finish_and_clear();

    println!("{}", render(&result?, precision));
    Ok(())
}
