//! Midpoint rate conversion between PLN and foreign currencies

use crate::core::currency::CurrencyCode;
use crate::core::error::ConversionError;
use crate::core::rate::RateRecord;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRequest {
    pub amount: Decimal,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl ConversionRequest {
    pub fn new(amount: Decimal, from: CurrencyCode, to: CurrencyCode) -> Self {
        Self { amount, from, to }
    }

    /// Currencies that need a published rate for this request.
    pub fn required_rates(&self) -> (Option<CurrencyCode>, Option<CurrencyCode>) {
        if self.from == self.to {
            return (None, None);
        }
        let source = (!self.from.is_base()).then_some(self.from);
        let target = (!self.to.is_base()).then_some(self.to);
        (source, target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    /// Converted amount, unrounded.
    pub amount: Decimal,
    pub original_amount: Decimal,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Units of `to` per one unit of `from`.
    pub rate_used: Decimal,
    /// Effective date of the most recent rate involved.
    pub rate_date: Option<NaiveDate>,
    pub timestamp: DateTime<Utc>,
}

impl ConversionResult {
    /// Amount rounded for display, midpoint away from zero.
    pub fn rounded(&self, precision: u32) -> Decimal {
        self.amount
            .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn display(&self, precision: u32) -> String {
        format!(
            "{} {} = {} {}",
            self.original_amount.normalize(),
            self.from,
            self.rounded(precision),
            self.to
        )
    }
}

fn checked_rate<'a>(
    rate: Option<&'a RateRecord>,
    currency: CurrencyCode,
) -> Result<&'a RateRecord, ConversionError> {
    let rate = rate.ok_or(ConversionError::MissingRate(currency))?;
    if rate.currency() != currency {
        return Err(ConversionError::RateMismatch {
            expected: currency,
            found: rate.currency(),
        });
    }
    Ok(rate)
}

/// Side of a conversion in PLN terms: the base currency is worth exactly one PLN.
fn pln_value(
    currency: CurrencyCode,
    rate: Option<&RateRecord>,
) -> Result<(Decimal, Option<NaiveDate>), ConversionError> {
    if currency.is_base() {
        return Ok((Decimal::ONE, rate.map(RateRecord::date)));
    }
    let rate = checked_rate(rate, currency)?;
    Ok((rate.mid(), Some(rate.date())))
}

/// Converts `req.amount` using PLN as the intermediate currency.
///
/// `source_rate` is required unless `from` is PLN, `target_rate` unless `to` is PLN.
pub fn convert(
    req: &ConversionRequest,
    source_rate: Option<&RateRecord>,
    target_rate: Option<&RateRecord>,
) -> Result<ConversionResult, ConversionError> {
    if req.amount <= Decimal::ZERO {
        return Err(ConversionError::InvalidAmount(req.amount));
    }

    let timestamp = Utc::now();

    if req.from == req.to {
        return Ok(ConversionResult {
            amount: req.amount,
            original_amount: req.amount,
            from: req.from,
            to: req.to,
            rate_used: Decimal::ONE,
            rate_date: None,
            timestamp,
        });
    }

    let (source_mid, source_date) = pln_value(req.from, source_rate)?;
    let (target_mid, target_date) = pln_value(req.to, target_rate)?;

    let overflow = || ConversionError::Overflow {
        amount: req.amount,
        from: req.from,
        to: req.to,
    };
    // Multiply before dividing so PLN -> foreign and foreign -> foreign keep full precision
    let amount = req
        .amount
        .checked_mul(source_mid)
        .and_then(|v| v.checked_div(target_mid))
        .ok_or_else(overflow)?;
    let rate_used = source_mid.checked_div(target_mid).ok_or_else(overflow)?;

    Ok(ConversionResult {
        amount,
        original_amount: req.amount,
        from: req.from,
        to: req.to,
        rate_used,
        rate_date: source_date.max(target_date),
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn rate(c: &str, mid: Decimal) -> RateRecord {
        RateRecord::new(code(c), NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(), mid).unwrap()
    }

    #[test]
    fn test_foreign_to_base_multiplies() {
        let req = ConversionRequest::new(dec!(100), code("USD"), CurrencyCode::PLN);
        let usd = rate("USD", dec!(4.00));
        let result = convert(&req, Some(&usd), None).unwrap();
        assert_eq!(result.rounded(2), dec!(400.00));
        assert_eq!(result.rate_used, dec!(4.00));
        assert_eq!(result.rate_date, Some(usd.date()));
    }

    #[test]
    fn test_base_to_foreign_divides() {
        let req = ConversionRequest::new(dec!(400), CurrencyCode::PLN, code("USD"));
        let usd = rate("USD", dec!(4.00));
        let result = convert(&req, None, Some(&usd)).unwrap();
        assert_eq!(result.rounded(2), dec!(100.00));
        assert_eq!(result.rate_used, dec!(0.25));
    }

    #[test]
    fn test_cross_rate_goes_through_base() {
        let req = ConversionRequest::new(dec!(100), code("USD"), code("EUR"));
        let usd = rate("USD", dec!(4.00));
        let eur = rate("EUR", dec!(4.50));
        let result = convert(&req, Some(&usd), Some(&eur)).unwrap();
        assert_eq!(result.rounded(2), dec!(88.89));
        assert_eq!(result.display(2), "100 USD = 88.89 EUR");
        // Internal value is not rounded
        assert!(result.amount > dec!(88.888) && result.amount < dec!(88.889));
    }

    #[test]
    fn test_round_trip_returns_original_amount() {
        let usd = rate("USD", dec!(3.9432));
        let eur = rate("EUR", dec!(4.3215));
        let chf = rate("CHF", dec!(4.4871));
        let pairs = [
            ("USD", "EUR", Some(&usd), Some(&eur)),
            ("EUR", "CHF", Some(&eur), Some(&chf)),
            ("PLN", "CHF", None, Some(&chf)),
            ("USD", "PLN", Some(&usd), None),
        ];

        for amount in [dec!(0.01), dec!(1), dec!(123.45), dec!(1000000)] {
            for (from, to, from_rate, to_rate) in pairs {
                let there = convert(
                    &ConversionRequest::new(amount, code(from), code(to)),
                    from_rate,
                    to_rate,
                )
                .unwrap();
                let back = convert(
                    &ConversionRequest::new(there.amount, code(to), code(from)),
                    to_rate,
                    from_rate,
                )
                .unwrap();
                assert!(
                    (back.amount - amount).abs() < dec!(0.000001),
                    "{amount} {from}->{to}->{from} gave {}",
                    back.amount
                );
            }
        }
    }

    #[test]
    fn test_non_positive_amount_is_rejected() {
        let usd = rate("USD", dec!(4.00));
        for amount in [Decimal::ZERO, dec!(-0.01), dec!(-100)] {
            let req = ConversionRequest::new(amount, code("USD"), CurrencyCode::PLN);
            assert_eq!(
                convert(&req, Some(&usd), None),
                Err(ConversionError::InvalidAmount(amount))
            );
        }
        // Checked before anything else, even for identity conversions
        let req = ConversionRequest::new(Decimal::ZERO, code("USD"), code("USD"));
        assert!(matches!(
            convert(&req, None, None),
            Err(ConversionError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_missing_rates() {
        let usd = rate("USD", dec!(4.00));
        let req = ConversionRequest::new(dec!(10), code("USD"), code("EUR"));
        assert_eq!(
            convert(&req, Some(&usd), None),
            Err(ConversionError::MissingRate(code("EUR")))
        );
        assert_eq!(
            convert(&req, None, Some(&rate("EUR", dec!(4.5)))),
            Err(ConversionError::MissingRate(code("USD")))
        );

        let req = ConversionRequest::new(dec!(10), CurrencyCode::PLN, code("USD"));
        assert_eq!(
            convert(&req, Some(&usd), None),
            Err(ConversionError::MissingRate(code("USD")))
        );
    }

    #[test]
    fn test_mismatched_rate_is_rejected() {
        let req = ConversionRequest::new(dec!(10), code("USD"), CurrencyCode::PLN);
        let eur = rate("EUR", dec!(4.5));
        assert_eq!(
            convert(&req, Some(&eur), None),
            Err(ConversionError::RateMismatch {
                expected: code("USD"),
                found: code("EUR"),
            })
        );
    }

    #[test]
    fn test_amount_beyond_decimal_range_is_an_error() {
        let usd = rate("USD", dec!(4.00));
        let req = ConversionRequest::new(Decimal::MAX, code("USD"), CurrencyCode::PLN);
        assert_eq!(
            convert(&req, Some(&usd), None),
            Err(ConversionError::Overflow {
                amount: Decimal::MAX,
                from: code("USD"),
                to: CurrencyCode::PLN,
            })
        );

        // Dividing by a small target rate overflows as well
        let req = ConversionRequest::new(Decimal::MAX, CurrencyCode::PLN, code("IDR"));
        let idr = rate("IDR", dec!(0.000251));
        assert!(matches!(
            convert(&req, None, Some(&idr)),
            Err(ConversionError::Overflow { .. })
        ));

        // Largest amount is still fine when it only shrinks
        let eur = rate("EUR", dec!(4.50));
        let req = ConversionRequest::new(Decimal::MAX, CurrencyCode::PLN, code("EUR"));
        assert!(convert(&req, None, Some(&eur)).is_ok());
    }

    #[test]
    fn test_same_currency_is_identity() {
        let req = ConversionRequest::new(dec!(42.5), code("GBP"), code("GBP"));
        let result = convert(&req, None, None).unwrap();
        assert_eq!(result.amount, dec!(42.5));
        assert_eq!(result.rate_used, Decimal::ONE);
    }

    #[test]
    fn test_required_rates() {
        let req = ConversionRequest::new(dec!(1), code("USD"), code("EUR"));
        assert_eq!(req.required_rates(), (Some(code("USD")), Some(code("EUR"))));
        let req = ConversionRequest::new(dec!(1), CurrencyCode::PLN, code("EUR"));
        assert_eq!(req.required_rates(), (None, Some(code("EUR"))));
        let req = ConversionRequest::new(dec!(1), code("EUR"), code("EUR"));
        assert_eq!(req.required_rates(), (None, None));
    }

    #[test]
    fn test_rounding_is_midpoint_away_from_zero() {
        let req = ConversionRequest::new(dec!(1.005), code("USD"), CurrencyCode::PLN);
        let result = convert(&req, Some(&rate("USD", dec!(1))), None).unwrap();
        assert_eq!(result.rounded(2), dec!(1.01));
    }
}
