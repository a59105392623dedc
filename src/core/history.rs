//! Cross rates and summary statistics over historical series

use crate::core::rate::RateSeries;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Price of one unit of the source currency in the target currency on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairPoint {
    pub date: NaiveDate,
    pub rate: Decimal,
}

/// Pairs two series on their common dates, yielding `from.mid / to.mid`.
pub fn cross_series(from: &RateSeries, to: &RateSeries) -> Vec<PairPoint> {
    let to_by_date: BTreeMap<NaiveDate, Decimal> =
        to.records().iter().map(|r| (r.date(), r.mid())).collect();

    from.records()
        .iter()
        .filter_map(|r| {
            to_by_date.get(&r.date()).map(|to_mid| PairPoint {
                date: r.date(),
                rate: r.mid() / to_mid,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub min: PairPoint,
    pub max: PairPoint,
    pub average: Decimal,
    pub first: PairPoint,
    pub last: PairPoint,
    pub points: usize,
}

impl SeriesStats {
    pub fn from_points(points: &[PairPoint]) -> Option<Self> {
        let first = *points.first()?;
        let last = *points.last()?;
        let min = *points.iter().min_by_key(|p| p.rate)?;
        let max = *points.iter().max_by_key(|p| p.rate)?;
        let sum: Decimal = points.iter().map(|p| p.rate).sum();

        Some(Self {
            min,
            max,
            average: sum / Decimal::from(points.len()),
            first,
            last,
            points: points.len(),
        })
    }

    /// Percentage change from the first to the last point.
    pub fn change_pct(&self) -> Decimal {
        (self.last.rate - self.first.rate) / self.first.rate * Decimal::ONE_HUNDRED
    }
}
