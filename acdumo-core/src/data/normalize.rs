//! Price series normalization.
//!
//! Turns raw provider rows into a [`PriceSeries`] the signal calculator can
//! read: chronological sort, date dedupe, missing-price removal, the
//! per-frequency period rule, then a flip so index 0 is the newest row.
//!
//! Monthly data must contain the first-of-month row for the query month.
//! Providers sometimes lag on that row, so [`load_series`] widens the fetch
//! window one day at a time, up to a fixed number of fetches.

use chrono::{Datelike, Duration, NaiveDate};

use super::provider::{PriceProvider, RawPrice};
use crate::domain::{PricePoint, PriceSeries, SamplingFrequency};
use crate::error::EngineError;

/// Default cap on monthly alignment fetches.
pub const MAX_ALIGNMENT_ATTEMPTS: u32 = 10;

/// Length of one weekly bucket in days.
const WEEK_DAYS: i64 = 7;

/// Sort, dedupe (last delivered record wins) and drop rows after `as_of`.
fn chronological(raw: &[RawPrice], as_of: NaiveDate) -> Vec<RawPrice> {
    let mut rows: Vec<RawPrice> = raw.iter().filter(|r| r.date <= as_of).cloned().collect();
    rows.sort_by_key(|r| r.date);

    let mut deduped: Vec<RawPrice> = Vec::with_capacity(rows.len());
    for row in rows {
        match deduped.last_mut() {
            Some(last) if last.date == row.date => *last = row,
            _ => deduped.push(row),
        }
    }
    deduped
}

fn is_month_start(date: NaiveDate) -> bool {
    date.day() == 1
}

/// Whether the newest first-of-month row with a price falls in `as_of`'s month.
pub fn is_month_aligned(raw: &[RawPrice], as_of: NaiveDate) -> bool {
    chronological(raw, as_of)
        .iter()
        .rev()
        .find(|r| r.adj_close.is_some() && is_month_start(r.date))
        .is_some_and(|r| r.date.year() == as_of.year() && r.date.month() == as_of.month())
}

/// A weekly bucket dated `d` covers `[d, d + 7)`; it is complete once the
/// next bucket has opened, i.e. `as_of >= d + 7`.
fn is_partial_week(bucket: NaiveDate, as_of: NaiveDate) -> bool {
    bucket + Duration::days(WEEK_DAYS) > as_of
}

/// Normalize raw provider rows for `ticker` as of `as_of`.
pub fn normalize(
    ticker: &str,
    raw: &[RawPrice],
    frequency: SamplingFrequency,
    as_of: NaiveDate,
) -> Result<PriceSeries, EngineError> {
    let mut rows: Vec<(NaiveDate, f64)> = Vec::new();
    for row in chronological(raw, as_of) {
        let Some(price) = row.adj_close else { continue };
        if !price.is_finite() {
            continue;
        }
        if price <= 0.0 {
            return Err(EngineError::InvalidSeries {
                ticker: ticker.to_string(),
                detail: format!("non-positive adjusted close {price} on {}", row.date),
            });
        }
        rows.push((row.date, price));
    }

    match frequency {
        SamplingFrequency::Monthly => {
            rows.retain(|(date, _)| is_month_start(*date));
            let aligned = rows
                .last()
                .is_some_and(|(date, _)| date.year() == as_of.year() && date.month() == as_of.month());
            if !aligned {
                return Err(EngineError::InsufficientData {
                    ticker: ticker.to_string(),
                    detail: format!(
                        "no first-of-month row for {} (latest is {})",
                        as_of.format("%Y-%m"),
                        rows.last()
                            .map(|(d, _)| d.to_string())
                            .unwrap_or_else(|| "none".into())
                    ),
                });
            }
        }
        SamplingFrequency::Weekly => {
            if rows.last().is_some_and(|(date, _)| is_partial_week(*date, as_of)) {
                rows.pop();
            }
        }
    }

    let required = frequency.min_series_len();
    if rows.len() < required {
        return Err(EngineError::InsufficientData {
            ticker: ticker.to_string(),
            detail: format!("{} {frequency} rows, need at least {required}", rows.len()),
        });
    }

    let points = rows
        .into_iter()
        .rev()
        .map(|(date, price)| PricePoint::new(date, price))
        .collect();
    Ok(PriceSeries::new(ticker, frequency, points))
}

/// Fetch and normalize one instrument.
///
/// The fetch window spans `frequency.fetch_window_days()` back from `as_of`.
/// For monthly data the window end is pushed forward one day per attempt
/// until the query month's first-of-month row appears; after
/// `max_attempts` fetches the load fails with `InsufficientData`.
pub fn load_series(
    provider: &dyn PriceProvider,
    ticker: &str,
    as_of: NaiveDate,
    frequency: SamplingFrequency,
    max_attempts: u32,
) -> Result<PriceSeries, EngineError> {
    let start = as_of - Duration::days(frequency.fetch_window_days());
    let mut end = as_of;

    for attempt in 1..=max_attempts {
        let raw = provider
            .fetch(ticker, start, end, frequency)
            .map_err(|source| EngineError::Data {
                ticker: ticker.to_string(),
                source,
            })?;

        if frequency == SamplingFrequency::Weekly || is_month_aligned(&raw, as_of) {
            return normalize(ticker, &raw, frequency, as_of);
        }

        tracing::debug!(ticker, attempt, %end, "month boundary missing, widening fetch window");
        end += Duration::days(1);
    }

    tracing::warn!(ticker, max_attempts, "gave up waiting for month boundary row");
    Err(EngineError::InsufficientData {
        ticker: ticker.to_string(),
        detail: format!(
            "no first-of-month row for {} after {max_attempts} fetch attempts",
            as_of.format("%Y-%m")
        ),
    })
}
