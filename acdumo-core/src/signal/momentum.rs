//! Accelerated dual momentum signal.
//!
//! signal = Σ_h ( current / reference_h − 1 )  over the 1, 3 and 6 month horizons
//!
//! "current" and each "reference_h" are the mean of `smoothing_width`
//! consecutive prices starting at offset 0 and at the horizon offset. Monthly
//! data uses single points; weekly data averages four weeks. The per-horizon
//! returns are summed, not averaged, and the result is not clamped.

use serde::{Deserialize, Serialize};

use crate::domain::{PriceSeries, SamplingFrequency};
use crate::error::EngineError;

/// Approximate calendar length of each horizon, aligned with
/// [`SamplingFrequency::lookback_indices`].
pub const HORIZON_MONTHS: [u32; 3] = [1, 3, 6];

/// Return over one lookback horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonReturn {
    pub months: u32,
    pub index: usize,
    pub reference_price: f64,
    /// Fractional return `current / reference − 1`.
    pub fractional_return: f64,
}

/// Everything that went into one instrument's signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumBreakdown {
    pub current_price: f64,
    pub horizons: [HorizonReturn; 3],
    pub signal: f64,
}

/// Mean of the usable prices in `series[start .. start + width]`.
///
/// Non-finite entries are skipped. The window must lie inside the series.
fn window_mean(series: &PriceSeries, start: usize, width: usize) -> Result<f64, EngineError> {
    let end = start + width;
    if series.len() < end {
        return Err(EngineError::InvalidSeries {
            ticker: series.ticker.clone(),
            detail: format!("series of length {} lacks index {}", series.len(), end - 1),
        });
    }

    let (sum, count) = series.points()[start..end]
        .iter()
        .map(|p| p.adjusted_close)
        .filter(|p| p.is_finite())
        .fold((0.0_f64, 0_usize), |(s, n), p| (s + p, n + 1));

    if count == 0 {
        return Err(EngineError::InvalidSeries {
            ticker: series.ticker.clone(),
            detail: format!("no usable prices in window starting at index {start}"),
        });
    }
    Ok(sum / count as f64)
}

fn reference_price(series: &PriceSeries, index: usize, width: usize) -> Result<f64, EngineError> {
    let price = window_mean(series, index, width)?;
    if price == 0.0 {
        return Err(EngineError::DivisionByZero {
            ticker: series.ticker.clone(),
            index,
        });
    }
    if price < 0.0 {
        return Err(EngineError::InvalidSeries {
            ticker: series.ticker.clone(),
            detail: format!("negative reference price {price} at index {index}"),
        });
    }
    Ok(price)
}

/// Compute the signal together with its per-horizon returns.
pub fn momentum_breakdown(
    series: &PriceSeries,
    frequency: SamplingFrequency,
) -> Result<MomentumBreakdown, EngineError> {
    if series.frequency != frequency {
        return Err(EngineError::InvalidSeries {
            ticker: series.ticker.clone(),
            detail: format!("series sampled {} but {frequency} requested", series.frequency),
        });
    }

    let width = frequency.smoothing_width();
    let current_price = window_mean(series, 0, width)?;

    let mut horizons = [HorizonReturn {
        months: 0,
        index: 0,
        reference_price: 0.0,
        fractional_return: 0.0,
    }; 3];
    for (slot, (&index, &months)) in horizons
        .iter_mut()
        .zip(frequency.lookback_indices().iter().zip(HORIZON_MONTHS.iter()))
    {
        let reference = reference_price(series, index, width)?;
        *slot = HorizonReturn {
            months,
            index,
            reference_price: reference,
            fractional_return: current_price / reference - 1.0,
        };
    }

    let signal = horizons.iter().map(|h| h.fractional_return).sum();
    Ok(MomentumBreakdown {
        current_price,
        horizons,
        signal,
    })
}

/// Accelerated dual momentum signal for one normalized series.
pub fn compute_signal(series: &PriceSeries, frequency: SamplingFrequency) -> Result<f64, EngineError> {
    momentum_breakdown(series, frequency).map(|b| b.signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricePoint;
    use chrono::{Duration, NaiveDate};

    fn series(frequency: SamplingFrequency, prices: &[f64]) -> PriceSeries {
        let newest = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let step = match frequency {
            SamplingFrequency::Monthly => 30,
            SamplingFrequency::Weekly => 7,
        };
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(newest - Duration::days(step * i as i64), p))
            .collect();
        PriceSeries::new("SPY", frequency, points)
    }

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn monthly_sums_point_returns() {
        // current 120; refs: [1]=100, [3]=80, [6]=60
        let s = series(
            SamplingFrequency::Monthly,
            &[120.0, 100.0, 90.0, 80.0, 70.0, 65.0, 60.0],
        );
        let expected = (120.0 / 100.0 - 1.0) + (120.0 / 80.0 - 1.0) + (120.0 / 60.0 - 1.0);
        approx(compute_signal(&s, SamplingFrequency::Monthly).unwrap(), expected);
    }

    #[test]
    fn weekly_averages_four_week_windows() {
        let mut prices = vec![0.0; 28];
        for (i, p) in prices.iter_mut().enumerate() {
            *p = 200.0 - i as f64;
        }
        let s = series(SamplingFrequency::Weekly, &prices);
        let mean = |start: usize| (start..start + 4).map(|i| 200.0 - i as f64).sum::<f64>() / 4.0;
        let current = mean(0);
        let expected = (current / mean(4) - 1.0) + (current / mean(12) - 1.0) + (current / mean(24) - 1.0);
        let b = momentum_breakdown(&s, SamplingFrequency::Weekly).unwrap();
        approx(b.current_price, 198.5);
        approx(b.signal, expected);
        assert_eq!(b.horizons[2].index, 24);
        assert_eq!(b.horizons[2].months, 6);
    }

    #[test]
    fn weekly_skips_nan_in_window() {
        let mut prices = vec![100.0; 28];
        prices[1] = f64::NAN;
        prices[0] = 130.0;
        let s = series(SamplingFrequency::Weekly, &prices);
        let b = momentum_breakdown(&s, SamplingFrequency::Weekly).unwrap();
        approx(b.current_price, 110.0);
    }

    #[test]
    fn flat_series_has_zero_signal() {
        let s = series(SamplingFrequency::Monthly, &[50.0; 7]);
        assert_eq!(compute_signal(&s, SamplingFrequency::Monthly).unwrap(), 0.0);
    }

    #[test]
    fn zero_reference_is_division_by_zero() {
        let mut prices = [50.0; 7];
        prices[3] = 0.0;
        let s = series(SamplingFrequency::Monthly, &prices);
        let err = compute_signal(&s, SamplingFrequency::Monthly).unwrap_err();
        assert!(matches!(err, EngineError::DivisionByZero { index: 3, .. }));
    }

    #[test]
    fn short_series_is_invalid() {
        let s = series(SamplingFrequency::Weekly, &[100.0; 27]);
        let err = compute_signal(&s, SamplingFrequency::Weekly).unwrap_err();
        match err {
            EngineError::InvalidSeries { detail, .. } => assert!(detail.contains("lacks index 27")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn frequency_mismatch_is_invalid() {
        let s = series(SamplingFrequency::Weekly, &[100.0; 28]);
        assert!(matches!(
            compute_signal(&s, SamplingFrequency::Monthly),
            Err(EngineError::InvalidSeries { .. })
        ));
    }
}
