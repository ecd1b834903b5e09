//! Synthetic price provider for offline runs and tests.
//!
//! Produces a seeded random walk per ticker, sampled on the same bucket
//! labels as the chart API. The walk always starts from a fixed anchor date,
//! so two queries with overlapping windows agree on every shared row.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::csv_provider::bucket_label;
use super::provider::{DataError, DataSource, PriceProvider, RawPrice};
use crate::domain::SamplingFrequency;

const ANCHOR: (i32, u32, u32) = (2000, 1, 3);

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn ticker_seed(&self, ticker: &str) -> u64 {
        let hash = blake3::hash(ticker.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        self.seed ^ u64::from_le_bytes(bytes)
    }

    fn next_label(label: NaiveDate, frequency: SamplingFrequency) -> NaiveDate {
        match frequency {
            SamplingFrequency::Weekly => label + Duration::days(7),
            SamplingFrequency::Monthly => bucket_label(label + Duration::days(32), frequency),
        }
    }

    /// Full walk from the anchor through `end`.
    pub fn walk(&self, ticker: &str, end: NaiveDate, frequency: SamplingFrequency) -> Vec<RawPrice> {
        let mut rng = StdRng::seed_from_u64(self.ticker_seed(ticker));
        let drift: f64 = rng.gen_range(-0.004..0.006);
        let vol: f64 = rng.gen_range(0.01..0.05);
        let mut price: f64 = rng.gen_range(20.0..400.0);

        let Some(anchor) = NaiveDate::from_ymd_opt(ANCHOR.0, ANCHOR.1, ANCHOR.2) else {
            return Vec::new();
        };
        let mut label = bucket_label(anchor, frequency);
        let mut out = Vec::new();
        while label <= end {
            out.push(RawPrice::new(label, price));
            let step: f64 = rng.gen_range(-vol..vol) + drift;
            price *= step.exp();
            label = Self::next_label(label, frequency);
        }
        out
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        frequency: SamplingFrequency,
    ) -> Result<Vec<RawPrice>, DataError> {
        if ticker.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        Ok(self
            .walk(ticker, end, frequency)
            .into_iter()
            .filter(|r| r.date >= bucket_label(start, frequency))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn monthly_rows_are_first_of_month() {
        let p = SyntheticProvider::new(7);
        let rows = p
            .fetch("SPY", d(2024, 1, 15), d(2024, 8, 20), SamplingFrequency::Monthly)
            .unwrap();
        assert_eq!(rows.first().unwrap().date, d(2024, 1, 1));
        assert_eq!(rows.last().unwrap().date, d(2024, 8, 1));
        assert!(rows.iter().all(|r| r.date.day() == 1));
        assert!(rows.iter().all(|r| r.adj_close.unwrap() > 0.0));
    }

    #[test]
    fn overlapping_windows_agree() {
        let p = SyntheticProvider::new(42);
        let a = p
            .fetch("VSS", d(2024, 1, 1), d(2024, 6, 30), SamplingFrequency::Weekly)
            .unwrap();
        let b = p
            .fetch("VSS", d(2024, 3, 1), d(2024, 7, 31), SamplingFrequency::Weekly)
            .unwrap();
        let shared = b.iter().find(|r| r.date == d(2024, 4, 1)).unwrap();
        assert!(a.contains(shared));
    }

    #[test]
    fn tickers_walk_independently() {
        let p = SyntheticProvider::new(1);
        let spy = p.walk("SPY", d(2020, 1, 1), SamplingFrequency::Monthly);
        let tlt = p.walk("TLT", d(2020, 1, 1), SamplingFrequency::Monthly);
        assert_ne!(spy.last(), tlt.last());
    }
}
