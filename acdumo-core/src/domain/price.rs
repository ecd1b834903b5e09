//! Price observations and normalized price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SamplingFrequency;

/// One normalized observation of an instrument's adjusted close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub formatted_label: String,
    pub adjusted_close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, adjusted_close: f64) -> Self {
        Self {
            date,
            formatted_label: date.format("%Y-%m-%d").to_string(),
            adjusted_close,
        }
    }

    /// A price the signal formula can use: finite and strictly positive.
    pub fn is_usable(&self) -> bool {
        self.adjusted_close.is_finite() && self.adjusted_close > 0.0
    }
}

/// Price observations for one instrument, most recent first (index 0).
///
/// The normalizer is the only producer that guarantees the length and
/// no-missing invariants; the calculator re-checks what it reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub frequency: SamplingFrequency,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, frequency: SamplingFrequency, points: Vec<PricePoint>) -> Self {
        Self {
            ticker: ticker.into(),
            frequency,
            points,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Date of the most recent observation.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Same dates, every price multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let points = self
            .points
            .iter()
            .map(|p| PricePoint {
                adjusted_close: p.adjusted_close * factor,
                ..p.clone()
            })
            .collect();
        Self::new(self.ticker.clone(), self.frequency, points)
    }
}
