//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over market-data sources (Yahoo Finance,
//! CSV files, synthetic walks) so the engine can be driven offline and mocked
//! in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SamplingFrequency;

/// One dated price record as delivered by a provider, before normalization.
///
/// `adj_close` is `None` when the provider reported no value. Missing values
/// are never replaced by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrice {
    pub date: NaiveDate,
    pub adj_close: Option<f64>,
}

impl RawPrice {
    pub fn new(date: NaiveDate, adj_close: f64) -> Self {
        Self {
            date,
            adj_close: Some(adj_close),
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self {
            date,
            adj_close: None,
        }
    }
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("csv import failed for {path}: {reason}")]
    CsvImport { path: String, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// Source of historical prices sampled at a given frequency.
///
/// Implementations may return rows with missing prices, a partial trailing
/// period, or omit the most recent month boundary; the normalizer deals with
/// all three. Retry policy for transient failures belongs here, not in the
/// engine.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Which kind of source this is.
    fn source(&self) -> DataSource;

    /// Fetch price records for `ticker` with dates in `[start, end]`.
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        frequency: SamplingFrequency,
    ) -> Result<Vec<RawPrice>, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

impl<P: PriceProvider + ?Sized> PriceProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn source(&self) -> DataSource {
        (**self).source()
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        frequency: SamplingFrequency,
    ) -> Result<Vec<RawPrice>, DataError> {
        (**self).fetch(ticker, start, end, frequency)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
