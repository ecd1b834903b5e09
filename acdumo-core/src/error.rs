//! Engine error taxonomy.
//!
//! Every variant that concerns a single instrument carries its ticker so a
//! partial failure can be reported per instrument.

use chrono::NaiveDate;
use thiserror::Error;

use crate::data::DataError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("insufficient data for {ticker}: {detail}")]
    InsufficientData { ticker: String, detail: String },

    #[error("invalid series for {ticker}: {detail}")]
    InvalidSeries { ticker: String, detail: String },

    #[error("division by zero for {ticker}: reference price at index {index} is zero")]
    DivisionByZero { ticker: String, index: usize },

    #[error("requested date {requested} is later than today ({today})")]
    FutureDateRequested { requested: NaiveDate, today: NaiveDate },

    #[error("ticker {ticker} appears more than once")]
    DuplicateTicker { ticker: String },

    #[error("no signal for safe haven {ticker}")]
    MissingSafeHaven { ticker: String },

    #[error("signal computation failed for {}", describe_failures(.failures))]
    PartialFailure { failures: Vec<TickerFailure> },

    #[error("price data for {ticker}: {source}")]
    Data {
        ticker: String,
        #[source]
        source: DataError,
    },
}

impl EngineError {
    /// Ticker the error concerns, if it concerns exactly one.
    pub fn ticker(&self) -> Option<&str> {
        match self {
            Self::InsufficientData { ticker, .. }
            | Self::InvalidSeries { ticker, .. }
            | Self::DivisionByZero { ticker, .. }
            | Self::DuplicateTicker { ticker }
            | Self::MissingSafeHaven { ticker }
            | Self::Data { ticker, .. } => Some(ticker),
            Self::FutureDateRequested { .. } | Self::PartialFailure { .. } => None,
        }
    }
}

/// One instrument whose signal could not be computed.
#[derive(Debug)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: EngineError,
}

fn describe_failures(failures: &[TickerFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.ticker, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}
