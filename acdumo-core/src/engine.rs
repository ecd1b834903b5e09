//! Engine orchestration: fetch → normalize → signal for every requested
//! instrument, then strategy selection.
//!
//! Instruments are independent, so their pipelines run on the rayon pool and
//! are joined into one [`SignalMap`] in request order.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::normalize::{load_series, MAX_ALIGNMENT_ATTEMPTS};
use crate::data::PriceProvider;
use crate::domain::{SamplingFrequency, SignalMap, StrategyDecision};
use crate::error::{EngineError, TickerFailure};
use crate::signal::{decide_strategy, momentum_breakdown, MomentumBreakdown};

/// Parameters of one signal computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRequest {
    pub as_of: NaiveDate,
    pub tickers: Vec<String>,
    pub safe_haven: String,
    pub frequency: SamplingFrequency,
    pub max_alignment_attempts: u32,
    /// Proceed with the instruments that succeeded instead of failing the
    /// whole decision. The safe haven must succeed either way.
    pub allow_partial: bool,
}

impl SignalRequest {
    pub fn new(
        as_of: NaiveDate,
        tickers: Vec<String>,
        safe_haven: impl Into<String>,
        frequency: SamplingFrequency,
    ) -> Self {
        Self {
            as_of,
            tickers,
            safe_haven: safe_haven.into(),
            frequency,
            max_alignment_attempts: MAX_ALIGNMENT_ATTEMPTS,
            allow_partial: false,
        }
    }

    /// The same request evaluated on another date.
    pub fn on(&self, as_of: NaiveDate) -> Self {
        Self {
            as_of,
            ..self.clone()
        }
    }

    fn validate(&self, today: NaiveDate) -> Result<(), EngineError> {
        if self.as_of > today {
            return Err(EngineError::FutureDateRequested {
                requested: self.as_of,
                today,
            });
        }
        for (i, ticker) in self.tickers.iter().enumerate() {
            if self.tickers[..i].contains(ticker) {
                return Err(EngineError::DuplicateTicker { ticker: ticker.clone() });
            }
        }
        if !self.tickers.contains(&self.safe_haven) {
            return Err(EngineError::MissingSafeHaven {
                ticker: self.safe_haven.clone(),
            });
        }
        Ok(())
    }
}

/// Per-instrument detail kept alongside the signal map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSignal {
    pub ticker: String,
    pub latest_date: Option<NaiveDate>,
    pub breakdown: MomentumBreakdown,
}

/// Result of [`compute_signals`].
#[derive(Debug)]
pub struct SignalOutcome {
    pub as_of: NaiveDate,
    pub frequency: SamplingFrequency,
    pub signals: SignalMap,
    pub instruments: Vec<InstrumentSignal>,
    /// Instruments skipped under `allow_partial`.
    pub failures: Vec<TickerFailure>,
}

fn instrument_signal(
    provider: &dyn PriceProvider,
    ticker: &str,
    request: &SignalRequest,
) -> Result<InstrumentSignal, EngineError> {
    let series = load_series(
        provider,
        ticker,
        request.as_of,
        request.frequency,
        request.max_alignment_attempts,
    )?;
    let breakdown = momentum_breakdown(&series, request.frequency)?;
    if !breakdown.signal.is_finite() {
        return Err(EngineError::InvalidSeries {
            ticker: ticker.to_string(),
            detail: format!("signal is not finite ({})", breakdown.signal),
        });
    }
    Ok(InstrumentSignal {
        ticker: ticker.to_string(),
        latest_date: series.latest_date(),
        breakdown,
    })
}

/// Compute every requested instrument's signal as of `request.as_of`.
///
/// `today` bounds the request date; a later `as_of` is rejected before any
/// fetch.
pub fn compute_signals(
    provider: &dyn PriceProvider,
    request: &SignalRequest,
    today: NaiveDate,
) -> Result<SignalOutcome, EngineError> {
    request.validate(today)?;

    tracing::info!(
        as_of = %request.as_of,
        frequency = %request.frequency,
        provider = provider.name(),
        tickers = request.tickers.len(),
        "computing signals"
    );

    let results: Vec<(String, Result<InstrumentSignal, EngineError>)> = request
        .tickers
        .par_iter()
        .map(|ticker| (ticker.clone(), instrument_signal(provider, ticker, request)))
        .collect();

    let mut instruments = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (ticker, result) in results {
        match result {
            Ok(signal) => {
                tracing::debug!(ticker = %ticker, signal = signal.breakdown.signal, "signal computed");
                instruments.push(signal);
            }
            Err(error) => {
                tracing::warn!(ticker = %ticker, error = %error, "signal computation failed");
                failures.push(TickerFailure { ticker, error });
            }
        }
    }

    let haven_failed = failures.iter().any(|f| f.ticker == request.safe_haven);
    if !failures.is_empty() && (!request.allow_partial || haven_failed) {
        return Err(EngineError::PartialFailure { failures });
    }

    let signals = SignalMap::from_pairs(
        instruments
            .iter()
            .map(|i| (i.ticker.clone(), i.breakdown.signal)),
    )?;

    Ok(SignalOutcome {
        as_of: request.as_of,
        frequency: request.frequency,
        signals,
        instruments,
        failures,
    })
}

impl SignalOutcome {
    pub fn decide(&self, safe_haven: &str) -> StrategyDecision {
        decide_strategy(&self.signals, safe_haven)
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}
