//! Signal maps, strategy decisions and notification events.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;

/// One instrument's momentum signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEntry {
    pub ticker: String,
    pub signal: f64,
}

/// Ticker → signal mapping with unique keys.
///
/// Entries keep the order in which they were supplied. That order is the
/// tie-break used by the strategy selector, so it is part of the value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<SignalEntry>", into = "Vec<SignalEntry>")]
pub struct SignalMap {
    entries: Vec<SignalEntry>,
}

impl SignalMap {
    /// Build a map from `(ticker, signal)` pairs, rejecting repeated tickers.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut entries: Vec<SignalEntry> = Vec::new();
        for (ticker, signal) in pairs {
            let ticker = ticker.into();
            if entries.iter().any(|e| e.ticker == ticker) {
                return Err(EngineError::DuplicateTicker { ticker });
            }
            entries.push(SignalEntry { ticker, signal });
        }
        Ok(Self { entries })
    }

    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.ticker == ticker)
            .map(|e| e.signal)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.get(ticker).is_some()
    }

    /// Entries in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|e| (e.ticker.as_str(), e.signal))
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.ticker.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<SignalEntry>> for SignalMap {
    type Error = EngineError;

    fn try_from(entries: Vec<SignalEntry>) -> Result<Self, Self::Error> {
        Self::from_pairs(entries.into_iter().map(|e| (e.ticker, e.signal)))
    }
}

impl From<SignalMap> for Vec<SignalEntry> {
    fn from(map: SignalMap) -> Self {
        map.entries
    }
}

/// The single instrument to hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrategyDecision {
    pub chosen_instrument: String,
}

impl StrategyDecision {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            chosen_instrument: ticker.into(),
        }
    }
}

impl fmt::Display for StrategyDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buy/Hold {}", self.chosen_instrument)
    }
}

/// Why a notification check fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    None,
    StrategyChanged,
    SignalNearThreshold,
}

/// Output of the change/threshold detector for one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub triggered: bool,
    pub reason: AlertReason,
}

impl NotificationEvent {
    pub const QUIET: Self = Self {
        triggered: false,
        reason: AlertReason::None,
    };

    pub fn fired(reason: AlertReason) -> Self {
        Self {
            triggered: reason != AlertReason::None,
            reason,
        }
    }
}
