//! acdumo core — accelerated dual momentum signal engine.
//!
//! This crate contains the computation core:
//! - Domain types (price series, sampling frequency, signal maps, decisions)
//! - Price providers (Yahoo Finance, CSV import, synthetic walk)
//! - Series normalization with bounded month-boundary alignment
//! - Momentum signal, strategy selection, change/threshold detection
//! - Engine orchestration and report assembly
//!
//! Everything past the provider fetch is a pure function of its inputs.

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod report;
pub mod signal;

pub use domain::{
    AlertReason, NotificationEvent, PricePoint, PriceSeries, SamplingFrequency, SignalMap, StrategyDecision,
};
pub use engine::{compute_signals, InstrumentSignal, SignalOutcome, SignalRequest};
pub use error::{EngineError, TickerFailure};
pub use report::StrategyReport;
pub use signal::{compute_signal, decide_strategy, detect_notification, DEFAULT_TOLERANCE};
