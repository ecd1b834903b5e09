//! Domain types: price series, sampling frequency, signals, decisions.

pub mod frequency;
pub mod price;
pub mod signal;

pub use frequency::SamplingFrequency;
pub use price::{PricePoint, PriceSeries};
pub use signal::{AlertReason, NotificationEvent, SignalEntry, SignalMap, StrategyDecision};
