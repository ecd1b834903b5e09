//! Price providers and series normalization.

pub mod circuit_breaker;
pub mod csv_provider;
pub mod normalize;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_provider::CsvProvider;
pub use normalize::{load_series, normalize, MAX_ALIGNMENT_ATTEMPTS};
pub use provider::{DataError, DataSource, PriceProvider, RawPrice};
pub use synthetic::SyntheticProvider;
pub use yahoo::{YahooProvider, YahooSettings};
