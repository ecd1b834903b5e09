//! Sampling frequency and the lookback constants that depend on it.
//!
//! Every frequency-dependent constant (fetch window, horizon offsets,
//! smoothing width, minimum series length) is answered by a method here,
//! so adding a frequency means adding one variant and one arm per method.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Periodicity at which price observations are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingFrequency {
    Monthly,
    Weekly,
}

impl SamplingFrequency {
    /// Calendar days of history requested from the provider, measured
    /// backward from the query date.
    ///
    /// 217 days is 31 weeks: the 28 complete weekly buckets, the open
    /// current one and two spare weeks. The same span holds the seven
    /// month starts a monthly series needs.
    pub const fn fetch_window_days(self) -> i64 {
        match self {
            Self::Monthly | Self::Weekly => 217,
        }
    }

    /// Series offsets of the short, medium and long horizons (≈1, 3, 6 months).
    pub const fn lookback_indices(self) -> [usize; 3] {
        match self {
            Self::Monthly => [1, 3, 6],
            Self::Weekly => [4, 12, 24],
        }
    }

    /// Number of consecutive observations averaged into one price.
    ///
    /// Monthly uses the point value; weekly averages four weeks (≈ one month).
    pub const fn smoothing_width(self) -> usize {
        match self {
            Self::Monthly => 1,
            Self::Weekly => 4,
        }
    }

    /// Minimum normalized series length: the deepest index read plus one.
    pub const fn min_series_len(self) -> usize {
        let [_, _, long] = self.lookback_indices();
        long + self.smoothing_width()
    }

    /// Yahoo chart API interval code.
    pub const fn interval_code(self) -> &'static str {
        match self {
            Self::Monthly => "1mo",
            Self::Weekly => "1wk",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
        }
    }
}

impl fmt::Display for SamplingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" | "month" | "1mo" => Ok(Self::Monthly),
            "weekly" | "week" | "1wk" => Ok(Self::Weekly),
            other => Err(format!("unknown sampling frequency '{other}' (expected monthly or weekly)")),
        }
    }
}
