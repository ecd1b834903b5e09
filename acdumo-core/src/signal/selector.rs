//! Strategy selection.
//!
//! Hold the risk asset with the strongest positive signal; when none is
//! positive, hold the safe haven. Ties keep the ticker that appears first in
//! the signal map's order.

use crate::domain::{SignalMap, StrategyDecision};

pub fn decide_strategy(signals: &SignalMap, safe_haven: &str) -> StrategyDecision {
    let mut best: Option<(&str, f64)> = None;
    let candidates = signals
        .iter()
        .filter(|(t, s)| *t != safe_haven && !s.is_nan());
    for (ticker, signal) in candidates {
        // Strict comparison keeps the first of equal maxima.
        if best.map_or(true, |(_, top)| signal > top) {
            best = Some((ticker, signal));
        }
    }

    match best {
        Some((ticker, signal)) if signal > 0.0 => StrategyDecision::new(ticker),
        _ => StrategyDecision::new(safe_haven),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f64)]) -> SignalMap {
        SignalMap::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn picks_max_positive_risk_asset() {
        let signals = map(&[("SPY", 0.05), ("TLT", -0.02), ("VSS", 0.08), ("SCZ", 0.01)]);
        assert_eq!(decide_strategy(&signals, "TLT"), StrategyDecision::new("VSS"));
    }

    #[test]
    fn falls_back_to_safe_haven() {
        let signals = map(&[("SPY", -0.01), ("TLT", -0.02), ("VSS", -0.03)]);
        assert_eq!(decide_strategy(&signals, "TLT"), StrategyDecision::new("TLT"));
    }

    #[test]
    fn safe_haven_alone_is_chosen() {
        let signals = map(&[("TLT", -0.02)]);
        assert_eq!(decide_strategy(&signals, "TLT"), StrategyDecision::new("TLT"));
    }

    #[test]
    fn safe_haven_signal_does_not_compete() {
        let signals = map(&[("SPY", 0.01), ("TLT", 0.50)]);
        assert_eq!(decide_strategy(&signals, "TLT"), StrategyDecision::new("SPY"));
    }

    #[test]
    fn zero_signal_is_not_positive() {
        let signals = map(&[("SPY", 0.0), ("TLT", -0.5)]);
        assert_eq!(decide_strategy(&signals, "TLT"), StrategyDecision::new("TLT"));
    }

    #[test]
    fn tie_keeps_first_encountered() {
        let signals = map(&[("SCZ", 0.07), ("TLT", 0.0), ("SPY", 0.07), ("VSS", 0.07)]);
        assert_eq!(decide_strategy(&signals, "TLT"), StrategyDecision::new("SCZ"));

        let reordered = map(&[("VSS", 0.07), ("SPY", 0.07), ("SCZ", 0.07), ("TLT", 0.0)]);
        assert_eq!(decide_strategy(&reordered, "TLT"), StrategyDecision::new("VSS"));
    }

    #[test]
    fn empty_map_returns_safe_haven() {
        assert_eq!(decide_strategy(&SignalMap::default(), "TLT"), StrategyDecision::new("TLT"));
    }
}
