//! Report assembly.
//!
//! A [`StrategyReport`] is the self-describing record handed to renderers and
//! notifiers: date, signal table, decision, and per-horizon returns. Its
//! `report_id` is a BLAKE3 hash of the other fields, so two reports built from
//! the same inputs share an id.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{SamplingFrequency, SignalMap, StrategyDecision};
use crate::engine::SignalOutcome;

/// Per-horizon returns of one instrument, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReturns {
    pub ticker: String,
    pub one_month_pct: f64,
    pub three_month_pct: f64,
    pub six_month_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub report_id: String,
    pub date: NaiveDate,
    pub frequency: SamplingFrequency,
    pub safe_haven: String,
    pub signals: SignalMap,
    pub decision: StrategyDecision,
    pub returns: Vec<InstrumentReturns>,
    /// Instruments left out of a partial computation.
    pub skipped: Vec<String>,
}

#[derive(Serialize)]
struct ReportBody<'a> {
    date: NaiveDate,
    frequency: SamplingFrequency,
    safe_haven: &'a str,
    signals: &'a SignalMap,
    decision: &'a StrategyDecision,
    returns: &'a [InstrumentReturns],
    skipped: &'a [String],
}

impl StrategyReport {
    pub fn new(
        date: NaiveDate,
        frequency: SamplingFrequency,
        safe_haven: impl Into<String>,
        signals: SignalMap,
        decision: StrategyDecision,
        returns: Vec<InstrumentReturns>,
        skipped: Vec<String>,
    ) -> Self {
        let mut report = Self {
            report_id: String::new(),
            date,
            frequency,
            safe_haven: safe_haven.into(),
            signals,
            decision,
            returns,
            skipped,
        };
        report.report_id = report.compute_id();
        report
    }

    /// Build a report from an engine outcome and the decision made on it.
    pub fn assemble(outcome: &SignalOutcome, safe_haven: &str, decision: StrategyDecision) -> Self {
        let returns = outcome
            .instruments
            .iter()
            .map(|i| {
                let [one, three, six] = i.breakdown.horizons;
                InstrumentReturns {
                    ticker: i.ticker.clone(),
                    one_month_pct: one.fractional_return * 100.0,
                    three_month_pct: three.fractional_return * 100.0,
                    six_month_pct: six.fractional_return * 100.0,
                }
            })
            .collect();
        let skipped = outcome.failures.iter().map(|f| f.ticker.clone()).collect();
        Self::new(
            outcome.as_of,
            outcome.frequency,
            safe_haven,
            outcome.signals.clone(),
            decision,
            returns,
            skipped,
        )
    }

    fn compute_id(&self) -> String {
        let body = ReportBody {
            date: self.date,
            frequency: self.frequency,
            safe_haven: &self.safe_haven,
            signals: &self.signals,
            decision: &self.decision,
            returns: &self.returns,
            skipped: &self.skipped,
        };
        // Serializing plain data with string keys cannot fail.
        let json = serde_json::to_string(&body).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Markdown body used by the CLI and by notification messages.
    pub fn render_markdown(&self) -> String {
        let mut out = format!("Date\n====\n{}\n\nSignals\n=======\n", self.date.format("%Y-%m-%d"));
        out.push_str("| Ticker | Signal |\n");
        out.push_str("| ------ | ------ |\n");
        for (ticker, signal) in self.signals.iter() {
            out.push_str(&format!("| {ticker} | {}% |\n", format_significant(signal * 100.0, 4)));
        }

        out.push_str(&format!("\nStrategy\n========\n{}\n", self.decision));

        if !self.returns.is_empty() {
            out.push_str("\nReturns\n=======\n");
            out.push_str("| Ticker | 1 month | 3 months | 6 months |\n");
            out.push_str("| ------ | ------- | -------- | -------- |\n");
            for r in &self.returns {
                out.push_str(&format!(
                    "| {} | {:+.2}% | {:+.2}% | {:+.2}% |\n",
                    r.ticker, r.one_month_pct, r.three_month_pct, r.six_month_pct
                ));
            }
        }

        if !self.skipped.is_empty() {
            out.push_str(&format!("\nSkipped: {}\n", self.skipped.join(", ")));
        }
        out
    }
}

/// Format with `digits` significant digits.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let magnitude = value.abs().log10().floor() as i64;
    let decimals = (digits as i64 - 1 - magnitude).max(0) as usize;
    let text = format!("{value:.decimals$}");

    // Rounding up can carry into the next power of ten (9.99996 -> 10.000).
    let carried = text
        .parse::<f64>()
        .is_ok_and(|rounded| rounded.abs() >= 10f64.powi(magnitude as i32 + 1));
    if carried && decimals > 0 {
        let decimals = decimals - 1;
        return format!("{value:.decimals$}");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StrategyReport {
        StrategyReport::new(
            NaiveDate::from_ymd_opt(2024, 8, 14).unwrap(),
            SamplingFrequency::Weekly,
            "TLT",
            SignalMap::from_pairs([("SPY", 0.123456), ("TLT", -0.02)]).unwrap(),
            StrategyDecision::new("SPY"),
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn id_is_stable_and_content_addressed() {
        let a = sample();
        let b = sample();
        assert_eq!(a.report_id, b.report_id);
        assert_eq!(a.report_id.len(), 64);

        let c = StrategyReport::new(
            a.date,
            a.frequency,
            "TLT",
            SignalMap::from_pairs([("SPY", 0.5), ("TLT", -0.02)]).unwrap(),
            StrategyDecision::new("SPY"),
            Vec::new(),
            Vec::new(),
        );
        assert_ne!(a.report_id, c.report_id);
    }

    #[test]
    fn markdown_has_table_and_strategy() {
        let md = sample().render_markdown();
        assert!(md.starts_with("Date\n====\n2024-08-14\n"));
        assert!(md.contains("| SPY | 12.35% |"));
        assert!(md.contains("| TLT | -2.000% |"));
        assert!(md.contains("Strategy\n========\nBuy/Hold SPY\n"));
        assert!(!md.contains("Returns"));
    }

    #[test]
    fn significant_digits() {
        assert_eq!(format_significant(12.3456, 4), "12.35");
        assert_eq!(format_significant(0.0123456, 4), "0.01235");
        assert_eq!(format_significant(1234.56, 4), "1235");
        assert_eq!(format_significant(0.0, 4), "0");
    }

    #[test]
    fn significant_digits_after_carry() {
        assert_eq!(format_significant(9.99996, 4), "10.00");
        assert_eq!(format_significant(-0.0999996, 4), "-0.1000");
        assert_eq!(format_significant(999.96, 4), "1000");
    }

    #[test]
    fn json_roundtrip_keeps_id() {
        let report = sample();
        let back: StrategyReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
