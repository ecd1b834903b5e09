//! End-to-end engine runs over the synthetic provider and scripted failures.

use acdumo_core::data::{DataError, DataSource, PriceProvider, RawPrice, SyntheticProvider};
use acdumo_core::{
    compute_signals, decide_strategy, EngineError, SamplingFrequency, SignalRequest, StrategyReport,
};
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn tickers() -> Vec<String> {
    ["SPY", "TLT", "VSS", "SCZ"].iter().map(|t| t.to_string()).collect()
}

/// Synthetic prices, except for the listed tickers which always fail.
struct Flaky {
    inner: SyntheticProvider,
    broken: Vec<&'static str>,
}

impl PriceProvider for Flaky {
    fn name(&self) -> &str {
        "flaky"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        frequency: SamplingFrequency,
    ) -> Result<Vec<RawPrice>, DataError> {
        if self.broken.contains(&ticker) {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        self.inner.fetch(ticker, start, end, frequency)
    }
}

#[test]
fn weekly_run_produces_full_signal_map() {
    let provider = SyntheticProvider::new(11);
    let request = SignalRequest::new(d(2024, 8, 14), tickers(), "TLT", SamplingFrequency::Weekly);
    let outcome = compute_signals(&provider, &request, d(2024, 8, 14)).unwrap();

    let order: Vec<&str> = outcome.signals.tickers().collect();
    assert_eq!(order, ["SPY", "TLT", "VSS", "SCZ"]);
    assert!(outcome.signals.iter().all(|(_, s)| s.is_finite()));
    assert!(!outcome.is_partial());
    // The current week (Monday 2024-08-12) is incomplete and dropped.
    assert!(outcome
        .instruments
        .iter()
        .all(|i| i.latest_date == Some(d(2024, 8, 5))));
}

#[test]
fn monthly_run_uses_current_month_row() {
    let provider = SyntheticProvider::new(11);
    let request = SignalRequest::new(d(2024, 8, 14), tickers(), "TLT", SamplingFrequency::Monthly);
    let outcome = compute_signals(&provider, &request, d(2024, 10, 1)).unwrap();
    assert!(outcome
        .instruments
        .iter()
        .all(|i| i.latest_date == Some(d(2024, 8, 1))));
}

#[test]
fn repeated_runs_are_identical() {
    let provider = SyntheticProvider::new(3);
    let request = SignalRequest::new(d(2023, 5, 10), tickers(), "TLT", SamplingFrequency::Weekly);
    let a = compute_signals(&provider, &request, d(2024, 1, 1)).unwrap();
    let b = compute_signals(&provider, &request, d(2024, 1, 1)).unwrap();
    assert_eq!(a.signals, b.signals);

    let report_a = StrategyReport::assemble(&a, "TLT", a.decide("TLT"));
    let report_b = StrategyReport::assemble(&b, "TLT", b.decide("TLT"));
    assert_eq!(report_a.report_id, report_b.report_id);
}

#[test]
fn report_matches_selector_and_returns() {
    let provider = SyntheticProvider::new(5);
    let request = SignalRequest::new(d(2024, 3, 20), tickers(), "TLT", SamplingFrequency::Weekly);
    let outcome = compute_signals(&provider, &request, d(2024, 3, 20)).unwrap();
    let decision = decide_strategy(&outcome.signals, "TLT");
    let report = StrategyReport::assemble(&outcome, "TLT", decision.clone());

    assert_eq!(report.decision, decision);
    assert_eq!(report.returns.len(), 4);
    for r in &report.returns {
        let signal = outcome.signals.get(&r.ticker).unwrap();
        let summed = (r.one_month_pct + r.three_month_pct + r.six_month_pct) / 100.0;
        assert!((summed - signal).abs() < 1e-9);
    }
}

#[test]
fn one_failure_fails_the_decision_by_default() {
    let provider = Flaky {
        inner: SyntheticProvider::new(1),
        broken: vec!["VSS"],
    };
    let request = SignalRequest::new(d(2024, 8, 14), tickers(), "TLT", SamplingFrequency::Weekly);
    match compute_signals(&provider, &request, d(2024, 8, 14)).unwrap_err() {
        EngineError::PartialFailure { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].ticker, "VSS");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn partial_results_when_opted_in() {
    let provider = Flaky {
        inner: SyntheticProvider::new(1),
        broken: vec!["VSS"],
    };
    let mut request = SignalRequest::new(d(2024, 8, 14), tickers(), "TLT", SamplingFrequency::Weekly);
    request.allow_partial = true;
    let outcome = compute_signals(&provider, &request, d(2024, 8, 14)).unwrap();

    assert!(outcome.is_partial());
    assert!(!outcome.signals.contains("VSS"));
    assert_eq!(outcome.signals.len(), 3);

    let report = StrategyReport::assemble(&outcome, "TLT", outcome.decide("TLT"));
    assert_eq!(report.skipped, vec!["VSS".to_string()]);
    assert!(report.render_markdown().contains("Skipped: VSS"));
}

#[test]
fn safe_haven_failure_is_fatal_even_with_partial() {
    let provider = Flaky {
        inner: SyntheticProvider::new(1),
        broken: vec!["TLT"],
    };
    let mut request = SignalRequest::new(d(2024, 8, 14), tickers(), "TLT", SamplingFrequency::Weekly);
    request.allow_partial = true;
    assert!(matches!(
        compute_signals(&provider, &request, d(2024, 8, 14)),
        Err(EngineError::PartialFailure { .. })
    ));
}
