//! One notification check cycle.
//!
//! Computes yesterday's and today's decisions with identical settings, runs
//! the change/threshold detector, and on a triggered event sends the report
//! to every subscribed recipient.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use acdumo_core::data::PriceProvider;
use acdumo_core::report::StrategyReport;
use acdumo_core::{
    compute_signals, detect_notification, EngineError, NotificationEvent, SamplingFrequency, SignalRequest,
    DEFAULT_TOLERANCE,
};

use crate::notify::{alert_text, NotificationMessage, Notifier};
use crate::subscribers::{SubscriberDirectory, SubscriberError};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("signal computation failed: {0}")]
    Engine(#[from] EngineError),

    #[error("subscriber lookup failed: {0}")]
    Subscribers(#[from] SubscriberError),

    #[error("no day before {0}")]
    DateOutOfRange(NaiveDate),
}

/// Parameters shared by both days of a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSettings {
    pub tickers: Vec<String>,
    pub safe_haven: String,
    pub frequency: SamplingFrequency,
    pub tolerance: f64,
    pub max_alignment_attempts: u32,
    pub allow_partial: bool,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            tickers: ["SPY", "TLT", "VSS", "SCZ"].map(String::from).to_vec(),
            safe_haven: "TLT".to_string(),
            frequency: SamplingFrequency::Weekly,
            tolerance: DEFAULT_TOLERANCE,
            max_alignment_attempts: acdumo_core::data::MAX_ALIGNMENT_ATTEMPTS,
            allow_partial: false,
        }
    }
}

impl CheckSettings {
    pub fn request(&self, as_of: NaiveDate) -> SignalRequest {
        SignalRequest {
            max_alignment_attempts: self.max_alignment_attempts,
            allow_partial: self.allow_partial,
            ..SignalRequest::new(as_of, self.tickers.clone(), self.safe_haven.clone(), self.frequency)
        }
    }
}

/// Injected collaborators of a check.
pub struct CheckContext<'a> {
    pub provider: &'a dyn PriceProvider,
    pub subscribers: &'a dyn SubscriberDirectory,
    pub notifier: &'a dyn Notifier,
    pub settings: CheckSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub date: NaiveDate,
    pub event: NotificationEvent,
    pub report: StrategyReport,
    pub recipients_notified: usize,
    pub delivery_failures: usize,
}

/// Compare the decisions for `today` and the day before and notify on a
/// change or a near-threshold signal.
///
/// `now` is the real current date; requests past it are rejected.
pub fn run_signal_check(
    ctx: &CheckContext<'_>,
    today: NaiveDate,
    now: NaiveDate,
) -> Result<CheckOutcome, CheckError> {
    let settings = &ctx.settings;
    let yesterday = today
        .checked_sub_days(Days::new(1))
        .ok_or(CheckError::DateOutOfRange(today))?;

    let previous = compute_signals(ctx.provider, &settings.request(yesterday), now)?;
    let current = compute_signals(ctx.provider, &settings.request(today), now)?;

    let yesterday_decision = previous.decide(&settings.safe_haven);
    let today_decision = current.decide(&settings.safe_haven);

    let event = detect_notification(
        &current.signals,
        &today_decision,
        &yesterday_decision,
        &settings.safe_haven,
        settings.tolerance,
    )?;
    let report = StrategyReport::assemble(&current, &settings.safe_haven, today_decision);

    tracing::info!(
        date = %today,
        yesterday = %yesterday_decision.chosen_instrument,
        today = %report.decision.chosen_instrument,
        reason = ?event.reason,
        "check evaluated"
    );

    let mut recipients_notified = 0;
    let mut delivery_failures = 0;
    if let Some(alert) = alert_text(event.reason, settings.tolerance).filter(|_| event.triggered) {
        let message = NotificationMessage::new(alert, &report);
        for subscriber in ctx.subscribers.subscribed()? {
            match ctx.notifier.send(&subscriber.address, &message) {
                Ok(()) => recipients_notified += 1,
                Err(e) => {
                    tracing::warn!(
                        recipient = %subscriber.address,
                        notifier = ctx.notifier.name(),
                        error = %e,
                        "notification delivery failed"
                    );
                    delivery_failures += 1;
                }
            }
        }
        tracing::info!(recipients_notified, delivery_failures, "notifications sent");
    }

    Ok(CheckOutcome {
        date: today,
        event,
        report,
        recipients_notified,
        delivery_failures,
    })
}
