//! Change / threshold detection between two consecutive checks.
//!
//! Rules, first match wins:
//! 1. the decision changed since yesterday → `StrategyChanged`
//! 2. some risk asset's signal is within `tolerance` of the safe haven's → `SignalNearThreshold`
//! 3. otherwise nothing to report

use crate::domain::{AlertReason, NotificationEvent, SignalMap, StrategyDecision};
use crate::error::EngineError;

pub const DEFAULT_TOLERANCE: f64 = 0.1;

pub fn detect_notification(
    today_signals: &SignalMap,
    today_decision: &StrategyDecision,
    yesterday_decision: &StrategyDecision,
    safe_haven: &str,
    tolerance: f64,
) -> Result<NotificationEvent, EngineError> {
    if today_decision != yesterday_decision {
        return Ok(NotificationEvent::fired(AlertReason::StrategyChanged));
    }

    let haven = today_signals
        .get(safe_haven)
        .ok_or_else(|| EngineError::MissingSafeHaven {
            ticker: safe_haven.to_string(),
        })?;

    let near = today_signals
        .iter()
        .filter(|(ticker, _)| *ticker != safe_haven)
        .any(|(_, signal)| (haven - signal).abs() < tolerance);

    Ok(if near {
        NotificationEvent::fired(AlertReason::SignalNearThreshold)
    } else {
        NotificationEvent::QUIET
    })
}
