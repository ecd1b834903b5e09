//! Notification delivery.
//!
//! A [`NotificationMessage`] is built once per triggered check and handed to
//! a [`Notifier`] for every subscribed recipient.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use acdumo_core::{AlertReason, StrategyReport};

pub const SUBJECT: &str = "[acdumo] signal notification";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to write outbox {}: {source}", .path.display())]
    Outbox {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("delivery to {recipient} rejected: {reason}")]
    Rejected { recipient: String, reason: String },
}

/// Human-readable alert line for a fired event, `None` for a quiet one.
pub fn alert_text(reason: AlertReason, tolerance: f64) -> Option<String> {
    match reason {
        AlertReason::None => None,
        AlertReason::StrategyChanged => Some("A strategy change has occurred recently.".to_string()),
        AlertReason::SignalNearThreshold => Some(format!(
            "A stocks signal is within {}% of the bonds signal, so a strategy change may occur soon.",
            percent(tolerance)
        )),
    }
}

fn percent(fraction: f64) -> String {
    let text = format!("{:.2}", fraction * 100.0);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Message body shared by every recipient of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub subject: String,
    pub date: NaiveDate,
    pub alert: String,
    pub body: String,
}

impl NotificationMessage {
    pub fn new(alert: impl Into<String>, report: &StrategyReport) -> Self {
        Self {
            subject: SUBJECT.to_string(),
            date: report.date,
            alert: alert.into(),
            body: report.render_markdown(),
        }
    }

    /// Plain-text rendering: alert line, blank line, report.
    pub fn text(&self) -> String {
        format!("{}\n\n{}", self.alert, self.body)
    }
}

/// Delivery channel for notification messages.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    fn send(&self, recipient: &str, message: &NotificationMessage) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn send(&self, recipient: &str, message: &NotificationMessage) -> Result<(), NotifyError> {
        (**self).send(recipient, message)
    }
}

/// Emits each message as a tracing event.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn send(&self, recipient: &str, message: &NotificationMessage) -> Result<(), NotifyError> {
        tracing::info!(
            recipient,
            subject = %message.subject,
            date = %message.date,
            alert = %message.alert,
            "notification\n{}",
            message.body
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct OutboxRecord<'a> {
    recipient: &'a str,
    subject: &'a str,
    sender: &'a str,
    date: NaiveDate,
    alert: &'a str,
    body: &'a str,
}

/// Appends one JSON message per line to an outbox file for a separate
/// mail relay to drain.
pub struct OutboxNotifier {
    path: PathBuf,
    sender: String,
    lock: Mutex<()>,
}

impl OutboxNotifier {
    pub fn new(path: impl Into<PathBuf>, sender: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sender: sender.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;
        file.flush()
    }
}

impl Notifier for OutboxNotifier {
    fn name(&self) -> &str {
        "outbox"
    }

    fn send(&self, recipient: &str, message: &NotificationMessage) -> Result<(), NotifyError> {
        let record = OutboxRecord {
            recipient,
            subject: &message.subject,
            sender: &self.sender,
            date: message.date,
            alert: &message.alert,
            body: &message.body,
        };
        let line = serde_json::to_string(&record)?;

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.append(&line).map_err(|source| NotifyError::Outbox {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acdumo_core::{SamplingFrequency, SignalMap, StrategyDecision};

    fn report() -> StrategyReport {
        StrategyReport::new(
            NaiveDate::from_ymd_opt(2024, 8, 14).unwrap(),
            SamplingFrequency::Weekly,
            "TLT",
            SignalMap::from_pairs([("SPY", 0.12), ("TLT", 0.05)]).unwrap(),
            StrategyDecision::new("SPY"),
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn alert_texts() {
        assert_eq!(alert_text(AlertReason::None, 0.1), None);
        assert_eq!(
            alert_text(AlertReason::StrategyChanged, 0.1).unwrap(),
            "A strategy change has occurred recently."
        );
        assert_eq!(
            alert_text(AlertReason::SignalNearThreshold, 0.1).unwrap(),
            "A stocks signal is within 10% of the bonds signal, so a strategy change may occur soon."
        );
        assert!(alert_text(AlertReason::SignalNearThreshold, 0.075)
            .unwrap()
            .contains("within 7.5% of"));
    }

    #[test]
    fn message_carries_rendered_report() {
        let message = NotificationMessage::new("alert", &report());
        assert_eq!(message.subject, SUBJECT);
        assert!(message.body.contains("Buy/Hold SPY"));
        assert!(message.text().starts_with("alert\n\nDate\n====\n2024-08-14"));
    }

    #[test]
    fn outbox_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = OutboxNotifier::new(dir.path().join("out").join("outbox.jsonl"), "signals@example.com");
        let message = NotificationMessage::new("A strategy change has occurred recently.", &report());

        notifier.send("a@example.com", &message).unwrap();
        notifier.send("b@example.com", &message).unwrap();

        let content = fs::read_to_string(notifier.path()).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["recipient"], "a@example.com");
        assert_eq!(lines[1]["recipient"], "b@example.com");
        assert_eq!(lines[0]["subject"], SUBJECT);
        assert_eq!(lines[0]["sender"], "signals@example.com");
        assert_eq!(lines[0]["date"], "2024-08-14");
        assert!(lines[0]["body"].as_str().unwrap().contains("| SPY |"));
    }

    #[test]
    fn log_notifier_always_succeeds() {
        let message = NotificationMessage::new("alert", &report());
        assert!(LogNotifier.send("a@example.com", &message).is_ok());
    }
}
