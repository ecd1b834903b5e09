//! acdumo runner: notification checks on top of `acdumo-core`.
//!
//! This crate provides:
//! - TOML application config with provider and notifier factories
//! - The daily check cycle (yesterday vs. today, change/threshold alert)
//! - Subscriber directories and notifiers (tracing log, JSONL outbox)
//! - Weekday/time-of-day scheduling with misfire grace
//! - JSONL check history

pub mod check;
pub mod config;
pub mod history;
pub mod notify;
pub mod schedule;
pub mod subscribers;

pub use check::{run_signal_check, CheckContext, CheckError, CheckOutcome, CheckSettings};
pub use config::{AppConfig, ConfigError, NotifierKind, NotifyConfig, ProviderConfig, ProviderKind};
pub use history::{CheckHistory, HistoryEntry};
pub use notify::{alert_text, LogNotifier, NotificationMessage, Notifier, NotifyError, OutboxNotifier};
pub use schedule::{run_scheduled, CheckSchedule, Clock, ScheduleError, ScheduleSummary, SystemClock};
pub use subscribers::{FileSubscriberDirectory, StaticSubscribers, Subscriber, SubscriberDirectory, SubscriberError};
