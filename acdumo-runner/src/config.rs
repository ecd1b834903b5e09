//! Application configuration (TOML).
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! tickers = ["SPY", "TLT", "VSS", "SCZ"]
//! safe_haven = "TLT"
//! frequency = "weekly"
//! tolerance = 0.1
//!
//! [schedule]
//! weekdays = ["Mon", "Tue", "Wed", "Thu", "Fri"]
//! hour = 7
//!
//! [provider]
//! kind = "yahoo"
//!
//! [notify]
//! kind = "outbox"
//! outbox_path = "outbox.jsonl"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use acdumo_core::data::{
    CircuitBreaker, CsvProvider, DataError, PriceProvider, SyntheticProvider, YahooProvider, YahooSettings,
    MAX_ALIGNMENT_ATTEMPTS,
};
use acdumo_core::{SamplingFrequency, DEFAULT_TOLERANCE};

use crate::check::CheckSettings;
use crate::notify::{LogNotifier, Notifier, OutboxNotifier};
use crate::schedule::{CheckSchedule, ScheduleError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config {} already exists (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("failed to build price provider: {0}")]
    Provider(#[from] DataError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Directory of `<TICKER>.csv` files for the csv provider.
    pub csv_dir: PathBuf,
    pub seed: u64,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Upper bound on `provider.max_retries`.
pub const MAX_PROVIDER_RETRIES: u32 = 10;

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            csv_dir: PathBuf::from("data"),
            seed: 42,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider timeout_secs must be at least 1".into()));
        }
        if self.max_retries > MAX_PROVIDER_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "provider max_retries must be at most {MAX_PROVIDER_RETRIES}, got {}",
                self.max_retries
            )));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Box<dyn PriceProvider>, ConfigError> {
        Ok(match self.kind {
            ProviderKind::Yahoo => {
                let settings = YahooSettings {
                    timeout: Duration::from_secs(self.timeout_secs),
                    max_retries: self.max_retries,
                    ..YahooSettings::default()
                };
                Box::new(YahooProvider::new(Arc::new(CircuitBreaker::default_provider()), settings)?)
            }
            ProviderKind::Csv => Box::new(CsvProvider::new(&self.csv_dir)),
            ProviderKind::Synthetic => Box::new(SyntheticProvider::new(self.seed)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    Log,
    Outbox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub kind: NotifierKind,
    pub outbox_path: PathBuf,
    pub sender: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            outbox_path: PathBuf::from("outbox.jsonl"),
            sender: "acdumo@localhost".to_string(),
        }
    }
}

impl NotifyConfig {
    pub fn build(&self) -> Box<dyn Notifier> {
        match self.kind {
            NotifierKind::Log => Box::new(LogNotifier),
            NotifierKind::Outbox => Box::new(OutboxNotifier::new(&self.outbox_path, &self.sender)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tickers: Vec<String>,
    pub safe_haven: String,
    pub frequency: SamplingFrequency,
    pub tolerance: f64,
    pub max_alignment_attempts: u32,
    pub allow_partial: bool,
    pub subscribers_path: PathBuf,
    pub history_path: PathBuf,
    pub schedule: CheckSchedule,
    pub provider: ProviderConfig,
    pub notify: NotifyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tickers: ["SPY", "TLT", "VSS", "SCZ"].map(String::from).to_vec(),
            safe_haven: "TLT".to_string(),
            frequency: SamplingFrequency::Weekly,
            tolerance: DEFAULT_TOLERANCE,
            max_alignment_attempts: MAX_ALIGNMENT_ATTEMPTS,
            allow_partial: false,
            subscribers_path: PathBuf::from("subscribers.toml"),
            history_path: PathBuf::from("history.jsonl"),
            schedule: CheckSchedule::default(),
            provider: ProviderConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the config, refusing to replace an existing file unless `force`.
    pub fn save(&self, path: &Path, force: bool) -> Result<(), ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let content = self.to_toml()?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tickers.is_empty() {
            return Err(ConfigError::Invalid("ticker list is empty".into()));
        }
        for (i, ticker) in self.tickers.iter().enumerate() {
            if self.tickers[..i].contains(ticker) {
                return Err(ConfigError::Invalid(format!("ticker {ticker} is listed twice")));
            }
        }
        if !self.tickers.contains(&self.safe_haven) {
            return Err(ConfigError::Invalid(format!(
                "safe haven {} is not in the ticker list",
                self.safe_haven
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_alignment_attempts == 0 {
            return Err(ConfigError::Invalid("max_alignment_attempts must be at least 1".into()));
        }
        self.provider.validate()?;
        self.schedule.validate()?;
        Ok(())
    }

    pub fn check_settings(&self) -> CheckSettings {
        CheckSettings {
            tickers: self.tickers.clone(),
            safe_haven: self.safe_haven.clone(),
            frequency: self.frequency,
            tolerance: self.tolerance,
            max_alignment_attempts: self.max_alignment_attempts,
            allow_partial: self.allow_partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acdumo_core::data::DataSource;
    use chrono::Weekday;

    #[test]
    fn empty_file_is_default() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_match_daily_check() {
        let config = AppConfig::default();
        assert_eq!(config.tickers, ["SPY", "TLT", "VSS", "SCZ"]);
        assert_eq!(config.safe_haven, "TLT");
        assert_eq!(config.frequency, SamplingFrequency::Weekly);
        assert_eq!(config.schedule.hour, 7);
        assert_eq!(config.schedule.misfire_grace_secs, 900);
        assert_eq!(config.schedule.weekdays.len(), 5);
        assert!(!config.schedule.weekdays.contains(&Weekday::Sat));
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = AppConfig::default();
        config.provider.kind = ProviderKind::Synthetic;
        config.notify.kind = NotifierKind::Outbox;
        config.tolerance = 0.05;
        let text = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            "tickers = [\"SPY\", \"IEF\"]\nsafe_haven = \"IEF\"\nfrequency = \"monthly\"\n\n[provider]\nkind = \"csv\"\ncsv_dir = \"prices\"\n",
        )
        .unwrap();
        assert_eq!(config.frequency, SamplingFrequency::Monthly);
        assert_eq!(config.provider.kind, ProviderKind::Csv);
        assert_eq!(config.provider.csv_dir, PathBuf::from("prices"));
        assert_eq!(config.provider.seed, 42);
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases: Vec<(&str, Box<dyn Fn(&mut AppConfig)>)> = vec![
            ("empty", Box::new(|c| c.tickers.clear())),
            ("haven", Box::new(|c| c.safe_haven = "IEF".into())),
            ("dup", Box::new(|c| c.tickers.push("SPY".into()))),
            ("tolerance", Box::new(|c| c.tolerance = 0.0)),
            ("nan", Box::new(|c| c.tolerance = f64::NAN)),
            ("attempts", Box::new(|c| c.max_alignment_attempts = 0)),
            ("retries", Box::new(|c| c.provider.max_retries = 33)),
            ("timeout", Box::new(|c| c.provider.timeout_secs = 0)),
            ("hour", Box::new(|c| c.schedule.hour = 24)),
            ("minute", Box::new(|c| c.schedule.minute = 60)),
            ("weekdays", Box::new(|c| c.schedule.weekdays.clear())),
        ];
        for (name, mutate) in cases {
            let mut config = AppConfig::default();
            mutate(&mut config);
            assert!(config.validate().is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn retry_cap_is_inclusive() {
        let mut config = AppConfig::default();
        config.provider.max_retries = MAX_PROVIDER_RETRIES;
        assert!(config.validate().is_ok());

        config.provider.max_retries = MAX_PROVIDER_RETRIES + 1;
        match config.validate() {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("max_retries"), "{msg}"),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn save_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acdumo.toml");
        AppConfig::default().save(&path, false).unwrap();
        assert!(matches!(
            AppConfig::default().save(&path, false),
            Err(ConfigError::AlreadyExists(_))
        ));
        AppConfig::default().save(&path, true).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn builds_offline_providers() {
        let synthetic = ProviderConfig {
            kind: ProviderKind::Synthetic,
            ..ProviderConfig::default()
        };
        assert_eq!(synthetic.build().unwrap().source(), DataSource::Synthetic);
        let csv = ProviderConfig {
            kind: ProviderKind::Csv,
            ..ProviderConfig::default()
        };
        assert_eq!(csv.build().unwrap().source(), DataSource::CsvImport);
    }
}
