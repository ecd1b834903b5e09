//! Check history: JSONL append-only log of notification checks.
//!
//! One JSON object per line, so a partially written tail never corrupts the
//! entries before it.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use acdumo_core::AlertReason;

use crate::check::CheckOutcome;

/// One completed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub report_id: String,
    /// Instrument chosen on `date`.
    pub decision: String,
    pub reason: AlertReason,
    pub triggered: bool,
    /// Recipients the notification reached.
    pub notified: usize,
}

impl HistoryEntry {
    pub fn from_outcome(outcome: &CheckOutcome) -> Self {
        Self {
            date: outcome.date,
            report_id: outcome.report.report_id.clone(),
            decision: outcome.report.decision.chosen_instrument.clone(),
            reason: outcome.event.reason,
            triggered: outcome.event.triggered,
            notified: outcome.recipients_notified,
        }
    }
}

pub struct CheckHistory {
    path: PathBuf,
}

impl CheckHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, entry: &HistoryEntry) -> io::Result<()> {
        let json = serde_json::to_string(entry).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{json}")?;
        file.flush()
    }

    /// Read all entries, skipping blank and malformed lines.
    pub fn read_all(&self) -> io::Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = io::BufReader::new(fs::File::open(&self.path)?);
        let mut entries = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(line = number + 1, error = %e, "skipping malformed history line"),
            }
        }
        Ok(entries)
    }

    /// Most recent entry, if any.
    pub fn last(&self) -> io::Result<Option<HistoryEntry>> {
        Ok(self.read_all()?.pop())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: u32, triggered: bool) -> HistoryEntry {
        HistoryEntry {
            date: NaiveDate::from_ymd_opt(2024, 8, day).unwrap(),
            report_id: format!("id-{day}"),
            decision: "SPY".into(),
            reason: if triggered {
                AlertReason::StrategyChanged
            } else {
                AlertReason::None
            },
            triggered,
            notified: usize::from(triggered) * 2,
        }
    }

    #[test]
    fn append_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let history = CheckHistory::new(dir.path().join("nested").join("history.jsonl"));

        history.append(&entry(13, false)).unwrap();
        history.append(&entry(14, true)).unwrap();

        let entries = history.read_all().unwrap();
        assert_eq!(entries, vec![entry(13, false), entry(14, true)]);
        assert_eq!(history.last().unwrap(), Some(entry(14, true)));
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = CheckHistory::new(dir.path().join("absent.jsonl"));
        assert!(history.read_all().unwrap().is_empty());
        assert_eq!(history.last().unwrap(), None);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let good = serde_json::to_string(&entry(12, false)).unwrap();
        fs::write(&path, format!("{good}\n\nnot json\n{{\"date\":1}}\n")).unwrap();

        let entries = CheckHistory::new(&path).read_all().unwrap();
        assert_eq!(entries, vec![entry(12, false)]);
    }
}
