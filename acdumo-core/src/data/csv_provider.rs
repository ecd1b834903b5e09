//! CSV price import.
//!
//! Reads `<dir>/<TICKER>.csv` files holding daily adjusted closes
//! (`date,adj_close`, or Yahoo's `Date,...,Adj Close` export) and buckets
//! them to the requested sampling frequency the way the chart API does:
//! monthly rows are labelled with the first of the month, weekly rows with
//! the Monday of the week, and each bucket carries its last available close.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::provider::{DataError, DataSource, PriceProvider, RawPrice};
use crate::domain::SamplingFrequency;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Adj Close", alias = "adjclose")]
    adj_close: Option<f64>,
}

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    fn read_daily(path: &Path) -> Result<Vec<RawPrice>, DataError> {
        let csv_err = |reason: String| DataError::CsvImport {
            path: path.display().to_string(),
            reason,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(|e| csv_err(e.to_string()))?;

        let mut rows = Vec::new();
        for (line, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record.map_err(|e| csv_err(format!("row {}: {e}", line + 2)))?;
            rows.push(RawPrice {
                date: row.date,
                adj_close: row.adj_close.filter(|p| p.is_finite()),
            });
        }
        Ok(rows)
    }
}

/// Label of the bucket `date` falls into.
pub fn bucket_label(date: NaiveDate, frequency: SamplingFrequency) -> NaiveDate {
    match frequency {
        SamplingFrequency::Monthly => date.with_day(1).unwrap_or(date),
        SamplingFrequency::Weekly => date - Duration::days(date.weekday().num_days_from_monday() as i64),
    }
}

/// Collapse daily rows into one row per bucket, carrying the last available
/// close. A bucket whose rows are all missing stays missing.
pub fn bucket_daily(rows: &[RawPrice], frequency: SamplingFrequency) -> Vec<RawPrice> {
    let mut sorted: Vec<&RawPrice> = rows.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let mut buckets: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
    for row in sorted {
        let slot = buckets.entry(bucket_label(row.date, frequency)).or_insert(None);
        if row.adj_close.is_some() {
            *slot = row.adj_close;
        }
    }

    buckets
        .into_iter()
        .map(|(date, adj_close)| RawPrice { date, adj_close })
        .collect()
}

impl PriceProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvImport
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        frequency: SamplingFrequency,
    ) -> Result<Vec<RawPrice>, DataError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        let daily: Vec<RawPrice> = Self::read_daily(&path)?
            .into_iter()
            .filter(|r| r.date >= start && r.date <= end)
            .collect();
        tracing::debug!(ticker, rows = daily.len(), path = %path.display(), "read csv prices");
        Ok(bucket_daily(&daily, frequency))
    }
}
