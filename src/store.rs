// Visa Record Store - one JSON document plus an append-only history log
//
// Every read goes back to disk so external edits to the file are picked up.
// There is no locking: concurrent writers race and the last write wins.
// The history append is not atomic with the primary write; a crash between
// the two leaves the record updated with no matching history entry.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::entities::{HistoryEntry, VisaRecord, VisaUpdate};
use crate::error::{AppError, Result};
use crate::temporal;

#[derive(Debug, Clone)]
pub struct VisaStore {
    record_path: PathBuf,
    history_path: PathBuf,
}

impl VisaStore {
    pub fn new(record_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        VisaStore {
            record_path: record_path.into(),
            history_path: history_path.into(),
        }
    }

    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Load the record fresh from disk
    pub fn read(&self) -> Result<VisaRecord> {
        let content = fs::read_to_string(&self.record_path)
            .map_err(|e| AppError::storage(&self.record_path, e))?;

        serde_json::from_str(&content).map_err(|e| AppError::storage(&self.record_path, e))
    }

    /// Overwrite the record, then append it to the history log
    pub fn write(&self, record: &VisaRecord) -> Result<()> {
        self.write_at(record, Utc::now())
    }

    fn write_at(&self, record: &VisaRecord, timestamp: DateTime<Utc>) -> Result<()> {
        write_json(&self.record_path, record)?;
        debug!(path = %self.record_path.display(), "visa record written");

        let mut history = self.history()?;
        history.push(HistoryEntry {
            timestamp,
            data: record.clone(),
        });
        write_json(&self.history_path, &history)?;
        debug!(entries = history.len(), "history entry appended");

        Ok(())
    }

    /// All history entries in append order; a missing log is empty
    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        if !self.history_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.history_path)
            .map_err(|e| AppError::storage(&self.history_path, e))?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| AppError::storage(&self.history_path, e))
    }

    /// Apply a client update, derive the status as of `now`, and persist.
    ///
    /// Nothing is written unless both dates are present and parse.
    pub fn update(&self, update: VisaUpdate, now: DateTime<Utc>) -> Result<VisaRecord> {
        let missing = update.missing_dates();
        if !missing.is_empty() {
            return Err(AppError::validation(
                "Both startDate and expirationDate are required",
            ));
        }

        let VisaUpdate {
            visa_type,
            country,
            start_date,
            expiration_date,
        } = update;
        let start_date = start_date.unwrap_or_default();
        let expiration_date = expiration_date.unwrap_or_default();

        temporal::parse_date(&start_date)?;
        let status = temporal::derive_status(&expiration_date, now)?;

        let mut record = self.read()?;
        let visa = &mut record.current_visa;

        if let Some(visa_type) = visa_type.filter(|v| !v.is_empty()) {
            visa.visa_type = visa_type;
        }
        if let Some(country) = country {
            visa.country = country;
        }
        visa.start_date = start_date;
        visa.expiration_date = expiration_date;
        visa.status = status;

        self.write_at(&record, now)?;
        info!(status = %record.current_visa.status, "visa record updated");

        Ok(record)
    }

    /// Write `record` as the seed document. Existing files are kept unless `overwrite`.
    /// Returns whether anything was written.
    pub fn seed(&self, record: &VisaRecord, overwrite: bool) -> Result<bool> {
        if self.record_path.exists() && !overwrite {
            return Ok(false);
        }

        write_json(&self.record_path, record)?;
        Ok(true)
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AppError::storage(path, e))?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|e| AppError::storage(path, e))?;
    fs::write(path, json).map_err(|e| AppError::storage(path, e))
}
