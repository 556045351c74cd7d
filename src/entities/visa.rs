// Visa Record - the single tracked user's visa state
//
// Persisted as one JSON document:
//   { "currentVisa": { ... }, "nextStages": [ ... ], ...any other keys }
// Unknown top-level keys ride along in `metadata` so external edits survive a write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Remaining path used when the record does not list one
pub const DEFAULT_NEXT_STAGES: [&str; 3] = ["PERM", "I-140", "I-485"];

// ============================================================================
// VISA STATUS
// ============================================================================

/// Derived from `expirationDate`, never set directly by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisaStatus {
    #[serde(rename = "ACTIVE")]
    Active,

    #[serde(rename = "EXPIRING SOON")]
    ExpiringSoon,

    #[serde(rename = "EXPIRED")]
    Expired,
}

impl VisaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisaStatus::Active => "ACTIVE",
            VisaStatus::ExpiringSoon => "EXPIRING SOON",
            VisaStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for VisaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VISA RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentVisa {
    pub visa_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// ISO 8601 date
    pub start_date: String,

    /// ISO 8601 date
    pub expiration_date: String,

    pub status: VisaStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisaRecord {
    pub current_visa: CurrentVisa,

    /// Ordered remaining path, by stage name
    #[serde(default = "default_next_stages")]
    pub next_stages: Vec<String>,

    #[serde(flatten)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_next_stages() -> Vec<String> {
    DEFAULT_NEXT_STAGES.iter().map(|s| s.to_string()).collect()
}

const BUNDLED_RECORD: &str = include_str!("../../data/visas.json");

impl VisaRecord {
    /// The bundled `data/visas.json` record with its status derived for `now`
    pub fn seed(now: DateTime<Utc>) -> crate::error::Result<Self> {
        let mut record: VisaRecord = serde_json::from_str(BUNDLED_RECORD)
            .map_err(|e| crate::error::AppError::validation(format!("Invalid bundled record: {e}")))?;
        record.current_visa.status =
            crate::temporal::derive_status(&record.current_visa.expiration_date, now)?;
        Ok(record)
    }
}

// ============================================================================
// UPDATE REQUEST
// ============================================================================

/// Body of `PUT /visa`. `status` is not accepted from clients.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisaUpdate {
    #[serde(default)]
    pub visa_type: Option<String>,

    /// Outer `None` = key absent, `Some(None)` = explicit null
    #[serde(default, deserialize_with = "deserialize_present")]
    pub country: Option<Option<String>>,

    #[serde(default)]
    pub start_date: Option<String>,

    #[serde(default)]
    pub expiration_date: Option<String>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl VisaUpdate {
    /// Names of required date fields that are absent or empty
    pub fn missing_dates(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.start_date) {
            missing.push("startDate");
        }
        if is_blank(&self.expiration_date) {
            missing.push("expirationDate");
        }
        missing
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

// ============================================================================
// HISTORY
// ============================================================================

/// One append-only audit entry per update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub data: VisaRecord,
}
