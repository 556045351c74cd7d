// Timeline Stage - one step of the immigration process with its expected duration

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStage {
    pub stage_name: String,
    pub average_days: u32,
    pub min_days: u32,
    pub max_days: u32,

    #[serde(default)]
    pub notes: String,
}

impl TimelineStage {
    pub fn new(stage_name: &str, average_days: u32, min_days: u32, max_days: u32, notes: &str) -> Self {
        TimelineStage {
            stage_name: stage_name.to_string(),
            average_days,
            min_days,
            max_days,
            notes: notes.to_string(),
        }
    }

    /// Stage assumed when a request does not name one
    pub fn default_current() -> Self {
        TimelineStage::new("H1B", 180, 120, 240, "")
    }
}

// ============================================================================
// CLIENT-SUPPLIED STAGE
// ============================================================================

/// A stage as a client describes it in `currentStage`.
///
/// Only `stageName` is required. Durations and notes are rendered as given,
/// whatever their JSON type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageInput {
    pub stage_name: String,

    #[serde(default)]
    pub average_days: Option<Value>,

    #[serde(default)]
    pub min_days: Option<Value>,

    #[serde(default)]
    pub max_days: Option<Value>,

    #[serde(default)]
    pub notes: Option<Value>,
}

impl StageInput {
    pub fn named(stage_name: &str) -> Self {
        StageInput {
            stage_name: stage_name.to_string(),
            average_days: None,
            min_days: None,
            max_days: None,
            notes: None,
        }
    }

    pub fn default_current() -> Self {
        TimelineStage::default_current().into()
    }
}

impl From<TimelineStage> for StageInput {
    fn from(stage: TimelineStage) -> Self {
        StageInput {
            stage_name: stage.stage_name,
            average_days: Some(stage.average_days.into()),
            min_days: Some(stage.min_days.into()),
            max_days: Some(stage.max_days.into()),
            notes: Some(stage.notes).filter(|n| !n.is_empty()).map(Value::String),
        }
    }
}

/// Text form of a client value; `None` when absent or null
pub fn render_value(value: &Option<Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}
