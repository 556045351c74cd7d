// Timeline Catalog - ordered stage definitions, read-only at runtime

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::entities::TimelineStage;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCatalog {
    pub stages: Vec<TimelineStage>,
}

impl Default for StageCatalog {
    fn default() -> Self {
        StageCatalog {
            stages: vec![
                TimelineStage::new("H1B", 180, 120, 240, "Initial work visa, can be extended."),
                TimelineStage::new("PERM", 180, 150, 210, "Labor certification process."),
                TimelineStage::new("I-140", 120, 90, 150, "Immigrant petition for alien worker."),
                TimelineStage::new(
                    "I-485",
                    180,
                    150,
                    210,
                    "Application to register permanent residence or adjust status.",
                ),
            ],
        }
    }
}

impl StageCatalog {
    /// Load a `{"stages": [...]}` document
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::storage(path, e))?;
        let catalog: StageCatalog =
            serde_json::from_str(&content).map_err(|e| AppError::storage(path, e))?;

        if catalog.stages.is_empty() {
            return Err(AppError::storage(path, "catalog has no stages"));
        }

        Ok(catalog)
    }
}
