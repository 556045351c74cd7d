// Visa Bulletin - static reference document served as-is

use serde_json::Value;
use std::path::Path;

use crate::error::{AppError, Result};

/// Read the bulletin from disk; the content is passed through untouched
pub fn load_bulletin(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::storage(path, e))?;
    serde_json::from_str(&content).map_err(|e| AppError::storage(path, e))
}
