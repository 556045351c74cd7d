// Error taxonomy shared by the store, the timeline service and the agent.
// Each variant maps to exactly one HTTP status at the route layer.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed required input (400)
    #[error("{0}")]
    Validation(String),

    /// Unknown stage name (404)
    #[error("Stage not found: {0}")]
    NotFound(String),

    /// Narrative agent was never initialized (503)
    #[error("AI Agent is not available. Make sure GOOGLE_API_KEY is set in .env file.")]
    UpstreamUnavailable,

    /// Upstream generation call failed, message passed through (500)
    #[error("{0}")]
    Generation(String),

    /// Record or history file missing, unreadable or unwritable (500)
    #[error("Storage error at {}: {message}", path.display())]
    Storage { path: PathBuf, message: String },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn storage(path: &Path, err: impl std::fmt::Display) -> Self {
        AppError::Storage {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(feature = "server")]
impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Generation(_) | AppError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
