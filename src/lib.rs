// Visa Tracker - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod agent;
pub mod bulletin;
pub mod catalog;
pub mod config;
pub mod entities;
pub mod error;
pub mod prompts;
#[cfg(feature = "server")]
pub mod routes;
pub mod store;
pub mod temporal;
pub mod timeline;

// Re-export commonly used types
pub use agent::{GeminiClient, GeminiConfig, GenerationFailure, NarrativeAgent, NextStage, TextGenerator};
pub use bulletin::load_bulletin;
pub use catalog::StageCatalog;
pub use config::Config;
pub use entities::{
    CurrentVisa, HistoryEntry, StageInput, TimelineStage, VisaRecord, VisaStatus, VisaUpdate,
    DEFAULT_NEXT_STAGES,
};
pub use error::{AppError, Result};
pub use store::VisaStore;
pub use timeline::TimelineService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
