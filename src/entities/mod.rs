// Entity Models
//
// - VisaRecord: the one persisted document, plus its history entries
// - TimelineStage: read-only catalog entries
// - StageInput: a stage as a client describes it

pub mod stage;
pub mod visa;

pub use stage::{StageInput, TimelineStage};
pub use visa::{CurrentVisa, HistoryEntry, VisaRecord, VisaStatus, VisaUpdate, DEFAULT_NEXT_STAGES};
