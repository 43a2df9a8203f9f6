//! Multi-source QSO merge and field-resolution engine.
//!
//! Pure engine crate: receives pre-parsed records, returns merged records
//! plus a problem report. No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod group;
pub mod model;
pub mod report;
pub mod resolve;

pub use config::{MergeConfig, ResolutionClass};
pub use engine::run;
pub use error::{MalformedRecord, MergeError};
pub use model::{
    ConflictEntry, FieldValue, MatchKey, MergeInput, MergeResult, MergedRecord, Record, Source,
    SourceRecords, TrustTag,
};
pub use report::ProblemReport;
