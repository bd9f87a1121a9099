//! Error types shared by the engine and the file store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Rejected engine input. A step that returns one of these has not touched
/// any model state.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("invalid step size: {0} minutes (must be >= 0)")]
    InvalidStep(i64),

    #[error("step of {0} minutes runs past the representable calendar")]
    StepOverflow(i64),

    #[error("invalid external condition {field}: {value}")]
    InvalidCondition { field: &'static str, value: f64 },

    #[error("unknown battery cell index {0} (expected 0-3)")]
    UnknownCell(usize),

    #[error("invalid timestamp \"{0}\" (expected YYYY-MM-DDTHH:MM:SS)")]
    InvalidTimestamp(String),
}

/// Failure reading or writing one of the persisted documents.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
