//! Error taxonomy for the ingestion pipeline.

use thiserror::Error;

/// Failures the pipeline can report.
///
/// Empty or missing data inside a table is never an error: it is defaulted by
/// the normalizer or represented in the shape of the summary.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No input tables were found. Reported, not retried; nothing is written.
    #[error("no input files found in {0}")]
    NoInput(String),

    /// A single input could not be read as a header-first delimited table.
    #[error("malformed input {path}: {reason}")]
    MalformedInput { path: String, reason: String },

    #[error("too many input files in {dir}: found {found}, limit is {limit}")]
    TooManyInputs {
        dir: String,
        found: usize,
        limit: usize,
    },

    #[error("input {path} exceeds {limit} bytes")]
    InputTooLarge { path: String, limit: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn malformed(path: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::MalformedInput {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
