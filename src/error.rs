// Engine errors - domain failures the callers may want to match on.
// I/O and CSV decoding failures travel as anyhow errors with context.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{file}: missing required column(s): {}", .columns.join(", "))]
    MissingColumns { file: String, columns: Vec<String> },

    #[error("Could not detect record kind for file: {0}")]
    UnknownRecordKind(String),

    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
