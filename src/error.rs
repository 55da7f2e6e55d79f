// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed hash blob: {0}")]
    Codec(String),

    #[error("Segment fetch failed for {segment}: {message}")]
    Fetch { segment: String, message: String },

    #[error("No record for {url} (digest {digest}) in segment {segment}")]
    NotFound {
        segment: String,
        url: String,
        digest: String,
    },

    #[error("Could not rebuild {url}: matched {matched} of {expected} lines")]
    Reconstruction {
        url: String,
        matched: usize,
        expected: usize,
    },

    #[error("Abandoned after an earlier failure (segment {segment})")]
    Abandoned { segment: String },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
