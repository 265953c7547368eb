use derive_more::{Display, Error};
use thiserror::Error as ThisError;

/// Raw fact string does not have the expected shape.
///
/// Never fatal: evaluators turn it into a failed or unknown verdict.
#[derive(Debug, Display, Error, Clone, PartialEq)]
pub enum NormalizationError {
    #[display(fmt = "empty value")]
    Empty,

    #[display(fmt = "unrecognized version token")]
    MalformedVersion,
}

/// An external data source could not produce a fact.
#[derive(Debug, ThisError)]
pub enum CollectorError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse command output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("command `{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("not supported on this platform")]
    Unsupported,
}
