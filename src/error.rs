use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OutlineError>;

/// Failures scoped to a single document.
#[derive(Debug, Error)]
pub enum OutlineError {
    /// The classifier could not be loaded or invoked.
    #[error("Classifier unavailable: {0}")]
    ModelUnavailable(String),

    /// The PDF backend could not parse the document.
    #[error("Failed to parse PDF {}: {reason}", path.display())]
    MalformedPdf { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize outline: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl OutlineError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        OutlineError::MalformedPdf {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
