use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("Failed to load CSV from {}: {source}", path.display())]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid row on line {line}: {reason}")]
    RowParseError { line: usize, reason: String },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Failed to write output: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl MatcherError {
    /// Whether the failure was caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MatcherError::MissingField(_)
                | MatcherError::FileReadError { .. }
                | MatcherError::RowParseError { .. }
        )
    }
}
