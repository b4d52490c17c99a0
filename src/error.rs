use std::path::PathBuf;

/// Error types for the library.
///
/// Only workbook-level failures abort an analysis run; per-sheet and
/// per-cell problems are logged and degrade to partial results.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to load workbook {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("unsupported workbook format: {0}")]
    UnsupportedFormat(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias used throughout the crate.
pub type AuditResult<T> = Result<T, AuditError>;
