use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No pages discoverable for this site (sitemap and crawl both came up empty)")]
    SourceUnavailable,

    #[error("Another capture or expansion is already in progress")]
    OperationInFlight,

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Scan error: {0}")]
    Scan(#[from] sitelens_scanner::ScanError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
