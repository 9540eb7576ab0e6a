//! Error types for rendering and persistence.

/// Errors raised while acquiring a rendered page.
///
/// The pipeline never propagates these to its caller: a render failure
/// degrades to a defaulted record.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("Chromium not found; set DEALRADAR_CHROMIUM_PATH or install Chrome")]
    BrowserNotFound,

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Snapshot failed: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for renderers.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised by the persistence collaborator.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
