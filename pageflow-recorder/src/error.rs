use thiserror::Error;

/// Errors that can occur in the recording core
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Failed to read or write the recording session
    #[error("Session store error: {0}")]
    Store(String),

    /// Failed to deliver a cross-frame message
    #[error("Frame channel error: {0}")]
    Channel(String),

    /// Failed to install the recorder on the document
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// Result type for the recording core
pub type Result<T> = std::result::Result<T, RecorderError>;
