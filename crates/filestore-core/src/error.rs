use thiserror::Error;

/// Errors raised by sessions and by the transports they drive.
#[derive(Error, Debug)]
pub enum FileStoreError {
    /// The session charged more round trips than its ceiling allows.
    #[error(
        "The maximum number of requests ({max}) allowed for this session has been reached. \
         Batch operations instead of issuing one request per item, or raise \
         max_number_of_requests_per_session"
    )]
    RequestBudgetExceeded { max: usize },

    #[error("Session cannot execute operations: {0}")]
    InvalidSessionCast(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Etag mismatch for {path}: expected {expected}, found {actual}")]
    EtagMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Flush cancelled with {remaining} operation(s) still queued")]
    Cancelled { remaining: usize },

    #[error("Another flush of this session is already running")]
    FlushInProgress,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for FileStoreError {
    fn from(err: std::io::Error) -> Self {
        FileStoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FileStoreError {
    fn from(err: serde_json::Error) -> Self {
        FileStoreError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FileStoreError>;
