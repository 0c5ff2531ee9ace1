use thiserror::Error;
use threadhub_store::StoreError;

/// Failures surfaced by [`ThreadRegistry`](crate::ThreadRegistry) operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The thread id, or the name within its scope, is already taken.
    #[error("Thread conflicts with an existing id or scoped name")]
    Conflict,

    /// No such thread, or the thread belongs to someone else.
    #[error("Thread not found")]
    NotFound,

    #[error("Operation canceled")]
    Canceled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// The store failed independently of the request.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => RegistryError::Conflict,
            StoreError::NotFound => RegistryError::NotFound,
            e if e.is_interrupted() => RegistryError::Canceled,
            e => RegistryError::StoreUnavailable(e.to_string()),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RegistryError>;
