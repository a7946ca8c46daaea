use thiserror::Error;

/// Unexpected backing-store failures.
///
/// Expected outcomes (guard miss, missing row) are values on the repository
/// trait, not errors; anything surfacing here is infrastructure trouble.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("backing store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Dispatch error taxonomy.
///
/// Callers branch on these: `Conflict` in particular must stay
/// distinguishable so a client can show "this ride is no longer available"
/// instead of a generic failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Malformed input - the caller's fault, never retried automatically
    #[error("invalid input: {0}")]
    Validation(String),

    /// Unknown ride or driver id
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not the ride's rider or its assigned driver
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A guarded transition lost the race - the ride already moved on
    #[error("conflict: {0}")]
    Conflict(String),

    /// No candidate drivers within the search radius
    #[error("no drivers available")]
    NoDriversAvailable,

    /// Unexpected backing-store failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
