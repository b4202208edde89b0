use thiserror::Error;

/// Failures surfaced by the workflow engine and allocation matcher. All are
/// returned synchronously to the caller; nothing is retried internally.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Out-of-order approval: {0}")]
    Sequence(String),

    #[error("Concurrent mutation detected: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures at the row-store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Table corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("Store locked: {reason}")]
    Locked { reason: String },

    #[error("Version mismatch for order {order_id}: expected {expected}, found {found}")]
    VersionMismatch {
        order_id: u64,
        expected: u64,
        found: u64,
    },
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;
