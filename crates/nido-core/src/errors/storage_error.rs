use uuid::Uuid;

/// Record-store errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("subject {0} not found")]
    SubjectNotFound(Uuid),

    #[error("growth record {0} not found")]
    RecordNotFound(Uuid),

    #[error("access denied to {resource} {id}")]
    AccessDenied { resource: &'static str, id: Uuid },

    #[error("conditional check failed: {0}")]
    ConditionFailed(String),

    #[error("transaction of {items} items exceeds ceiling of {ceiling}")]
    TransactionTooLarge { items: usize, ceiling: usize },

    #[error("transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
