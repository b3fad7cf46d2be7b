mod percentile_error;
mod storage_error;
mod validation_error;

pub use percentile_error::PercentileError;
pub use storage_error::StorageError;
pub use validation_error::ValidationError;

/// Top-level error type aggregating all subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum NidoError {
    #[error(transparent)]
    Percentile(#[from] PercentileError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type NidoResult<T> = Result<T, NidoError>;
