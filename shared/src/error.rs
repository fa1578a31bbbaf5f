use thiserror::Error;
use tracing::error;

/// Failures reported by repository implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write conflicts with an existing reservation")]
    Conflict,
    #[error("record already exists: {0}")]
    Duplicate(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Cannot find your agent account")]
    Unauthorized,
    #[error("Cannot find this customer")]
    CustomerNotFound,
    #[error("Cannot find this car")]
    CarNotFound,
    #[error("This car is not available")]
    CarUnavailable,
    #[error("Validation error: {0}")]
    ValidationFailed(String),
    #[error("Storage failure: {0}")]
    StorageFailure(#[source] StoreError),
}

impl AdmissionError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::ValidationFailed(reason.into())
    }

    /// Logs a store error and wraps it. Every `StorageFailure` is built here.
    pub fn storage(e: StoreError) -> Self {
        error!("storage failure: {}", e);
        Self::StorageFailure(e)
    }

    /// Stable machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::CustomerNotFound => "customer_not_found",
            Self::CarNotFound => "car_not_found",
            Self::CarUnavailable => "car_unavailable",
            Self::ValidationFailed(_) => "validation_failed",
            Self::StorageFailure(_) => "storage_failure",
        }
    }
}
