use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Patient not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Failed to save reports")]
    ReportSaveFailed,

    #[error("Internal server error")]
    InternalServerError,
}
