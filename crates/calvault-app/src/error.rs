use thiserror::Error;

/// Application-level errors (command line layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] calvault_service::error::ServiceError),

    #[error(transparent)]
    RfcError(#[from] calvault_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] calvault_core::error::CoreError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
