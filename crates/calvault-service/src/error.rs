use thiserror::Error;

use crate::crypto::CryptoError;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A signature did not verify against any supplied key.
    #[error("Signature verification failed")]
    SignatureError,

    /// Decrypted payload is not text.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// A structural precondition is absent.
    #[error("Missing data: {0}")]
    MissingData(String),

    #[error(transparent)]
    CryptoError(#[from] CryptoError),

    #[error(transparent)]
    RfcError(#[from] calvault_rfc::error::RfcError),

    #[error("Base64 error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Rule evaluation failed while expanding occurrences.
    #[error("Recurrence error: {0}")]
    RecurrenceError(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
