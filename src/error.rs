//! Errors reported by the HTTP handlers

use crate::extractor::ExtractionError;
use crate::storage::StorageError;
use crate::synthesizer::SynthesisError;
use crate::types::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The request carried no `file` field
    #[error("no file uploaded")]
    MissingFile,

    /// The multipart body could not be read
    #[error("{message}")]
    BadRequest { message: String },

    /// The upload exceeded the configured body limit
    #[error("uploaded file is too large")]
    PayloadTooLarge,

    /// The document parsed but held no text
    #[error("no extractable text")]
    NoExtractableText,

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => AppError::NotFound(name),
            other => AppError::Storage(other),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFile | AppError::BadRequest { .. } | AppError::NoExtractableText => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Synthesis(SynthesisError::RateLimitExceeded) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Synthesis(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client
    pub fn user_message(&self) -> String {
        match self {
            AppError::Extraction(_) => "could not extract text from the uploaded PDF".to_string(),
            AppError::Synthesis(SynthesisError::RateLimitExceeded) => {
                "speech service rate limit reached, try again later".to_string()
            }
            AppError::Synthesis(_) => "speech synthesis failed".to_string(),
            AppError::Storage(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Storage(_) => tracing::error!("Storage failure: {:#}", self),
            AppError::Synthesis(_) => tracing::warn!("Speech service failure: {}", self),
            AppError::Extraction(_) => tracing::info!("Extraction failure: {}", self),
            _ => tracing::debug!("Client error: {}", self),
        }

        let body = ErrorResponse {
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
