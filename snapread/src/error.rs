use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapreadError {
    #[error("{0}")]
    Validation(String),

    #[error("Image exceeds the maximum allowed size of {max_bytes} bytes")]
    PayloadTooLarge { max_bytes: usize },

    #[error("Origin not allowed")]
    OriginRejected,

    #[error("Too many requests, try again later")]
    RateLimited,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("OCR operation did not complete within {attempts} poll attempts")]
    OcrTimeout { attempts: u32 },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl SnapreadError {
    pub fn status(&self) -> StatusCode {
        match self {
            SnapreadError::Validation(_) => StatusCode::BAD_REQUEST,
            SnapreadError::Json(_) => StatusCode::BAD_REQUEST,
            SnapreadError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            SnapreadError::OriginRejected => StatusCode::FORBIDDEN,
            SnapreadError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SnapreadError::Storage(_)
            | SnapreadError::Ocr(_)
            | SnapreadError::OcrTimeout { .. }
            | SnapreadError::Http(_)
            | SnapreadError::Config(_)
            | SnapreadError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text body sent to the client. Server faults carry the
    /// `Error: ` prefix; client faults are the bare message. No internal
    /// identifiers or backtraces are exposed either way.
    pub fn response_body(&self) -> String {
        if self.status().is_server_error() {
            format!("Error: {self}")
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for SnapreadError {
    fn into_response(self) -> Response {
        (self.status(), self.response_body()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, SnapreadError>;
