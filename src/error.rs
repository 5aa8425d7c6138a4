use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    /// The camera has not delivered a frame with real dimensions yet
    #[error("Camera frame is not ready yet, try again in a moment")]
    NotReady,

    /// Crop region collapsed to nothing after scaling and clamping
    #[error("Crop region is empty after scaling ({width}x{height})")]
    DegenerateGeometry { width: u32, height: u32 },

    #[error("Text recognition failed: {0}")]
    Recognition(String),

    #[error("Preprocessing failed: {0}")]
    Pipeline(String),

    #[error("Failed to initialize OCR engine: {0}")]
    InitializationError(String),

    #[error("Failed to load additive data: {0}")]
    KnowledgeBase(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ScanError {
    /// Recoverable conditions where a cycle is skipped rather than reported
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            ScanError::NotReady | ScanError::DegenerateGeometry { .. }
        )
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ScanError::NotReady => (StatusCode::CONFLICT, "NOT_READY"),
            ScanError::DegenerateGeometry { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DEGENERATE_REGION")
            }
            ScanError::Recognition(_) => (StatusCode::BAD_GATEWAY, "OCR_FAILED"),
            ScanError::Pipeline(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PIPELINE_ERROR"),
            ScanError::InitializationError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INIT_ERROR")
            }
            ScanError::KnowledgeBase(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATA_ERROR"),
            ScanError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE"),
            ScanError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ScanError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
