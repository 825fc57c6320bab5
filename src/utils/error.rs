use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaceError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Checkpoint loading failed: {0}")]
    Checkpoint(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl FaceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 非图像类型与无法解码的载荷都是客户端错误
            FaceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            FaceError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            FaceError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            FaceError::Json(_) => StatusCode::BAD_REQUEST,
            FaceError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            FaceError::Checkpoint(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FaceError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            FaceError::Checkpoint(_) => "CHECKPOINT_ERROR",
            FaceError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            FaceError::Inference(_) => "INFERENCE_ERROR",
            FaceError::InvalidInput(_) => "INVALID_INPUT",
            FaceError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            FaceError::Config(_) => "CONFIG_ERROR",
            FaceError::Io(_) => "IO_ERROR",
            FaceError::Json(_) => "JSON_ERROR",
            FaceError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            FaceError::Ort(_) => "ORT_ERROR",
            FaceError::Download(_) => "DOWNLOAD_ERROR",
            FaceError::Archive(_) => "ARCHIVE_ERROR",
            FaceError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for FaceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        tracing::error!("Request failed: {} ({})", self, status);

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(
            FaceError::InvalidInput("not an image".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        let decode_err = image::load_from_memory(b"definitely not an image").unwrap_err();
        assert_eq!(
            FaceError::ImageDecode(decode_err).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn model_errors_map_to_503() {
        assert_eq!(
            FaceError::ModelLoad("missing".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            FaceError::Checkpoint("bad shapes".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn server_faults_map_to_500() {
        assert_eq!(
            FaceError::Inference("feature length mismatch".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(FaceError::Inference("x".into()).error_code(), "INFERENCE_ERROR");
    }
}
