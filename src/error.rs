use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::flash::{Category, Flash, FlashSigner};

/// Rejections of the submitted file itself. Each one sends the user back to the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("No file selected")]
    EmptyFilename,
    #[error("Invalid file type. Please upload an image (PNG, JPG, JPEG, GIF)")]
    UnsupportedType,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("failed to store upload: {0}")]
    Storage(#[from] std::io::Error),
    #[error("an upload named {0} already exists")]
    Conflict(String),
}

const CONFLICT_MESSAGE: &str =
    "Another upload with the same name arrived at the same moment. Please try again.";

impl AppError {
    /// Turns the error into a response, attaching a signed flash where the user is redirected.
    pub fn into_response_with(self, signer: &FlashSigner) -> Response {
        match self {
            AppError::Upload(err) => {
                tracing::debug!(reason = %err, "upload rejected");
                Flash::new(Category::Danger, err.to_string()).redirect(signer, "/upload")
            }
            AppError::Conflict(name) => {
                tracing::warn!(stored_name = %name, "stored name collision, refusing to overwrite");
                Flash::new(Category::Danger, CONFLICT_MESSAGE).redirect(signer, "/upload")
            }
            AppError::Multipart(err) => err.into_response(),
            AppError::Storage(err) => {
                tracing::error!(error = %err, "failed to store upload");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload").into_response()
            }
        }
    }
}
