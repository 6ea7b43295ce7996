use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use registry::{AppealError, EditError, FormError};
use thiserror::Error;

use crate::store::{EditOrStore, StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("{0}")]
    Form(#[from] FormError),

    #[error("{0}")]
    Edit(#[from] EditError),

    #[error("{0}")]
    Appeal(#[from] AppealError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Photo not found")]
    PhotoNotFound,

    #[error("Invalid claim: {0}")]
    InvalidClaim(&'static str),

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<EditOrStore> for AppError {
    fn from(err: EditOrStore) -> Self {
        match err {
            EditOrStore::Store(e) => AppError::Store(e),
            EditOrStore::Edit(e) => AppError::Edit(e),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(_: MultipartError) -> Self {
        AppError::MalformedPayload
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MalformedPayload | AppError::Form(_) | AppError::InvalidClaim(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Appeal(_) | AppError::Edit(EditError::EmptyName) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Edit(EditError::InvalidCredentials) => StatusCode::FORBIDDEN,
            AppError::Store(StoreError::NotFound(_)) | AppError::PhotoNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::Store(StoreError::AlreadyClaimed(_)) => StatusCode::CONFLICT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
