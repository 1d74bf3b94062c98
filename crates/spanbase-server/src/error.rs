use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};
use spanbase_store::StoreError;
use spanbase_types::ValidationError;
use thiserror::Error;

use crate::envelope::{Envelope, ErrorKind};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No valid action specified")]
    InvalidAction {
        app: Option<String>,
        action: Option<String>,
    },

    /// The multipart body could not be read. `status` is the one the
    /// extractor chose, e.g. 413 when the body limit was hit.
    #[error("malformed multipart body: {message}")]
    Multipart { status: StatusCode, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidAction { .. } => ErrorKind::InvalidAction,
            Self::Multipart { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                ErrorKind::PayloadTooLarge
            }
            Self::Multipart { .. } => ErrorKind::BadRequest,
            Self::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::Store(StoreError::UnknownTarget(_)) => ErrorKind::UnknownTarget,
            Self::Store(StoreError::PartialWrite { .. }) => ErrorKind::PartialWrite,
            Self::Store(err) if err.is_backend() => ErrorKind::Storage,
            Self::Store(_) => ErrorKind::Internal,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::InvalidAction | ErrorKind::BadRequest => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::NotFound | ErrorKind::UnknownTarget => StatusCode::NOT_FOUND,
            ErrorKind::PartialWrite => StatusCode::CONFLICT,
            ErrorKind::Storage | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `obj` field of the error reply: whatever input or state the client
    /// needs to act on the failure.
    fn detail(&self) -> Value {
        match self {
            Self::Validation(err) => json!(err.input),
            Self::InvalidAction { app, action } => json!({ "app": app, "action": action }),
            Self::Store(StoreError::NotFound(target) | StoreError::UnknownTarget(target)) => {
                json!({ "target": target })
            }
            Self::Store(StoreError::PartialWrite {
                target,
                expected,
                persisted,
                source,
            }) => json!({
                "target": target,
                "expected": expected,
                "persisted": persisted,
                "cause": source.as_ref().map(|err| err.to_string()),
            }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = ?self.kind(), error = %self, "request failed");
        } else {
            tracing::debug!(kind = ?self.kind(), error = %self, "request refused");
        }
        let body = Envelope::error(self.kind(), self.to_string(), self.detail());
        (status, Json(body)).into_response()
    }
}
