use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors surfaced to HTTP clients.
///
/// Messages only ever carry the path the client asked for. Host paths and OS
/// error strings stay in the server log.
#[derive(Error, Debug)]
pub enum PendulumError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("I/O failure")]
    Io(#[from] std::io::Error),
}

impl PendulumError {
    /// Map a stat/open error for `path` onto the client-facing taxonomy.
    pub fn from_io(err: std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => PendulumError::NotFound(path.to_string()),
            _ => PendulumError::Io(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PendulumError::NotFound(_) => StatusCode::NOT_FOUND,
            PendulumError::InvalidPath(_) => StatusCode::FORBIDDEN,
            PendulumError::IsADirectory(_) | PendulumError::NotADirectory(_) => {
                StatusCode::BAD_REQUEST
            }
            PendulumError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            PendulumError::NotFound(_) => "NOT_FOUND",
            PendulumError::InvalidPath(_) => "INVALID_PATH",
            PendulumError::IsADirectory(_) => "IS_A_DIRECTORY",
            PendulumError::NotADirectory(_) => "NOT_A_DIRECTORY",
            PendulumError::Io(_) => "IO_FAILURE",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for PendulumError {
    fn into_response(self) -> Response {
        if let PendulumError::Io(err) = &self {
            error!("I/O failure: {}", err);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        };

        (self.status(), Json(body)).into_response()
    }
}
