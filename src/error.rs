//! Error types for the admin gateway

use std::io;

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::gateway::error_page;

/// Result type alias for the admin gateway
pub type Result<T> = std::result::Result<T, Error>;

/// Admin gateway errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Action name outside the closed action set
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Anything that escapes a handler is an uncaught failure: log it and
/// answer with the generic 500 page.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        error_page(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}
