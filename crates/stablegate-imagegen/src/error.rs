use std::error::Error as StdError;

use axum::{
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Message used when a failure carries no usable text
pub const FALLBACK_MESSAGE: &str = "Image generation failed";

/// Terminal failure of a generation call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Malformed or incomplete generation parameters
    #[error("Invalid generation parameters: {0}")]
    Validation(String),

    /// Non-OK terminal stream status, connection failure, or deadline expiry
    #[error("Generation transport error: {0}")]
    Transport(String),

    /// Unusable adapter configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Category of a [`GenerationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Config,
}

impl GenerationError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport(detail.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// The message carried by the failure, without the category prefix
    pub fn detail(&self) -> &str {
        match self {
            Self::Validation(detail) | Self::Transport(detail) | Self::Config(detail) => detail,
        }
    }
}

/// Extract a displayable message from any error
///
/// Never panics: known shapes yield their inner message, anything else its
/// `Display` text, and an empty result is replaced by [`FALLBACK_MESSAGE`].
pub fn extract_message(err: &(dyn StdError + 'static)) -> String {
    let message = if let Some(generation) = err.downcast_ref::<GenerationError>() {
        generation.detail().to_string()
    } else if let Some(status) = err.downcast_ref::<tonic::Status>() {
        status.message().to_string()
    } else {
        err.to_string()
    };

    if message.trim().is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        message
    }
}

/// Unreadable request bodies fail like any other invalid parameters
impl From<JsonRejection> for GenerationError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        let message = extract_message(&self);

        tracing::error!(kind = ?self.kind(), error = %message, "image generation request failed");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}
