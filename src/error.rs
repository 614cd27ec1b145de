//! Error taxonomy for the request pipeline.
//!
//! Every failure raised while serving a connection is a [`ServerError`], and
//! every `ServerError` maps onto one of the four [`StatusError`] values the
//! error translator knows how to render.

use std::fmt;
use std::io;

use crate::http::parser::ParseError;

/// The closed set of error statuses a client can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusError {
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusError {
    /// Maps a numeric status onto the closed set. Unknown codes become 500.
    ///
    /// ```
    /// # use vesta::error::StatusError;
    /// assert_eq!(StatusError::from_code(404), StatusError::NotFound);
    /// assert_eq!(StatusError::from_code(418), StatusError::InternalServerError);
    /// ```
    pub fn from_code(code: u16) -> Self {
        match code {
            400 => StatusError::BadRequest,
            403 => StatusError::Forbidden,
            404 => StatusError::NotFound,
            _ => StatusError::InternalServerError,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            StatusError::BadRequest => 400,
            StatusError::Forbidden => 403,
            StatusError::NotFound => 404,
            StatusError::InternalServerError => 500,
        }
    }

    /// Standard reason phrase, used verbatim on the status line.
    pub fn message(&self) -> &'static str {
        match self {
            StatusError::BadRequest => "Bad Request",
            StatusError::Forbidden => "Forbidden",
            StatusError::NotFound => "Not Found",
            StatusError::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.message())
    }
}

/// A failure anywhere in the per-connection pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] ParseError),

    #[error("Invalid host: {0}")]
    UnconfiguredHost(String),

    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("handler execution failed: {0}")]
    HandlerFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusError {
        match self {
            ServerError::MalformedRequest(_) | ServerError::UnconfiguredHost(_) => {
                StatusError::BadRequest
            }
            ServerError::Forbidden(_) => StatusError::Forbidden,
            ServerError::NotFound(_) => StatusError::NotFound,
            ServerError::HandlerFailure(_) | ServerError::Io(_) => {
                StatusError::InternalServerError
            }
        }
    }

    /// Text that is safe to show the client.
    ///
    /// Client errors echo what was wrong with the request. Server errors only
    /// ever expose the reason phrase; the underlying cause stays in the logs.
    pub fn public_detail(&self) -> String {
        match self {
            ServerError::HandlerFailure(_) | ServerError::Io(_) => {
                StatusError::InternalServerError.message().to_string()
            }
            other => other.to_string(),
        }
    }
}
