use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Main error type for whispernet nodes and the directory service
#[derive(Debug)]
pub enum WhisperError {
    /// Configuration or CLI argument errors
    Config(String),

    /// Directory registration or listing errors
    Directory(String),

    /// Peer link errors: connect, accept, read, write
    Transport(String),

    /// Invalid requests made against the directory HTTP API
    Api(String),

    /// Serialization/deserialization errors
    Serialization(SerializationError),

    /// System I/O errors
    Io(std::io::Error),

    /// Internal lock poisoning or concurrency errors
    Concurrency(String),
}

/// Wire codec errors
#[derive(Debug)]
pub enum SerializationError {
    /// JSON serialization/deserialization errors
    Json(serde_json::Error),

    /// A frame exceeded the maximum accepted size (in bytes)
    FrameTooLarge(usize),
}

impl fmt::Display for WhisperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhisperError::Config(msg) => write!(f, "Configuration error: {}", msg),
            WhisperError::Directory(msg) => write!(f, "Directory error: {}", msg),
            WhisperError::Transport(msg) => write!(f, "Transport error: {}", msg),
            WhisperError::Api(msg) => write!(f, "API error: {}", msg),
            WhisperError::Serialization(err) => write!(f, "Serialization error: {}", err),
            WhisperError::Io(err) => write!(f, "I/O error: {}", err),
            WhisperError::Concurrency(msg) => write!(f, "Concurrency error: {}", msg),
        }
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationError::Json(err) => write!(f, "JSON: {}", err),
            SerializationError::FrameTooLarge(len) => {
                write!(f, "frame of {} bytes exceeds limit", len)
            }
        }
    }
}

impl std::error::Error for WhisperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WhisperError::Io(err) => Some(err),
            WhisperError::Serialization(SerializationError::Json(err)) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for SerializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SerializationError::Json(err) => Some(err),
            SerializationError::FrameTooLarge(_) => None,
        }
    }
}

// Convenient type alias for Results using our error type
pub type Result<T> = std::result::Result<T, WhisperError>;

impl WhisperError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            WhisperError::Config(_) => StatusCode::BAD_REQUEST,
            WhisperError::Directory(_) => StatusCode::BAD_GATEWAY,
            WhisperError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            WhisperError::Api(_) => StatusCode::BAD_REQUEST,
            WhisperError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WhisperError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WhisperError::Concurrency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            WhisperError::Config(_) => "configuration_error",
            WhisperError::Directory(_) => "directory_error",
            WhisperError::Transport(_) => "transport_error",
            WhisperError::Api(_) => "api_error",
            WhisperError::Serialization(_) => "serialization_error",
            WhisperError::Io(_) => "io_error",
            WhisperError::Concurrency(_) => "concurrency_error",
        }
    }
}

// Axum IntoResponse implementation for HTTP error responses
impl IntoResponse for WhisperError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = json!({
            "error": {
                "code": status_code.as_u16(),
                "message": self.to_string(),
                "type": self.error_type(),
            }
        });

        (status_code, Json(error_response)).into_response()
    }
}

// Conversions from common error types
impl From<std::io::Error> for WhisperError {
    fn from(err: std::io::Error) -> Self {
        WhisperError::Io(err)
    }
}

impl From<serde_json::Error> for WhisperError {
    fn from(err: serde_json::Error) -> Self {
        WhisperError::Serialization(SerializationError::Json(err))
    }
}

impl From<SerializationError> for WhisperError {
    fn from(err: SerializationError) -> Self {
        WhisperError::Serialization(err)
    }
}

impl From<reqwest::Error> for WhisperError {
    fn from(err: reqwest::Error) -> Self {
        WhisperError::Directory(err.to_string())
    }
}

// Helper macros for common error construction patterns
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::WhisperError::Config($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::WhisperError::Config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! directory_error {
    ($msg:expr) => {
        $crate::error::WhisperError::Directory($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::WhisperError::Directory(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! transport_error {
    ($msg:expr) => {
        $crate::error::WhisperError::Transport($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::WhisperError::Transport(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! concurrency_error {
    ($msg:expr) => {
        $crate::error::WhisperError::Concurrency($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::WhisperError::Concurrency(format!($fmt, $($arg)*))
    };
}
