use std::fmt;

use media_gallery::GalleryError;

/// Wire error codes of the caller-facing method surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidArguments,
    NotFound,
    Error,
    NotImplemented,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArguments => "INVALID_ARGUMENTS",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Error => "ERROR",
            ErrorCode::NotImplemented => "NOT_IMPLEMENTED",
        }
    }
}

/// Structured (code, message) failure returned across the bridge.
#[derive(Debug)]
pub struct BridgeError {
    pub code: ErrorCode,
    pub message: String,
}

impl BridgeError {
    pub fn invalid_arguments(name: &str) -> Self {
        Self {
            code: ErrorCode::InvalidArguments,
            message: format!("{} must not be null", name),
        }
    }

    pub fn not_implemented(method: &str) -> Self {
        Self {
            code: ErrorCode::NotImplemented,
            message: format!("Unknown method: {}", method),
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for BridgeError {}

impl From<GalleryError> for BridgeError {
    fn from(err: GalleryError) -> Self {
        let code = match err {
            GalleryError::InvalidArgument(_) => ErrorCode::InvalidArguments,
            GalleryError::NotFound(_) => ErrorCode::NotFound,
            _ => ErrorCode::Error,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}
