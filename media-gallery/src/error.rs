use std::fmt;

/// Central error type for gallery operations.
///
/// Platform-layer failures are converted at the adapter boundary; no raw
/// index or filesystem error crosses the caller-facing surface untyped.
#[derive(Debug)]
pub enum GalleryError {
    /// Required call parameter missing or malformed
    InvalidArgument(String),
    /// Asset or resource does not resolve in the media index
    NotFound(String),
    /// The platform declined to render a thumbnail or media resource
    GenerationFailed(String),
    /// Operation was cancelled before completion
    Cancelled,
    /// Payload encoding failed
    Encoding(serde_json::Error),
    /// Media index query error
    Index(rusqlite::Error),
    /// Filesystem error
    Io(std::io::Error),
}

impl fmt::Display for GalleryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GalleryError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            GalleryError::NotFound(msg) => write!(f, "Not found: {}", msg),
            GalleryError::GenerationFailed(msg) => write!(f, "Generation failed: {}", msg),
            GalleryError::Cancelled => write!(f, "Operation cancelled"),
            GalleryError::Encoding(e) => write!(f, "Encoding error: {}", e),
            GalleryError::Index(e) => write!(f, "Media index error: {}", e),
            GalleryError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for GalleryError {}

impl From<rusqlite::Error> for GalleryError {
    fn from(e: rusqlite::Error) -> Self {
        GalleryError::Index(e)
    }
}

impl From<std::io::Error> for GalleryError {
    fn from(e: std::io::Error) -> Self {
        GalleryError::Io(e)
    }
}

impl From<serde_json::Error> for GalleryError {
    fn from(e: serde_json::Error) -> Self {
        GalleryError::Encoding(e)
    }
}
