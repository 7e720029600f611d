//! Error types for report generation.

use crate::image_store::ImageRole;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Coarse failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Template or image file does not exist.
    NotFound,
    /// A file exists but is not a usable image.
    DecodeFailure,
    /// Directory creation or file write failed.
    IoFailure,
    /// A custom image loader failed or returned unusable images.
    LoaderFailure,
    /// The request or configuration is malformed.
    InvalidInput,
}

impl ErrorKind {
    /// Stable snake_case name for machine output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::DecodeFailure => "decode_failure",
            ErrorKind::IoFailure => "io_failure",
            ErrorKind::LoaderFailure => "loader_failure",
            ErrorKind::InvalidInput => "invalid_input",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during report generation.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Template file is missing.
    #[error("template not found: {path}")]
    TemplateNotFound { path: PathBuf },

    /// Image file referenced by a role is missing.
    #[error("image for {role} not found: {path}")]
    ImageNotFound { role: ImageRole, path: PathBuf },

    /// Image file exists but could not be decoded.
    #[error("failed to decode image for {role} ({path}): {source}")]
    DecodeFailure {
        role: ImageRole,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Image could not be encoded to the output format.
    #[error("failed to encode image for {role}: {source}")]
    EncodeFailure {
        role: ImageRole,
        #[source]
        source: image::ImageError,
    },

    /// In-memory image has no pixels.
    #[error("image for {role} is empty ({width}x{height})")]
    EmptyImage {
        role: ImageRole,
        width: u32,
        height: u32,
    },

    /// Filesystem error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path expected to be a directory is something else.
    #[error("path exists but is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Custom image loader failed for an error pair.
    #[error("image loader failed for error pair {index}: {reason}")]
    LoaderFailure { index: usize, reason: String },

    /// Malformed report request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportError::TemplateNotFound { .. } | ReportError::ImageNotFound { .. } => {
                ErrorKind::NotFound
            }
            ReportError::DecodeFailure { .. }
            | ReportError::EncodeFailure { .. }
            | ReportError::EmptyImage { .. } => ErrorKind::DecodeFailure,
            ReportError::Io { .. } | ReportError::NotADirectory { .. } => ErrorKind::IoFailure,
            ReportError::LoaderFailure { .. } => ErrorKind::LoaderFailure,
            ReportError::InvalidRequest(_)
            | ReportError::InvalidConfig(_)
            | ReportError::Json(_) => ErrorKind::InvalidInput,
        }
    }
}
