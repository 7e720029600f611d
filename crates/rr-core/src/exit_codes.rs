//! Exit codes for the rr-core CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal and I/O errors

use rr_report::ErrorKind;

/// Exit codes for rr-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Report (or other command) completed.
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments, manifest or configuration
    ArgsError = 10,

    /// Template or image file missing
    NotFound = 11,

    /// Image could not be decoded or encoded
    DecodeError = 12,

    /// Custom image loader failed
    LoaderError = 13,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::NotFound => "ERR_NOT_FOUND",
            ExitCode::DecodeError => "ERR_DECODE",
            ExitCode::LoaderError => "ERR_LOADER",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ErrorKind> for ExitCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => ExitCode::NotFound,
            ErrorKind::DecodeFailure => ExitCode::DecodeError,
            ErrorKind::IoFailure => ExitCode::IoError,
            ErrorKind::LoaderFailure => ExitCode::LoaderError,
            ErrorKind::InvalidInput => ExitCode::ArgsError,
        }
    }
}
