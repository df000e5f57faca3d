//! Error types for tumble
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown id, bad index)
//! - 4: Operation failed (storage write, serialization)

use thiserror::Error;

/// Exit codes for the tumble CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tumble operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Subtask not found: {0}")]
    SubtaskNotFound(i64),

    #[error("Index {index} out of range for list of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unknown theme: {0} (expected standard, light, or darker)")]
    UnknownTheme(String),

    #[error("Unknown filter: {0} (expected all, active, or completed)")]
    UnknownFilter(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::TaskNotFound(_)
            | Error::SubtaskNotFound(_)
            | Error::IndexOutOfRange { .. }
            | Error::UnknownTheme(_)
            | Error::UnknownFilter(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for tumble operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_map_correctly() {
        let user = Error::TaskNotFound(42);
        assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

        let index = Error::IndexOutOfRange { index: 9, len: 3 };
        assert_eq!(index.exit_code(), exit_codes::USER_ERROR);

        let op = Error::OperationFailed("boom".to_string());
        assert_eq!(op.exit_code(), exit_codes::OPERATION_FAILED);
    }

    #[test]
    fn json_error_includes_code() {
        let err = Error::UnknownTheme("neon".to_string());
        let json = JsonError::from(&err);
        assert_eq!(json.code, exit_codes::USER_ERROR);
        assert!(json.error.contains("Unknown theme"));
    }
}
