//! Error types for the snapshot writer crate

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Storage configuration missing or invalid
    E001InvalidConfig,
    /// E002: Series could not be encoded or decoded
    E002Encoding,
    /// E003: Storage read or write failed
    E003WriteFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001InvalidConfig => "E001",
            Self::E002Encoding => "E002",
            Self::E003WriteFailure => "E003",
        }
    }
}

/// Errors that can occur while writing snapshot files
#[derive(Debug, Error)]
pub enum WriterError {
    /// Invalid storage configuration provided
    #[error("[{code}] Invalid storage configuration: {message}")]
    InvalidConfig { code: &'static str, message: String },

    /// JSON encoding or decoding failed
    #[error("[{code}] Snapshot encoding failed for '{path}': {message}")]
    Encoding {
        code: &'static str,
        path: String,
        message: String,
    },

    /// Storage operation failed
    #[error("[{code}] Write operation failed for '{path}': {message}")]
    WriteFailure {
        code: &'static str,
        path: String,
        message: String,
    },
}

impl WriterError {
    /// Create an invalid config error with error code
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            code: ErrorCode::E001InvalidConfig.as_str(),
            message: message.into(),
        }
    }

    /// Create an encoding error with error code
    pub fn encoding(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Encoding {
            code: ErrorCode::E002Encoding.as_str(),
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a write failure error with error code
    pub fn write_failure(path: impl Into<String>, message: impl ToString) -> Self {
        Self::WriteFailure {
            code: ErrorCode::E003WriteFailure.as_str(),
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig { .. } => ErrorCode::E001InvalidConfig,
            Self::Encoding { .. } => ErrorCode::E002Encoding,
            Self::WriteFailure { .. } => ErrorCode::E003WriteFailure,
        }
    }
}

/// Result type alias for WriterError
pub type Result<T> = std::result::Result<T, WriterError>;
