//! Error Handling Module
//!
//! Structured error types for the movie dashboard. Load-time problems
//! (missing file, unreadable CSV, missing column) are fatal and surface
//! through these variants; malformed cell values never do, the cleaning
//! step turns them into nulls instead.

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Main error type for the dashboard library.
#[derive(Error, Debug, Clone)]
pub enum DashError {
    // Data Loading Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Failed to read file {path}: {message}")]
    ReadError { path: String, message: String },

    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    #[error("Invalid data type in column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    // Selection Errors
    #[error("Unknown genre: {0}")]
    UnknownGenre(String),

    #[error("Unknown year: {0}")]
    UnknownYear(i32),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    // Rendering Errors
    #[error("Render error: {0}")]
    RenderError(String),

    // IO Errors
    #[error("IO error: {0}")]
    IoError(String),

    // Polars Errors (wrapped)
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type alias used across the crate.
pub type DashResult<T> = Result<T, DashError>;

// ============================================================================
// Error Conversion Implementations
// ============================================================================

impl From<std::io::Error> for DashError {
    fn from(err: std::io::Error) -> Self {
        DashError::IoError(err.to_string())
    }
}

impl From<polars::error::PolarsError> for DashError {
    fn from(err: polars::error::PolarsError) -> Self {
        DashError::PolarsError(err.to_string())
    }
}

impl<E: std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for DashError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        DashError::RenderError(err.to_string())
    }
}

// ============================================================================
// Error Construction Helpers
// ============================================================================

impl DashError {
    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        DashError::FileNotFound { path: path.into() }
    }

    pub fn unsupported_format(extension: impl Into<String>) -> Self {
        DashError::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    pub fn read_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        DashError::ReadError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a missing column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        DashError::MissingColumn {
            column: column.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        DashError::TypeMismatch {
            column: column.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DashError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a polars failure with the stage that produced it.
    pub fn polars(stage: &str, err: impl std::fmt::Display) -> Self {
        DashError::PolarsError(format!("{}: {}", stage, err))
    }

    /// True for errors that can only happen while loading the dataset.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            DashError::FileNotFound { .. }
                | DashError::UnsupportedFormat { .. }
                | DashError::ReadError { .. }
                | DashError::MissingColumn { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
