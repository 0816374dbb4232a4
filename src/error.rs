//! Unified error hierarchy for NutriRS
//!
//! The analytics calculators never fail: bad numbers degrade to zero. Errors
//! only arise at the edges, when input has the wrong shape or a file or
//! configuration cannot be read.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all NutriRS operations
#[derive(Debug, Error)]
pub enum NutriRsError {
    /// Input has the wrong shape (not a day-series, duplicate dates, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration file exists but cannot be read or parsed
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Day-series import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Record without the date key
    #[error("Record {index} is missing a date")]
    MissingDate { index: usize },

    /// Same calendar day appears twice
    #[error("Duplicate date in series: {date}")]
    DuplicateDate { date: String },
}

/// Result type alias for NutriRS operations
pub type Result<T> = std::result::Result<T, NutriRsError>;

impl NutriRsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            NutriRsError::Validation(_) => ErrorSeverity::Warning,
            NutriRsError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            NutriRsError::Import(ImportError::DuplicateDate { .. }) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            NutriRsError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find daily log file: {}", path.display())
            }
            NutriRsError::Import(ImportError::DuplicateDate { date }) => {
                format!(
                    "The daily log contains {} more than once. Merge the entries and retry.",
                    date
                )
            }
            NutriRsError::Validation(reason) => {
                format!("The daily log has an unexpected shape: {}", reason)
            }
            NutriRsError::Configuration(reason) => {
                format!("Could not load the configuration file. Fix or remove it: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// How a failed command is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Input or environment problem
    Error,
    /// The user can fix the input and retry
    Warning,
}
