//! Naming and reservation error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reserving, renaming or saving files
#[derive(Error, Debug)]
pub enum NameError {
    /// The filename is held by another file object and renaming is not allowed
    #[error("Filename '{filename}' is already reserved in {}", directory.display())]
    Reserved { directory: PathBuf, filename: String },

    /// A renaming strategy ran out of attempts
    #[error("Renaming strategy '{strategy}' gave up after {attempts} attempts")]
    Exhausted { strategy: String, attempts: usize },

    /// A save would break one of the file's options
    #[error("Operation not allowed: {reason}")]
    OperationNotAllowed { reason: String },
}

impl NameError {
    /// Create a reserved name error
    pub fn reserved(directory: &std::path::Path, filename: &str) -> Self {
        Self::Reserved {
            directory: directory.to_path_buf(),
            filename: filename.to_string(),
        }
    }

    /// Create an exhaustion error
    pub fn exhausted(strategy: &str, attempts: usize) -> Self {
        Self::Exhausted {
            strategy: strategy.to_string(),
            attempts,
        }
    }

    /// Create an operation not allowed error
    pub fn not_allowed(reason: impl Into<String>) -> Self {
        Self::OperationNotAllowed {
            reason: reason.into(),
        }
    }
}
