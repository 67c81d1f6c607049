//! Integrity verification error types

use thiserror::Error;

/// Outcome of a failed integrity check
#[derive(Error, Debug)]
pub enum IntegrityError {
    /// The content no longer matches the stored digest
    #[error("File '{file}' failed the {algorithm} integrity check: expected {expected}, got {actual}")]
    Mismatch {
        file: String,
        algorithm: String,
        expected: String,
        actual: String,
    },

    /// There is nothing to verify against. This is a usage error, not corruption.
    #[error("No hash available to compare for file '{file}'")]
    NoHashAvailable { file: String },
}

impl IntegrityError {
    /// Create a mismatch error
    pub fn mismatch(file: &str, algorithm: &str, expected: &str, actual: &str) -> Self {
        Self::Mismatch {
            file: file.to_string(),
            algorithm: algorithm.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a no hash available error
    pub fn no_hash_available(file: &str) -> Self {
        Self::NoHashAvailable {
            file: file.to_string(),
        }
    }
}
