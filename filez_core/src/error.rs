//! Error types for the filez engine
//!
//! This module contains all error types used throughout the library, organized
//! into logical categories for better maintainability and clarity.

use thiserror::Error;

pub mod content;
pub mod integrity;
pub mod internal;
pub mod io;
pub mod naming;
pub mod pipeline;
pub mod validation;

pub use self::content::ContentError;
pub use self::integrity::IntegrityError;
pub use self::io::{IoError, IoErrorKind};
pub use self::naming::NameError;
pub use self::pipeline::PipelineError;
pub use self::validation::ValidationError;
pub use internal::InternalError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the filez engine
///
/// Errors are categorized by the subsystem that reports them:
/// - I/O errors: storage backend operations
/// - Validation errors: bad input, including the skippable unsupported-extension kind
/// - Pipeline errors: misconfigured pipelines and wrapped step failures
/// - Naming errors: reservation conflicts, exhausted renamers and refused saves
/// - Content errors: misuse of a content buffer
/// - Integrity errors: digest mismatches and missing digests
/// - Internal errors: codec failures and broken invariants
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Pipeline configuration and step errors
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Naming and reservation errors
    #[error(transparent)]
    Naming(#[from] NameError),

    /// Content buffer errors
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Integrity verification errors
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Internal library errors
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl Error {
    /// Whether a pipeline should move on to the next processor without
    /// recording this error.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::Validation(ValidationError::UnsupportedExtension { .. })
        )
    }

    /// Whether this error reports a corrupted file (as opposed to a usage problem)
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::Integrity(IntegrityError::Mismatch { .. }))
    }
}

// Conversions from external error types

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::io;
    use std::path::Path;

    #[test]
    fn test_file_not_found_error_creation() {
        let path = Path::new("/non/existent/photo.jpg");
        let error = Error::Io(IoError::file_not_found(path));

        match error {
            Error::Io(io_err) => {
                assert_eq!(io_err.kind, IoErrorKind::FileNotFound);
                assert_eq!(io_err.path, Some(path.to_path_buf()));
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_unsupported_extension_is_skippable() {
        let error = Error::from(ValidationError::unsupported_extension("zip", ".txt"));
        assert!(error.is_skippable());

        let error = Error::from(ValidationError::invalid_configuration("bad"));
        assert!(!error.is_skippable());
    }

    #[test]
    fn test_mismatch_is_distinct_from_missing_hash() {
        let mismatch = Error::from(IntegrityError::mismatch("a.txt", "md5", "00", "11"));
        let missing = Error::from(IntegrityError::no_hash_available("a.txt"));

        assert!(mismatch.is_integrity_failure());
        assert!(!missing.is_integrity_failure());
    }

    #[test]
    fn test_step_error_keeps_source_chain() {
        let cause = Error::from(ContentError::Empty);
        let error = Error::from(PipelineError::step("hasher", "md5", cause));

        assert!(error.to_string().contains("md5"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_error_from_std_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();

        match error {
            Error::Io(io_err) => {
                assert_eq!(io_err.kind, IoErrorKind::FileNotFound);
                assert!(io_err.source.is_some());
            }
            _ => panic!("Expected Io error"),
        }
    }
}
