//! Content buffer error types

use thiserror::Error;

/// Misuse of a content buffer
#[derive(Error, Debug)]
pub enum ContentError {
    /// Text or bytes content with nothing in it
    #[error("Content is empty")]
    Empty,

    /// Caching was required but neither memory nor file caching is enabled
    #[error("Content must be cached but no cache target is configured")]
    CacheNotConfigured,

    /// `read` was called while block iteration is in progress
    #[error("Cannot read content while iterating over its blocks")]
    IterationInProgress,

    /// The buffer was closed
    #[error("Content buffer is closed")]
    Closed,

    /// Content was requested as text but is not valid UTF-8
    #[error("Content is not valid UTF-8 text")]
    NotText,

    /// No content was assigned to the file
    #[error("No content available for '{file}'")]
    Missing { file: String },

    /// A comparison ran out of processors without reaching a verdict
    #[error("Not enough data to compare files")]
    Inconclusive,
}

impl ContentError {
    /// Create a missing content error
    pub fn missing(file: &str) -> Self {
        Self::Missing {
            file: file.to_string(),
        }
    }
}
