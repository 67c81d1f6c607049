//! Internal library error types

use thiserror::Error;

/// Internal library errors
#[derive(Error, Debug)]
pub enum InternalError {
    /// A container codec failed to decode its input
    #[error("Codec '{codec}' failed: {message}")]
    Codec { codec: String, message: String },

    /// Unknown hash algorithm identifier
    #[error("Unknown hash algorithm '{algorithm}'")]
    UnknownAlgorithm { algorithm: String },

    /// Internal assertion failure
    #[error("Internal assertion failed: {message}")]
    Assertion { message: String },
}

impl InternalError {
    /// Create a codec error
    pub fn codec(codec: &str, message: impl Into<String>) -> Self {
        Self::Codec {
            codec: codec.to_string(),
            message: message.into(),
        }
    }

    /// Create an unknown algorithm error
    pub fn unknown_algorithm(algorithm: &str) -> Self {
        Self::UnknownAlgorithm {
            algorithm: algorithm.to_string(),
        }
    }

    /// Create an internal assertion failure error
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error() {
        let error = InternalError::codec("zip", "bad central directory");
        assert!(error.to_string().contains("zip"));
        assert!(error.to_string().contains("bad central directory"));
    }

    #[test]
    fn test_unknown_algorithm_error() {
        let error = InternalError::unknown_algorithm("whirlpool");
        assert!(error.to_string().contains("whirlpool"));
    }

    #[test]
    fn test_assertion_error() {
        let error = InternalError::assertion("Test assertion");
        assert!(error.to_string().contains("Internal assertion failed"));
    }
}
