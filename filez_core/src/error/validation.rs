//! Validation related error types

use thiserror::Error;

/// Validation and configuration errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Invalid input parameter
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A processor does not handle files with this extension.
    ///
    /// Pipelines skip over this error without recording it.
    #[error("Processor '{processor}' does not support extension '{extension}'")]
    UnsupportedExtension { processor: String, extension: String },
}

impl ValidationError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: &str) -> Self {
        Self::InvalidConfiguration {
            message: message.to_string(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }

    /// Create an unsupported extension error
    pub fn unsupported_extension(processor: &str, extension: &str) -> Self {
        Self::UnsupportedExtension {
            processor: processor.to_string(),
            extension: extension.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_error() {
        let error = ValidationError::invalid_configuration("Bad config");
        assert!(error.to_string().contains("Invalid configuration"));
        assert!(error.to_string().contains("Bad config"));
    }

    #[test]
    fn test_invalid_parameter_error() {
        let error = ValidationError::invalid_parameter("block_size", "must be positive");
        assert!(error.to_string().contains("Invalid parameter"));
        assert!(error.to_string().contains("block_size"));
        assert!(error.to_string().contains("must be positive"));
    }

    #[test]
    fn test_missing_field_error() {
        let error = ValidationError::missing_field("save_to");
        assert!(error.to_string().contains("Missing required field"));
        assert!(error.to_string().contains("save_to"));
    }

    #[test]
    fn test_unsupported_extension_error() {
        let error = ValidationError::unsupported_extension("zip", ".txt");
        assert!(error.to_string().contains("zip"));
        assert!(error.to_string().contains(".txt"));
    }
}
