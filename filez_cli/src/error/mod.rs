//! Exit codes and user-facing error rendering

use colored::*;
use filez_core::Error as CoreError;

/// Semantic exit codes for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// Generic failure, also "files differ" for `compare`
    GeneralError = 1,
    Misuse = 2,
    /// Verification failed or no digest to verify against
    IntegrityError = 3,
    FilesystemError = 4,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Error categories that map to exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorCategory {
    General,
    Misuse,
    Integrity,
    Filesystem,
}

/// A failed command, ready to be shown to the user
#[derive(Debug)]
pub struct CliError {
    category: ErrorCategory,
    error: anyhow::Error,
    /// Suggestions for recovery
    pub suggestions: Vec<String>,
}

impl CliError {
    /// Classify by the first engine error in the chain
    pub fn new(error: anyhow::Error) -> Self {
        let category = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<CoreError>())
            .map(categorize)
            .unwrap_or(ErrorCategory::General);

        let mut suggestions = Vec::new();
        match category {
            ErrorCategory::Misuse => {
                suggestions.push("Run 'filez --help' for usage information".to_string());
                suggestions.push("Check the configuration with 'filez config show'".to_string());
            }
            ErrorCategory::Filesystem => {
                suggestions.push("Check that the path exists and is readable".to_string());
            }
            _ => {}
        }

        Self {
            category,
            error,
            suggestions,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self.category {
            ErrorCategory::General => ExitCode::GeneralError,
            ErrorCategory::Misuse => ExitCode::Misuse,
            ErrorCategory::Integrity => ExitCode::IntegrityError,
            ErrorCategory::Filesystem => ExitCode::FilesystemError,
        }
    }

    /// Format the error for user display
    pub fn format_for_user(&self, debug: bool) -> String {
        let prefix = match self.category {
            ErrorCategory::General => "Error".red(),
            ErrorCategory::Misuse => "Usage Error".yellow(),
            ErrorCategory::Integrity => "Integrity Error".red(),
            ErrorCategory::Filesystem => "File Error".red(),
        };

        let mut output = format!("{}: {}\n", prefix, self.error);

        let causes: Vec<String> = self.error.chain().skip(1).map(|cause| cause.to_string()).collect();
        if !causes.is_empty() {
            output.push_str("\nCaused by:\n");
            for cause in causes {
                output.push_str(&format!("  {cause}\n"));
            }
        }

        if !self.suggestions.is_empty() {
            output.push_str(&format!("\n{}:\n", "Suggestions".bold()));
            for suggestion in &self.suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        if debug {
            output.push_str(&format!("\n{:?}\n", self.error));
        }

        output
    }
}

/// Pipeline failures take the category of the step error they carry
fn categorize(error: &CoreError) -> ErrorCategory {
    match error {
        CoreError::Io(_) => ErrorCategory::Filesystem,
        CoreError::Pipeline(pipeline) => pipeline
            .errors()
            .first()
            .map_or(ErrorCategory::Misuse, |inner| categorize(inner)),
        CoreError::Validation(_) => ErrorCategory::Misuse,
        CoreError::Integrity(_) => ErrorCategory::Integrity,
        _ => ErrorCategory::General,
    }
}

impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use filez_core::error::{ContentError, IntegrityError, IoError, PipelineError, ValidationError};
    use std::path::Path;

    #[test]
    fn test_exit_codes_follow_engine_errors() {
        let io: anyhow::Error = CoreError::from(IoError::file_not_found(Path::new("/x"))).into();
        assert_eq!(CliError::new(io).exit_code(), ExitCode::FilesystemError);

        let integrity = Err::<(), _>(CoreError::from(IntegrityError::no_hash_available("a.txt")))
            .context("Failed to verify a.txt")
            .unwrap_err();
        assert_eq!(CliError::new(integrity).exit_code(), ExitCode::IntegrityError);

        assert_eq!(
            CliError::new(anyhow::anyhow!("plain")).exit_code(),
            ExitCode::GeneralError
        );
    }

    #[test]
    fn test_pipeline_errors_classified_by_their_steps() {
        let collected = PipelineError::collected(
            "hasher",
            vec![
                IoError::file_not_found(Path::new("/x")).into(),
                ContentError::Empty.into(),
            ],
        )
        .unwrap();
        assert!(matches!(collected, CoreError::Pipeline(_)));
        assert_eq!(CliError::new(collected.into()).exit_code(), ExitCode::FilesystemError);

        let step = CoreError::from(PipelineError::step(
            "hasher",
            "md5",
            ValidationError::invalid_configuration("bad").into(),
        ));
        assert_eq!(CliError::new(step.into()).exit_code(), ExitCode::Misuse);

        let misconfigured = CoreError::from(PipelineError::configuration("hasher", "unknown processor"));
        assert_eq!(CliError::new(misconfigured.into()).exit_code(), ExitCode::Misuse);
    }

    #[test]
    fn test_format_includes_causes() {
        let error = Err::<(), _>(std::io::Error::other("disk on fire"))
            .context("Failed to hash a.txt")
            .unwrap_err();
        let text = CliError::new(error).format_for_user(false);
        assert!(text.contains("Failed to hash a.txt"));
        assert!(text.contains("disk on fire"));
    }
}
