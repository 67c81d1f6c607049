//! Pipeline related error types

use thiserror::Error;

/// Errors raised by the pipeline engine
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A candidate could not be resolved into a processor. Always fatal.
    #[error("Pipeline '{pipeline}' is misconfigured: {message}")]
    Configuration { pipeline: String, message: String },

    /// A processor failed while the target asked for errors to be raised
    #[error("Processor '{processor}' failed in pipeline '{pipeline}': {source}")]
    Step {
        pipeline: String,
        processor: String,
        #[source]
        source: Box<crate::Error>,
    },

    /// Several processors failed during one run; `first` is the earliest
    #[error("Pipeline '{pipeline}' collected {} errors, first: {first}", rest.len() + 1)]
    Collected {
        pipeline: String,
        #[source]
        first: Box<crate::Error>,
        rest: Vec<crate::Error>,
    },
}

impl PipelineError {
    /// Create a configuration error
    pub fn configuration(pipeline: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            pipeline: pipeline.to_string(),
            message: message.into(),
        }
    }

    /// Wrap an error returned by a processor
    pub fn step(pipeline: &str, processor: &str, source: crate::Error) -> Self {
        Self::Step {
            pipeline: pipeline.to_string(),
            processor: processor.to_string(),
            source: Box::new(source),
        }
    }

    /// Fold errors collected by a run into one; a single error is returned unchanged
    pub fn collected(pipeline: &str, errors: Vec<crate::Error>) -> Option<crate::Error> {
        let mut errors = errors.into_iter();
        let first = errors.next()?;
        let rest: Vec<_> = errors.collect();
        if rest.is_empty() {
            return Some(first);
        }
        Some(
            Self::Collected {
                pipeline: pipeline.to_string(),
                first: Box::new(first),
                rest,
            }
            .into(),
        )
    }

    /// Every error carried, outermost first
    pub fn errors(&self) -> Vec<&crate::Error> {
        match self {
            Self::Step { source, .. } => vec![&**source],
            Self::Collected { first, rest, .. } => std::iter::once(&**first).chain(rest).collect(),
            Self::Configuration { .. } => Vec::new(),
        }
    }
}
