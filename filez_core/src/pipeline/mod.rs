//! Declarative processor pipelines
//!
//! Extraction, hashing, renaming, comparison and unpacking are all "a list of
//! optional steps run over one target". A [`Pipeline`] holds such a list as
//! unresolved candidates, resolves them through a [`ProcessorRegistry`] the
//! first time it runs, then calls each processor in declaration order until
//! one reports its stop value.

use crate::Result;
use serde_json::Value;

mod params;
mod registry;
mod runner;

pub use params::{KeywordOverrides, Params};
pub use registry::ProcessorRegistry;
pub use runner::{Candidate, Pipeline, PipelineBuilder};

/// What a processor reports back. `None` means it had no opinion.
pub type Outcome = Option<bool>;

/// Result(s) that make a stopper processor end the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopValue {
    Single(Outcome),
    AnyOf(Vec<Outcome>),
}

impl StopValue {
    /// Equality for a single value, membership for a set
    pub fn matches(&self, outcome: Outcome) -> bool {
        match self {
            Self::Single(value) => *value == outcome,
            Self::AnyOf(values) => values.contains(&outcome),
        }
    }

    pub fn is_empty_set(&self) -> bool {
        matches!(self, Self::AnyOf(values) if values.is_empty())
    }

    /// Parse a `stop_value` candidate parameter: a boolean, `null`, or a list of those
    pub fn from_param(value: &Value) -> std::result::Result<Self, String> {
        fn outcome(value: &Value) -> std::result::Result<Outcome, String> {
            match value {
                Value::Bool(flag) => Ok(Some(*flag)),
                Value::Null => Ok(None),
                other => Err(format!("stop value must be a boolean or null, got {other}")),
            }
        }

        match value {
            Value::Array(values) if values.is_empty() => Err("stop value set is empty".to_string()),
            Value::Array(values) => values
                .iter()
                .map(outcome)
                .collect::<std::result::Result<_, _>>()
                .map(Self::AnyOf),
            other => outcome(other).map(Self::Single),
        }
    }
}

/// One pipeline step.
///
/// Processors are stateless with respect to the pipeline: everything they
/// produce is written to the target.
pub trait Processor<T: ?Sized, C: ?Sized = ()>: Send + Sync {
    /// Name used for diagnostics and for processor-scoped overrides
    fn name(&self) -> &str;

    /// Do the work
    fn process(&self, target: &mut T, context: &C, params: &Params) -> Result<Outcome>;

    /// Whether a matching result ends the pipeline
    fn stopper(&self) -> bool {
        false
    }

    fn stop_value(&self) -> StopValue {
        StopValue::Single(Some(true))
    }
}

/// Objects pipelines run over
pub trait PipelineTarget {
    /// Overrides applied to every processor of `pipeline`
    fn pipeline_overrides(&self, pipeline: &str) -> Params {
        let _ = pipeline;
        Params::default()
    }

    /// Overrides applied to the processor named `processor` only
    fn processor_overrides(&self, processor: &str) -> Params {
        let _ = processor;
        Params::default()
    }

    /// Raise the first processor error instead of collecting it
    fn raises_pipeline_errors(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stop_value_matching() {
        assert!(StopValue::Single(Some(true)).matches(Some(true)));
        assert!(!StopValue::Single(Some(true)).matches(None));
        assert!(StopValue::Single(None).matches(None));

        let set = StopValue::AnyOf(vec![Some(true), Some(false)]);
        assert!(set.matches(Some(false)));
        assert!(!set.matches(None));
    }

    #[test]
    fn test_stop_value_from_param() {
        assert_eq!(StopValue::from_param(&json!(false)), Ok(StopValue::Single(Some(false))));
        assert_eq!(
            StopValue::from_param(&json!([true, null])),
            Ok(StopValue::AnyOf(vec![Some(true), None]))
        );
        assert!(StopValue::from_param(&json!([])).is_err());
        assert!(StopValue::from_param(&json!("yes")).is_err());
    }
}
