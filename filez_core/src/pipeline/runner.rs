//! Core pipeline implementation
//!
//! This module provides the pipeline that resolves candidates and runs
//! processors over a target.

use super::{Outcome, Params, PipelineTarget, Processor, ProcessorRegistry, StopValue};
use crate::error::PipelineError;
use crate::{Error, Result};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// An unresolved pipeline entry
pub enum Candidate<T: ?Sized, C: ?Sized = ()> {
    /// Looked up in the registry on first run
    Named { name: String, params: Params },
    /// Ready-made processor
    Instance {
        processor: Arc<dyn Processor<T, C>>,
        params: Params,
    },
}

impl<T: ?Sized, C: ?Sized> Candidate<T, C> {
    fn label(&self) -> &str {
        match self {
            Self::Named { name, .. } => name,
            Self::Instance { processor, .. } => processor.name(),
        }
    }
}

/// A resolved processor plus its effective stop settings
struct Step<T: ?Sized, C: ?Sized> {
    processor: Arc<dyn Processor<T, C>>,
    stopper: bool,
    stop_value: StopValue,
    params: Params,
}

/// Ordered, lazily resolved sequence of processors
pub struct Pipeline<T: ?Sized, C: ?Sized = ()> {
    /// Pipeline name, also the scope for target overrides
    name: String,
    registry: Arc<ProcessorRegistry<T, C>>,
    candidates: Vec<Candidate<T, C>>,
    /// Resolved once, on first use
    steps: OnceCell<Vec<Step<T, C>>>,
    processors_ran: usize,
    last_result: Outcome,
    errors: Vec<Error>,
}

impl<T: ?Sized, C: ?Sized> Pipeline<T, C> {
    /// Create an empty pipeline resolving names through `registry`
    pub fn new(name: &str, registry: Arc<ProcessorRegistry<T, C>>) -> Self {
        Self {
            name: name.to_string(),
            registry,
            candidates: Vec::new(),
            steps: OnceCell::new(),
            processors_ran: 0,
            last_result: None,
            errors: Vec::new(),
        }
    }

    /// Create a pipeline from registered processor names
    pub fn from_names<S: AsRef<str>>(
        name: &str,
        registry: Arc<ProcessorRegistry<T, C>>,
        processors: &[S],
    ) -> Self {
        let mut pipeline = Self::new(name, registry);
        for processor in processors {
            pipeline.push(Candidate::Named {
                name: processor.as_ref().to_string(),
                params: Params::new(),
            });
        }
        pipeline
    }

    pub fn builder(name: &str, registry: Arc<ProcessorRegistry<T, C>>) -> PipelineBuilder<T, C> {
        PipelineBuilder {
            pipeline: Self::new(name, registry),
        }
    }

    /// Append a candidate. Has no effect once the pipeline has been resolved.
    pub fn push(&mut self, candidate: Candidate<T, C>) {
        if self.steps.get().is_some() {
            warn!(
                "Pipeline '{}' already resolved; ignoring candidate '{}'",
                self.name,
                candidate.label()
            );
            return;
        }
        self.candidates.push(candidate);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidate names in declaration order
    pub fn candidate_names(&self) -> Vec<&str> {
        self.candidates.iter().map(Candidate::label).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn is_resolved(&self) -> bool {
        self.steps.get().is_some()
    }

    /// Resolve candidates now instead of on first run
    pub fn resolve(&self) -> Result<()> {
        self.steps()?;
        Ok(())
    }

    /// Resolved processor at `index`
    pub fn processor(&self, index: usize) -> Result<Option<&dyn Processor<T, C>>> {
        Ok(self.steps()?.get(index).map(|step| &*step.processor))
    }

    /// Number of processors that completed during the last run
    pub fn processors_ran(&self) -> usize {
        self.processors_ran
    }

    /// Result of the last processor that completed
    pub fn last_result(&self) -> Outcome {
        self.last_result
    }

    /// Errors collected during the last run
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }

    fn steps(&self) -> Result<&Vec<Step<T, C>>> {
        self.steps
            .get_or_try_init(|| resolve(&self.name, &self.registry, &self.candidates))
    }

    /// Run every processor over `target` in declaration order.
    ///
    /// Parameters are merged, lowest precedence first: candidate params,
    /// target overrides for this pipeline, `kwargs`, target overrides for the
    /// processor. Returns the last completed processor's result.
    pub fn run(&mut self, target: &mut T, context: &C, kwargs: &Params) -> Result<Outcome>
    where
        T: PipelineTarget,
    {
        self.processors_ran = 0;
        self.last_result = None;
        self.errors.clear();

        let steps = self
            .steps
            .get_or_try_init(|| resolve(&self.name, &self.registry, &self.candidates))?;
        let raises = target.raises_pipeline_errors();
        let pipeline_overrides = target.pipeline_overrides(&self.name);

        for step in steps {
            let processor = step.processor.name();

            let mut params = step.params.clone();
            params.merge(&pipeline_overrides);
            params.merge(kwargs);
            params.merge(&target.processor_overrides(processor));

            match step.processor.process(target, context, &params) {
                Ok(outcome) => {
                    self.processors_ran += 1;
                    self.last_result = outcome;

                    if step.stopper && step.stop_value.matches(outcome) {
                        debug!(
                            "Pipeline '{}' stopped at '{processor}' with {outcome:?}",
                            self.name
                        );
                        break;
                    }
                }
                Err(e) if e.is_skippable() => {
                    debug!("Pipeline '{}' skipped '{processor}': {e}", self.name);
                }
                Err(e) => {
                    if raises {
                        return Err(PipelineError::step(&self.name, processor, e).into());
                    }
                    warn!("Pipeline '{}' processor '{processor}' failed: {e}", self.name);
                    self.errors.push(e);
                }
            }
        }

        Ok(self.last_result)
    }
}

fn resolve<T: ?Sized, C: ?Sized>(
    pipeline: &str,
    registry: &ProcessorRegistry<T, C>,
    candidates: &[Candidate<T, C>],
) -> Result<Vec<Step<T, C>>> {
    let mut steps = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let (processor, mut params) = match candidate {
            Candidate::Named { name, params } => {
                let processor = registry
                    .create(name, params)
                    .ok_or_else(|| {
                        PipelineError::configuration(pipeline, format!("unknown processor '{name}'"))
                    })?
                    .map_err(|e| {
                        PipelineError::configuration(
                            pipeline,
                            format!("processor '{name}' could not be built: {e}"),
                        )
                    })?;
                (processor, params.clone())
            }
            Candidate::Instance { processor, params } => (processor.clone(), params.clone()),
        };

        let name = processor.name().to_string();
        let stopper = match params.remove("stopper") {
            None => processor.stopper(),
            Some(serde_json::Value::Bool(flag)) => flag,
            Some(other) => {
                return Err(PipelineError::configuration(
                    pipeline,
                    format!("'stopper' of '{name}' must be a boolean, got {other}"),
                )
                .into());
            }
        };
        let stop_value = match params.remove("stop_value") {
            None => processor.stop_value(),
            Some(value) => StopValue::from_param(&value).map_err(|reason| {
                PipelineError::configuration(pipeline, format!("'{name}': {reason}"))
            })?,
        };
        if stopper && stop_value.is_empty_set() {
            return Err(PipelineError::configuration(
                pipeline,
                format!("stopper '{name}' has an empty stop value set"),
            )
            .into());
        }

        steps.push(Step {
            processor,
            stopper,
            stop_value,
            params,
        });
    }

    debug!("Pipeline '{pipeline}' resolved {} processor(s)", steps.len());
    Ok(steps)
}

impl<T: ?Sized, C: ?Sized> fmt::Debug for Pipeline<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("candidates", &self.candidate_names())
            .field("resolved", &self.is_resolved())
            .field("processors_ran", &self.processors_ran)
            .field("last_result", &self.last_result)
            .field("errors", &self.errors.len())
            .finish()
    }
}

/// Builder for Pipeline
pub struct PipelineBuilder<T: ?Sized, C: ?Sized = ()> {
    pipeline: Pipeline<T, C>,
}

impl<T: ?Sized, C: ?Sized> PipelineBuilder<T, C> {
    /// Add a registered processor
    pub fn processor(self, name: &str) -> Self {
        self.processor_with(name, Params::new())
    }

    /// Add a registered processor with candidate parameters
    pub fn processor_with(mut self, name: &str, params: Params) -> Self {
        self.pipeline.push(Candidate::Named {
            name: name.to_string(),
            params,
        });
        self
    }

    /// Add a ready-made processor
    pub fn instance(mut self, processor: Arc<dyn Processor<T, C>>) -> Self {
        self.pipeline.push(Candidate::Instance {
            processor,
            params: Params::new(),
        });
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline<T, C> {
        self.pipeline
    }
}
