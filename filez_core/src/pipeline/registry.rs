//! Name → processor factory table

use super::{Params, Processor};
use crate::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Factory<T, C> = Arc<dyn Fn(&Params) -> Result<Arc<dyn Processor<T, C>>> + Send + Sync>;

/// Registry resolving processor names into live processors
pub struct ProcessorRegistry<T: ?Sized, C: ?Sized = ()> {
    factories: HashMap<String, Factory<T, C>>,
}

impl<T: ?Sized, C: ?Sized> ProcessorRegistry<T, C> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory building a processor from its candidate parameters
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Params) -> Result<Arc<dyn Processor<T, C>>> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    /// Register one shared instance under its own name
    pub fn register_instance<P>(&mut self, processor: P)
    where
        P: Processor<T, C> + 'static,
        T: 'static,
        C: 'static,
    {
        let name = processor.name().to_string();
        let shared: Arc<dyn Processor<T, C>> = Arc::new(processor);
        self.register(&name, move |_| Ok(shared.clone()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the processor registered as `name`, `None` when unknown
    pub fn create(&self, name: &str, params: &Params) -> Option<Result<Arc<dyn Processor<T, C>>>> {
        self.factories.get(name).map(|factory| factory(params))
    }
}

impl<T: ?Sized, C: ?Sized> Default for ProcessorRegistry<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized, C: ?Sized> fmt::Debug for ProcessorRegistry<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("processors", &self.names())
            .finish()
    }
}
