//! Processor parameters and per-target overrides

use crate::error::ValidationError;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keyword parameters handed to a processor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Boolean parameter, `default` when absent
    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(value)) => Ok(*value),
            Some(_) => Err(ValidationError::invalid_parameter(key, "expected a boolean").into()),
        }
    }

    pub fn str(&self, key: &str) -> Result<Option<&str>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(_) => Err(ValidationError::invalid_parameter(key, "expected a string").into()),
        }
    }

    pub fn u64(&self, key: &str) -> Result<Option<u64>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| ValidationError::invalid_parameter(key, "expected an unsigned integer").into()),
        }
    }

    /// List of strings, empty when absent
    pub fn string_list(&self, key: &str) -> Result<Vec<String>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        ValidationError::invalid_parameter(key, "expected a list of strings").into()
                    })
                })
                .collect(),
            Some(_) => Err(ValidationError::invalid_parameter(key, "expected a list of strings").into()),
        }
    }

    /// Overlay `other` on top of `self`; keys in `other` win
    pub fn merge(&mut self, other: &Params) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn merged(&self, other: &Params) -> Params {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Keyword overrides a file object carries for its pipelines.
///
/// Each entry is a parameter set plus an optional scope. Unscoped entries
/// apply to every pipeline; scoped entries apply to the pipeline or the
/// processor with that name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordOverrides {
    entries: Vec<(Params, Option<String>)>,
}

impl KeywordOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add parameters for every pipeline
    pub fn global(mut self, params: Params) -> Self {
        self.entries.push((params, None));
        self
    }

    /// Add parameters for one pipeline or processor
    pub fn scoped(mut self, scope: &str, params: Params) -> Self {
        self.entries.push((params, Some(scope.to_string())));
        self
    }

    pub fn push(&mut self, params: Params, scope: Option<String>) {
        self.entries.push((params, scope));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unscoped entries plus entries scoped to `pipeline`, in insertion order
    pub fn for_pipeline(&self, pipeline: &str) -> Params {
        self.collect(|scope| scope.is_none_or(|scope| scope == pipeline))
    }

    /// Only the entries scoped to `scope`
    pub fn scoped_to(&self, scope: &str) -> Params {
        self.collect(|entry| entry == Some(scope))
    }

    fn collect(&self, keep: impl Fn(Option<&str>) -> bool) -> Params {
        let mut merged = Params::new();
        for (params, scope) in &self.entries {
            if keep(scope.as_deref()) {
                merged.merge(params);
            }
        }
        merged
    }
}
