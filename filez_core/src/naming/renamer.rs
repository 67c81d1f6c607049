//! Renaming strategies
//!
//! Each strategy is a stopper processor over a [`NameCandidate`]. A strategy
//! must return a name that is neither on disk nor in the `reserved_names`
//! parameter, since reservations run ahead of what has been saved.

use super::{NameCandidate, split_extension};
use crate::error::NameError;
use crate::pipeline::{Outcome, Params, Processor};
use crate::storage::Storage;
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound on random names tried by [`UniqueRenamer`]
pub const UNIQUE_ATTEMPTS: usize = 100;

/// Upper bound on enumerated names tried by the numbered strategies
const MAX_ENUMERATION: usize = 100_000;

static WINDOWS_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" ?\([0-9]+\)$|\[[0-9]+\]$").expect("valid regex"));

static LINUX_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"( +)?- +[0-9]+$").expect("valid regex"));

fn taken(storage: &dyn Storage, directory: &Path, name: &str, reserved: &HashSet<String>) -> bool {
    reserved.contains(name) || storage.exists(&storage.join(directory, name))
}

fn reserved_names(params: &Params) -> Result<HashSet<String>> {
    Ok(params.string_list("reserved_names")?.into_iter().collect())
}

/// Probe `<base><suffix(i)><extension>` for i = 1, 2, ...
fn enumerate(
    strategy: &str,
    storage: &dyn Storage,
    target: &NameCandidate,
    pattern: &Regex,
    suffix: impl Fn(usize) -> String,
    reserved: &HashSet<String>,
) -> Result<String> {
    let base = pattern.replace(&target.filename, "").into_owned();
    let mut name = base.clone();

    for i in 1..=MAX_ENUMERATION {
        if !taken(storage, &target.directory, &format!("{name}{}", target.extension), reserved) {
            return Ok(name);
        }
        name = format!("{base}{}", suffix(i));
    }
    Err(NameError::exhausted(strategy, MAX_ENUMERATION).into())
}

/// `name.ext`, `name (1).ext`, `name (2).ext`, ...
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRenamer;

impl Processor<NameCandidate, dyn Storage> for WindowsRenamer {
    fn name(&self) -> &str {
        "windows"
    }

    fn process(&self, target: &mut NameCandidate, storage: &dyn Storage, params: &Params) -> Result<Outcome> {
        let reserved = reserved_names(params)?;
        let name = enumerate(
            self.name(),
            storage,
            target,
            &WINDOWS_SUFFIX,
            |i| format!(" ({i})"),
            &reserved,
        )?;
        target.filename = name;
        Ok(Some(true))
    }

    fn stopper(&self) -> bool {
        true
    }
}

/// `name.ext`, `name - 1.ext`, `name - 2.ext`, ...
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxRenamer;

impl Processor<NameCandidate, dyn Storage> for LinuxRenamer {
    fn name(&self) -> &str {
        "linux"
    }

    fn process(&self, target: &mut NameCandidate, storage: &dyn Storage, params: &Params) -> Result<Outcome> {
        let reserved = reserved_names(params)?;
        let name = enumerate(
            self.name(),
            storage,
            target,
            &LINUX_SUFFIX,
            |i| format!(" - {i}"),
            &reserved,
        )?;
        target.filename = name;
        Ok(Some(true))
    }

    fn stopper(&self) -> bool {
        true
    }
}

type Generator = Arc<dyn Fn() -> String + Send + Sync>;

/// Random UUID v4 filenames, extension kept
#[derive(Clone)]
pub struct UniqueRenamer {
    generate: Generator,
}

impl UniqueRenamer {
    pub fn new() -> Self {
        Self {
            generate: Arc::new(|| Uuid::new_v4().to_string()),
        }
    }

    /// Use `generate` instead of UUID v4 for the random part
    pub fn with_generator(generate: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            generate: Arc::new(generate),
        }
    }

    /// A fresh stem for `extension` in `directory`
    pub fn fresh_name(
        &self,
        storage: &dyn Storage,
        directory: &Path,
        extension: &str,
        reserved: &HashSet<String>,
    ) -> Result<String> {
        for _ in 0..UNIQUE_ATTEMPTS {
            let stem = (self.generate)();
            if !taken(storage, directory, &format!("{stem}{extension}"), reserved) {
                return Ok(stem);
            }
        }
        Err(NameError::exhausted("unique", UNIQUE_ATTEMPTS).into())
    }
}

impl Default for UniqueRenamer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UniqueRenamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueRenamer").finish_non_exhaustive()
    }
}

impl Processor<NameCandidate, dyn Storage> for UniqueRenamer {
    fn name(&self) -> &str {
        "unique"
    }

    fn process(&self, target: &mut NameCandidate, storage: &dyn Storage, params: &Params) -> Result<Outcome> {
        let reserved = reserved_names(params)?;
        target.filename = self.fresh_name(storage, &target.directory, &target.extension, &reserved)?;
        Ok(Some(true))
    }

    fn stopper(&self) -> bool {
        true
    }
}

/// Allocate a random complete filename with `extension` in `directory`
pub fn unique_filename(
    storage: &dyn Storage,
    directory: &Path,
    extension: &str,
    reserved: &HashSet<String>,
) -> Result<String> {
    let stem = UniqueRenamer::new().fresh_name(storage, directory, extension, reserved)?;
    Ok(format!("{stem}{extension}"))
}

/// Rename `complete_filename` with one strategy outside of any pipeline
pub fn rename_with(
    renamer: &dyn Processor<NameCandidate, dyn Storage>,
    storage: &(dyn Storage + 'static),
    directory: &Path,
    complete_filename: &str,
    reserved: &HashSet<String>,
) -> Result<String> {
    let mut target = NameCandidate::new(directory, complete_filename);
    let mut names: Vec<&String> = reserved.iter().collect();
    names.sort();
    let params = Params::new().with("reserved_names", names.into_iter().cloned().collect::<Vec<_>>());
    renamer.process(&mut target, storage, &params)?;
    Ok(target.complete_filename())
}

/// Strip a numbering suffix the way the Windows strategy would
pub fn strip_windows_suffix(complete_filename: &str) -> String {
    let (stem, extension) = split_extension(complete_filename);
    format!("{}{extension}", WINDOWS_SUFFIX.replace(&stem, ""))
}
