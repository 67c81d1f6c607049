//! Per-directory filename reservations

use crate::error::{InternalError, NameError};
use crate::file::FileId;
use crate::storage::normalize;
use crate::Result;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Reservations {
    /// directory → complete filename → owner
    by_directory: HashMap<PathBuf, HashMap<String, FileId>>,
    /// complete filename → owner → directory
    by_name: HashMap<String, HashMap<FileId, PathBuf>>,
}

impl Reservations {
    fn insert(&mut self, directory: &Path, filename: &str, owner: FileId) {
        self.by_directory
            .entry(directory.to_path_buf())
            .or_default()
            .insert(filename.to_string(), owner);
        self.by_name
            .entry(filename.to_string())
            .or_default()
            .insert(owner, directory.to_path_buf());
    }

    fn remove(&mut self, directory: &Path, filename: &str, owner: FileId) -> bool {
        let Some(names) = self.by_directory.get_mut(directory) else {
            return false;
        };
        if names.get(filename) != Some(&owner) {
            return false;
        }
        names.remove(filename);
        if names.is_empty() {
            self.by_directory.remove(directory);
        }

        if let Some(owners) = self.by_name.get_mut(filename) {
            owners.remove(&owner);
            if owners.is_empty() {
                self.by_name.remove(filename);
            }
        }
        true
    }
}

/// Registry of complete filenames reserved per directory.
///
/// Within one directory at most one owner holds a given filename. The
/// registry is a cheap handle: clones share the same reservations.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    inner: Arc<Mutex<Reservations>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Reservations> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserve `filename` in `directory` for `owner`.
    ///
    /// When another owner holds the name and `rename_on_conflict` is set,
    /// `rename` is asked for a new name given the names currently reserved in
    /// the directory, and that name is reserved instead. Returns the name that
    /// ended up reserved.
    pub fn reserve<F>(
        &self,
        directory: &Path,
        filename: &str,
        owner: FileId,
        rename_on_conflict: bool,
        mut rename: F,
    ) -> Result<String>
    where
        F: FnMut(&str, &HashSet<String>) -> Result<String>,
    {
        let directory = normalize(directory);
        let mut candidate = filename.to_string();

        loop {
            let reserved = {
                let mut reservations = self.lock();
                let holder = reservations
                    .by_directory
                    .get(&directory)
                    .and_then(|names| names.get(&candidate))
                    .copied();

                match holder {
                    None => {
                        reservations.insert(&directory, &candidate, owner);
                        debug!("Reserved '{candidate}' in {} for {owner}", directory.display());
                        return Ok(candidate);
                    }
                    Some(holder) if holder == owner => return Ok(candidate),
                    Some(_) if !rename_on_conflict => {
                        return Err(NameError::reserved(&directory, &candidate).into());
                    }
                    Some(_) => reservations
                        .by_directory
                        .get(&directory)
                        .map(|names| names.keys().cloned().collect::<HashSet<_>>())
                        .unwrap_or_default(),
                }
            };

            // The lock is released while the renamer runs
            let renamed = rename(&candidate, &reserved)?;
            if renamed == candidate {
                return Err(InternalError::assertion(format!(
                    "renaming '{candidate}' produced the same name"
                ))
                .into());
            }
            debug!("Name '{candidate}' taken in {}, trying '{renamed}'", directory.display());
            candidate = renamed;
        }
    }

    /// Reserve `filename` for `owner`, failing if another owner holds it
    pub fn claim(&self, directory: &Path, filename: &str, owner: FileId) -> Result<()> {
        self.reserve(directory, filename, owner, false, |name, _| {
            Err(NameError::reserved(directory, name).into())
        })
        .map(|_| ())
    }

    /// Drop `owner`'s reservation of `filename` in `directory`
    pub fn release(&self, directory: &Path, filename: &str, owner: FileId) -> bool {
        let directory = normalize(directory);
        let released = self.lock().remove(&directory, filename, owner);
        if released {
            debug!("Released '{filename}' in {} for {owner}", directory.display());
        }
        released
    }

    /// Drop `owner`'s reservation of `filename` in whatever directory it is held
    pub fn release_name(&self, filename: &str, owner: FileId) -> bool {
        let mut reservations = self.lock();
        let directory = reservations
            .by_name
            .get(filename)
            .and_then(|owners| owners.get(&owner))
            .cloned();

        match directory {
            Some(directory) => reservations.remove(&directory, filename, owner),
            None => false,
        }
    }

    /// Drop every reservation held by `owner`
    pub fn release_owner(&self, owner: FileId) -> usize {
        let mut reservations = self.lock();
        let held: Vec<(PathBuf, String)> = reservations
            .by_name
            .iter()
            .filter_map(|(filename, owners)| {
                owners
                    .get(&owner)
                    .map(|directory| (directory.clone(), filename.clone()))
            })
            .collect();

        held.iter()
            .filter(|(directory, filename)| reservations.remove(directory, filename, owner))
            .count()
    }

    pub fn owner_of(&self, directory: &Path, filename: &str) -> Option<FileId> {
        self.lock()
            .by_directory
            .get(&normalize(directory))
            .and_then(|names| names.get(filename))
            .copied()
    }

    /// Complete filenames currently reserved in `directory`
    pub fn reserved_names(&self, directory: &Path) -> HashSet<String> {
        self.lock()
            .by_directory
            .get(&normalize(directory))
            .map(|names| names.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of reservations
    pub fn len(&self) -> usize {
        self.lock().by_directory.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
