//! Shared hashing state
//!
//! The engine owns two caches shared by every file of a workspace:
//!
//! - in-flight digest states, keyed by `(algorithm, FileId)`. One pass over
//!   a file's content feeds every algorithm that will be asked for next, and
//!   the finished states wait here until their digest is requested.
//! - sidecar lookups, keyed by `(algorithm, directory, filename)`, so a
//!   directory's checksum files are scanned once per file and algorithm.
//!
//! Only successful sidecar lookups are cached. Entries of a directory are
//! dropped by [`HashEngine::invalidate_directory`], which the workspace calls
//! whenever it writes a sidecar there.

use super::record::FileHashes;
use super::sidecar::{self, SidecarHit};
use super::traits::{HashAlgorithmExt, StreamingHasher};
use super::HashAlgorithm;
use crate::content::ContentBuffer;
use crate::error::IntegrityError;
use crate::file::FileId;
use crate::storage::{Storage, normalize};
use crate::Result;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

type SidecarKey = (HashAlgorithm, PathBuf, String);

/// Finished digest state waiting to be collected
struct InFlight {
    hasher: Box<dyn StreamingHasher>,
    bytes: u64,
}

#[derive(Default)]
struct EngineState {
    in_flight: HashMap<(HashAlgorithm, FileId), InFlight>,
    sidecars: HashMap<SidecarKey, SidecarHit>,
}

/// Hash states and sidecar lookups shared across files
#[derive(Clone, Default)]
pub struct HashEngine {
    inner: Arc<Mutex<EngineState>>,
}

impl HashEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Digest of `content` under `algorithm`.
    ///
    /// A state left by an earlier pass for `owner` is finalized without
    /// reading again. Otherwise the content is read once from its first byte
    /// and every algorithm in `also` is fed in the same pass; their states
    /// are kept for later calls.
    pub fn digest(
        &self,
        algorithm: HashAlgorithm,
        owner: FileId,
        content: &mut ContentBuffer,
        also: &[HashAlgorithm],
    ) -> Result<String> {
        let pending: Vec<HashAlgorithm> = {
            let mut state = self.lock();
            if let Some(done) = state.in_flight.remove(&(algorithm, owner)) {
                debug!("Using {algorithm} state of {owner} ({} bytes)", done.bytes);
                return Ok(done.hasher.hex_digest());
            }
            also.iter()
                .copied()
                .filter(|other| *other != algorithm && !state.in_flight.contains_key(&(*other, owner)))
                .collect()
        };

        let mut hashers: Vec<(HashAlgorithm, Box<dyn StreamingHasher>)> = std::iter::once(algorithm)
            .chain(pending)
            .map(|algorithm| (algorithm, algorithm.to_impl().create_hasher()))
            .collect();

        let bytes = feed(content, &mut hashers)?;
        debug!(
            "Hashed {bytes} bytes of {owner} with {}",
            hashers
                .iter()
                .map(|(algorithm, _)| algorithm.id())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut hashers = hashers.into_iter();
        let digest = match hashers.next() {
            Some((_, hasher)) => hasher.hex_digest(),
            None => String::new(),
        };

        let mut state = self.lock();
        for (other, hasher) in hashers {
            state.in_flight.insert((other, owner), InFlight { hasher, bytes });
        }
        Ok(digest)
    }

    /// Digest of `content` computed now, ignoring any kept state
    pub fn compute(&self, algorithm: HashAlgorithm, content: &mut ContentBuffer) -> Result<String> {
        let mut hashers = vec![(algorithm, algorithm.to_impl().create_hasher())];
        feed(content, &mut hashers)?;
        Ok(hashers
            .pop()
            .map(|(_, hasher)| hasher.hex_digest())
            .unwrap_or_default())
    }

    /// Drop every kept state of `owner`, e.g. after its content changed
    pub fn forget(&self, owner: FileId) {
        self.lock().in_flight.retain(|(_, id), _| *id != owner);
    }

    /// Number of kept states, for diagnostics
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    pub fn has_in_flight(&self, algorithm: HashAlgorithm, owner: FileId) -> bool {
        self.lock().in_flight.contains_key(&(algorithm, owner))
    }

    /// Look up `complete_filename` in the sidecars of `directory`, memoized
    pub fn load_from_sidecar(
        &self,
        storage: &dyn Storage,
        algorithm: HashAlgorithm,
        directory: &Path,
        complete_filename: &str,
        full_scan: bool,
    ) -> Result<Option<SidecarHit>> {
        let directory = normalize(directory);
        let key = (algorithm, directory.clone(), complete_filename.to_string());

        if let Some(hit) = self.lock().sidecars.get(&key) {
            return Ok(Some(hit.clone()));
        }

        let hit = sidecar::search(storage, &directory, complete_filename, algorithm, full_scan)?;
        if let Some(hit) = &hit {
            self.lock().sidecars.insert(key, hit.clone());
        }
        Ok(hit)
    }

    /// Forget cached sidecar lookups for `directory`
    pub fn invalidate_directory(&self, directory: &Path) {
        let directory = normalize(directory);
        let mut state = self.lock();
        let before = state.sidecars.len();
        state.sidecars.retain(|(_, dir, _), _| *dir != directory);
        let dropped = before - state.sidecars.len();
        if dropped > 0 {
            debug!("Dropped {dropped} cached sidecar lookup(s) for {}", directory.display());
        }
    }

    /// Number of cached sidecar lookups
    pub fn cached_sidecars(&self) -> usize {
        self.lock().sidecars.len()
    }

    /// Check `content` against the stored digests.
    ///
    /// Checks the sidecar-loaded digests if there are any, otherwise every
    /// stored one; stops after the first check unless `force`. Returns the
    /// algorithms checked.
    pub fn verify(
        &self,
        file: &str,
        hashes: &FileHashes,
        content: &mut ContentBuffer,
        force: bool,
    ) -> Result<Vec<HashAlgorithm>> {
        let order = hashes.verification_order();
        if order.is_empty() {
            return Err(IntegrityError::no_hash_available(file).into());
        }

        let mut checked = Vec::new();
        for algorithm in order {
            let Some(expected) = hashes.digest(algorithm) else {
                continue;
            };
            let actual = self.compute(algorithm, content)?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(IntegrityError::mismatch(file, algorithm.id(), expected, &actual).into());
            }
            checked.push(algorithm);
            if !force {
                break;
            }
        }
        Ok(checked)
    }
}

/// Read `content` once from the start, feeding every hasher
fn feed(content: &mut ContentBuffer, hashers: &mut [(HashAlgorithm, Box<dyn StreamingHasher>)]) -> Result<u64> {
    content.reset()?;
    let mut bytes = 0u64;
    for block in content.blocks() {
        let block = block?;
        bytes += block.len() as u64;
        for (_, hasher) in hashers.iter_mut() {
            hasher.update(&block);
        }
    }
    Ok(bytes)
}

impl fmt::Debug for HashEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("HashEngine")
            .field("in_flight", &state.in_flight.len())
            .field("sidecars", &state.sidecars.len())
            .finish()
    }
}
