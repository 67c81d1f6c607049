//! Hasher pipeline steps

use super::{HashAlgorithm, HashRecord};
use crate::error::ContentError;
use crate::file::FileEntry;
use crate::pipeline::{Outcome, Params, Processor};
use crate::workspace::Environment;
use crate::Result;

/// Fill in one digest of a file.
///
/// An existing record is left alone. With `try_loading_from_file` the
/// sidecars next to the file are searched first; otherwise, or when none has
/// an entry, the digest is computed from content. The `pending` parameter
/// lists the algorithms the rest of the pipeline will ask for, so a single
/// content pass can serve all of them.
#[derive(Debug, Clone, Copy)]
pub struct HashProcessor {
    algorithm: HashAlgorithm,
}

impl HashProcessor {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn pending(&self, entry: &FileEntry, params: &Params) -> Result<Vec<HashAlgorithm>> {
        let mut pending = Vec::new();
        for name in params.string_list("pending")? {
            let algorithm: HashAlgorithm = name.parse()?;
            if algorithm != self.algorithm && !entry.hashes.contains(algorithm) {
                pending.push(algorithm);
            }
        }
        Ok(pending)
    }
}

impl Processor<FileEntry, Environment> for HashProcessor {
    fn name(&self) -> &str {
        self.algorithm.id()
    }

    fn process(&self, entry: &mut FileEntry, env: &Environment, params: &Params) -> Result<Outcome> {
        let algorithm = self.algorithm;
        if entry.hashes.contains(algorithm) {
            return Ok(Some(true));
        }

        let filename = entry.complete_filename();
        if params.bool_or("try_loading_from_file", false)?
            && let Some(directory) = entry.directory()
        {
            let full_scan = params.bool_or("full_check", entry.options.full_check)?;
            if let Some(hit) =
                env.hashes
                    .load_from_sidecar(&*env.storage, algorithm, &directory, &filename, full_scan)?
            {
                entry.hashes.insert(HashRecord::loaded(algorithm, &hit, &filename));
                return Ok(Some(true));
            }
        }

        let pending = self.pending(entry, params)?;
        let owner = entry.id;
        let display = entry.display_name();
        let content = entry
            .content
            .as_mut()
            .ok_or_else(|| ContentError::missing(&display))?;

        let digest = env.hashes.digest(algorithm, owner, content, &pending)?;
        entry.hashes.insert(HashRecord::computed(algorithm, digest, &filename));
        Ok(Some(true))
    }
}
