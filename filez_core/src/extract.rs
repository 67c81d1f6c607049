//! Extraction pipeline steps
//!
//! `refresh` runs these over a file read from storage: name from the path,
//! storage metadata, then any digests already sitting in sidecar files.

use crate::file::FileEntry;
use crate::hashing::{HashAlgorithm, HashRecord};
use crate::pipeline::{Outcome, Params, Processor, ProcessorRegistry};
use crate::workspace::Environment;
use crate::Result;
use log::debug;

/// Register the built-in extractors
pub fn register(registry: &mut ProcessorRegistry<FileEntry, Environment>) {
    registry.register_instance(FilenameFromPath);
    registry.register_instance(FilesystemData);
    registry.register_instance(HashFiles);
}

/// Filename, extension and directory taken from the file's path
#[derive(Debug, Default, Clone, Copy)]
pub struct FilenameFromPath;

impl Processor<FileEntry, Environment> for FilenameFromPath {
    fn name(&self) -> &str {
        "filename_from_path"
    }

    fn process(&self, entry: &mut FileEntry, env: &Environment, _params: &Params) -> Result<Outcome> {
        let Some(path) = entry.path.clone() else {
            return Ok(None);
        };

        if entry.naming.is_empty()
            && let Some(filename) = env.storage.filename_of(&path)
        {
            entry.naming.set_complete_filename(&filename);
        }
        if entry.save_to.is_none() {
            entry.save_to = Some(env.storage.directory_of(&path));
        }
        Ok(Some(true))
    }
}

/// Metadata the storage backend knows about the file
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemData;

impl Processor<FileEntry, Environment> for FilesystemData {
    fn name(&self) -> &str {
        "filesystem_data"
    }

    fn process(&self, entry: &mut FileEntry, env: &Environment, _params: &Params) -> Result<Outcome> {
        match &entry.path {
            Some(path) if env.storage.is_file(path) => {
                entry.meta.size = Some(env.storage.size(path)?);
                Ok(Some(true))
            }
            _ => Ok(None),
        }
    }
}

/// Digests found in sidecar files next to the file.
///
/// Looks for every algorithm of the configured hasher pipeline, or the ones
/// in the `algorithms` parameter. Does nothing when searching for hashes is
/// disabled for the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashFiles;

impl HashFiles {
    fn algorithms(env: &Environment, params: &Params) -> Result<Vec<HashAlgorithm>> {
        let names = match params.string_list("algorithms")? {
            names if names.is_empty() => env.config.pipelines.hasher.clone(),
            names => names,
        };
        // hasher pipelines may hold processors that are not digests
        Ok(names.iter().filter_map(|name| name.parse().ok()).collect())
    }
}

impl Processor<FileEntry, Environment> for HashFiles {
    fn name(&self) -> &str {
        "hash_files"
    }

    fn process(&self, entry: &mut FileEntry, env: &Environment, params: &Params) -> Result<Outcome> {
        if !entry.options.allow_search_hashes {
            return Ok(None);
        }
        let Some(directory) = entry.directory() else {
            return Ok(None);
        };
        let filename = entry.complete_filename();
        if filename.is_empty() {
            return Ok(None);
        }

        let full_scan = params.bool_or("full_check", entry.options.full_check)?;
        let mut found = false;
        for algorithm in Self::algorithms(env, params)? {
            if entry.hashes.contains(algorithm) {
                continue;
            }
            if let Some(hit) =
                env.hashes
                    .load_from_sidecar(&*env.storage, algorithm, &directory, &filename, full_scan)?
            {
                entry.hashes.insert(HashRecord::loaded(algorithm, &hit, &filename));
                found = true;
            }
        }
        debug!("Sidecar search for '{filename}' found hashes: {found}");
        Ok(Some(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::storage::{LocalStorage, SaveMode, Storage};
    use crate::workspace::Workspace;
    use std::sync::Arc;
    use tempfile::TempDir;

    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    fn workspace() -> Workspace {
        Workspace::builder()
            .storage(Arc::new(LocalStorage::new()))
            .config(EngineConfig::test())
            .build()
            .unwrap()
    }

    #[test]
    fn test_filename_and_size_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        LocalStorage::new().save(&path, b"hello", SaveMode::Truncate).unwrap();

        let workspace = workspace();
        let mut entry = FileEntry::default();
        entry.path = Some(path);

        FilenameFromPath.process(&mut entry, workspace.env(), &Params::new()).unwrap();
        FilesystemData.process(&mut entry, workspace.env(), &Params::new()).unwrap();

        assert_eq!(entry.naming.filename(), "notes");
        assert_eq!(entry.naming.extension(), ".txt");
        assert_eq!(entry.save_to.as_deref(), Some(temp_dir.path()));
        assert_eq!(entry.meta.size, Some(5));
    }

    #[test]
    fn test_no_path_no_opinion() {
        let workspace = workspace();
        let mut entry = FileEntry::default();
        assert_eq!(
            FilenameFromPath.process(&mut entry, workspace.env(), &Params::new()).unwrap(),
            None
        );
        assert_eq!(
            FilesystemData.process(&mut entry, workspace.env(), &Params::new()).unwrap(),
            None
        );
    }

    #[test]
    fn test_hash_files_loads_checksum_entry() {
        let temp_dir = TempDir::new().unwrap();
        LocalStorage::new()
            .save(
                &temp_dir.path().join("CHECKSUM.md5"),
                format!("{EMPTY_MD5}  empty.txt\n").as_bytes(),
                SaveMode::Truncate,
            )
            .unwrap();

        let workspace = workspace();
        let mut entry = FileEntry::default();
        entry.save_to = Some(temp_dir.path().to_path_buf());
        entry.naming.set_complete_filename("empty.txt");

        let outcome = HashFiles.process(&mut entry, workspace.env(), &Params::new()).unwrap();

        assert_eq!(outcome, Some(true));
        assert_eq!(entry.hashes.digest(HashAlgorithm::Md5), Some(EMPTY_MD5));
        assert!(entry.hashes.get(HashAlgorithm::Md5).unwrap().hash_file.from_checksum);
        assert!(!entry.hashes.contains(HashAlgorithm::Sha256));
    }

    #[test]
    fn test_hash_files_respects_search_option() {
        let workspace = workspace();
        let mut entry = FileEntry::default();
        entry.options.allow_search_hashes = false;
        entry.save_to = Some("/nowhere".into());
        entry.naming.set_complete_filename("empty.txt");

        assert_eq!(HashFiles.process(&mut entry, workspace.env(), &Params::new()).unwrap(), None);
    }
}
