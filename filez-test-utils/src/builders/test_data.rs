//! Test data builders for creating test scenarios

use crate::mocks::{BundleCodec, MemoryStorage};
use filez_core::error::IoError;
use filez_core::hashing::sidecar;
use filez_core::{EngineConfig, HashAlgorithm, Result, Workspace};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builder for files on local disk
pub struct TestFileBuilder {
    base_dir: PathBuf,
    generated_files: Vec<PathBuf>,
}

impl TestFileBuilder {
    /// Create a new test file builder
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            generated_files: Vec::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Write a file with `content` under the base directory
    pub fn file(&mut self, name: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
        let file_path = self.base_dir.join(name);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| IoError::at(parent, e))?;
        }
        std::fs::write(&file_path, content).map_err(|e| IoError::at(&file_path, e))?;

        self.generated_files.push(file_path.clone());
        Ok(file_path)
    }

    /// Generate a deterministic file with specific size and seed
    pub fn deterministic_file(&mut self, name: &str, size: usize, seed: u64) -> Result<PathBuf> {
        self.file(name, deterministic_bytes(size, seed))
    }

    /// Write the dedicated sidecar of `name` for its current content
    pub fn sidecar_for(&mut self, name: &str, algorithm: HashAlgorithm) -> Result<PathBuf> {
        let target = self.base_dir.join(name);
        let content = std::fs::read(&target).map_err(|e| IoError::at(&target, e))?;
        let digest = algorithm.hash_bytes(&content);
        self.file(
            &sidecar::dedicated_name(name, algorithm),
            format!("{}\n", sidecar::entry(&digest, name)),
        )
    }

    /// Write an md5sum-style listing, one `digest  name` line per entry
    pub fn checksum_file(&mut self, name: &str, entries: &[(&str, &str)]) -> Result<PathBuf> {
        let listing: String = entries
            .iter()
            .map(|(digest, filename)| format!("{digest}  {filename}\n"))
            .collect();
        self.file(name, listing)
    }

    /// Clean up all generated files
    pub fn cleanup(&mut self) {
        for file_path in &self.generated_files {
            let _ = std::fs::remove_file(file_path);
        }
        self.generated_files.clear();
    }
}

/// Pseudo-random bytes that are stable across runs
pub fn deterministic_bytes(size: usize, seed: u64) -> Vec<u8> {
    let mut current = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    (0..size)
        .map(|_| {
            current = current.wrapping_mul(1664525).wrapping_add(1013904223);
            (current >> 24) as u8
        })
        .collect()
}

/// Workspace running entirely in memory
pub struct WorkspaceFixture {
    pub storage: Arc<MemoryStorage>,
    pub workspace: Workspace,
}

impl WorkspaceFixture {
    /// Empty storage with the test configuration
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::new(), EngineConfig::test())
    }

    /// Workspace over `storage` with the bundle codec installed
    pub fn with_storage(storage: MemoryStorage, config: EngineConfig) -> Self {
        let storage = Arc::new(storage);
        let workspace = Workspace::builder()
            .storage(storage.clone())
            .config(config)
            .codec(Arc::new(BundleCodec))
            .build()
            .unwrap_or_else(|e| panic!("invalid test workspace: {e}"));
        Self { storage, workspace }
    }
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_bytes_are_stable() {
        assert_eq!(deterministic_bytes(64, 7), deterministic_bytes(64, 7));
        assert_ne!(deterministic_bytes(64, 7), deterministic_bytes(64, 8));
    }

    #[test]
    fn test_fixture_opens_memory_files() {
        let fixture = WorkspaceFixture::new();
        fixture.storage.add_file("/data/a.txt", "abc");

        let file = fixture.workspace.open("/data/a.txt").unwrap();
        assert_eq!(file.complete_filename(), "a.txt");
        assert_eq!(file.meta().size, Some(3));
    }
}
