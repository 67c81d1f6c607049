//! Engine configuration
//!
//! Everything here is plain serde data so that front-ends can layer it from
//! files and environment variables.

use crate::error::ValidationError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default block size used when iterating content
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bytes per block when iterating content
    pub block_size: usize,
    /// Where non-seekable content gets captured
    pub cache: CacheConfig,
    /// Directory for temp cache files (storage default when unset)
    pub temp_directory: Option<PathBuf>,
    /// Default options applied to every new file
    pub options: FileOptions,
    /// Processor names for each pipeline
    pub pipelines: PipelinesConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            cache: CacheConfig::default(),
            temp_directory: None,
            options: FileOptions::default(),
            pipelines: PipelinesConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a test configuration
    pub fn test() -> Self {
        Self {
            block_size: 4, // tiny blocks so tests cross block boundaries
            ..Self::default()
        }
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(ValidationError::invalid_parameter("block_size", "must be positive").into());
        }
        Ok(())
    }
}

/// Content caching policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Capture into memory (preferred when both targets are enabled)
    pub cache_in_memory: bool,
    /// Capture into a temp file through the storage backend
    pub cache_in_file: bool,
    /// Cache even when the source is seekable
    pub force: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_in_memory: true,
            cache_in_file: false,
            force: false,
        }
    }
}

/// Per-file behaviour switches consulted by `save`, hashing and pipelines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOptions {
    pub allow_overwrite: bool,
    pub allow_update: bool,
    pub allow_rename: bool,
    pub allow_extension_change: bool,
    pub create_backup: bool,
    pub save_hashes: bool,
    pub allow_search_hashes: bool,
    /// Scan every `*.<algo>` file in a directory when looking for sidecars
    pub full_check: bool,
    /// Raise the first processor error instead of collecting it
    pub pipeline_raises_exception: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            allow_overwrite: false,
            allow_update: true,
            allow_rename: true,
            allow_extension_change: true,
            create_backup: true,
            save_hashes: true,
            allow_search_hashes: true,
            full_check: true,
            pipeline_raises_exception: false,
        }
    }
}

/// Processor names making up each pipeline, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelinesConfig {
    pub extract: Vec<String>,
    pub hasher: Vec<String>,
    pub compare: Vec<String>,
    pub rename: Vec<String>,
    pub unpack: Vec<String>,
}

impl Default for PipelinesConfig {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|name| name.to_string()).collect()
        }

        Self {
            extract: names(&["filename_from_path", "filesystem_data", "hash_files"]),
            hasher: names(&["md5", "sha256"]),
            compare: names(&["size", "binary", "hash", "data"]),
            rename: names(&["windows"]),
            unpack: names(&["package"]),
        }
    }
}
