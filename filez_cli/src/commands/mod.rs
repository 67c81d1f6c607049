//! One module per file command
//!
//! Each command takes its clap arguments plus the loaded configuration and
//! returns the exit code to finish with.

pub mod compare;
pub mod hash;
pub mod list;
pub mod place;
pub mod verify;

use crate::config::AppConfig;
use crate::output::OutputFormat;
use crate::paths;
use anyhow::{Context, Result};
use filez_core::{EngineConfig, HashAlgorithm, LocalStorage, Workspace};
use std::sync::Arc;

/// What every command needs besides its own arguments
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: AppConfig,
    pub format: OutputFormat,
    pub use_color: bool,
}

/// Workspace over local disk, spilling piped content into the cache directory
pub fn build_workspace(engine: EngineConfig) -> Result<Workspace> {
    let storage = LocalStorage::with_temp_directory(paths::get_cache_dir());
    Workspace::builder()
        .storage(Arc::new(storage))
        .config(engine)
        .build()
        .context("Failed to set up workspace")
}

/// clap value parser for algorithm names
pub fn parse_algorithm(value: &str) -> filez_core::Result<HashAlgorithm> {
    value.parse()
}
