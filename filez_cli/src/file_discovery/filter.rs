//! Include/exclude filtering with compiled glob sets

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

use super::{DiscoveryError, Result};

/// Compile `patterns` into one set, `None` when there are none
fn compile(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| DiscoveryError::InvalidPattern(format!("{pattern}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| DiscoveryError::InvalidPattern(e.to_string()))
}

/// File filter managing include and exclude patterns
#[derive(Debug)]
pub struct FileFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl FileFilter {
    pub fn new(include_patterns: &[String], exclude_patterns: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile(include_patterns)?,
            exclude: compile(exclude_patterns)?,
        })
    }

    /// Excludes win over includes; no includes means everything
    pub fn should_include(&self, path: &Path) -> bool {
        if self.exclude.as_ref().is_some_and(|exclude| exclude.is_match(path)) {
            return false;
        }
        self.include.as_ref().is_none_or(|include| include.is_match(path))
    }
}
