//! Directory walker for file discovery
//!
//! Streams matching files with walkdir in file-name order, so output is
//! stable across runs.

use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::{
    DiscoveredFile, DiscoveryError, Result,
    defaults::{extensions_to_patterns, generated_extensions},
    filter::FileFilter,
};

/// Options for file discovery
#[derive(Debug, Clone)]
pub struct FileDiscoveryOptions {
    /// Patterns to include (glob patterns)
    pub include_patterns: Vec<String>,
    /// Patterns to exclude (glob patterns, override includes)
    pub exclude_patterns: Vec<String>,
    /// Skip sidecars, backups and cache files
    pub skip_generated: bool,
    /// Process directories recursively
    pub recursive: bool,
    /// Follow symbolic links
    pub follow_links: bool,
}

impl Default for FileDiscoveryOptions {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            skip_generated: true,
            recursive: false,
            follow_links: false,
        }
    }
}

impl FileDiscoveryOptions {
    /// Create new options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_skip_generated(mut self, skip: bool) -> Self {
        self.skip_generated = skip;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

/// File discovery iterator for streaming file enumeration
pub struct FileDiscovery {
    walker: walkdir::IntoIter,
    filter: FileFilter,
}

impl FileDiscovery {
    /// Create a new file discovery iterator
    pub fn new(path: &Path, options: FileDiscoveryOptions) -> Result<Self> {
        if !path.exists() {
            return Err(DiscoveryError::PathNotFound(path.to_path_buf()));
        }

        let mut exclude_patterns = options.exclude_patterns;
        if options.skip_generated {
            exclude_patterns.extend(extensions_to_patterns(&generated_extensions()));
        }
        let filter = FileFilter::new(&options.include_patterns, &exclude_patterns)?;

        let mut walker = WalkDir::new(path)
            .follow_links(options.follow_links)
            .sort_by_file_name();
        if !options.recursive {
            walker = walker.max_depth(1);
        }

        Ok(Self {
            walker: walker.into_iter(),
            filter,
        })
    }

    fn should_include_entry(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_file() && self.filter.should_include(entry.path())
    }
}

impl Iterator for FileDiscovery {
    type Item = Result<DiscoveredFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if !self.should_include_entry(&entry) {
                        continue;
                    }
                    match entry.metadata() {
                        Ok(metadata) => {
                            return Some(Ok(DiscoveredFile {
                                path: entry.into_path(),
                                size: metadata.len(),
                            }));
                        }
                        Err(e) => {
                            log::warn!("Failed to read metadata for {:?}: {}", entry.path(), e);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Walk error: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_directory() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::write(base.join("b.jpg"), b"test").unwrap();
        fs::write(base.join("a.jpg"), b"test").unwrap();
        fs::write(base.join("a.jpg.md5"), b"test").unwrap();
        fs::write(base.join("CHECKSUM.SHA256"), b"test").unwrap();
        fs::write(base.join("notes.txt.bak"), b"test").unwrap();

        let subdir = base.join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("nested.jpg"), b"test").unwrap();

        dir
    }

    fn discover(dir: &Path, options: FileDiscoveryOptions) -> Vec<String> {
        FileDiscovery::new(dir, options)
            .unwrap()
            .map(|file| {
                file.unwrap()
                    .path
                    .strip_prefix(dir)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_generated_files_are_skipped() {
        let dir = create_test_directory();
        assert_eq!(discover(dir.path(), FileDiscoveryOptions::new()), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_generated_files_on_request() {
        let dir = create_test_directory();
        let files = discover(dir.path(), FileDiscoveryOptions::new().with_skip_generated(false));
        assert!(files.contains(&"a.jpg.md5".to_string()));
        assert!(files.contains(&"CHECKSUM.SHA256".to_string()));
    }

    #[test]
    fn test_recursive_with_excludes() {
        let dir = create_test_directory();
        let options = FileDiscoveryOptions::new()
            .with_recursive(true)
            .with_exclude_patterns(vec!["**/b.jpg".to_string()]);

        assert_eq!(discover(dir.path(), options), vec!["a.jpg", "subdir/nested.jpg"]);
    }

    #[test]
    fn test_missing_directory() {
        assert!(matches!(
            FileDiscovery::new(Path::new("/no/such/dir"), FileDiscoveryOptions::new()),
            Err(DiscoveryError::PathNotFound(_))
        ));
    }
}
