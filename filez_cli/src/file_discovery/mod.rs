//! File discovery for commands taking files or directories
//!
//! Directories are walked and filtered by include and exclude glob
//! patterns. Sidecar files and backups are skipped by default so hashing a
//! directory does not hash its own checksum files.

mod defaults;
mod filter;
mod walker;

pub use walker::{FileDiscovery, FileDiscoveryOptions};

use std::path::PathBuf;

/// Result of file discovery
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path to the discovered file
    pub path: PathBuf,
    /// Size of the file in bytes
    pub size: u64,
}

/// Error type for file discovery operations
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Result type for file discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Expand command-line inputs: files pass through, directories are walked
pub fn collect_paths(inputs: &[PathBuf], options: &FileDiscoveryOptions) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_file() {
            paths.push(input.clone());
        } else if input.is_dir() {
            for file in FileDiscovery::new(input, options.clone())? {
                paths.push(file?.path);
            }
        } else {
            return Err(DiscoveryError::PathNotFound(input.clone()));
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_mixes_files_and_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("a.txt.md5"), b"x a.txt").unwrap();
        let single = dir.path().join("single.bin");
        fs::write(&single, b"s").unwrap();

        let paths = collect_paths(
            &[single.clone(), dir.path().to_path_buf()],
            &FileDiscoveryOptions::new(),
        )
        .unwrap();

        assert_eq!(paths[0], single);
        assert!(paths.contains(&dir.path().join("a.txt")));
        assert!(!paths.contains(&dir.path().join("a.txt.md5")));
    }

    #[test]
    fn test_collect_missing_input() {
        let result = collect_paths(&[PathBuf::from("/no/such/input")], &FileDiscoveryOptions::new());
        assert!(matches!(result, Err(DiscoveryError::PathNotFound(_))));
    }
}
