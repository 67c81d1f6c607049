//! Storage backends
//!
//! Every component reaches the filesystem through the [`Storage`] trait so
//! the engine runs unchanged over local disk or the in-memory backend used
//! in tests.

use crate::content::ContentStream;
use crate::error::ValidationError;
use crate::Result;
use globset::{Glob, GlobMatcher};
use std::fmt::Debug;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

mod local;

pub use local::LocalStorage;

/// How `save` treats an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Truncate,
    Append,
}

/// Lines read from a stored text file
pub type Lines = Box<dyn Iterator<Item = Result<String>> + Send>;

/// Path and I/O primitives consumed by the engine
pub trait Storage: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Open a file for reading
    fn open(&self, path: &Path) -> Result<Box<dyn ContentStream>>;

    /// Write `data` to `path`, creating parent directories as needed
    fn save(&self, path: &Path, data: &[u8], mode: SaveMode) -> Result<()>;

    /// Create or truncate `path` and keep it open for writing.
    ///
    /// Bytes written reach the file no later than the writer's `flush`.
    fn create_writer(&self, path: &Path) -> Result<Box<dyn Write + Send>>;

    fn delete(&self, path: &Path) -> Result<()>;

    fn copy(&self, from: &Path, to: &Path) -> Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Files directly inside `directory` whose name matches the glob `pattern`
    fn list_files(&self, directory: &Path, pattern: &str) -> Result<Vec<PathBuf>>;

    fn read_lines(&self, path: &Path) -> Result<Lines>;

    fn size(&self, path: &Path) -> Result<u64>;

    fn temp_directory(&self) -> PathBuf;

    fn join(&self, directory: &Path, name: &str) -> PathBuf {
        directory.join(name)
    }

    /// Lexically normalise a path (`.` dropped, `..` folded)
    fn sanitize(&self, path: &Path) -> PathBuf {
        normalize(path)
    }

    fn directory_of(&self, path: &Path) -> PathBuf {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    }

    fn filename_of(&self, path: &Path) -> Option<String> {
        path.file_name().map(|name| name.to_string_lossy().into_owned())
    }

    /// Copy `path` to `<path>.bak`, returning the backup location
    fn backup(&self, path: &Path) -> Result<PathBuf> {
        let mut backup = path.as_os_str().to_owned();
        backup.push(".bak");
        let backup = PathBuf::from(backup);
        self.copy(path, &backup)?;
        Ok(backup)
    }
}

/// Lexical path normalisation shared by the backends
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Compile a filename glob for `list_files`
pub fn filename_matcher(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| ValidationError::invalid_parameter("pattern", &e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c.txt")), PathBuf::from("/a/c.txt"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_filename_matcher() {
        let matcher = filename_matcher("*.md5").unwrap();
        assert!(matcher.is_match("CHECKSUM.md5"));
        assert!(!matcher.is_match("photo.jpg"));
        assert!(filename_matcher("[").is_err());
    }
}
