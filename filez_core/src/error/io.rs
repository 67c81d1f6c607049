//! Storage backend failures

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A storage operation failed, usually on a known path
#[derive(Error, Debug)]
#[error("{}", self.describe())]
pub struct IoError {
    pub kind: IoErrorKind,
    pub path: Option<PathBuf>,
    #[source]
    pub source: Option<io::Error>,
}

/// What went wrong, as far as callers care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoErrorKind {
    FileNotFound,
    PermissionDenied,
    /// The target of a create-only save exists
    AlreadyExists,
    Other,
}

impl From<io::ErrorKind> for IoErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => Self::FileNotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            _ => Self::Other,
        }
    }
}

impl IoError {
    /// No stored file at `path`
    pub fn file_not_found(path: &Path) -> Self {
        Self {
            kind: IoErrorKind::FileNotFound,
            path: Some(path.to_path_buf()),
            source: None,
        }
    }

    /// `source` happened while touching `path`
    pub fn at(path: &Path, source: io::Error) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            ..Self::from_std(source)
        }
    }

    pub fn from_std(source: io::Error) -> Self {
        Self {
            kind: source.kind().into(),
            path: None,
            source: Some(source),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == IoErrorKind::FileNotFound
    }

    fn describe(&self) -> String {
        let what = match self.kind {
            IoErrorKind::FileNotFound => "File not found",
            IoErrorKind::PermissionDenied => "Permission denied",
            IoErrorKind::AlreadyExists => "File already exists",
            IoErrorKind::Other => "I/O error",
        };
        match (&self.path, &self.source) {
            (Some(path), Some(source)) if self.kind == IoErrorKind::Other => {
                format!("{what} on {}: {source}", path.display())
            }
            (Some(path), _) => format!("{what}: {}", path.display()),
            (None, Some(source)) if self.kind == IoErrorKind::Other => format!("{what}: {source}"),
            (None, _) => what.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found() {
        let error = IoError::file_not_found(Path::new("/photos/photo.jpg"));

        assert!(error.is_not_found());
        assert!(error.source.is_none());
        assert_eq!(error.to_string(), "File not found: /photos/photo.jpg");
    }

    #[test]
    fn test_kind_follows_std_error() {
        let error = IoError::at(
            Path::new("/root/protected.jpg"),
            io::Error::new(io::ErrorKind::PermissionDenied, "Access denied"),
        );
        assert_eq!(error.kind, IoErrorKind::PermissionDenied);
        assert_eq!(error.to_string(), "Permission denied: /root/protected.jpg");

        let error = IoError::from_std(io::Error::new(io::ErrorKind::AlreadyExists, "taken"));
        assert_eq!(error.kind, IoErrorKind::AlreadyExists);
        assert!(error.path.is_none());
    }

    #[test]
    fn test_other_errors_keep_their_message() {
        let error = IoError::at(Path::new("/a/b.txt"), io::Error::other("disk on fire"));

        assert_eq!(error.kind, IoErrorKind::Other);
        assert_eq!(error.to_string(), "I/O error on /a/b.txt: disk on fire");
        assert_eq!(IoError::from_std(io::Error::other("x")).to_string(), "I/O error: x");
    }
}
