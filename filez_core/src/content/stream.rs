//! Byte sources a content buffer can read from

use crate::storage::Storage;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A readable byte source that knows whether it can be rewound
pub trait ContentStream: Read + Send {
    /// Whether `seek_start` is supported
    fn seekable(&self) -> bool;

    /// Move back to the first byte
    fn seek_start(&mut self) -> io::Result<()>;
}

impl ContentStream for std::fs::File {
    fn seekable(&self) -> bool {
        true
    }

    fn seek_start(&mut self) -> io::Result<()> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }
}

impl<T: AsRef<[u8]> + Send> ContentStream for Cursor<T> {
    fn seekable(&self) -> bool {
        true
    }

    fn seek_start(&mut self) -> io::Result<()> {
        self.set_position(0);
        Ok(())
    }
}

/// Forward-only wrapper for pipes, sockets and other one-shot readers
pub struct NonSeekable<R>(pub R);

impl<R: Read> Read for NonSeekable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read + Send> ContentStream for NonSeekable<R> {
    fn seekable(&self) -> bool {
        false
    }

    fn seek_start(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stream cannot be rewound",
        ))
    }
}

/// A stored file that is opened on first read
pub struct LazyStream {
    storage: Arc<dyn Storage>,
    path: PathBuf,
    inner: Option<Box<dyn ContentStream>>,
}

impl LazyStream {
    pub fn new(storage: Arc<dyn Storage>, path: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            path: path.into(),
            inner: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn inner(&mut self) -> io::Result<&mut Box<dyn ContentStream>> {
        match &mut self.inner {
            Some(inner) => Ok(inner),
            slot => {
                let opened = self.storage.open(&self.path).map_err(io::Error::other)?;
                Ok(slot.insert(opened))
            }
        }
    }
}

impl fmt::Debug for LazyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyStream")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Read for LazyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner()?.read(buf)
    }
}

impl ContentStream for LazyStream {
    fn seekable(&self) -> bool {
        // stored files are seekable until proven otherwise
        self.inner.as_ref().is_none_or(|inner| inner.seekable())
    }

    fn seek_start(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Some(inner) => inner.seek_start(),
            None => Ok(()),
        }
    }
}
