//! Replayable, block-iterable content
//!
//! A [`ContentBuffer`] wraps one byte source. Seekable sources are simply
//! rewound between passes. Non-seekable sources (or any source when caching
//! is forced) are captured while they are read for the first time, either
//! into memory or into a temp file on the storage backend, and every later
//! pass replays that capture from the first byte.

use super::stream::{ContentStream, NonSeekable};
use crate::config::CacheConfig;
use crate::error::{ContentError, IoError, ValidationError};
use crate::file::FileId;
use crate::naming::{NameRegistry, renamer::unique_filename};
use crate::storage::Storage;
use crate::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{debug, warn};
use std::fmt;
use std::io::{self, Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Where content comes from
pub enum ContentSource {
    Text(String),
    Bytes(Vec<u8>),
    Stream {
        stream: Box<dyn ContentStream>,
        binary: bool,
    },
}

impl From<&str> for ContentSource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ContentSource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for ContentSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for ContentSource {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Temp-file cache location for content that must be captured on disk
#[derive(Clone)]
pub struct SpillTarget {
    storage: Arc<dyn Storage>,
    directory: PathBuf,
    names: Option<NameRegistry>,
    owner: FileId,
}

impl SpillTarget {
    /// Spill into the storage's temp directory
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let directory = storage.temp_directory();
        Self {
            storage,
            directory,
            names: None,
            owner: FileId::next(),
        }
    }

    pub fn in_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Reserve temp filenames in `names` so no other file object can claim them
    pub fn with_names(mut self, names: NameRegistry) -> Self {
        self.names = Some(names);
        self
    }

    fn allocate(&self) -> Result<PathBuf> {
        let reserved = self
            .names
            .as_ref()
            .map(|names| names.reserved_names(&self.directory))
            .unwrap_or_default();
        let filename = unique_filename(&*self.storage, &self.directory, ".cache", &reserved)?;
        if let Some(names) = &self.names {
            names.claim(&self.directory, &filename, self.owner)?;
        }
        Ok(self.storage.join(&self.directory, &filename))
    }

    fn discard(&self, path: &PathBuf) {
        if self.storage.exists(path)
            && let Err(e) = self.storage.delete(path)
        {
            warn!("Failed to remove cache file {}: {e}", path.display());
        }
        if let (Some(names), Some(filename)) = (&self.names, self.storage.filename_of(path)) {
            names.release(&self.directory, &filename, self.owner);
        }
    }
}

/// Capture in progress during the first pass
enum Capture {
    Idle,
    Memory(Vec<u8>),
    /// The writer stays open from the first block until the capture ends
    File {
        path: PathBuf,
        writer: Box<dyn Write + Send>,
    },
}

impl Capture {
    /// Flush and close a file capture, returning its path
    fn finish_file(self) -> Result<Option<PathBuf>> {
        match self {
            Self::File { path, mut writer } => {
                writer.flush().map_err(|e| IoError::at(&path, e))?;
                Ok(Some(path))
            }
            _ => Ok(None),
        }
    }
}

/// Completed capture
enum Replay {
    None,
    Memory(Arc<[u8]>),
    File(PathBuf),
}

/// Block-iterable content with optional capture of non-seekable sources
pub struct ContentBuffer {
    stream: Box<dyn ContentStream>,
    binary: bool,
    block_size: usize,
    policy: CacheConfig,
    caching: bool,
    capture: Capture,
    replay: Replay,
    spill: Option<SpillTarget>,
    stale: Vec<PathBuf>,
    consumed: u64,
    iterating: bool,
    closed: bool,
}

impl ContentBuffer {
    /// Create a buffer over `source`
    pub fn new(source: ContentSource, block_size: usize, policy: CacheConfig) -> Result<Self> {
        if block_size == 0 {
            return Err(ValidationError::invalid_parameter("block_size", "must be positive").into());
        }

        let (stream, binary): (Box<dyn ContentStream>, bool) = match source {
            ContentSource::Text(text) if text.is_empty() => return Err(ContentError::Empty.into()),
            ContentSource::Bytes(bytes) if bytes.is_empty() => {
                return Err(ContentError::Empty.into());
            }
            ContentSource::Text(text) => (Box::new(Cursor::new(text.into_bytes())), false),
            ContentSource::Bytes(bytes) => (Box::new(Cursor::new(bytes)), true),
            ContentSource::Stream { stream, binary } => (stream, binary),
        };

        let caching = !stream.seekable() || policy.force;

        Ok(Self {
            stream,
            binary,
            block_size,
            policy,
            caching,
            capture: Capture::Idle,
            replay: Replay::None,
            spill: None,
            stale: Vec::new(),
            consumed: 0,
            iterating: false,
            closed: false,
        })
    }

    /// Buffer over text with default caching
    pub fn from_text(text: impl Into<String>, block_size: usize) -> Result<Self> {
        Self::new(ContentSource::Text(text.into()), block_size, CacheConfig::default())
    }

    /// Buffer over bytes with default caching
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, block_size: usize) -> Result<Self> {
        Self::new(ContentSource::Bytes(bytes.into()), block_size, CacheConfig::default())
    }

    /// Buffer over a forward-only reader
    pub fn from_reader<R: Read + Send + 'static>(
        reader: R,
        binary: bool,
        block_size: usize,
        policy: CacheConfig,
    ) -> Result<Self> {
        Self::new(
            ContentSource::Stream {
                stream: Box::new(NonSeekable(reader)),
                binary,
            },
            block_size,
            policy,
        )
    }

    /// Allow capturing into temp files
    pub fn with_spill(mut self, spill: SpillTarget) -> Self {
        self.spill = Some(spill);
        self
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn set_block_size(&mut self, block_size: usize) -> Result<()> {
        if block_size == 0 {
            return Err(ValidationError::invalid_parameter("block_size", "must be positive").into());
        }
        self.block_size = block_size;
        Ok(())
    }

    /// Whether this buffer captures its source on the first pass
    pub fn is_caching(&self) -> bool {
        self.caching
    }

    /// Whether the full content has been captured
    pub fn is_cached(&self) -> bool {
        !matches!(self.replay, Replay::None)
    }

    pub fn is_iterating(&self) -> bool {
        self.iterating
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Next block in source order, `None` once the source is exhausted.
    ///
    /// Reaching the end finishes the capture (if any) and rewinds, so the
    /// following call starts a new pass from the first byte.
    pub fn next_block(&mut self) -> Result<Option<Vec<u8>>> {
        let block = self.pull(self.block_size)?;
        self.iterating = block.is_some();
        Ok(block)
    }

    /// Iterator over the remaining blocks of the current pass
    pub fn blocks(&mut self) -> Blocks<'_> {
        Blocks {
            buffer: self,
            done: false,
        }
    }

    /// Read up to `size` bytes, or everything when `size` is `None`.
    ///
    /// Not allowed while block iteration is in progress.
    pub fn read(&mut self, size: Option<usize>) -> Result<Vec<u8>> {
        if self.iterating {
            return Err(ContentError::IterationInProgress.into());
        }

        match size {
            None => self.full_content(),
            Some(0) => Ok(Vec::new()),
            Some(size) => Ok(self.pull(size)?.unwrap_or_default()),
        }
    }

    /// The complete payload, draining (and capturing) the source if needed
    pub fn full_content(&mut self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        if self.iterating || self.consumed > 0 {
            self.reset()?;
        }

        if let Replay::Memory(bytes) = &self.replay {
            return Ok(bytes.to_vec());
        }

        let mut content = Vec::new();
        while let Some(block) = self.pull(self.block_size)? {
            content.extend_from_slice(&block);
        }
        Ok(content)
    }

    /// The complete payload decoded as UTF-8
    pub fn full_text(&mut self) -> Result<String> {
        String::from_utf8(self.full_content()?).map_err(|_| ContentError::NotText.into())
    }

    /// The complete payload, base64 encoded
    pub fn as_base64(&mut self) -> Result<String> {
        Ok(STANDARD.encode(self.full_content()?))
    }

    /// A reader positioned at the first byte.
    ///
    /// Memory-cached buffers hand out an independent view over the capture;
    /// everything else hands out the live stream after rewinding it.
    pub fn as_reader(&mut self) -> Result<ContentReader<'_>> {
        self.ensure_open()?;

        if self.caching && !self.is_cached() {
            self.reset()?;
            while self.pull(self.block_size)?.is_some() {}
        } else {
            self.reset()?;
        }

        if let Replay::Memory(bytes) = &self.replay {
            return Ok(ContentReader::Memory(Cursor::new(bytes.clone())));
        }
        Ok(ContentReader::Live(&mut *self.stream))
    }

    /// Start the next pass from the first byte.
    ///
    /// A capture interrupted half-way is dropped. For seekable sources the
    /// source is rewound; for forward-only sources the bytes captured so far
    /// are replayed ahead of the unread rest, which is captured again.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.iterating = false;

        if self.consumed == 0 {
            return Ok(());
        }

        if self.caching && !self.is_cached() {
            let partial = std::mem::replace(&mut self.capture, Capture::Idle);
            if self.stream.seekable() {
                if let Capture::File { path, .. } = partial {
                    self.discard(path);
                }
                self.stream.seek_start()?;
            } else {
                let head: Box<dyn ContentStream> = match partial {
                    Capture::Idle => Box::new(Cursor::new(Vec::new())),
                    Capture::Memory(bytes) => Box::new(Cursor::new(bytes)),
                    file => match file.finish_file()? {
                        Some(path) => {
                            let stream = self.spill_target()?.storage.open(&path)?;
                            self.stale.push(path);
                            stream
                        }
                        None => Box::new(Cursor::new(Vec::new())),
                    },
                };
                let tail = std::mem::replace(&mut self.stream, Box::new(Cursor::new(Vec::new())));
                self.stream = Box::new(NonSeekable(head.chain(tail)));
            }
            debug!("Discarded partial content capture");
        } else {
            self.stream.seek_start()?;
        }

        self.consumed = 0;
        Ok(())
    }

    /// Release the source and remove any temp cache file
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.stream = Box::new(Cursor::new(Vec::new()));
        self.cleanup();
        self.replay = Replay::None;
        self.iterating = false;
        self.closed = true;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(ContentError::Closed.into());
        }
        Ok(())
    }

    fn pull(&mut self, size: usize) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;

        let mut block = Vec::with_capacity(size.min(crate::config::DEFAULT_BLOCK_SIZE));
        self.stream
            .by_ref()
            .take(size as u64)
            .read_to_end(&mut block)?;

        if block.is_empty() {
            if self.caching && !self.is_cached() {
                self.materialize()?;
            } else if self.stream.seekable() {
                self.stream.seek_start()?;
            }
            self.consumed = 0;
            return Ok(None);
        }

        if self.caching && !self.is_cached() {
            self.capture_block(&block)?;
        }
        self.consumed += block.len() as u64;
        Ok(Some(block))
    }

    fn capture_block(&mut self, block: &[u8]) -> Result<()> {
        if let Capture::Idle = self.capture {
            self.capture = if self.policy.cache_in_memory {
                Capture::Memory(Vec::new())
            } else if self.policy.cache_in_file {
                let spill = self.spill_target()?;
                let path = spill.allocate()?;
                let writer = match spill.storage.create_writer(&path) {
                    Ok(writer) => writer,
                    Err(e) => {
                        spill.discard(&path);
                        return Err(e);
                    }
                };
                debug!("Capturing content into {}", path.display());
                Capture::File { path, writer }
            } else {
                return Err(ContentError::CacheNotConfigured.into());
            };
        }

        match &mut self.capture {
            Capture::Memory(bytes) => bytes.extend_from_slice(block),
            Capture::File { path, writer } => {
                writer.write_all(block).map_err(|e| IoError::at(path, e))?;
            }
            Capture::Idle => {}
        }
        Ok(())
    }

    fn materialize(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.capture, Capture::Idle) {
            Capture::Idle => {
                self.replay = Replay::Memory(Arc::from(Vec::new()));
                self.stream = Box::new(Cursor::new(Vec::new()));
            }
            Capture::Memory(bytes) => {
                let bytes: Arc<[u8]> = Arc::from(bytes);
                debug!("Content cached in memory ({} bytes)", bytes.len());
                self.stream = Box::new(Cursor::new(bytes.clone()));
                self.replay = Replay::Memory(bytes);
            }
            file => {
                if let Some(path) = file.finish_file()? {
                    self.stream = self.spill_target()?.storage.open(&path)?;
                    self.replay = Replay::File(path);
                }
            }
        }

        for path in std::mem::take(&mut self.stale) {
            self.discard(path);
        }
        Ok(())
    }

    fn spill_target(&self) -> Result<&SpillTarget> {
        self.spill
            .as_ref()
            .ok_or_else(|| ContentError::CacheNotConfigured.into())
    }

    fn discard(&self, path: PathBuf) {
        if let Some(spill) = &self.spill {
            spill.discard(&path);
        }
    }

    fn cleanup(&mut self) {
        let mut paths = std::mem::take(&mut self.stale);
        if let Capture::File { path, writer } = std::mem::replace(&mut self.capture, Capture::Idle) {
            drop(writer);
            paths.push(path);
        }
        if let Replay::File(path) = std::mem::replace(&mut self.replay, Replay::None) {
            paths.push(path);
        }
        for path in paths {
            self.discard(path);
        }
    }
}

impl Drop for ContentBuffer {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl fmt::Debug for ContentBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentBuffer")
            .field("binary", &self.binary)
            .field("block_size", &self.block_size)
            .field("caching", &self.caching)
            .field("cached", &self.is_cached())
            .field("iterating", &self.iterating)
            .field("closed", &self.closed)
            .finish()
    }
}

/// Iterator returned by [`ContentBuffer::blocks`]
pub struct Blocks<'a> {
    buffer: &'a mut ContentBuffer,
    done: bool,
}

impl Iterator for Blocks<'_> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.buffer.next_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reader handed out by [`ContentBuffer::as_reader`]
pub enum ContentReader<'a> {
    Memory(Cursor<Arc<[u8]>>),
    Live(&'a mut dyn ContentStream),
}

impl Read for ContentReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Memory(cursor) => cursor.read(buf),
            Self::Live(stream) => stream.read(buf),
        }
    }
}
