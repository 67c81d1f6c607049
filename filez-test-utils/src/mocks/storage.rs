//! In-memory storage backend

use filez_core::content::ContentStream;
use filez_core::error::IoError;
use filez_core::storage::{Lines, SaveMode, Storage, filename_matcher, normalize};
use filez_core::Result;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

type Files = Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>;

/// Storage keeping every file in a map
///
/// Directories exist implicitly as soon as a file lives below them. Opens
/// for reading and for writing are counted per path so tests can assert how
/// often content was reread or rewritten.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Files,
    opens: Mutex<HashMap<PathBuf, usize>>,
    writes: Mutex<HashMap<PathBuf, usize>>,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        self.lock()
            .insert(normalize(path.as_ref()), content.as_ref().to_vec());
    }

    /// Builder-style [`add_file`](Self::add_file)
    pub fn with_file(self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Self {
        self.add_file(path, content);
        self
    }

    /// Current content of a file
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock().get(&normalize(path.as_ref())).cloned()
    }

    /// Content of a file as text, lossily decoded
    pub fn read_text(&self, path: impl AsRef<Path>) -> Option<String> {
        self.read_file(path)
            .map(|data| String::from_utf8_lossy(&data).into_owned())
    }

    /// Every stored path, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    /// How many times `path` was opened for reading
    pub fn open_count(&self, path: impl AsRef<Path>) -> usize {
        self.opens
            .lock()
            .map(|opens| opens.get(&normalize(path.as_ref())).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// How many times `path` was opened for writing, by `save` or a writer
    pub fn write_count(&self, path: impl AsRef<Path>) -> usize {
        self.writes
            .lock()
            .map(|writes| writes.get(&normalize(path.as_ref())).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all files and counters
    pub fn reset(&self) {
        self.lock().clear();
        if let Ok(mut opens) = self.opens.lock() {
            opens.clear();
        }
        if let Ok(mut writes) = self.writes.lock() {
            writes.clear();
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>> {
        lock_files(&self.files)
    }

    fn count_write(&self, path: &Path) {
        if let Ok(mut writes) = self.writes.lock() {
            *writes.entry(path.to_path_buf()).or_default() += 1;
        }
    }

    fn content(&self, path: &Path) -> Result<Vec<u8>> {
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| IoError::file_not_found(path).into())
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.lock()
            .keys()
            .any(|file| file == &path || file.starts_with(&path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.lock().contains_key(&normalize(path))
    }

    fn open(&self, path: &Path) -> Result<Box<dyn ContentStream>> {
        let path = normalize(path);
        let content = self.content(&path)?;
        if let Ok(mut opens) = self.opens.lock() {
            *opens.entry(path).or_default() += 1;
        }
        Ok(Box::new(Cursor::new(content)))
    }

    fn save(&self, path: &Path, data: &[u8], mode: SaveMode) -> Result<()> {
        let path = normalize(path);
        self.count_write(&path);
        let mut files = self.lock();
        let content = files.entry(path).or_default();
        if mode == SaveMode::Truncate {
            content.clear();
        }
        content.extend_from_slice(data);
        Ok(())
    }

    fn create_writer(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        let path = normalize(path);
        self.count_write(&path);
        self.lock().insert(path.clone(), Vec::new());
        Ok(Box::new(MemoryWriter {
            files: self.files.clone(),
            path,
        }))
    }

    fn delete(&self, path: &Path) -> Result<()> {
        self.lock()
            .remove(&normalize(path))
            .map(|_| ())
            .ok_or_else(|| IoError::file_not_found(path).into())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let content = self.content(&normalize(from))?;
        self.lock().insert(normalize(to), content);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut files = self.lock();
        let content = files
            .remove(&normalize(from))
            .ok_or_else(|| IoError::file_not_found(from))?;
        files.insert(normalize(to), content);
        Ok(())
    }

    fn list_files(&self, directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        let matcher = filename_matcher(pattern)?;
        let directory = normalize(directory);
        Ok(self
            .lock()
            .keys()
            .filter(|path| path.parent() == Some(directory.as_path()))
            .filter(|path| path.file_name().is_some_and(|name| matcher.is_match(name)))
            .cloned()
            .collect())
    }

    fn read_lines(&self, path: &Path) -> Result<Lines> {
        let content = self.content(&normalize(path))?;
        let lines: Vec<String> = String::from_utf8_lossy(&content)
            .lines()
            .map(str::to_string)
            .collect();
        Ok(Box::new(lines.into_iter().map(Ok)))
    }

    fn size(&self, path: &Path) -> Result<u64> {
        Ok(self.content(&normalize(path))?.len() as u64)
    }

    fn temp_directory(&self) -> PathBuf {
        PathBuf::from("/tmp/filez")
    }
}

fn lock_files(files: &Files) -> MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>> {
    // a panicking test must not poison the others sharing the storage
    files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Appends straight into the shared file map
struct MemoryWriter {
    files: Files,
    path: PathBuf,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock_files(&self.files)
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
