//! File objects as seen by pipeline processors
//!
//! A [`FileEntry`] is everything the extract, hash, compare and unpack
//! processors read and write: identity, naming, content, hash records and
//! a little metadata. The [`crate::workspace::File`] façade wraps one entry
//! together with its pipelines.

use crate::config::FileOptions;
use crate::content::ContentBuffer;
use crate::hashing::FileHashes;
use crate::naming::NamingState;
use crate::pipeline::{KeywordOverrides, Params, PipelineTarget};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identity of one file object.
///
/// Used as the owner of name reservations and as the key of in-flight hash
/// states. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(u64);

impl FileId {
    /// Issue a fresh id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// What the next `save` has to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    /// New file, not on disk yet
    pub adding: bool,
    /// Content replaced since the last save
    pub changing: bool,
    /// Name changed since the last save
    pub renaming: bool,
    /// Loaded from or written to storage at least once
    pub was_saved: bool,
}

/// Facts gathered by the extract and unpack pipelines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Size in bytes, when known
    pub size: Option<u64>,
    /// Content is a container whose members were listed
    pub packed: bool,
    /// Member of a container rather than a stored file
    pub internal: bool,
    /// Path of the member inside its container
    pub member_path: Option<String>,
}

/// The data of one file object
pub struct FileEntry {
    pub id: FileId,
    /// Where the file was read from
    pub path: Option<PathBuf>,
    /// Directory the file is saved into
    pub save_to: Option<PathBuf>,
    pub naming: NamingState,
    pub content: Option<ContentBuffer>,
    pub hashes: FileHashes,
    pub meta: FileMeta,
    pub options: FileOptions,
    pub state: FileState,
    /// Keyword overrides consulted by every pipeline run over this file
    pub overrides: KeywordOverrides,
    /// Members listed by the unpack pipeline
    pub members: Vec<FileEntry>,
}

impl FileEntry {
    pub fn new(options: FileOptions) -> Self {
        Self {
            id: FileId::next(),
            path: None,
            save_to: None,
            naming: NamingState::default(),
            content: None,
            hashes: FileHashes::default(),
            meta: FileMeta::default(),
            options,
            state: FileState::default(),
            overrides: KeywordOverrides::default(),
            members: Vec::new(),
        }
    }

    pub fn complete_filename(&self) -> String {
        self.naming.complete_filename()
    }

    /// Directory the file lives in: `save_to`, or the parent of `path`
    pub fn directory(&self) -> Option<PathBuf> {
        self.save_to
            .clone()
            .or_else(|| self.path.as_deref().and_then(Path::parent).map(Path::to_path_buf))
    }

    /// Full destination path, when both directory and name are known
    pub fn target_path(&self) -> Option<PathBuf> {
        let name = self.complete_filename();
        if name.is_empty() {
            return None;
        }
        self.directory().map(|directory| directory.join(name))
    }

    /// Name used in logs and error messages
    pub fn display_name(&self) -> String {
        match (self.target_path(), self.path.as_ref()) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(path)) => path.display().to_string(),
            (None, None) if !self.naming.is_empty() => self.complete_filename(),
            (None, None) => self.id.to_string(),
        }
    }

    pub fn is_binary(&self) -> Option<bool> {
        self.content.as_ref().map(ContentBuffer::is_binary)
    }
}

impl Default for FileEntry {
    fn default() -> Self {
        Self::new(FileOptions::default())
    }
}

impl fmt::Debug for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("save_to", &self.save_to)
            .field("name", &self.complete_filename())
            .field("content", &self.content)
            .field("hashes", &self.hashes.algorithms())
            .field("state", &self.state)
            .field("members", &self.members.len())
            .finish()
    }
}

impl PipelineTarget for FileEntry {
    fn pipeline_overrides(&self, pipeline: &str) -> Params {
        self.overrides.for_pipeline(pipeline)
    }

    fn processor_overrides(&self, processor: &str) -> Params {
        self.overrides.scoped_to(processor)
    }

    fn raises_pipeline_errors(&self) -> bool {
        self.options.pipeline_raises_exception
    }
}

/// Comparisons run over a subject followed by the files it is compared to
impl PipelineTarget for [FileEntry] {
    fn pipeline_overrides(&self, pipeline: &str) -> Params {
        self.first()
            .map(|subject| subject.pipeline_overrides(pipeline))
            .unwrap_or_default()
    }

    fn processor_overrides(&self, processor: &str) -> Params {
        self.first()
            .map(|subject| subject.processor_overrides(processor))
            .unwrap_or_default()
    }

    fn raises_pipeline_errors(&self) -> bool {
        self.first().is_some_and(PipelineTarget::raises_pipeline_errors)
    }
}
