//! The file object façade
//!
//! A [`File`] is one [`FileEntry`] plus the pipelines that act on it and a
//! handle on the shared [`Environment`]. Operations that touch storage go
//! through here: `save` checks the file's options before writing anything,
//! reserves the final name and writes pending sidecars.

use super::Environment;
use crate::config::FileOptions;
use crate::content::{ContentBuffer, ContentSource, NonSeekable};
use crate::error::{ContentError, NameError, PipelineError, ValidationError};
use crate::file::{FileEntry, FileId, FileMeta, FileState};
use crate::hashing::{FileHashes, HashAlgorithm, sidecar};
use crate::naming::{NameCandidate, NamingState};
use crate::pipeline::{KeywordOverrides, Params, Pipeline};
use crate::storage::{SaveMode, Storage, normalize};
use crate::Result;
use log::{debug, info};
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The pipelines of one file, built from the configured processor names
pub struct FilePipelines {
    pub extract: Pipeline<FileEntry, Environment>,
    pub hasher: Pipeline<FileEntry, Environment>,
    pub compare: Pipeline<[FileEntry], Environment>,
    pub rename: Pipeline<NameCandidate, dyn Storage>,
    pub unpack: Pipeline<FileEntry, Environment>,
}

impl FilePipelines {
    pub fn from_config(env: &Environment) -> Self {
        let names = &env.config.pipelines;
        Self {
            extract: Pipeline::from_names("extract", env.extractors.clone(), &names.extract),
            hasher: Pipeline::from_names("hasher", env.hashers.clone(), &names.hasher),
            compare: Pipeline::from_names("compare", env.comparers.clone(), &names.compare),
            rename: Pipeline::from_names("rename", env.renamers.clone(), &names.rename),
            unpack: Pipeline::from_names("unpack", env.unpackers.clone(), &names.unpack),
        }
    }
}

/// A file object bound to a workspace
pub struct File {
    entry: FileEntry,
    env: Arc<Environment>,
    pipelines: FilePipelines,
    /// Name currently reserved for this file
    reservation: Option<(PathBuf, String)>,
}

impl File {
    pub(crate) fn new(env: Arc<Environment>) -> Self {
        let entry = FileEntry::new(env.config.options.clone());
        Self::from_entry(env, entry)
    }

    pub(crate) fn from_entry(env: Arc<Environment>, entry: FileEntry) -> Self {
        Self {
            pipelines: FilePipelines::from_config(&env),
            entry,
            env,
            reservation: None,
        }
    }

    pub fn id(&self) -> FileId {
        self.entry.id
    }

    pub fn entry(&self) -> &FileEntry {
        &self.entry
    }

    pub fn entry_mut(&mut self) -> &mut FileEntry {
        &mut self.entry
    }

    pub fn env(&self) -> &Arc<Environment> {
        &self.env
    }

    pub fn pipelines(&self) -> &FilePipelines {
        &self.pipelines
    }

    pub fn pipelines_mut(&mut self) -> &mut FilePipelines {
        &mut self.pipelines
    }

    pub fn path(&self) -> Option<&Path> {
        self.entry.path.as_deref()
    }

    pub fn save_to(&self) -> Option<&Path> {
        self.entry.save_to.as_deref()
    }

    pub fn naming(&self) -> &NamingState {
        &self.entry.naming
    }

    pub fn complete_filename(&self) -> String {
        self.entry.complete_filename()
    }

    pub fn options(&self) -> &FileOptions {
        &self.entry.options
    }

    pub fn options_mut(&mut self) -> &mut FileOptions {
        &mut self.entry.options
    }

    pub fn overrides_mut(&mut self) -> &mut KeywordOverrides {
        &mut self.entry.overrides
    }

    pub fn state(&self) -> FileState {
        self.entry.state
    }

    pub fn meta(&self) -> &FileMeta {
        &self.entry.meta
    }

    pub fn hashes(&self) -> &FileHashes {
        &self.entry.hashes
    }

    pub fn digest(&self, algorithm: HashAlgorithm) -> Option<&str> {
        self.entry.hashes.digest(algorithm)
    }

    pub fn content_mut(&mut self) -> Option<&mut ContentBuffer> {
        self.entry.content.as_mut()
    }

    /// Directory the next `save` writes into.
    ///
    /// Moving a saved file counts as renaming it.
    pub fn set_save_to(&mut self, directory: &Path) {
        let directory = self.env.storage.sanitize(directory);
        if self.entry.save_to.as_ref() == Some(&directory) {
            return;
        }
        if self.entry.state.was_saved {
            self.entry.state.renaming = true;
        }
        self.entry.save_to = Some(directory);
    }

    /// Give the file a new name; sidecars follow on the next `save`
    pub fn set_complete_filename(&mut self, complete_filename: &str) {
        let previous = self.entry.complete_filename();
        if previous == complete_filename {
            return;
        }
        self.entry.naming.set_complete_filename(complete_filename);
        if self.entry.state.was_saved {
            self.entry.state.renaming = true;
        }
        if !previous.is_empty() {
            self.entry.hashes.rename(complete_filename);
        }
    }

    /// Replace the content.
    ///
    /// Digests computed for the old content are dropped, both the records and
    /// any state kept by the hash engine.
    pub fn set_content(&mut self, content: impl Into<ContentSource>) -> Result<()> {
        let source = content.into();
        let size = match &source {
            ContentSource::Text(text) => Some(text.len() as u64),
            ContentSource::Bytes(bytes) => Some(bytes.len() as u64),
            ContentSource::Stream { .. } => None,
        };

        let buffer = self.env.content(source)?;
        if let Some(mut previous) = self.entry.content.replace(buffer) {
            previous.close();
        }
        self.entry.meta.size = size;
        self.entry.state.changing = true;
        self.entry.hashes.clear();
        self.env.hashes.forget(self.entry.id);
        Ok(())
    }

    /// Replace the content with a forward-only reader
    pub fn set_content_reader<R: Read + Send + 'static>(&mut self, reader: R, binary: bool) -> Result<()> {
        self.set_content(ContentSource::Stream {
            stream: Box::new(NonSeekable(reader)),
            binary,
        })
    }

    /// Run the extract pipeline
    pub fn refresh(&mut self) -> Result<()> {
        self.pipelines
            .extract
            .run(&mut self.entry, &self.env, &Params::new())?;
        Ok(())
    }

    /// Fill in a digest for every algorithm of the hasher pipeline.
    ///
    /// Files saved before and unchanged since try their sidecars first.
    /// `force` drops existing records and recomputes from content. Fails only
    /// when no digest at all was produced; otherwise step errors stay readable
    /// through `pipelines().hasher.errors()`.
    pub fn generate_hashes(&mut self, force: bool) -> Result<()> {
        if force {
            self.entry.hashes.clear();
            self.env.hashes.forget(self.entry.id);
        }

        let state = self.entry.state;
        let try_loading = !(state.changing || force) && state.was_saved;
        let pending: Vec<String> = self
            .pipelines
            .hasher
            .candidate_names()
            .into_iter()
            .filter(|name| {
                name.parse::<HashAlgorithm>()
                    .is_ok_and(|algorithm| !self.entry.hashes.contains(algorithm))
            })
            .map(str::to_string)
            .collect();

        let kwargs = Params::new()
            .with("try_loading_from_file", try_loading)
            .with("full_check", self.entry.options.full_check)
            .with("pending", pending);
        self.pipelines.hasher.run(&mut self.entry, &self.env, &kwargs)?;

        // partial success leaves the step errors on the pipeline for inspection
        if self.entry.hashes.is_empty()
            && let Some(error) = PipelineError::collected("hasher", self.pipelines.hasher.take_errors())
        {
            return Err(error);
        }
        Ok(())
    }

    /// Check the content against the stored digests, returning the algorithms checked
    pub fn verify(&mut self, force: bool) -> Result<Vec<HashAlgorithm>> {
        let display = self.entry.display_name();
        let content = self
            .entry
            .content
            .as_mut()
            .ok_or_else(|| ContentError::missing(&display))?;
        self.env.hashes.verify(&display, &self.entry.hashes, content, force)
    }

    /// Run the compare pipeline over this file and `others`.
    ///
    /// Fails with [`ContentError::Inconclusive`] when no comparer reached a
    /// verdict.
    pub fn compare_to(&mut self, others: &mut [File]) -> Result<bool> {
        if others.is_empty() {
            return Err(ValidationError::invalid_parameter("others", "nothing to compare to").into());
        }

        let mut entries = Vec::with_capacity(others.len() + 1);
        entries.push(std::mem::take(&mut self.entry));
        entries.extend(others.iter_mut().map(|other| std::mem::take(&mut other.entry)));

        let outcome = self
            .pipelines
            .compare
            .run(&mut entries[..], &self.env, &Params::new());

        let mut entries = entries.into_iter();
        if let Some(entry) = entries.next() {
            self.entry = entry;
        }
        for (other, entry) in others.iter_mut().zip(entries) {
            other.entry = entry;
        }

        outcome?.ok_or_else(|| ContentError::Inconclusive.into())
    }

    /// Run the unpack pipeline and hand out the members it listed
    pub fn unpack(&mut self) -> Result<Vec<File>> {
        self.entry.members.clear();
        self.pipelines
            .unpack
            .run(&mut self.entry, &self.env, &Params::new())?;
        if let Some(error) = PipelineError::collected("unpack", self.pipelines.unpack.take_errors()) {
            return Err(error);
        }

        let members = std::mem::take(&mut self.entry.members);
        Ok(members
            .into_iter()
            .map(|entry| File::from_entry(self.env.clone(), entry))
            .collect())
    }

    /// Release the content and any temp file behind it
    pub fn close(&mut self) {
        if let Some(content) = self.entry.content.as_mut() {
            content.close();
        }
    }

    fn validate(&self) -> Result<PathBuf> {
        if self.entry.naming.is_empty() {
            return Err(ValidationError::missing_field("filename").into());
        }
        if self.entry.content.is_none() {
            return Err(ValidationError::missing_field("content").into());
        }
        self.entry
            .save_to
            .clone()
            .ok_or_else(|| ValidationError::missing_field("save_to").into())
    }

    /// Write the file to `save_to` according to its options.
    ///
    /// New files and changed content are written block by block; a saved
    /// file that was only renamed or moved is renamed in storage. Returns
    /// where the file ended up.
    pub fn save(&mut self) -> Result<PathBuf> {
        let directory = self.validate()?;
        let storage = self.env.storage.clone();
        let options = self.entry.options.clone();
        let state = self.entry.state;

        let target = storage.join(&directory, &self.entry.complete_filename());
        let occupied = storage.exists(&target) && self.entry.path.as_ref() != Some(&target);

        if state.adding && occupied && !(options.allow_overwrite || options.allow_rename) {
            return Err(NameError::not_allowed(format!(
                "'{}' exists and neither overwriting nor renaming is allowed",
                target.display()
            ))
            .into());
        }
        if !state.adding && state.changing && !(options.allow_update || options.create_backup) {
            return Err(NameError::not_allowed(
                "updating content requires `allow_update` or `create_backup`",
            )
            .into());
        }
        if state.renaming && occupied && !(options.allow_rename || options.allow_overwrite) {
            return Err(NameError::not_allowed(format!(
                "cannot rename onto existing '{}' without `allow_rename` or `allow_overwrite`",
                target.display()
            ))
            .into());
        }
        if state.renaming && self.entry.naming.extension_changed() && !options.allow_extension_change {
            return Err(NameError::not_allowed("changing the extension is not allowed").into());
        }

        self.entry.naming.on_conflict_rename = options.allow_rename;
        let avoid_existing = occupied && !options.allow_overwrite;
        let previous_name = self
            .entry
            .path
            .as_deref()
            .and_then(|path| storage.filename_of(path));
        let filename = self.reserve_name(&directory, avoid_existing)?;
        let target = storage.join(&directory, &filename);

        if state.changing
            && !state.adding
            && options.create_backup
            && let Some(source) = self.entry.path.as_deref().filter(|path| storage.is_file(path))
        {
            let backup = storage.backup(source)?;
            debug!("Backed up {} to {}", source.display(), backup.display());
        }

        let previous = self
            .entry
            .path
            .clone()
            .filter(|path| *path != target && storage.is_file(path));
        let write = state.adding || state.changing || (previous.is_none() && !storage.exists(&target));

        let moved = if write {
            let display = self.entry.display_name();
            let content = self
                .entry
                .content
                .as_mut()
                .ok_or_else(|| ContentError::missing(&display))?;
            let written = write_content(&*storage, &target, content)?;
            self.entry.meta.size = Some(written);
            match &previous {
                Some(previous) if state.renaming => {
                    storage.delete(previous)?;
                    true
                }
                _ => false,
            }
        } else if let Some(previous) = &previous {
            storage.rename(previous, &target)?;
            true
        } else {
            false
        };

        if moved {
            let binary = self.entry.is_binary().unwrap_or(true);
            let content = self.env.stored_content(&target, binary)?;
            if let Some(mut stale) = self.entry.content.replace(content) {
                stale.close();
            }
        }

        self.entry.path = Some(target.clone());
        self.entry.save_to = Some(directory.clone());

        if options.save_hashes {
            self.generate_hashes(!options.allow_search_hashes)?;
            self.save_hash_files(&directory, previous_name.as_deref())?;
        }

        self.entry.state = FileState {
            adding: false,
            changing: false,
            renaming: false,
            was_saved: true,
        };
        self.entry.naming.mark_saved();
        info!("Saved {}", target.display());
        Ok(target)
    }

    /// Reserve the current name in `directory`, renaming it on conflicts.
    ///
    /// With `avoid_existing` the rename pipeline picks a name free on disk
    /// first. Any previous reservation of this file is released.
    fn reserve_name(&mut self, directory: &Path, avoid_existing: bool) -> Result<String> {
        let env = self.env.clone();
        let storage: &(dyn Storage + 'static) = &*env.storage;
        let owner = self.entry.id;
        let requested = self.entry.complete_filename();
        let rename_on_conflict = self.entry.naming.on_conflict_rename;
        let overrides = self.entry.overrides.clone();
        let raises = self.entry.options.pipeline_raises_exception;
        let pipeline = &mut self.pipelines.rename;

        let mut candidate = requested.clone();
        if avoid_existing {
            let reserved = env.names.reserved_names(directory);
            candidate = run_rename(pipeline, storage, directory, &requested, &reserved, &overrides, raises)?;
        }
        let filename = env
            .names
            .reserve(directory, &candidate, owner, rename_on_conflict, |name, reserved| {
                run_rename(pipeline, storage, directory, name, reserved, &overrides, raises)
            })?;

        let reservation = (normalize(directory), filename.clone());
        if let Some((old_directory, old_name)) = self.reservation.replace(reservation.clone())
            && (old_directory != reservation.0 || old_name != filename)
        {
            env.names.release(&old_directory, &old_name, owner);
        }

        if filename != requested {
            debug!("'{requested}' saved as '{filename}' in {}", directory.display());
            self.entry.naming.set_complete_filename(&filename);
            self.entry.hashes.rename(&filename);
        }
        Ok(filename)
    }

    /// Write every pending dedicated sidecar into `directory`.
    ///
    /// `CHECKSUM.*` files are never written. The dedicated sidecar of the
    /// file's previous name is removed once its replacement exists.
    fn save_hash_files(&mut self, directory: &Path, previous_name: Option<&str>) -> Result<usize> {
        let storage = self.env.storage.clone();
        let mut touched = vec![directory.to_path_buf()];
        let mut written = 0;

        for record in self.entry.hashes.records_mut() {
            let hash_file = &mut record.hash_file;
            if !hash_file.pending_save || hash_file.from_checksum || sidecar::is_checksum_file(&hash_file.name) {
                continue;
            }

            let path = storage.join(directory, &hash_file.name);
            storage.save(&path, format!("{}\n", hash_file.content).as_bytes(), SaveMode::Truncate)?;
            debug!("Wrote {} sidecar {}", record.algorithm, path.display());

            let stale = hash_file.source.replace(path.clone());
            if let (Some(stale), Some(previous_name)) = (stale, previous_name)
                && stale != path
                && storage.filename_of(&stale) == Some(sidecar::dedicated_name(previous_name, record.algorithm))
                && storage.is_file(&stale)
            {
                storage.delete(&stale)?;
                touched.push(storage.directory_of(&stale));
            }
            hash_file.pending_save = false;
            written += 1;
        }

        if written > 0 {
            for directory in touched {
                self.env.hashes.invalidate_directory(&directory);
            }
        }
        Ok(written)
    }
}

/// Ask the rename pipeline for a replacement of `name`
fn run_rename(
    pipeline: &mut Pipeline<NameCandidate, dyn Storage>,
    storage: &(dyn Storage + 'static),
    directory: &Path,
    name: &str,
    reserved: &HashSet<String>,
    overrides: &KeywordOverrides,
    raises: bool,
) -> Result<String> {
    let mut candidate = NameCandidate::new(directory, name);
    candidate.overrides = overrides.clone();
    candidate.raises_errors = raises;

    let mut names: Vec<String> = reserved.iter().cloned().collect();
    names.sort();
    let kwargs = Params::new().with("reserved_names", names);
    pipeline.run(&mut candidate, storage, &kwargs)?;

    let renamed = candidate.complete_filename();
    if renamed != name {
        return Ok(renamed);
    }
    match pipeline.take_errors().into_iter().next() {
        Some(error) => Err(error),
        None => Err(NameError::reserved(directory, name).into()),
    }
}

/// Write `content` to `path` block by block, truncating first
fn write_content(storage: &dyn Storage, path: &Path, content: &mut ContentBuffer) -> Result<u64> {
    content.reset()?;
    let mut mode = SaveMode::Truncate;
    let mut written = 0u64;
    for block in content.blocks() {
        let block = block?;
        storage.save(path, &block, mode)?;
        mode = SaveMode::Append;
        written += block.len() as u64;
    }
    if mode == SaveMode::Truncate {
        storage.save(path, &[], SaveMode::Truncate)?;
    }
    Ok(written)
}

impl Drop for File {
    fn drop(&mut self) {
        let released = self.env.names.release_owner(self.entry.id);
        self.env.hashes.forget(self.entry.id);
        if released > 0 {
            debug!("Released {released} name(s) held by {}", self.entry.id);
        }
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("entry", &self.entry)
            .field("reservation", &self.reservation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::IntegrityError;
    use crate::storage::LocalStorage;
    use crate::workspace::Workspace;
    use crate::Error;
    use std::fs;
    use tempfile::TempDir;

    const ABC_MD5: &str = "900150983cd24fb0d6963f7d28e17f72";

    fn workspace() -> Workspace {
        Workspace::builder()
            .storage(Arc::new(LocalStorage::new()))
            .config(EngineConfig::test())
            .build()
            .unwrap()
    }

    #[test]
    fn test_save_new_file_with_sidecars() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = workspace();

        let mut file = workspace.create(temp_dir.path(), "abc.txt", "abc").unwrap();
        let path = file.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "abc");
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("abc.txt.md5")).unwrap(),
            format!("{ABC_MD5} abc.txt\n")
        );
        assert!(temp_dir.path().join("abc.txt.sha256").exists());
        assert!(file.state().was_saved);
        assert!(!file.state().adding);
    }

    #[test]
    fn test_existing_name_gets_windows_suffix() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("photo.jpg"), "old").unwrap();
        let workspace = workspace();

        let mut file = workspace.create(temp_dir.path(), "photo.jpg", "new").unwrap();
        let path = file.save().unwrap();

        assert_eq!(path, temp_dir.path().join("photo (1).jpg"));
        assert_eq!(fs::read_to_string(temp_dir.path().join("photo.jpg")).unwrap(), "old");
        assert!(temp_dir.path().join("photo (1).jpg.md5").exists());
    }

    #[test]
    fn test_overwrite_refused_without_options() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "old").unwrap();
        let workspace = workspace();

        let mut file = workspace.create(temp_dir.path(), "a.txt", "new").unwrap();
        file.options_mut().allow_rename = false;

        assert!(matches!(file.save(), Err(Error::Naming(NameError::OperationNotAllowed { .. }))));
        assert_eq!(fs::read_to_string(temp_dir.path().join("a.txt")).unwrap(), "old");
    }

    #[test]
    fn test_second_object_reserving_same_name() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = workspace();

        let mut first = workspace.create(temp_dir.path(), "photo.jpg", "one").unwrap();
        first.options_mut().save_hashes = false;
        let mut second = workspace.create(temp_dir.path(), "photo.jpg", "two").unwrap();
        second.options_mut().save_hashes = false;

        first.save().unwrap();
        let path = second.save().unwrap();

        assert_eq!(path.file_name().unwrap(), "photo (1).jpg");
        let names = workspace.names();
        assert_eq!(names.owner_of(temp_dir.path(), "photo.jpg"), Some(first.id()));
        assert_eq!(names.owner_of(temp_dir.path(), "photo (1).jpg"), Some(second.id()));

        drop(first);
        assert_eq!(names.owner_of(temp_dir.path(), "photo.jpg"), None);
    }

    #[test]
    fn test_update_creates_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        fs::write(&path, "v1").unwrap();
        let workspace = workspace();

        let mut file = workspace.open(&path).unwrap();
        file.set_content("v2").unwrap();
        file.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "v2");
        assert_eq!(fs::read_to_string(temp_dir.path().join("notes.txt.bak")).unwrap(), "v1");
    }

    #[test]
    fn test_update_refused() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        fs::write(&path, "v1").unwrap();
        let workspace = workspace();

        let mut file = workspace.open(&path).unwrap();
        file.options_mut().allow_update = false;
        file.options_mut().create_backup = false;
        file.set_content("v2").unwrap();

        assert!(file.save().is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "v1");
    }

    #[test]
    fn test_rename_moves_file_and_sidecar() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = workspace();
        let mut file = workspace.create(temp_dir.path(), "abc.txt", "abc").unwrap();
        file.save().unwrap();

        file.set_complete_filename("renamed.txt");
        assert!(file.state().renaming);
        let path = file.save().unwrap();

        assert_eq!(path, temp_dir.path().join("renamed.txt"));
        assert!(!temp_dir.path().join("abc.txt").exists());
        assert!(!temp_dir.path().join("abc.txt.md5").exists());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("renamed.txt.md5")).unwrap(),
            format!("{ABC_MD5} renamed.txt\n")
        );
        assert_eq!(file.content_mut().unwrap().full_text().unwrap(), "abc");
    }

    #[test]
    fn test_extension_change_refused() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = workspace();
        let mut file = workspace.create(temp_dir.path(), "abc.txt", "abc").unwrap();
        file.save().unwrap();

        file.options_mut().allow_extension_change = false;
        file.set_complete_filename("abc.md");
        assert!(file.save().is_err());
    }

    #[test]
    fn test_save_requires_name_and_directory() {
        let workspace = workspace();
        let mut file = workspace.new_file();
        assert!(matches!(file.save(), Err(Error::Validation(_))));

        file.set_complete_filename("a.txt");
        file.set_content("x").unwrap();
        assert!(matches!(file.save(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_verify_against_loaded_sidecar() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("abc.txt");
        fs::write(&path, "abc").unwrap();
        fs::write(temp_dir.path().join("abc.txt.md5"), format!("{ABC_MD5} abc.txt\n")).unwrap();
        let workspace = workspace();

        let mut file = workspace.open(&path).unwrap();
        assert_eq!(file.verify(false).unwrap(), vec![HashAlgorithm::Md5]);

        fs::write(&path, "abd").unwrap();
        let mut changed = workspace.open(&path).unwrap();
        let error = changed.verify(false).unwrap_err();
        assert!(error.is_integrity_failure());
    }

    #[test]
    fn test_verify_without_hashes() {
        let workspace = workspace();
        let mut file = workspace.new_file();
        file.set_content("abc").unwrap();
        assert!(matches!(
            file.verify(false),
            Err(Error::Integrity(IntegrityError::NoHashAvailable { .. }))
        ));
    }

    #[test]
    fn test_generate_hashes_single_pass() {
        let workspace = workspace();
        let mut file = workspace.new_file();
        file.set_complete_filename("abc.txt");
        file.set_content("abc").unwrap();

        file.generate_hashes(false).unwrap();

        assert_eq!(file.digest(HashAlgorithm::Md5), Some(ABC_MD5));
        assert!(file.digest(HashAlgorithm::Sha256).is_some());
        assert_eq!(workspace.hashes().in_flight(), 0);
    }

    #[test]
    fn test_new_content_drops_hashes() {
        let workspace = workspace();
        let mut file = workspace.new_file();
        file.set_content("abc").unwrap();
        file.generate_hashes(false).unwrap();

        file.set_content("xyz").unwrap();
        assert!(file.hashes().is_empty());
    }

    #[test]
    fn test_compare_files() {
        let workspace = workspace();
        let mut a = workspace.new_file();
        a.set_content("same text").unwrap();
        let mut b = workspace.new_file();
        b.set_content("same text").unwrap();
        let mut c = workspace.new_file();
        c.set_content("different").unwrap();

        assert!(a.compare_to(std::slice::from_mut(&mut b)).unwrap());
        assert!(!a.compare_to(std::slice::from_mut(&mut c)).unwrap());
        assert!(a.compare_to(&mut []).is_err());
        assert_eq!(a.content_mut().unwrap().full_text().unwrap(), "same text");
    }

    #[test]
    fn test_compare_inconclusive() {
        let mut config = EngineConfig::test();
        config.pipelines.compare = vec!["hash".into()];
        let workspace = Workspace::new(config).unwrap();
        let mut a = workspace.new_file();
        a.set_content("x").unwrap();
        let mut b = workspace.new_file();
        b.set_content("x").unwrap();

        assert!(matches!(
            a.compare_to(std::slice::from_mut(&mut b)),
            Err(Error::Content(ContentError::Inconclusive))
        ));
    }

    #[test]
    fn test_unpack_without_codec_is_empty() {
        let workspace = workspace();
        let mut file = workspace.new_file();
        file.set_complete_filename("notes.txt");
        file.set_content("x").unwrap();

        assert!(file.unpack().unwrap().is_empty());
        assert!(!file.meta().packed);
    }

    #[derive(Debug)]
    struct BrokenHasher;

    impl crate::pipeline::Processor<FileEntry, Environment> for BrokenHasher {
        fn name(&self) -> &str {
            "broken"
        }

        fn process(&self, _entry: &mut FileEntry, _env: &Environment, _params: &Params) -> Result<crate::Outcome> {
            Err(crate::error::InternalError::assertion("hasher out of order").into())
        }
    }

    fn workspace_with_hashers(names: &[&str]) -> Workspace {
        let mut config = EngineConfig::test();
        config.pipelines.hasher = names.iter().map(|name| name.to_string()).collect();
        Workspace::builder()
            .storage(Arc::new(LocalStorage::new()))
            .config(config)
            .hasher(BrokenHasher)
            .build()
            .unwrap()
    }

    #[test]
    fn test_rename_of_hex_like_name_keeps_sidecar_valid() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = workspace();
        let mut file = workspace.create(temp_dir.path(), "c", "abc").unwrap();
        file.save().unwrap();

        file.set_complete_filename("renamed");
        file.save().unwrap();
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("renamed.md5")).unwrap(),
            format!("{ABC_MD5} renamed\n")
        );
        drop(file);

        let mut reopened = workspace.open(temp_dir.path().join("renamed")).unwrap();
        assert!(reopened.verify(false).is_ok());
    }

    #[test]
    fn test_partial_hasher_failure_keeps_errors() {
        let workspace = workspace_with_hashers(&["md5", "broken"]);
        let mut file = workspace.new_file();
        file.set_complete_filename("abc.txt");
        file.set_content("abc").unwrap();

        file.generate_hashes(false).unwrap();

        assert_eq!(file.digest(HashAlgorithm::Md5), Some(ABC_MD5));
        let errors = file.pipelines().hasher.errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::Internal(_)));
    }

    #[test]
    fn test_total_hasher_failure_returns_every_error() {
        let workspace = workspace_with_hashers(&["broken", "broken"]);
        let mut file = workspace.new_file();
        file.set_complete_filename("abc.txt");
        file.set_content("abc").unwrap();

        match file.generate_hashes(false).unwrap_err() {
            Error::Pipeline(error) => assert_eq!(error.errors().len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
