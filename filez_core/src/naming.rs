//! File naming
//!
//! Per-file naming state, the shared reservation registry and the renaming
//! strategies used to resolve collisions.

use crate::pipeline::{KeywordOverrides, Params, PipelineTarget, ProcessorRegistry};
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod registry;
pub mod renamer;

pub use registry::NameRegistry;
pub use renamer::{LinuxRenamer, UniqueRenamer, WindowsRenamer, unique_filename};

/// Registry type for renaming strategies
pub type RenamerRegistry = ProcessorRegistry<NameCandidate, dyn Storage>;

/// Split a complete filename into stem and extension (with its dot).
///
/// A leading dot does not start an extension, so `.bashrc` has none.
pub fn split_extension(complete_filename: &str) -> (String, String) {
    match complete_filename.rfind('.') {
        Some(index) if index > 0 => (
            complete_filename[..index].to_string(),
            complete_filename[index..].to_string(),
        ),
        _ => (complete_filename.to_string(), String::new()),
    }
}

/// Registry with the built-in strategies: `windows`, `linux` and `unique`
pub fn default_renamers() -> RenamerRegistry {
    let mut registry = RenamerRegistry::new();
    registry.register_instance(WindowsRenamer);
    registry.register_instance(LinuxRenamer);
    registry.register_instance(UniqueRenamer::new());
    registry
}

/// A name being resolved by the rename pipeline
#[derive(Debug, Clone)]
pub struct NameCandidate {
    pub directory: PathBuf,
    /// Stem, without extension
    pub filename: String,
    /// Extension with its dot, or empty
    pub extension: String,
    pub overrides: KeywordOverrides,
    pub raises_errors: bool,
}

impl NameCandidate {
    pub fn new(directory: &Path, complete_filename: &str) -> Self {
        let (filename, extension) = split_extension(complete_filename);
        Self {
            directory: directory.to_path_buf(),
            filename,
            extension,
            overrides: KeywordOverrides::default(),
            raises_errors: false,
        }
    }

    pub fn complete_filename(&self) -> String {
        format!("{}{}", self.filename, self.extension)
    }
}

impl PipelineTarget for NameCandidate {
    fn pipeline_overrides(&self, pipeline: &str) -> Params {
        self.overrides.for_pipeline(pipeline)
    }

    fn processor_overrides(&self, processor: &str) -> Params {
        self.overrides.scoped_to(processor)
    }

    fn raises_pipeline_errors(&self) -> bool {
        self.raises_errors
    }
}

/// Filename, extension and their history for one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingState {
    filename: String,
    extension: String,
    history: Vec<(String, String)>,
    /// Ask the rename pipeline for a new name when the current one is reserved
    pub on_conflict_rename: bool,
    saved_extension: Option<String>,
}

impl NamingState {
    pub fn new(complete_filename: &str) -> Self {
        let mut state = Self::default();
        state.set_complete_filename(complete_filename);
        state
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn complete_filename(&self) -> String {
        format!("{}{}", self.filename, self.extension)
    }

    pub fn is_empty(&self) -> bool {
        self.filename.is_empty() && self.extension.is_empty()
    }

    /// Replace filename and extension, pushing the previous pair to history
    pub fn set(&mut self, filename: &str, extension: &str) {
        if self.filename == filename && self.extension == extension {
            return;
        }
        if !self.is_empty() {
            self.history
                .push((std::mem::take(&mut self.filename), std::mem::take(&mut self.extension)));
        }
        self.filename = filename.to_string();
        self.extension = extension.to_string();
    }

    pub fn set_complete_filename(&mut self, complete_filename: &str) {
        let (filename, extension) = split_extension(complete_filename);
        self.set(&filename, &extension);
    }

    pub fn set_filename(&mut self, filename: &str) {
        let extension = self.extension.clone();
        self.set(filename, &extension);
    }

    pub fn set_extension(&mut self, extension: &str) {
        let filename = self.filename.clone();
        self.set(&filename, extension);
    }

    /// Prior `(filename, extension)` pairs, oldest first
    pub fn history(&self) -> &[(String, String)] {
        &self.history
    }

    /// Complete filename before the last change
    pub fn previous_complete_filename(&self) -> Option<String> {
        self.history
            .last()
            .map(|(filename, extension)| format!("{filename}{extension}"))
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn saved_extension(&self) -> Option<&str> {
        self.saved_extension.as_deref()
    }

    /// Remember the current extension as the one on disk
    pub fn mark_saved(&mut self) {
        self.saved_extension = Some(self.extension.clone());
    }

    /// Whether the extension differs from the one last saved
    pub fn extension_changed(&self) -> bool {
        self.saved_extension
            .as_deref()
            .is_some_and(|saved| saved != self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("photo.jpg"), ("photo".into(), ".jpg".into()));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar".into(), ".gz".into()));
        assert_eq!(split_extension("README"), ("README".into(), String::new()));
        assert_eq!(split_extension(".bashrc"), (".bashrc".into(), String::new()));
    }

    #[test]
    fn test_history_tracks_changes() {
        let mut state = NamingState::new("photo.jpg");
        state.set_filename("photo (1)");
        state.set_extension(".png");
        state.set_extension(".png");

        assert_eq!(state.complete_filename(), "photo (1).png");
        assert_eq!(
            state.history(),
            &[
                ("photo".to_string(), ".jpg".to_string()),
                ("photo (1)".to_string(), ".jpg".to_string())
            ]
        );
        assert_eq!(state.previous_complete_filename().as_deref(), Some("photo (1).jpg"));
    }

    #[test]
    fn test_extension_change_detection() {
        let mut state = NamingState::new("photo.jpg");
        assert!(!state.extension_changed());

        state.mark_saved();
        state.set_extension(".png");
        assert!(state.extension_changed());
        assert_eq!(state.saved_extension(), Some(".jpg"));
    }

    #[test]
    fn test_default_renamers() {
        let registry = default_renamers();
        assert_eq!(registry.names(), vec!["linux", "unique", "windows"]);
    }

    #[test]
    fn test_candidate_round_trip() {
        let candidate = NameCandidate::new(Path::new("/d"), "photo.jpg");
        assert_eq!(candidate.filename, "photo");
        assert_eq!(candidate.extension, ".jpg");
        assert_eq!(candidate.complete_filename(), "photo.jpg");
    }
}
