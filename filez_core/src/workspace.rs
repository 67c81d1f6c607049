//! Workspaces tie the engine together
//!
//! A [`Workspace`] owns one [`Environment`]: the storage backend, the name
//! registry, the hash engine, the configuration and the processor
//! registries every pipeline resolves against. Files opened or created
//! through the same workspace share all of it.

use crate::compare::{self, CompareRegistry};
use crate::config::EngineConfig;
use crate::content::{ContainerCodec, ContentBuffer, ContentSource, LazyStream, SpillTarget};
use crate::error::IoError;
use crate::extract;
use crate::file::FileEntry;
use crate::hashing::{HashAlgorithm, HashEngine, HashProcessor};
use crate::naming::{self, NameCandidate, NameRegistry, RenamerRegistry};
use crate::package;
use crate::pipeline::{Processor, ProcessorRegistry};
use crate::storage::{LocalStorage, Storage};
use crate::Result;
use log::debug;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

mod file;

pub use file::{File, FilePipelines};

/// Registry type for processors working on one file
pub type FileRegistry = ProcessorRegistry<FileEntry, Environment>;

/// Everything pipeline processors can reach besides the file itself
pub struct Environment {
    pub storage: Arc<dyn Storage>,
    pub names: NameRegistry,
    pub hashes: HashEngine,
    pub config: EngineConfig,
    pub codecs: Vec<Arc<dyn ContainerCodec>>,
    pub extractors: Arc<FileRegistry>,
    pub hashers: Arc<FileRegistry>,
    pub comparers: Arc<CompareRegistry>,
    pub renamers: Arc<RenamerRegistry>,
    pub unpackers: Arc<FileRegistry>,
}

impl Environment {
    /// Codec handling files with `extension` (leading dot, lowercase)
    pub fn codec_for(&self, extension: &str) -> Option<Arc<dyn ContainerCodec>> {
        self.codecs
            .iter()
            .find(|codec| codec.extensions().contains(&extension))
            .cloned()
    }

    /// Where content that must be captured on disk goes
    pub fn spill_target(&self) -> SpillTarget {
        let spill = SpillTarget::new(self.storage.clone()).with_names(self.names.clone());
        match &self.config.temp_directory {
            Some(directory) => spill.in_directory(directory.clone()),
            None => spill,
        }
    }

    /// Buffer over `source` with the configured block size and cache policy
    pub fn content(&self, source: ContentSource) -> Result<ContentBuffer> {
        Ok(ContentBuffer::new(source, self.config.block_size, self.config.cache.clone())?
            .with_spill(self.spill_target()))
    }

    /// Buffer reading a stored file on first access
    pub fn stored_content(&self, path: &Path, binary: bool) -> Result<ContentBuffer> {
        self.content(ContentSource::Stream {
            stream: Box::new(LazyStream::new(self.storage.clone(), path)),
            binary,
        })
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("storage", &self.storage)
            .field("names", &self.names.len())
            .field("hashes", &self.hashes)
            .field("codecs", &self.codecs.iter().map(|codec| codec.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Handle on a shared [`Environment`]
#[derive(Debug, Clone)]
pub struct Workspace {
    env: Arc<Environment>,
}

impl Workspace {
    /// Workspace over local disk
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> WorkspaceBuilder {
        WorkspaceBuilder::default()
    }

    pub fn env(&self) -> &Arc<Environment> {
        &self.env
    }

    pub fn config(&self) -> &EngineConfig {
        &self.env.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.env.storage
    }

    pub fn names(&self) -> &NameRegistry {
        &self.env.names
    }

    pub fn hashes(&self) -> &HashEngine {
        &self.env.hashes
    }

    /// A file object with nothing set
    pub fn new_file(&self) -> File {
        File::new(self.env.clone())
    }

    /// Open a stored file and run its extract pipeline
    pub fn open(&self, path: impl AsRef<Path>) -> Result<File> {
        let path = self.env.storage.sanitize(path.as_ref());
        if !self.env.storage.is_file(&path) {
            return Err(IoError::file_not_found(&path).into());
        }

        let mut file = self.new_file();
        {
            let entry = file.entry_mut();
            entry.content = Some(self.env.stored_content(&path, true)?);
            entry.path = Some(path);
            entry.state.was_saved = true;
        }
        file.refresh()?;
        file.entry_mut().naming.mark_saved();
        debug!("Opened {}", file.entry().display_name());
        Ok(file)
    }

    /// A new file with `content`, to be saved as `complete_filename` in `directory`
    pub fn create(
        &self,
        directory: impl AsRef<Path>,
        complete_filename: &str,
        content: impl Into<ContentSource>,
    ) -> Result<File> {
        let mut file = self.new_file();
        file.set_save_to(directory.as_ref());
        file.set_complete_filename(complete_filename);
        file.set_content(content)?;
        file.entry_mut().state.adding = true;
        Ok(file)
    }
}

/// Builder for [`Workspace`]
#[derive(Default)]
pub struct WorkspaceBuilder {
    storage: Option<Arc<dyn Storage>>,
    config: Option<EngineConfig>,
    codecs: Vec<Arc<dyn ContainerCodec>>,
    extractors: Vec<Arc<dyn Processor<FileEntry, Environment>>>,
    hashers: Vec<Arc<dyn Processor<FileEntry, Environment>>>,
    comparers: Vec<Arc<dyn Processor<[FileEntry], Environment>>>,
    renamers: Vec<Arc<dyn Processor<NameCandidate, dyn Storage>>>,
    unpackers: Vec<Arc<dyn Processor<FileEntry, Environment>>>,
}

impl WorkspaceBuilder {
    /// Storage backend, local disk when unset
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Container codec used by the `package` unpacker
    pub fn codec(mut self, codec: Arc<dyn ContainerCodec>) -> Self {
        self.codecs.push(codec);
        self
    }

    pub fn extractor(mut self, processor: impl Processor<FileEntry, Environment> + 'static) -> Self {
        self.extractors.push(Arc::new(processor));
        self
    }

    pub fn hasher(mut self, processor: impl Processor<FileEntry, Environment> + 'static) -> Self {
        self.hashers.push(Arc::new(processor));
        self
    }

    pub fn comparer(mut self, processor: impl Processor<[FileEntry], Environment> + 'static) -> Self {
        self.comparers.push(Arc::new(processor));
        self
    }

    pub fn renamer(mut self, processor: impl Processor<NameCandidate, dyn Storage> + 'static) -> Self {
        self.renamers.push(Arc::new(processor));
        self
    }

    pub fn unpacker(mut self, processor: impl Processor<FileEntry, Environment> + 'static) -> Self {
        self.unpackers.push(Arc::new(processor));
        self
    }

    pub fn build(self) -> Result<Workspace> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(LocalStorage::new()) as Arc<dyn Storage>);

        let mut extractors = FileRegistry::new();
        extract::register(&mut extractors);
        add_all(&mut extractors, self.extractors);

        let mut hashers = FileRegistry::new();
        for algorithm in HashAlgorithm::ALL {
            hashers.register_instance(HashProcessor::new(algorithm));
        }
        add_all(&mut hashers, self.hashers);

        let mut comparers = CompareRegistry::new();
        compare::register(&mut comparers);
        add_all(&mut comparers, self.comparers);

        let mut renamers = naming::default_renamers();
        add_all(&mut renamers, self.renamers);

        let mut unpackers = FileRegistry::new();
        package::register(&mut unpackers);
        add_all(&mut unpackers, self.unpackers);

        let mut codecs = package::default_codecs();
        codecs.extend(self.codecs);

        Ok(Workspace {
            env: Arc::new(Environment {
                storage,
                names: NameRegistry::new(),
                hashes: HashEngine::new(),
                config,
                codecs,
                extractors: Arc::new(extractors),
                hashers: Arc::new(hashers),
                comparers: Arc::new(comparers),
                renamers: Arc::new(renamers),
                unpackers: Arc::new(unpackers),
            }),
        })
    }
}

/// Register shared instances under their own names, replacing built-ins
fn add_all<T: ?Sized + 'static, C: ?Sized + 'static>(
    registry: &mut ProcessorRegistry<T, C>,
    processors: Vec<Arc<dyn Processor<T, C>>>,
) {
    for processor in processors {
        let name = processor.name().to_string();
        registry.register(&name, move |_| Ok(processor.clone()));
    }
}
