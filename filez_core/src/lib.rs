//! filez core library
//!
//! File objects with replayable content, collision-free naming and
//! sidecar-aware hashing. Everything a file does runs through declarative
//! processor pipelines:
//!
//! - `extract` fills in name, metadata and sidecar digests of a stored file
//! - `hasher` computes or loads digests
//! - `rename` resolves name collisions
//! - `compare` decides whether files hold the same data
//! - `unpack` lists the members of container files
//!
//! A [`Workspace`] owns the state those pipelines share: storage backend,
//! name registry, hash engine and processor registries.

pub mod compare;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod file;
pub mod hashing;
pub mod naming;
pub mod package;
pub mod pipeline;
pub mod storage;
pub mod workspace;

// Re-export main types
pub use config::{CacheConfig, DEFAULT_BLOCK_SIZE, EngineConfig, FileOptions, PipelinesConfig};
pub use content::{ContainerCodec, ContentBuffer, ContentSource, ContentStream, MemberInfo};
pub use error::{Error, Result};
pub use file::{FileEntry, FileId, FileMeta, FileState};
pub use hashing::{FileHashes, HashAlgorithm, HashEngine, HashRecord};
pub use naming::{NameCandidate, NameRegistry, NamingState};
pub use pipeline::{KeywordOverrides, Outcome, Params, Pipeline, PipelineTarget, Processor, ProcessorRegistry, StopValue};
pub use storage::{LocalStorage, SaveMode, Storage};
pub use workspace::{Environment, File, Workspace, WorkspaceBuilder};
