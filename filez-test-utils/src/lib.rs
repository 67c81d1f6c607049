//! Test utilities for the filez engine
//!
//! This crate provides an in-memory storage backend, a container codec,
//! counting streams and builders for testing the engine.

pub mod builders;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use builders::{TestFileBuilder, WorkspaceFixture, deterministic_bytes};
pub use fixtures::{CountingStream, StreamStats, abc_digest, empty_digest};
pub use mocks::{BundleCodec, MemoryStorage};
