//! Core traits for the hash algorithm extensibility system

use std::sync::Arc;

/// Core trait that all hash algorithms must implement
pub trait HashAlgorithmImpl: Send + Sync {
    /// Unique identifier, also the sidecar file extension
    fn id(&self) -> &'static str;

    /// Display name for user interfaces
    fn display_name(&self) -> &'static str;

    /// Length of the hex digest
    fn hex_len(&self) -> usize;

    /// Create a new streaming hasher instance
    fn create_hasher(&self) -> Box<dyn StreamingHasher>;

    /// Calculate hash for in-memory data
    fn hash_bytes(&self, data: &[u8]) -> String {
        let mut hasher = self.create_hasher();
        hasher.update(data);
        hasher.hex_digest()
    }
}

/// Incremental digest state.
///
/// `hex_digest` does not consume the state, so a digest can be taken and
/// more data fed afterwards.
pub trait StreamingHasher: Send {
    /// Feed the next block
    fn update(&mut self, data: &[u8]);

    /// Hex digest of everything fed so far
    fn hex_digest(&self) -> String;
}

/// Extension trait for HashAlgorithm enum to provide adapter to the trait system
pub trait HashAlgorithmExt {
    /// Convert enum to trait implementation
    fn to_impl(&self) -> Arc<dyn HashAlgorithmImpl>;
}
