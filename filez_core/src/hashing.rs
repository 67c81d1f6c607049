//! Hash calculation for the filez engine
//!
//! This module contains the hash algorithm implementations, the per-file hash
//! records, sidecar checksum file lookup and the shared [`HashEngine`].

use crate::{Error, Result, error::ValidationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod algorithms;
mod engine;
mod processor;
mod record;
pub mod sidecar;
mod traits;

pub use algorithms::Crc32Accumulator;
pub use engine::HashEngine;
pub use processor::HashProcessor;
pub use record::{FileHashes, HashFile, HashRecord};
pub use sidecar::SidecarHit;
pub use traits::{HashAlgorithmExt, HashAlgorithmImpl, StreamingHasher};

/// Hash algorithms supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5 hash algorithm
    Md5,
    /// SHA-1 hash algorithm
    Sha1,
    /// SHA-256 hash algorithm
    Sha256,
    /// CRC32 checksum
    Crc32,
}

impl HashAlgorithm {
    /// Every built-in algorithm
    pub const ALL: [HashAlgorithm; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Crc32];

    /// Identifier, also used as the sidecar file extension
    pub fn id(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Crc32 => "crc32",
        }
    }

    /// Sidecar extension with its dot
    pub fn extension(&self) -> String {
        format!(".{}", self.id())
    }

    /// Hash in-memory data in one pass
    pub fn hash_bytes(&self, data: &[u8]) -> String {
        self.to_impl().hash_bytes(data)
    }

    /// Whether `digest` looks like a digest of this algorithm
    pub fn is_digest(&self, digest: &str) -> bool {
        digest.len() == self.to_impl().hex_len() && digest.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "crc32" => Ok(HashAlgorithm::Crc32),
            _ => Err(Error::Validation(ValidationError::invalid_configuration(
                &format!("Unknown hash algorithm: {s}"),
            ))),
        }
    }
}

impl HashAlgorithmExt for HashAlgorithm {
    fn to_impl(&self) -> Arc<dyn HashAlgorithmImpl> {
        algorithms::builtin(*self)
    }
}
