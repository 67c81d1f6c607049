//! Hash algorithm implementations

use super::HashAlgorithm;
use super::traits::HashAlgorithmImpl;
use std::sync::Arc;

mod crc32;
mod md5;
mod sha1;
mod sha256;

pub use crc32::Crc32Accumulator;

/// Implementation backing a built-in algorithm
pub(crate) fn builtin(algorithm: HashAlgorithm) -> Arc<dyn HashAlgorithmImpl> {
    match algorithm {
        HashAlgorithm::Md5 => Arc::new(md5::Md5Algorithm),
        HashAlgorithm::Sha1 => Arc::new(sha1::Sha1Algorithm),
        HashAlgorithm::Sha256 => Arc::new(sha256::Sha256Algorithm),
        HashAlgorithm::Crc32 => Arc::new(crc32::Crc32Algorithm),
    }
}
