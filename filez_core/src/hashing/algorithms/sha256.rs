//! SHA-256 hash algorithm implementation

use crate::hashing::traits::{HashAlgorithmImpl, StreamingHasher};
use sha2::{Digest, Sha256};

pub struct Sha256Algorithm;

#[derive(Clone)]
struct Sha256StreamingHasher {
    hasher: Sha256,
}

impl StreamingHasher for Sha256StreamingHasher {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    fn hex_digest(&self) -> String {
        format!("{:x}", self.hasher.clone().finalize())
    }
}

impl HashAlgorithmImpl for Sha256Algorithm {
    fn id(&self) -> &'static str {
        "sha256"
    }

    fn display_name(&self) -> &'static str {
        "SHA-256"
    }

    fn hex_len(&self) -> usize {
        64
    }

    fn create_hasher(&self) -> Box<dyn StreamingHasher> {
        Box::new(Sha256StreamingHasher {
            hasher: Sha256::new(),
        })
    }
}
