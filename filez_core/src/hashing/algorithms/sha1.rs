//! SHA-1 hash algorithm implementation

use crate::hashing::traits::{HashAlgorithmImpl, StreamingHasher};
use sha1::{Digest, Sha1};

pub struct Sha1Algorithm;

/// SHA-1 streaming hasher
#[derive(Clone)]
struct Sha1StreamingHasher {
    hasher: Sha1,
}

impl StreamingHasher for Sha1StreamingHasher {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    fn hex_digest(&self) -> String {
        format!("{:x}", self.hasher.clone().finalize())
    }
}

impl HashAlgorithmImpl for Sha1Algorithm {
    fn id(&self) -> &'static str {
        "sha1"
    }

    fn display_name(&self) -> &'static str {
        "SHA-1"
    }

    fn hex_len(&self) -> usize {
        40
    }

    fn create_hasher(&self) -> Box<dyn StreamingHasher> {
        Box::new(Sha1StreamingHasher { hasher: Sha1::new() })
    }
}
