//! CRC32 hash algorithm implementation
//!
//! CRC32 has no digest object of its own; it is kept as a running value that
//! each block is folded into, behind the same `update`/`hex_digest` contract
//! as the cryptographic algorithms.

use crate::hashing::traits::{HashAlgorithmImpl, StreamingHasher};
use crc32fast::Hasher as Crc32Hasher;

pub struct Crc32Algorithm;

/// CRC32 running value
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Accumulator {
    crc32: u32,
}

impl Crc32Accumulator {
    pub fn value(&self) -> u32 {
        self.crc32
    }
}

impl StreamingHasher for Crc32Accumulator {
    fn update(&mut self, data: &[u8]) {
        let mut hasher = Crc32Hasher::new_with_initial(self.crc32);
        hasher.update(data);
        self.crc32 = hasher.finalize();
    }

    fn hex_digest(&self) -> String {
        format!("{:08x}", self.crc32)
    }
}

impl HashAlgorithmImpl for Crc32Algorithm {
    fn id(&self) -> &'static str {
        "crc32"
    }

    fn display_name(&self) -> &'static str {
        "CRC32"
    }

    fn hex_len(&self) -> usize {
        8
    }

    fn create_hasher(&self) -> Box<dyn StreamingHasher> {
        Box::new(Crc32Accumulator::default())
    }
}
