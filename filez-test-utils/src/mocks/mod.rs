//! Mock implementations for testing

mod codec;
mod storage;

pub use codec::BundleCodec;
pub use storage::MemoryStorage;
