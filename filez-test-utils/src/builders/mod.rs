//! Builders for test scenarios

mod test_data;

pub use test_data::{TestFileBuilder, WorkspaceFixture, deterministic_bytes};
