//! Comparison pipeline steps
//!
//! Each comparer looks at a subject file followed by the files it is
//! compared to. Cheap checks come first and stop the pipeline on the first
//! difference; the hash and data comparers settle the question either way.

use crate::content::ContentBuffer;
use crate::file::FileEntry;
use crate::hashing::HashAlgorithm;
use crate::pipeline::{Outcome, Params, Processor, ProcessorRegistry, StopValue};
use crate::workspace::Environment;
use crate::Result;
use log::debug;

/// Registry type for comparers
pub type CompareRegistry = ProcessorRegistry<[FileEntry], Environment>;

/// Register the built-in comparers
pub fn register(registry: &mut CompareRegistry) {
    registry.register_instance(SizeComparer);
    registry.register_instance(BinaryComparer);
    registry.register_instance(NameComparer);
    registry.register_instance(HashComparer);
    registry.register_instance(DataComparer);
}

/// `Some(true)` when every value equals the first, `None` if any is unknown
fn all_equal<V: PartialEq>(values: impl IntoIterator<Item = Option<V>>) -> Outcome {
    let mut values = values.into_iter();
    let first = values.next()??;
    for value in values {
        if value? != first {
            return Some(false);
        }
    }
    Some(true)
}

fn stop_on_difference() -> StopValue {
    StopValue::Single(Some(false))
}

fn decisive() -> StopValue {
    StopValue::AnyOf(vec![Some(true), Some(false)])
}

/// Files of different sizes differ
#[derive(Debug, Default, Clone, Copy)]
pub struct SizeComparer;

impl Processor<[FileEntry], Environment> for SizeComparer {
    fn name(&self) -> &str {
        "size"
    }

    fn process(&self, entries: &mut [FileEntry], _env: &Environment, _params: &Params) -> Result<Outcome> {
        Ok(all_equal(entries.iter().map(|entry| entry.meta.size)))
    }

    fn stopper(&self) -> bool {
        true
    }

    fn stop_value(&self) -> StopValue {
        stop_on_difference()
    }
}

/// Text never equals binary content
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryComparer;

impl Processor<[FileEntry], Environment> for BinaryComparer {
    fn name(&self) -> &str {
        "binary"
    }

    fn process(&self, entries: &mut [FileEntry], _env: &Environment, _params: &Params) -> Result<Outcome> {
        Ok(all_equal(entries.iter().map(FileEntry::is_binary)))
    }

    fn stopper(&self) -> bool {
        true
    }

    fn stop_value(&self) -> StopValue {
        stop_on_difference()
    }
}

/// Same complete filename
#[derive(Debug, Default, Clone, Copy)]
pub struct NameComparer;

impl Processor<[FileEntry], Environment> for NameComparer {
    fn name(&self) -> &str {
        "name"
    }

    fn process(&self, entries: &mut [FileEntry], _env: &Environment, _params: &Params) -> Result<Outcome> {
        Ok(all_equal(entries.iter().map(|entry| {
            let name = entry.complete_filename();
            (!name.is_empty()).then_some(name)
        })))
    }

    fn stopper(&self) -> bool {
        true
    }

    fn stop_value(&self) -> StopValue {
        stop_on_difference()
    }
}

/// Digests under every algorithm all files have a record for.
///
/// Any mismatch means the files differ; they are equal only when every
/// shared algorithm agrees.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashComparer;

impl HashComparer {
    fn common_algorithms(entries: &[FileEntry]) -> Vec<HashAlgorithm> {
        let Some((subject, others)) = entries.split_first() else {
            return Vec::new();
        };
        subject
            .hashes
            .algorithms()
            .into_iter()
            .filter(|algorithm| others.iter().all(|other| other.hashes.contains(*algorithm)))
            .collect()
    }
}

impl Processor<[FileEntry], Environment> for HashComparer {
    fn name(&self) -> &str {
        "hash"
    }

    fn process(&self, entries: &mut [FileEntry], _env: &Environment, _params: &Params) -> Result<Outcome> {
        let algorithms = Self::common_algorithms(entries);
        if algorithms.is_empty() {
            return Ok(None);
        }
        debug!("Comparing {} files by {} algorithm(s)", entries.len(), algorithms.len());

        let mut outcome = None;
        for algorithm in algorithms {
            let equal = all_equal(entries.iter().map(|entry| {
                entry.hashes.digest(algorithm).map(str::to_ascii_lowercase)
            }));
            match equal {
                Some(false) => return Ok(Some(false)),
                Some(true) => outcome = Some(true),
                None => {}
            }
        }
        Ok(outcome)
    }

    fn stopper(&self) -> bool {
        true
    }

    fn stop_value(&self) -> StopValue {
        decisive()
    }
}

/// Byte-for-byte comparison, block by block.
///
/// Every buffer is read with the smallest block size among them, and gets
/// its own block size back afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataComparer;

impl DataComparer {
    fn compare_blocks(contents: &mut [&mut ContentBuffer]) -> Result<bool> {
        let Some((subject, others)) = contents.split_first_mut() else {
            return Ok(true);
        };
        loop {
            let expected = subject.next_block()?;
            for other in others.iter_mut() {
                if other.next_block()? != expected {
                    return Ok(false);
                }
            }
            if expected.is_none() {
                return Ok(true);
            }
        }
    }
}

impl Processor<[FileEntry], Environment> for DataComparer {
    fn name(&self) -> &str {
        "data"
    }

    fn process(&self, entries: &mut [FileEntry], _env: &Environment, _params: &Params) -> Result<Outcome> {
        let mut contents = Vec::with_capacity(entries.len());
        for entry in entries.iter_mut() {
            match entry.content.as_mut() {
                Some(content) => contents.push(content),
                None => return Ok(None),
            }
        }
        if contents.len() < 2 {
            return Ok(None);
        }

        let block_sizes: Vec<usize> = contents.iter().map(|content| content.block_size()).collect();
        let block_size = block_sizes.iter().copied().min().unwrap_or(1);
        for content in contents.iter_mut() {
            content.reset()?;
            content.set_block_size(block_size)?;
        }

        let same = Self::compare_blocks(&mut contents);

        for (content, original) in contents.iter_mut().zip(block_sizes) {
            content.reset()?;
            content.set_block_size(original)?;
        }
        Ok(Some(same?))
    }

    fn stopper(&self) -> bool {
        true
    }

    fn stop_value(&self) -> StopValue {
        decisive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::hashing::HashRecord;
    use crate::storage::LocalStorage;
    use crate::workspace::Workspace;
    use std::sync::Arc;

    fn workspace() -> Workspace {
        Workspace::builder()
            .storage(Arc::new(LocalStorage::new()))
            .config(EngineConfig::test())
            .build()
            .unwrap()
    }

    fn text_entry(name: &str, text: &str, block_size: usize) -> FileEntry {
        let mut entry = FileEntry::default();
        entry.naming.set_complete_filename(name);
        entry.meta.size = Some(text.len() as u64);
        entry.content = Some(ContentBuffer::from_text(text, block_size).unwrap());
        entry
    }

    #[test]
    fn test_all_equal() {
        assert_eq!(all_equal([Some(1), Some(1)]), Some(true));
        assert_eq!(all_equal([Some(1), Some(2)]), Some(false));
        assert_eq!(all_equal([Some(1), None]), None);
        assert_eq!(all_equal(Vec::<Option<u8>>::new()), None);
    }

    #[test]
    fn test_size_and_binary() {
        let workspace = workspace();
        let mut entries = vec![text_entry("a.txt", "abc", 4), text_entry("b.txt", "abcd", 4)];
        assert_eq!(
            SizeComparer.process(&mut entries, workspace.env(), &Params::new()).unwrap(),
            Some(false)
        );

        entries[1] = text_entry("b.txt", "abd", 4);
        entries[1].content = Some(ContentBuffer::from_bytes(b"abd".to_vec(), 4).unwrap());
        assert_eq!(
            BinaryComparer.process(&mut entries, workspace.env(), &Params::new()).unwrap(),
            Some(false)
        );
    }

    #[test]
    fn test_hash_uses_common_algorithm() {
        let workspace = workspace();
        let mut a = text_entry("a.txt", "abc", 4);
        let mut b = text_entry("b.txt", "abc", 4);
        a.hashes.insert(HashRecord::computed(HashAlgorithm::Md5, "AA".into(), "a.txt"));
        a.hashes.insert(HashRecord::computed(HashAlgorithm::Sha1, "bb".into(), "a.txt"));
        b.hashes.insert(HashRecord::computed(HashAlgorithm::Sha1, "BB".into(), "b.txt"));
        let mut entries = vec![a, b];

        assert_eq!(
            HashComparer.process(&mut entries, workspace.env(), &Params::new()).unwrap(),
            Some(true)
        );

        entries[1].hashes.clear();
        assert_eq!(
            HashComparer.process(&mut entries, workspace.env(), &Params::new()).unwrap(),
            None
        );
    }

    #[test]
    fn test_hash_checks_every_shared_algorithm() {
        let workspace = workspace();
        let mut a = text_entry("a.txt", "abc", 4);
        let mut b = text_entry("b.txt", "abd", 4);
        for (entry, sha1) in [(&mut a, "aa"), (&mut b, "bb")] {
            entry.hashes.insert(HashRecord::computed(HashAlgorithm::Md5, "same".into(), "x"));
            entry.hashes.insert(HashRecord::computed(HashAlgorithm::Sha1, sha1.into(), "x"));
        }
        let mut entries = vec![a, b];

        assert_eq!(
            HashComparer.process(&mut entries, workspace.env(), &Params::new()).unwrap(),
            Some(false)
        );
    }

    #[test]
    fn test_data_with_mixed_block_sizes() {
        let workspace = workspace();
        let mut entries = vec![
            text_entry("a.txt", "hello world", 3),
            text_entry("b.txt", "hello world", 5),
        ];

        let outcome = DataComparer.process(&mut entries, workspace.env(), &Params::new()).unwrap();

        assert_eq!(outcome, Some(true));
        assert_eq!(entries[0].content.as_ref().unwrap().block_size(), 3);
        assert_eq!(entries[1].content.as_ref().unwrap().block_size(), 5);
    }

    #[test]
    fn test_data_difference_leaves_buffers_replayable() {
        let workspace = workspace();
        let mut entries = vec![
            text_entry("a.txt", "hello world", 4),
            text_entry("b.txt", "hello there", 4),
        ];

        let outcome = DataComparer.process(&mut entries, workspace.env(), &Params::new()).unwrap();

        assert_eq!(outcome, Some(false));
        assert_eq!(
            entries[0].content.as_mut().unwrap().full_text().unwrap(),
            "hello world"
        );
    }

    #[test]
    fn test_data_needs_content() {
        let workspace = workspace();
        let mut entries = vec![text_entry("a.txt", "x", 4), FileEntry::default()];
        assert_eq!(
            DataComparer.process(&mut entries, workspace.env(), &Params::new()).unwrap(),
            None
        );
    }
}
