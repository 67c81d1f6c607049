//! Replay behaviour of content buffers over seekable and forward-only sources

use filez_core::content::SpillTarget;
use filez_core::{CacheConfig, ContentBuffer, Storage};
use filez_test_utils::{CountingStream, MemoryStorage};
use proptest::prelude::*;
use std::path::Path;
use std::sync::Arc;

fn collect_pass(buffer: &mut ContentBuffer) -> Vec<Vec<u8>> {
    buffer.blocks().collect::<filez_core::Result<Vec<_>>>().unwrap()
}

#[test]
fn test_forward_only_source_replays_from_capture() {
    let (source, stats) = CountingStream::new("abc", false).into_source(false);
    let mut buffer = ContentBuffer::new(source, 1, CacheConfig::default()).unwrap();

    let expected = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
    assert_eq!(collect_pass(&mut buffer), expected);
    assert!(buffer.is_cached());
    assert_eq!(collect_pass(&mut buffer), expected);
    assert_eq!(buffer.full_text().unwrap(), "abc");

    assert_eq!(stats.bytes(), 3);
}

#[test]
fn test_interrupted_pass_keeps_every_byte() {
    let (source, stats) = CountingStream::new("abcdef", false).into_source(true);
    let mut buffer = ContentBuffer::new(source, 2, CacheConfig::default()).unwrap();

    assert_eq!(buffer.next_block().unwrap(), Some(b"ab".to_vec()));
    buffer.reset().unwrap();

    assert_eq!(buffer.full_content().unwrap(), b"abcdef");
    assert_eq!(buffer.full_content().unwrap(), b"abcdef");
    assert_eq!(stats.bytes(), 6);
}

#[test]
fn test_seekable_source_is_rewound_not_cached() {
    let (source, stats) = CountingStream::new("abcd", true).into_source(true);
    let mut buffer = ContentBuffer::new(source, 3, CacheConfig::default()).unwrap();

    assert!(!buffer.is_caching());
    assert_eq!(collect_pass(&mut buffer).concat(), b"abcd");
    assert_eq!(collect_pass(&mut buffer).concat(), b"abcd");

    assert!(!buffer.is_cached());
    assert_eq!(stats.bytes(), 8);
    assert!(stats.rewinds() >= 1);
}

#[test]
fn test_forced_cache_reads_seekable_source_once() {
    let policy = CacheConfig {
        force: true,
        ..CacheConfig::default()
    };
    let (source, stats) = CountingStream::new("abcd", true).into_source(true);
    let mut buffer = ContentBuffer::new(source, 3, policy).unwrap();

    collect_pass(&mut buffer);
    collect_pass(&mut buffer);

    assert!(buffer.is_cached());
    assert_eq!(stats.bytes(), 4);
}

#[test]
fn test_file_capture_goes_through_storage() {
    let storage = Arc::new(MemoryStorage::new());
    let policy = CacheConfig {
        cache_in_memory: false,
        cache_in_file: true,
        force: false,
    };
    let (source, stats) = CountingStream::new("hello world", false).into_source(false);
    let mut buffer = ContentBuffer::new(source, 4, policy)
        .unwrap()
        .with_spill(SpillTarget::new(storage.clone()));

    assert_eq!(buffer.full_text().unwrap(), "hello world");
    let temp_files: Vec<_> = storage
        .paths()
        .into_iter()
        .filter(|path| path.starts_with(storage.temp_directory()))
        .collect();
    assert_eq!(temp_files.len(), 1);

    assert_eq!(buffer.full_text().unwrap(), "hello world");
    assert_eq!(stats.bytes(), 11);

    buffer.close();
    assert!(!storage.is_file(&temp_files[0]));
    assert!(!storage.exists(Path::new("/tmp/filez")));
}

#[test]
fn test_file_capture_opens_its_cache_file_once() {
    let storage = Arc::new(MemoryStorage::new());
    let policy = CacheConfig {
        cache_in_memory: false,
        cache_in_file: true,
        force: false,
    };
    let (source, _stats) = CountingStream::new("0123456789abcdef", false).into_source(true);
    let mut buffer = ContentBuffer::new(source, 2, policy)
        .unwrap()
        .with_spill(SpillTarget::new(storage.clone()));

    assert_eq!(collect_pass(&mut buffer).len(), 8);
    let cache = storage
        .paths()
        .into_iter()
        .find(|path| path.starts_with(storage.temp_directory()))
        .unwrap();
    assert_eq!(storage.write_count(&cache), 1);
    assert_eq!(storage.read_text(&cache).unwrap(), "0123456789abcdef");
    assert_eq!(buffer.full_text().unwrap(), "0123456789abcdef");
}

#[test]
fn test_interrupted_file_capture_is_recaptured() {
    let storage = Arc::new(MemoryStorage::new());
    let policy = CacheConfig {
        cache_in_memory: false,
        cache_in_file: true,
        force: false,
    };
    let (source, stats) = CountingStream::new("abcdefgh", false).into_source(true);
    let mut buffer = ContentBuffer::new(source, 3, policy)
        .unwrap()
        .with_spill(SpillTarget::new(storage.clone()));

    assert_eq!(buffer.next_block().unwrap(), Some(b"abc".to_vec()));
    buffer.reset().unwrap();
    assert_eq!(buffer.full_text().unwrap(), "abcdefgh");
    assert_eq!(buffer.full_text().unwrap(), "abcdefgh");
    assert_eq!(stats.bytes(), 8);

    let caches: Vec<_> = storage
        .paths()
        .into_iter()
        .filter(|path| path.starts_with(storage.temp_directory()))
        .collect();
    assert_eq!(caches.len(), 1);
}

#[test]
fn test_closed_buffer_rejects_reads() {
    let mut buffer = ContentBuffer::from_text("abc", 2).unwrap();
    buffer.close();
    assert!(buffer.is_closed());
    assert!(buffer.full_content().is_err());
}

proptest! {
    #[test]
    fn prop_every_pass_yields_the_source(
        data in proptest::collection::vec(any::<u8>(), 1..512),
        block_size in 1usize..64,
        seekable in any::<bool>(),
        force in any::<bool>(),
        interrupt_after in 0usize..4,
    ) {
        let policy = CacheConfig { force, ..CacheConfig::default() };
        let (source, _stats) = CountingStream::new(data.clone(), seekable).into_source(true);
        let mut buffer = ContentBuffer::new(source, block_size, policy).unwrap();

        for _ in 0..interrupt_after {
            if buffer.next_block().unwrap().is_none() {
                break;
            }
        }
        buffer.reset().unwrap();

        for _ in 0..2 {
            let blocks = collect_pass(&mut buffer);
            prop_assert!(blocks.iter().all(|block| !block.is_empty() && block.len() <= block_size));
            prop_assert_eq!(blocks.concat(), data.clone());
        }
    }
}
