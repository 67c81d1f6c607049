//! Streams and reference digests for content tests

use filez_core::content::{ContentSource, ContentStream};
use filez_core::HashAlgorithm;
use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared counters of a [`CountingStream`]
#[derive(Debug, Default)]
pub struct StreamStats {
    bytes: AtomicUsize,
    reads: AtomicUsize,
    rewinds: AtomicUsize,
}

impl StreamStats {
    /// Bytes handed out by the underlying stream
    pub fn bytes(&self) -> usize {
        self.bytes.load(Ordering::SeqCst)
    }

    /// Non-empty reads from the underlying stream
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn rewinds(&self) -> usize {
        self.rewinds.load(Ordering::SeqCst)
    }
}

/// Stream wrapper recording how much of its source was consumed
///
/// With `seekable` false it behaves like a pipe: rewinding fails, so any
/// replay must come from the buffer's own capture.
pub struct CountingStream {
    data: io::Cursor<Vec<u8>>,
    seekable: bool,
    stats: Arc<StreamStats>,
}

impl CountingStream {
    pub fn new(data: impl Into<Vec<u8>>, seekable: bool) -> Self {
        Self {
            data: io::Cursor::new(data.into()),
            seekable,
            stats: Arc::new(StreamStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<StreamStats> {
        self.stats.clone()
    }

    /// Content source over this stream, returning the counters alongside
    pub fn into_source(self, binary: bool) -> (ContentSource, Arc<StreamStats>) {
        let stats = self.stats();
        (
            ContentSource::Stream {
                stream: Box::new(self),
                binary,
            },
            stats,
        )
    }
}

impl Read for CountingStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.data.read(buf)?;
        if read > 0 {
            self.stats.bytes.fetch_add(read, Ordering::SeqCst);
            self.stats.reads.fetch_add(1, Ordering::SeqCst);
        }
        Ok(read)
    }
}

impl ContentStream for CountingStream {
    fn seekable(&self) -> bool {
        self.seekable
    }

    fn seek_start(&mut self) -> io::Result<()> {
        if !self.seekable {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "stream is not seekable"));
        }
        self.stats.rewinds.fetch_add(1, Ordering::SeqCst);
        self.data.set_position(0);
        Ok(())
    }
}

/// Known digest of `"abc"`
pub fn abc_digest(algorithm: HashAlgorithm) -> &'static str {
    match algorithm {
        HashAlgorithm::Md5 => "900150983cd24fb0d6963f7d28e17f72",
        HashAlgorithm::Sha1 => "a9993e364706816aba3e25717850c26c9cd0d89d",
        HashAlgorithm::Sha256 => "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        HashAlgorithm::Crc32 => "352441c2",
    }
}

/// Known digest of empty content
pub fn empty_digest(algorithm: HashAlgorithm) -> &'static str {
    match algorithm {
        HashAlgorithm::Md5 => "d41d8cd98f00b204e9800998ecf8427e",
        HashAlgorithm::Sha1 => "da39a3ee5e6b4b0d3255bfef95601890afd80709",
        HashAlgorithm::Sha256 => "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        HashAlgorithm::Crc32 => "00000000",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_stream() {
        let mut stream = CountingStream::new("abcdef", false);
        let stats = stream.stats();

        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 4);
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);

        assert_eq!(stats.bytes(), 6);
        assert_eq!(stats.reads(), 2);
        assert!(stream.seek_start().is_err());
    }

    #[test]
    fn test_reference_digests_match_engine() {
        for algorithm in HashAlgorithm::ALL {
            assert_eq!(algorithm.hash_bytes(b"abc"), abc_digest(algorithm));
            assert_eq!(algorithm.hash_bytes(b""), empty_digest(algorithm));
        }
    }
}
