//! Lazily decoded view over one member of a container

use super::stream::ContentStream;
use crate::storage::Storage;
use crate::Result;
use log::debug;
use std::fmt::{self, Debug};
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

/// One entry listed by a [`ContainerCodec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: String,
    pub size: u64,
}

/// Format-specific archive decoding
pub trait ContainerCodec: Send + Sync + Debug {
    /// Short identifier used in error messages and processor parameters
    fn name(&self) -> &str;

    /// Extensions (with leading dot) this codec understands
    fn extensions(&self) -> &[&str];

    /// Regular file members of the container, in archive order
    fn list_members(&self, container: &[u8]) -> Result<Vec<MemberInfo>>;

    /// Decoded bytes of one member
    fn extract_member(&self, container: &[u8], member: &str) -> Result<Vec<u8>>;
}

/// Where a nested buffer finds its container again
#[derive(Clone)]
pub enum ContainerOrigin {
    Stored {
        storage: Arc<dyn Storage>,
        path: PathBuf,
    },
    Memory(Arc<[u8]>),
}

impl ContainerOrigin {
    /// The complete container bytes
    pub fn load(&self) -> Result<Arc<[u8]>> {
        match self {
            Self::Stored { storage, path } => {
                let mut data = Vec::new();
                storage.open(path)?.read_to_end(&mut data)?;
                Ok(Arc::from(data))
            }
            Self::Memory(data) => Ok(data.clone()),
        }
    }
}

impl Debug for ContainerOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored { path, .. } => f.debug_tuple("Stored").field(path).finish(),
            Self::Memory(data) => write!(f, "Memory({} bytes)", data.len()),
        }
    }
}

/// Read-only content of one container member.
///
/// The container is reopened and the member decoded on the first `read`,
/// at most once. Rewinding and closing before that are no-ops.
pub struct NestedBuffer {
    origin: ContainerOrigin,
    codec: Arc<dyn ContainerCodec>,
    member: String,
    inner: Option<Cursor<Vec<u8>>>,
    closed: bool,
}

impl NestedBuffer {
    pub fn new(origin: ContainerOrigin, codec: Arc<dyn ContainerCodec>, member: impl Into<String>) -> Self {
        Self {
            origin,
            codec,
            member: member.into(),
            inner: None,
            closed: false,
        }
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn is_decoded(&self) -> bool {
        self.inner.is_some()
    }

    /// Drop the decoded member
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            self.closed = true;
        }
    }

    fn decoded(&mut self) -> io::Result<&mut Cursor<Vec<u8>>> {
        if self.closed {
            return Err(io::Error::other("container member was closed"));
        }
        match &mut self.inner {
            Some(inner) => Ok(inner),
            slot => {
                debug!("Decoding member '{}' with {}", self.member, self.codec.name());
                let container = self.origin.load().map_err(io::Error::other)?;
                let data = self
                    .codec
                    .extract_member(&container, &self.member)
                    .map_err(io::Error::other)?;
                Ok(slot.insert(Cursor::new(data)))
            }
        }
    }
}

impl Debug for NestedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedBuffer")
            .field("origin", &self.origin)
            .field("codec", &self.codec.name())
            .field("member", &self.member)
            .field("decoded", &self.is_decoded())
            .finish()
    }
}

impl Read for NestedBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decoded()?.read(buf)
    }
}

impl ContentStream for NestedBuffer {
    // decoded members always land in memory, so they can always be replayed
    fn seekable(&self) -> bool {
        true
    }

    fn seek_start(&mut self) -> io::Result<()> {
        if let Some(inner) = &mut self.inner {
            inner.set_position(0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InternalError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// `name=value` per line
    #[derive(Debug, Default)]
    struct LineCodec {
        extracts: AtomicUsize,
    }

    impl ContainerCodec for LineCodec {
        fn name(&self) -> &str {
            "lines"
        }

        fn extensions(&self) -> &[&str] {
            &[".lines"]
        }

        fn list_members(&self, container: &[u8]) -> Result<Vec<MemberInfo>> {
            Ok(String::from_utf8_lossy(container)
                .lines()
                .filter_map(|line| line.split_once('='))
                .map(|(name, value)| MemberInfo {
                    name: name.to_string(),
                    size: value.len() as u64,
                })
                .collect())
        }

        fn extract_member(&self, container: &[u8], member: &str) -> Result<Vec<u8>> {
            self.extracts.fetch_add(1, Ordering::SeqCst);
            String::from_utf8_lossy(container)
                .lines()
                .filter_map(|line| line.split_once('='))
                .find(|(name, _)| *name == member)
                .map(|(_, value)| value.as_bytes().to_vec())
                .ok_or_else(|| InternalError::codec("lines", format!("no member {member}")).into())
        }
    }

    #[test]
    fn test_decodes_once_on_first_read() {
        let codec = Arc::new(LineCodec::default());
        let origin = ContainerOrigin::Memory(Arc::from(&b"a=hello\nb=world"[..]));
        let mut nested = NestedBuffer::new(origin, codec.clone(), "b");

        nested.seek_start().unwrap();
        assert!(!nested.is_decoded());
        assert_eq!(codec.extracts.load(Ordering::SeqCst), 0);

        let mut first = String::new();
        nested.read_to_string(&mut first).unwrap();
        nested.seek_start().unwrap();
        let mut second = String::new();
        nested.read_to_string(&mut second).unwrap();

        assert_eq!(first, "world");
        assert_eq!(second, "world");
        assert_eq!(codec.extracts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_before_read_is_noop() {
        let codec = Arc::new(LineCodec::default());
        let origin = ContainerOrigin::Memory(Arc::from(&b"a=1"[..]));
        let mut nested = NestedBuffer::new(origin, codec, "a");

        nested.close();
        let mut out = String::new();
        nested.read_to_string(&mut out).unwrap();
        assert_eq!(out, "1");

        nested.close();
        assert!(nested.read_to_string(&mut out).is_err());
    }

    #[test]
    fn test_missing_member_surfaces_error() {
        let codec = Arc::new(LineCodec::default());
        let origin = ContainerOrigin::Memory(Arc::from(&b"a=1"[..]));
        let mut nested = NestedBuffer::new(origin, codec, "zzz");

        let mut out = Vec::new();
        assert!(nested.read_to_end(&mut out).is_err());
    }
}
