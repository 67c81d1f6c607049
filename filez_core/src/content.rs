//! Content buffering and caching
//!
//! Turns text, bytes and (possibly non-seekable) streams into replayable,
//! block-iterable content.

mod buffer;
mod nested;
mod stream;

pub use buffer::{Blocks, ContentBuffer, ContentReader, ContentSource, SpillTarget};
pub use nested::{ContainerCodec, ContainerOrigin, MemberInfo, NestedBuffer};
pub use stream::{ContentStream, LazyStream, NonSeekable};
