//! # Byte Streams
//!
//! [`ByteStream`] is the opaque binary payload that travels beside a JSON
//! document instead of being base64-inlined into it. Inside the document the
//! stream is replaced by a token issued by the active
//! [`BinaryChannel`](crate::channel::BinaryChannel).
//!
//! Streams compare by identity: two handles are the same stream only when
//! they are clones of one another, regardless of content.

use std::fmt;
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::channel;

type Source = Box<dyn Read + Send>;

/// Cloneable, thread-safe handle over a readable byte source.
#[derive(Clone)]
pub struct ByteStream {
    inner: Arc<Mutex<Source>>,
}

impl ByteStream {
    /// Wrap any reader.
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(reader))),
        }
    }

    /// Stream over an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(Cursor::new(bytes.into()))
    }

    /// Identity of the underlying source. Stable for as long as any clone
    /// of this handle is alive.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Returns true if both handles refer to the same source.
    pub fn ptr_eq(&self, other: &ByteStream) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Drain the remaining bytes of the source.
    pub fn read_to_end(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.inner.lock().read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Copy the remaining bytes of the source into `writer`.
    pub fn copy_to(&self, writer: &mut impl Write) -> io::Result<u64> {
        let mut source = self.inner.lock();
        io::copy(&mut *source, writer)
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.lock().read(buf)
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream")
            .field("identity", &self.identity())
            .finish()
    }
}

impl PartialEq for ByteStream {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ByteStream {}

/// Writes the token issued by the active channel in place of the bytes.
impl Serialize for ByteStream {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match channel::active() {
            Some(channel) => serializer.serialize_str(&channel.add_stream(self)),
            None => Err(<S::Error as serde::ser::Error>::custom(
                "byte stream serialized outside of a codec call; no binary channel is active",
            )),
        }
    }
}

/// Resolves a token against the active channel.
impl<'de> Deserialize<'de> for ByteStream {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        let channel = channel::active().ok_or_else(|| {
            <D::Error as serde::de::Error>::custom(
                "byte stream token decoded outside of a codec call",
            )
        })?;
        channel.lookup(&token).ok_or_else(|| {
            <D::Error as serde::de::Error>::custom(format!("unresolved stream token '{token}'"))
        })
    }
}
