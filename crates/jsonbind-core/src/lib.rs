//! # jsonbind-core: Value Trees, Streams, and the Codec
//!
//! This crate sits between application values and wire-format JSON. It
//! depends on nothing internal; `jsonbind-schema` builds on it.
//!
//! ## Key Design Principles
//!
//! 1. **Immutable, navigable trees.** [`ValueNode`] wraps a parsed
//!    `serde_json::Value`. Navigation hands out new nodes that share the
//!    root; nothing ever mutates a parsed document.
//!
//! 2. **Binary payloads travel beside the document.** A [`ByteStream`] is
//!    written into JSON as a `#<seq>#<identity>` token issued by a
//!    [`BinaryChannel`]. The token to stream map is returned next to the
//!    text and handed back on parse.
//!
//! 3. **One channel per call.** [`Codec`] opens a fresh channel for every
//!    serialize or typed parse and closes it on exit, success or failure.
//!    Parsed trees carry their channel explicitly.
//!
//! 4. **Typed failures.** Every fallible operation returns [`JsonError`].
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod node;
mod ser;
pub mod stream;

// Re-export primary types for ergonomic imports.
pub use channel::{BinaryChannel, ChannelScope, StreamMap};
pub use codec::{Codec, Encoded};
pub use config::{CodecConfig, DRAFT_03_URI};
pub use error::{ConfigurationError, JsonError, ParseError, Violation, Violations};
pub use node::{JsonTree, NodeKey, NodeType, ValueNode};
pub use stream::ByteStream;
