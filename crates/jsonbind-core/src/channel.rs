//! # Binary Side-Channel
//!
//! A [`BinaryChannel`] maps reference tokens to [`ByteStream`]s for exactly
//! one serialize or parse call. Tokens have the form `#<seq>#<identity>`,
//! where `seq` counts up from 1 within the channel and `identity` is the
//! stream's identity. Adding the same stream twice returns the same token.
//!
//! ## Scoping
//!
//! `serde` gives `Serialize`/`Deserialize` impls no context parameter, so the
//! codec installs the channel with a [`ChannelScope`] guard for the extent of
//! one synchronous serde call. The guard restores whatever scope was active
//! before it (nested codec calls compose) and is not `Send`: it cannot be
//! carried across an `.await` or handed to another thread, so a channel never
//! leaks into an unrelated call on a shared executor.
//!
//! Trees produced by a parse keep an explicit `Arc<BinaryChannel>` instead of
//! relying on the scope; see [`ValueNode::as_stream`](crate::node::ValueNode::as_stream).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::stream::ByteStream;

/// Token to stream map exchanged with callers.
pub type StreamMap = HashMap<String, ByteStream>;

struct ChannelState {
    streams: StreamMap,
    tokens: HashMap<usize, String>,
    counter: u64,
}

/// Token registry for one serialize/parse operation.
pub struct BinaryChannel {
    state: Mutex<ChannelState>,
}

impl BinaryChannel {
    /// Empty channel; the first token issued has sequence number 1.
    pub fn new() -> Self {
        Self::with_streams(StreamMap::new())
    }

    /// Channel seeded with tokens issued by an earlier serialize call.
    pub fn with_streams(streams: StreamMap) -> Self {
        let tokens = streams
            .iter()
            .map(|(token, stream)| (stream.identity(), token.clone()))
            .collect();
        Self {
            state: Mutex::new(ChannelState {
                streams,
                tokens,
                counter: 1,
            }),
        }
    }

    /// Register `stream` and return its token. Idempotent per stream identity.
    pub fn add_stream(&self, stream: &ByteStream) -> String {
        let mut state = self.state.lock();
        let identity = stream.identity();
        if let Some(token) = state.tokens.get(&identity) {
            return token.clone();
        }
        let token = loop {
            let candidate = format!("#{}#{}", state.counter, identity);
            state.counter += 1;
            if !state.streams.contains_key(&candidate) {
                break candidate;
            }
        };
        state.tokens.insert(identity, token.clone());
        state.streams.insert(token.clone(), stream.clone());
        token
    }

    /// Stream bound to `token`, if any.
    pub fn lookup(&self, token: &str) -> Option<ByteStream> {
        self.state.lock().streams.get(token).cloned()
    }

    /// Number of registered streams.
    pub fn len(&self) -> usize {
        self.state.lock().streams.len()
    }

    /// Returns true if no stream has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the token to stream map.
    pub fn stream_map(&self) -> StreamMap {
        self.state.lock().streams.clone()
    }
}

impl Default for BinaryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BinaryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryChannel")
            .field("streams", &self.len())
            .finish()
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<Arc<BinaryChannel>>> = const { RefCell::new(None) };
}

/// Installs a channel for the current thread until dropped.
pub struct ChannelScope {
    previous: Option<Arc<BinaryChannel>>,
    _not_send: PhantomData<*const ()>,
}

impl ChannelScope {
    /// Make `channel` the active channel for serde calls on this thread.
    pub fn enter(channel: Arc<BinaryChannel>) -> Self {
        let previous = ACTIVE.with(|active| active.borrow_mut().replace(channel));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for ChannelScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE.with(|active| *active.borrow_mut() = previous);
    }
}

/// The channel installed by the innermost live [`ChannelScope`].
pub fn active() -> Option<Arc<BinaryChannel>> {
    ACTIVE.with(|active| active.borrow().clone())
}
