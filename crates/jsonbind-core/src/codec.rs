//! # Codec Facade
//!
//! Converts between application values, JSON text, and [`ValueNode`] trees.
//! Every serialize or typed parse call opens its own [`BinaryChannel`],
//! installs it for the duration of the serde call, and drops the scope on
//! exit whether the call succeeded or not.
//!
//! ## Blank Input
//!
//! Empty or whitespace-only text is the JSON `null` on every entry point:
//! [`Codec::parse_node`] returns a Null node and [`Codec::parse`] decodes the
//! target type from `null`, so `Option<T>` yields `None`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::channel::{BinaryChannel, ChannelScope, StreamMap};
use crate::config::CodecConfig;
use crate::error::{JsonError, ParseError};
use crate::node::ValueNode;
use crate::ser;

/// Output of [`Codec::serialize`]: the document and the streams its tokens
/// refer to.
#[derive(Debug, Clone, Default)]
pub struct Encoded {
    /// JSON text with stream tokens in place of binary payloads.
    pub json: String,
    /// Token to stream map for every stream in the value.
    pub streams: StreamMap,
}

/// Text/value conversion with binary side-channel support.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Serialize `value`, collecting any [`ByteStream`](crate::ByteStream)s
    /// it contains into the returned stream map.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::Serialization`] if the value cannot be represented
    /// as JSON (for example a map with non-string keys).
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Encoded, JsonError> {
        let (tree, channel) = self.encode_tree(value)?;
        let json = self.write_tree(&tree)?;
        Ok(Encoded {
            json,
            streams: channel.stream_map(),
        })
    }

    /// Serialize `value` to text, discarding the stream map.
    ///
    /// # Errors
    ///
    /// See [`Codec::serialize`].
    pub fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, JsonError> {
        self.serialize(value).map(|encoded| encoded.json)
    }

    /// Serialize `value` straight into a tree whose string members resolve
    /// the streams produced during serialization.
    ///
    /// # Errors
    ///
    /// See [`Codec::serialize`].
    pub fn to_node<T: Serialize + ?Sized>(&self, value: &T) -> Result<ValueNode, JsonError> {
        let (tree, channel) = self.encode_tree(value)?;
        Ok(ValueNode::with_streams(tree, channel))
    }

    /// Parse text into a tree with no stream channel.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Syntax`] for malformed text.
    pub fn parse_node(&self, text: &str) -> Result<ValueNode, JsonError> {
        Ok(ValueNode::new(read_tree(text)?))
    }

    /// Parse text into a tree whose string members resolve against `streams`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Syntax`] for malformed text.
    pub fn parse_node_with_streams(
        &self,
        text: &str,
        streams: StreamMap,
    ) -> Result<ValueNode, JsonError> {
        let tree = read_tree(text)?;
        let channel = Arc::new(BinaryChannel::with_streams(streams));
        tracing::debug!(streams = channel.len(), "binary channel attached to parsed tree");
        Ok(ValueNode::with_streams(tree, channel))
    }

    /// Decode text into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Syntax`] for malformed text and
    /// [`ParseError::Mapping`] when the document does not fit `T`, including
    /// stream tokens that cannot be resolved.
    pub fn parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, JsonError> {
        self.parse_with_streams(text, StreamMap::new())
    }

    /// Decode text into `T`, resolving stream tokens against `streams`.
    ///
    /// Tokens produced by an earlier [`Codec::serialize`] round-trip when
    /// that call's stream map is passed back here.
    ///
    /// # Errors
    ///
    /// See [`Codec::parse`].
    pub fn parse_with_streams<T: DeserializeOwned>(
        &self,
        text: &str,
        streams: StreamMap,
    ) -> Result<T, JsonError> {
        let channel = Arc::new(BinaryChannel::with_streams(streams));
        tracing::debug!(streams = channel.len(), "binary channel opened for parse");
        let decoded = {
            let _scope = ChannelScope::enter(Arc::clone(&channel));
            if text.trim().is_empty() {
                T::deserialize(Value::Null)
            } else {
                serde_json::from_str(text)
            }
        };
        tracing::debug!(streams = channel.len(), "binary channel closed after parse");
        decoded.map_err(|e| JsonError::Parse(ParseError::from(e)))
    }

    /// Decode a tree into `T`, resolving stream tokens through the tree's
    /// own channel.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Mapping`] when the tree does not fit `T`.
    pub fn load<T: DeserializeOwned>(&self, node: &ValueNode) -> Result<T, JsonError> {
        let channel = node
            .streams()
            .cloned()
            .unwrap_or_else(|| Arc::new(BinaryChannel::new()));
        tracing::debug!(streams = channel.len(), "binary channel opened for load");
        let decoded = {
            let _scope = ChannelScope::enter(Arc::clone(&channel));
            T::deserialize(node.value())
        };
        tracing::debug!(streams = channel.len(), "binary channel closed after load");
        decoded.map_err(|e| JsonError::Parse(ParseError::from(e)))
    }

    /// Re-indent JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Syntax`] for malformed text.
    pub fn pretty_print(&self, text: &str) -> Result<String, JsonError> {
        let tree = read_tree(text)?;
        serde_json::to_string_pretty(&tree).map_err(JsonError::Serialization)
    }

    /// JSON string escaping of `text`, without the surrounding quotes.
    pub fn quote(&self, text: &str) -> String {
        let quoted = Value::String(text.to_owned()).to_string();
        quoted[1..quoted.len() - 1].to_string()
    }

    fn encode_tree<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<(Value, Arc<BinaryChannel>), JsonError> {
        let channel = Arc::new(BinaryChannel::new());
        tracing::debug!("binary channel opened for serialize");
        let encoded = {
            let _scope = ChannelScope::enter(Arc::clone(&channel));
            if self.config.omit_nulls {
                ser::to_value_omitting_nulls(value)
            } else {
                serde_json::to_value(value)
            }
        };
        tracing::debug!(streams = channel.len(), "binary channel closed after serialize");
        let tree = encoded.map_err(JsonError::Serialization)?;
        Ok((tree, channel))
    }

    fn write_tree(&self, tree: &Value) -> Result<String, JsonError> {
        let text = if self.config.pretty {
            serde_json::to_string_pretty(tree)
        } else {
            serde_json::to_string(tree)
        };
        text.map_err(JsonError::Serialization)
    }
}

fn read_tree(text: &str) -> Result<Value, JsonError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let tree = serde_json::from_str(text).map_err(ParseError::from)?;
    Ok(tree)
}
