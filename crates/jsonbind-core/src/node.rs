//! # Value Nodes
//!
//! [`ValueNode`] is an immutable, navigable view over a parsed JSON tree.
//! Every node shares the document root through an `Arc` and addresses its
//! own value by a path from that root, so navigation never copies or
//! mutates the tree and a child can always find its parent without the tree
//! holding back-references.
//!
//! Navigation is total: [`ValueNode::get`] returns `None` for missing keys,
//! out-of-range indices, and wrong node kinds. Scalar accessors coerce on a
//! best-effort basis and fall back to zero values instead of failing.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::channel::{self, BinaryChannel};
use crate::error::JsonError;
use crate::stream::ByteStream;

static NULL: Value = Value::Null;

/// Kind of a JSON node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
    /// Untyped; never produced by a parsed tree, used by schemas.
    Any,
}

impl NodeType {
    /// Kind of a generic tree value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Any => "any",
        };
        f.write_str(name)
    }
}

/// One step of a node's path from the document root.
#[doc(hidden)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A key usable with [`ValueNode::get`]: `usize` for arrays, strings for objects.
pub trait NodeKey {
    #[doc(hidden)]
    fn segment(&self, value: &Value) -> Option<Segment>;
}

impl NodeKey for usize {
    fn segment(&self, value: &Value) -> Option<Segment> {
        value
            .as_array()
            .filter(|items| *self < items.len())
            .map(|_| Segment::Index(*self))
    }
}

impl NodeKey for str {
    fn segment(&self, value: &Value) -> Option<Segment> {
        value
            .as_object()
            .filter(|map| map.contains_key(self))
            .map(|_| Segment::Key(self.to_owned()))
    }
}

impl NodeKey for String {
    fn segment(&self, value: &Value) -> Option<Segment> {
        self.as_str().segment(value)
    }
}

impl<T: NodeKey + ?Sized> NodeKey for &T {
    fn segment(&self, value: &Value) -> Option<Segment> {
        (**self).segment(value)
    }
}

/// Immutable node of a parsed JSON document.
#[derive(Clone)]
pub struct ValueNode {
    root: Arc<Value>,
    path: Vec<Segment>,
    streams: Option<Arc<BinaryChannel>>,
}

impl ValueNode {
    /// Root node over `value` with no stream channel.
    pub fn new(value: Value) -> Self {
        Self {
            root: Arc::new(value),
            path: Vec::new(),
            streams: None,
        }
    }

    /// Root node whose string members resolve streams through `streams`.
    pub fn with_streams(value: Value, streams: Arc<BinaryChannel>) -> Self {
        Self {
            root: Arc::new(value),
            path: Vec::new(),
            streams: Some(streams),
        }
    }

    /// The JSON `null` document.
    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    /// The underlying tree value of this node.
    pub fn value(&self) -> &Value {
        let mut current = self.root.as_ref();
        for segment in &self.path {
            let next = match segment {
                Segment::Key(key) => current.get(key.as_str()),
                Segment::Index(index) => current.get(*index),
            };
            // Paths are only built from successful lookups on an immutable root.
            current = match next {
                Some(value) => value,
                None => return &NULL,
            };
        }
        current
    }

    /// Channel inherited from the document root, if any.
    pub fn streams(&self) -> Option<&Arc<BinaryChannel>> {
        self.streams.as_ref()
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::of(self.value())
    }

    /// Child by array index or object property.
    pub fn get<K: NodeKey>(&self, key: K) -> Option<ValueNode> {
        let segment = key.segment(self.value())?;
        let mut path = self.path.clone();
        path.push(segment);
        Some(Self {
            root: Arc::clone(&self.root),
            path,
            streams: self.streams.clone(),
        })
    }

    /// Enclosing object or array; `None` for the document root.
    pub fn parent(&self) -> Option<ValueNode> {
        if self.path.is_empty() {
            return None;
        }
        let mut path = self.path.clone();
        path.pop();
        Some(Self {
            root: Arc::clone(&self.root),
            path,
            streams: self.streams.clone(),
        })
    }

    /// Property names in document order; empty for non-objects.
    pub fn properties(&self) -> impl Iterator<Item = &str> + '_ {
        self.value()
            .as_object()
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// Number of children; 0 for scalars.
    pub fn size(&self) -> usize {
        match self.value() {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    /// Stream bound to this string node's token.
    ///
    /// Returns `Ok(None)` when the node has no channel or the token is not
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::UnsupportedOperation`] for non-string nodes.
    pub fn as_stream(&self) -> Result<Option<ByteStream>, JsonError> {
        match self.value() {
            Value::String(token) => Ok(self
                .streams
                .as_ref()
                .and_then(|channel| channel.lookup(token))),
            other => Err(JsonError::UnsupportedOperation(format!(
                "as_stream() called on a node of type {}",
                NodeType::of(other)
            ))),
        }
    }

    pub fn as_boolean(&self) -> bool {
        match self.value() {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_i64().map_or(false, |i| i != 0),
            Value::String(s) => s.trim() == "true",
            _ => false,
        }
    }

    /// Truncating 32-bit view of [`as_long`](Self::as_long).
    pub fn as_integer(&self) -> i32 {
        self.as_long() as i32
    }

    pub fn as_long(&self) -> i64 {
        match self.value() {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_u64().map(|u| u as i64))
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Value::Bool(b) => i64::from(*b),
            Value::String(s) => {
                let text = s.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().map(|f| f as i64))
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn as_double(&self) -> f64 {
        match self.value() {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Text of the node: strings verbatim, numbers and booleans rendered,
    /// `"null"` for null, empty for containers.
    pub fn as_string(&self) -> String {
        match self.value() {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Array(_) | Value::Object(_) => String::new(),
        }
    }
}

impl Default for ValueNode {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for ValueNode {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl fmt::Debug for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueNode")
            .field("value", self.value())
            .field("streams", &self.streams.is_some())
            .finish()
    }
}

impl PartialEq for ValueNode {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for ValueNode {}

impl Hash for ValueNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(self.value(), state);
    }
}

/// Order-insensitive for object members, matching `Value` equality.
fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2u8.hash(state);
            hash_number(n, state);
        }
        Value::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            5u8.hash(state);
            map.len().hash(state);
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, item) in entries {
                key.hash(state);
                hash_value(item, state);
            }
        }
    }
}

/// `Number` equality compares unsigned, signed, and float representations
/// separately, and floats with `==`, so `0.0` and `-0.0` must hash alike.
fn hash_number<H: Hasher>(n: &Number, state: &mut H) {
    if let Some(u) = n.as_u64() {
        0u8.hash(state);
        u.hash(state);
    } else if let Some(i) = n.as_i64() {
        1u8.hash(state);
        i.hash(state);
    } else if let Some(f) = n.as_f64() {
        let canonical = if f == 0.0 { 0.0f64 } else { f };
        2u8.hash(state);
        canonical.to_bits().hash(state);
    }
}

impl Serialize for ValueNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// Embedded nodes pick up the channel of the codec call decoding them.
impl<'de> Deserialize<'de> for ValueNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match channel::active() {
            Some(streams) => Self::with_streams(value, streams),
            None => Self::new(value),
        })
    }
}

/// Any JSON tree the validator can consume.
///
/// Implementations not backed by `serde_json` only provide their text; it is
/// re-parsed before validation.
pub trait JsonTree {
    /// Compact JSON text of the tree.
    fn to_json_text(&self) -> String;

    /// The `serde_json` tree, when the implementation has one.
    fn native_value(&self) -> Option<&Value> {
        None
    }
}

impl JsonTree for ValueNode {
    fn to_json_text(&self) -> String {
        self.value().to_string()
    }

    fn native_value(&self) -> Option<&Value> {
        Some(self.value())
    }
}

impl JsonTree for Value {
    fn to_json_text(&self) -> String {
        self.to_string()
    }

    fn native_value(&self) -> Option<&Value> {
        Some(self)
    }
}
