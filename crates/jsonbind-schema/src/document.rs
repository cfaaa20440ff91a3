//! # Schema Documents
//!
//! [`SchemaDocument`] is a [`ValueNode`] whose tree is a schema. Structural
//! accessors are pure reads of that tree. The conformance checker is built
//! from the document on the first [`SchemaDocument::validate`] call and kept
//! for every later call on any thread.
//!
//! ## Validator Lifecycle
//!
//! `Unbuilt → Building → Built`, never back. Concurrent first callers block
//! on a single build; all of them observe the same result. A schema the
//! checker rejects stays rejected: every `validate` reports the same
//! [`JsonError::Schema`].
//!
//! ## Remote References
//!
//! `$ref` URIs are never fetched over the network. References to the
//! json-schema.org meta-schemas resolve to an empty schema; any other
//! remote reference fails the build.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use jsonbind_core::{Codec, JsonError, JsonTree, ValueNode, Violation, Violations};
use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;

use crate::dialect::with_dialect;
use crate::draft3::normalize;

const META_SCHEMA_HOST: &str = "json-schema.org";

/// Resolves `$ref` URIs without network access.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if uri_str.contains(META_SCHEMA_HOST) {
            return Ok(serde_json::json!({}));
        }
        Err(format!("remote schema retrieval is disabled: {uri_str}").into())
    }
}

fn build_options() -> ValidationOptions {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft4);
    opts.with_retriever(OfflineRetriever);
    opts
}

/// Primitive type named by a schema's `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Any,
}

impl SchemaType {
    /// Parses a `type` keyword value. Unknown names yield `None`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema tree plus its lazily-built validator.
pub struct SchemaDocument {
    node: ValueNode,
    validator: OnceLock<Result<Validator, String>>,
    build_count: AtomicUsize,
}

impl SchemaDocument {
    pub fn new(schema: Value) -> Self {
        Self::from_node(ValueNode::new(schema))
    }

    /// Wraps an existing node. The node's subtree is the schema.
    pub fn from_node(node: ValueNode) -> Self {
        Self {
            node,
            validator: OnceLock::new(),
            build_count: AtomicUsize::new(0),
        }
    }

    pub fn node(&self) -> &ValueNode {
        &self.node
    }

    /// The schema tree.
    pub fn to_value(&self) -> Value {
        self.node.value().clone()
    }

    /// A copy of this document with its `$schema` header set to `uri`.
    /// The copy starts with an unbuilt validator.
    pub fn with_dialect(&self, uri: &str) -> SchemaDocument {
        SchemaDocument::new(with_dialect(self.to_value(), uri))
    }

    /// The `type` keyword. `"any"` is [`SchemaType::Any`]; a missing,
    /// unknown, or union type is `None`.
    pub fn schema_type(&self) -> Option<SchemaType> {
        self.node
            .value()
            .get("type")
            .and_then(Value::as_str)
            .and_then(SchemaType::from_keyword)
    }

    /// Sub-schema of `property` under `properties`.
    pub fn property_schema(&self, property: &str) -> Option<SchemaDocument> {
        self.node
            .get("properties")
            .and_then(|properties| properties.get(property))
            .map(Self::sub_schema)
    }

    /// Sub-schema under `items`.
    pub fn item_schema(&self) -> Option<SchemaDocument> {
        self.node.get("items").map(Self::sub_schema)
    }

    /// Sub-schema under `additionalProperties`.
    pub fn additional_property_schema(&self) -> Option<SchemaDocument> {
        self.node.get("additionalProperties").map(Self::sub_schema)
    }

    fn sub_schema(node: ValueNode) -> SchemaDocument {
        SchemaDocument::new(node.value().clone())
    }

    /// Validates `tree` against this schema, building the validator on
    /// first use.
    ///
    /// Trees without a native `serde_json` representation are re-parsed
    /// from their JSON text first.
    ///
    /// # Errors
    ///
    /// - [`JsonError::Validation`] with every checker message, in order,
    ///   when the value does not conform.
    /// - [`JsonError::Schema`] when the checker cannot process the schema.
    /// - [`JsonError::Parse`] when a foreign tree renders malformed JSON.
    pub fn validate<T: JsonTree + ?Sized>(&self, tree: &T) -> Result<(), JsonError> {
        let validator = self.validator()?;

        let reparsed;
        let instance = match tree.native_value() {
            Some(value) => value,
            None => {
                reparsed = Codec::default().parse_node(&tree.to_json_text())?;
                reparsed.value()
            }
        };

        let violations: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(JsonError::Validation(Violations::new(violations)))
        }
    }

    /// Whether the validator has been built.
    pub fn is_validator_built(&self) -> bool {
        self.validator.get().is_some()
    }

    /// How many times a validator build has started. Never exceeds one.
    pub fn validator_build_count(&self) -> usize {
        self.build_count.load(Ordering::SeqCst)
    }

    fn validator(&self) -> Result<&Validator, JsonError> {
        self.validator
            .get_or_init(|| {
                self.build_count.fetch_add(1, Ordering::SeqCst);
                let normalized = normalize(self.node.value());
                let built = build_options().build(&normalized).map_err(|e| e.to_string());
                match &built {
                    Ok(_) => tracing::debug!("built schema validator"),
                    Err(reason) => tracing::debug!(%reason, "schema rejected by checker"),
                }
                built
            })
            .as_ref()
            .map_err(|reason| JsonError::Schema(reason.clone()))
    }
}

impl Deref for SchemaDocument {
    type Target = ValueNode;

    fn deref(&self) -> &ValueNode {
        &self.node
    }
}

impl From<Value> for SchemaDocument {
    fn from(schema: Value) -> Self {
        Self::new(schema)
    }
}

impl PartialEq for SchemaDocument {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl fmt::Display for SchemaDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.node, f)
    }
}

impl fmt::Debug for SchemaDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDocument")
            .field("schema", &self.node.value())
            .field("validator_built", &self.is_validator_built())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn person_schema() -> SchemaDocument {
        SchemaDocument::new(json!({
            "$schema": "http://json-schema.org/draft-03/schema#",
            "type": "object",
            "properties": {
                "name": {"type": "string", "required": true},
                "age": {"type": "integer"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "extra": {"type": "object", "additionalProperties": {"type": "number"}}
            }
        }))
    }

    /// A tree that only exposes JSON text.
    struct TextTree(&'static str);

    impl JsonTree for TextTree {
        fn to_json_text(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_schema_type() {
        assert_eq!(person_schema().schema_type(), Some(SchemaType::Object));
        assert_eq!(
            SchemaDocument::new(json!({"type": "any"})).schema_type(),
            Some(SchemaType::Any)
        );
        assert_eq!(SchemaDocument::new(json!({})).schema_type(), None);
        assert_eq!(
            SchemaDocument::new(json!({"type": ["string", "null"]})).schema_type(),
            None
        );
    }

    #[test]
    fn test_sub_schemas() {
        let schema = person_schema();
        let name = schema.property_schema("name").unwrap();
        assert_eq!(name.schema_type(), Some(SchemaType::String));
        assert!(schema.property_schema("missing").is_none());

        let tags = schema.property_schema("tags").unwrap();
        assert_eq!(
            tags.item_schema().unwrap().schema_type(),
            Some(SchemaType::String)
        );
        assert!(tags.additional_property_schema().is_none());

        let extra = schema.property_schema("extra").unwrap();
        assert_eq!(
            extra.additional_property_schema().unwrap().schema_type(),
            Some(SchemaType::Number)
        );
        assert!(schema.item_schema().is_none());
    }

    #[test]
    fn test_accessors_do_not_mutate() {
        let schema = person_schema();
        let before = schema.to_value();
        let _ = schema.property_schema("name");
        let _ = schema.item_schema();
        let _ = schema.validate(&json!({"name": "a"}));
        assert_eq!(schema.to_value(), before);
    }

    #[test]
    fn test_valid_instance() {
        let schema = person_schema();
        schema
            .validate(&json!({"name": "Ada", "age": 36, "tags": ["math"]}))
            .unwrap();
    }

    #[test]
    fn test_missing_required_reports_messages() {
        let schema = person_schema();
        let err = schema.validate(&json!({"age": 3})).unwrap_err();
        let violations = err.violations().expect("validation error");
        assert!(!violations.is_empty());
        assert!(violations.messages().iter().any(|m| m.contains("name")));
    }

    #[test]
    fn test_all_violations_reported() {
        let schema = person_schema();
        let err = schema
            .validate(&json!({"name": 1, "age": "old"}))
            .unwrap_err();
        assert_eq!(err.violations().map(Violations::len), Some(2));
    }

    #[test]
    fn test_validates_value_nodes_and_foreign_trees() {
        let schema = person_schema();
        let node = ValueNode::new(json!({"name": "Ada"}));
        schema.validate(&node).unwrap();
        schema.validate(&TextTree(r#"{"name": "Ada"}"#)).unwrap();
        assert!(schema.validate(&TextTree(r#"{"age": 1}"#)).is_err());
    }

    #[test]
    fn test_malformed_foreign_tree_is_parse_error() {
        let schema = person_schema();
        let err = schema.validate(&TextTree("{nope")).unwrap_err();
        assert!(matches!(err, JsonError::Parse(_)));
    }

    #[test]
    fn test_malformed_schema_is_schema_error() {
        let schema = SchemaDocument::new(json!({"type": 12}));
        let err = schema.validate(&json!("x")).unwrap_err();
        assert!(matches!(err, JsonError::Schema(_)), "got: {err}");
        let again = schema.validate(&json!("x")).unwrap_err();
        assert!(matches!(again, JsonError::Schema(_)));
        assert_eq!(schema.validator_build_count(), 1);
    }

    #[test]
    fn test_any_schema_accepts_everything() {
        let schema = SchemaDocument::new(json!({"type": "any"}));
        schema.validate(&json!(null)).unwrap();
        schema.validate(&json!({"a": [1, 2]})).unwrap();
    }

    #[test]
    fn test_validator_built_lazily_once() {
        let schema = person_schema();
        assert!(!schema.is_validator_built());
        assert_eq!(schema.validator_build_count(), 0);
        schema.validate(&json!({"name": "a"})).unwrap();
        schema.validate(&json!({"name": "b"})).unwrap();
        assert!(schema.is_validator_built());
        assert_eq!(schema.validator_build_count(), 1);
    }

    #[test]
    fn test_concurrent_first_validation_builds_once() {
        let schema = Arc::new(person_schema());
        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let schema = Arc::clone(&schema);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    schema.validate(&json!({"name": format!("user-{i}")}))
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(schema.validator_build_count(), 1);
    }

    #[test]
    fn test_with_dialect_copy() {
        let schema = SchemaDocument::new(json!({"type": "string"}));
        let tagged = schema.with_dialect("http://example.org/dialect");
        assert_eq!(tagged.value()["$schema"], "http://example.org/dialect");
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn test_deref_navigation() {
        let schema = person_schema();
        assert_eq!(schema.get("type").unwrap().as_string(), "object");
        assert_eq!(schema.to_string(), schema.node().to_string());
    }
}
