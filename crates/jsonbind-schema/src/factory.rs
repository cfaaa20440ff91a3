//! # Schema Factory
//!
//! The schema half of the codec: generates enriched schema documents from
//! type descriptors and parses schema text. Documents generated for a Rust
//! type are cached per type, so each type's validator is built once per
//! factory.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use jsonbind_core::{CodecConfig, JsonError, ParseError};
use parking_lot::RwLock;
use serde_json::Value;

use crate::descriptor::{Describe, TypeDescriptor};
use crate::dialect::with_dialect;
use crate::document::SchemaDocument;
use crate::format::FormatRegistry;
use crate::generate::SchemaGenerator;

/// Generates, caches, and parses schema documents.
#[derive(Debug)]
pub struct SchemaFactory {
    config: CodecConfig,
    formats: FormatRegistry,
    cache: RwLock<HashMap<TypeId, Arc<SchemaDocument>>>,
}

impl Default for SchemaFactory {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

impl SchemaFactory {
    /// Factory with the default format registrations plus `config.formats`.
    pub fn new(config: CodecConfig) -> Self {
        let formats = FormatRegistry::from_config(&config);
        Self::with_formats(config, formats)
    }

    /// Factory using `formats` as its complete registry.
    pub fn with_formats(config: CodecConfig, formats: FormatRegistry) -> Self {
        Self {
            config,
            formats,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// The schema document for `T`, generated on first request.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::Configuration`] if any property metadata of `T`
    /// is invalid. Failed generations are not cached.
    pub fn schema_for<T: Describe + ?Sized + 'static>(&self) -> Result<Arc<SchemaDocument>, JsonError> {
        let key = TypeId::of::<T>();
        if let Some(document) = self.cache.read().get(&key) {
            return Ok(Arc::clone(document));
        }

        let document = Arc::new(self.schema_for_descriptor(&T::describe())?);
        let mut cache = self.cache.write();
        let cached = cache.entry(key).or_insert(document);
        Ok(Arc::clone(cached))
    }

    /// The schema of `T` as JSON text, pretty-printed when configured.
    ///
    /// # Errors
    ///
    /// See [`SchemaFactory::schema_for`].
    pub fn schema_string<T: Describe + ?Sized + 'static>(&self) -> Result<String, JsonError> {
        let document = self.schema_for::<T>()?;
        let text = if self.config.pretty {
            serde_json::to_string_pretty(document.value())
        } else {
            serde_json::to_string(document.value())
        };
        text.map_err(JsonError::Serialization)
    }

    /// Generates an uncached document for `descriptor`, headed with the
    /// configured dialect.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::Configuration`] on invalid property metadata.
    pub fn schema_for_descriptor(&self, descriptor: &TypeDescriptor) -> Result<SchemaDocument, JsonError> {
        let schema = SchemaGenerator::new(&self.formats).generate(descriptor)?;
        tracing::debug!(type_name = %descriptor.type_name(), "generated schema");
        Ok(SchemaDocument::new(with_dialect(
            schema,
            &self.config.schema_dialect,
        )))
    }

    /// Parses schema text. Object schemas get the configured `$schema`
    /// header, replacing any they carry. Blank text yields a document over
    /// `null`.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::Parse`] if the text is not well-formed JSON.
    pub fn parse_schema(&self, text: &str) -> Result<SchemaDocument, JsonError> {
        if text.trim().is_empty() {
            return Ok(SchemaDocument::new(Value::Null));
        }
        let schema: Value = serde_json::from_str(text).map_err(ParseError::from)?;
        Ok(SchemaDocument::new(with_dialect(
            schema,
            &self.config.schema_dialect,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ObjectDescriptor, PropertyDescriptor};
    use jsonbind_core::{ConfigurationError, DRAFT_03_URI};
    use serde_json::json;
    use std::sync::Barrier;
    use std::thread;

    struct Ticket;

    impl Describe for Ticket {
        fn describe() -> TypeDescriptor {
            ObjectDescriptor::new("Ticket")
                .property(PropertyDescriptor::of::<String>("subject").required(true))
                .property(PropertyDescriptor::of::<u32>("priority").default_json("3"))
                .into()
        }
    }

    struct Broken;

    impl Describe for Broken {
        fn describe() -> TypeDescriptor {
            ObjectDescriptor::new("Broken")
                .property(PropertyDescriptor::of::<u32>("priority").default_json("abc"))
                .into()
        }
    }

    #[test]
    fn test_generated_schema_has_dialect_header_first() {
        let factory = SchemaFactory::default();
        let schema = factory.schema_for::<Ticket>().unwrap();
        let keys: Vec<&String> = schema.value().as_object().unwrap().keys().collect();
        assert_eq!(keys[0], "$schema");
        assert_eq!(schema.value()["$schema"], DRAFT_03_URI);
        assert_eq!(schema.value()["properties"]["priority"]["default"], json!(3));
    }

    #[test]
    fn test_schema_cached_per_type() {
        let factory = SchemaFactory::default();
        let first = factory.schema_for::<Ticket>().unwrap();
        let second = factory.schema_for::<Ticket>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        let other = factory.schema_for::<String>().unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn test_invalid_metadata_fails_generation() {
        let factory = SchemaFactory::default();
        let err = factory.schema_for::<Broken>().unwrap_err();
        assert!(matches!(
            err,
            JsonError::Configuration(ConfigurationError::InvalidDefault { .. })
        ));
        assert!(factory.schema_for::<Broken>().is_err());
    }

    #[test]
    fn test_cached_schema_validator_shared_across_threads() {
        let factory = Arc::new(SchemaFactory::default());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = Arc::clone(&factory);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let schema = factory.schema_for::<Ticket>().unwrap();
                    schema.validate(&json!({"subject": "help"})).unwrap();
                    schema
                })
            })
            .collect();
        let schemas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(schemas.iter().all(|s| Arc::ptr_eq(s, &schemas[0])));
        assert_eq!(schemas[0].validator_build_count(), 1);
    }

    #[test]
    fn test_schema_string_compact_and_pretty() {
        let compact = SchemaFactory::default().schema_string::<bool>().unwrap();
        assert_eq!(
            compact,
            format!(r#"{{"$schema":"{DRAFT_03_URI}","type":"boolean"}}"#)
        );

        let config = CodecConfig {
            pretty: true,
            ..CodecConfig::default()
        };
        let pretty = SchemaFactory::new(config).schema_string::<bool>().unwrap();
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn test_configured_dialect_and_formats() {
        let config = CodecConfig::from_yaml_str(
            "schema_dialect: http://example.org/dialect\nformats:\n  String: text\n",
        )
        .unwrap();
        let factory = SchemaFactory::new(config);
        let schema = factory.schema_for::<String>().unwrap();
        assert_eq!(
            schema.to_value(),
            json!({"$schema": "http://example.org/dialect", "type": "string", "format": "text"})
        );
    }

    #[test]
    fn test_parse_schema_replaces_header() {
        let factory = SchemaFactory::default();
        let schema = factory
            .parse_schema(r#"{"$schema": "http://json-schema.org/draft-04/schema#", "type": "integer"}"#)
            .unwrap();
        assert_eq!(schema.value()["$schema"], DRAFT_03_URI);
        schema.validate(&json!(4)).unwrap();
        assert!(schema.validate(&json!("four")).is_err());
    }

    #[test]
    fn test_parse_schema_blank_and_malformed() {
        let factory = SchemaFactory::default();
        assert!(factory.parse_schema("   ").unwrap().value().is_null());
        assert!(matches!(
            factory.parse_schema("{\"type\":"),
            Err(JsonError::Parse(ParseError::Syntax(_)))
        ));
    }
}
