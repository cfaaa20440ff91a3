//! # Schema Generation
//!
//! Walks a [`TypeDescriptor`] depth-first and emits Draft-03 fragments:
//!
//! | Descriptor      | Fragment                                              |
//! |-----------------|-------------------------------------------------------|
//! | `Any`           | `{"type": "any"}`                                     |
//! | `Null`          | `{"type": "null"}`                                    |
//! | `Boolean`       | `{"type": "boolean"}`                                 |
//! | `Integer`       | `{"type": "integer"}`                                 |
//! | `Number`        | `{"type": "number"}`                                  |
//! | `String`        | `{"type": "string"}` plus a registered `format`       |
//! | `Enumeration`   | `{"type": "string", "enum": [variants]}`              |
//! | `Array`         | `{"type": "array", "items": …}`                       |
//! | `Map`           | `{"type": "object", "additionalProperties": …}`       |
//! | `Optional`      | the inner fragment                                    |
//! | `Opaque`        | formatted string when registered, else `any`          |
//! | `Object`        | `{"type": "object", "properties": {…}}`, enriched     |
//!
//! The root fragment carries no `$schema` header; see
//! [`with_dialect`](crate::dialect::with_dialect).

use jsonbind_core::ConfigurationError;
use serde_json::{Map, Value};

use crate::descriptor::{ObjectDescriptor, TypeDescriptor};
use crate::enrich::{apply_format, enrich_property};
use crate::format::FormatRegistry;

/// Turns descriptors into schema fragments.
#[derive(Debug, Clone, Copy)]
pub struct SchemaGenerator<'a> {
    formats: &'a FormatRegistry,
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(formats: &'a FormatRegistry) -> Self {
        Self { formats }
    }

    /// Generates the schema of `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] raised while enriching a
    /// property. No partial schema is returned.
    pub fn generate(&self, descriptor: &TypeDescriptor) -> Result<Value, ConfigurationError> {
        self.fragment(descriptor).map(Value::Object)
    }

    fn fragment(&self, descriptor: &TypeDescriptor) -> Result<Map<String, Value>, ConfigurationError> {
        let fragment = match descriptor {
            TypeDescriptor::Any => typed("any"),
            TypeDescriptor::Null => typed("null"),
            TypeDescriptor::Boolean => typed("boolean"),
            TypeDescriptor::Integer => typed("integer"),
            TypeDescriptor::Number => typed("number"),
            TypeDescriptor::String(name) => {
                let mut fragment = typed("string");
                apply_format(&mut fragment, name, self.formats);
                fragment
            }
            TypeDescriptor::Enumeration(e) => {
                let mut fragment = typed("string");
                let variants = e.variants.iter().cloned().map(Value::String).collect();
                fragment.insert("enum".into(), Value::Array(variants));
                fragment
            }
            TypeDescriptor::Array(inner) => {
                let mut fragment = typed("array");
                fragment.insert("items".into(), Value::Object(self.fragment(inner)?));
                fragment
            }
            TypeDescriptor::Map(inner) => {
                let mut fragment = typed("object");
                fragment.insert(
                    "additionalProperties".into(),
                    Value::Object(self.fragment(inner)?),
                );
                fragment
            }
            TypeDescriptor::Optional(inner) => self.fragment(inner)?,
            TypeDescriptor::Opaque(name) => {
                let mut fragment = typed("string");
                if !apply_format(&mut fragment, name, self.formats) {
                    tracing::warn!(
                        type_name = %name,
                        "no format registered for opaque type, describing it as any"
                    );
                    fragment = typed("any");
                }
                fragment
            }
            TypeDescriptor::Object(object) => self.object(object)?,
        };
        Ok(fragment)
    }

    fn object(&self, object: &ObjectDescriptor) -> Result<Map<String, Value>, ConfigurationError> {
        let mut properties = Map::new();
        for property in &object.properties {
            let mut fragment = self.fragment(&property.ty)?;
            enrich_property(&mut fragment, object, property)?;
            properties.insert(property.name.clone(), Value::Object(fragment));
        }
        tracing::debug!(
            type_name = %object.name,
            properties = properties.len(),
            "generated object schema"
        );

        let mut fragment = typed("object");
        fragment.insert("properties".into(), Value::Object(properties));
        Ok(fragment)
    }
}

fn typed(type_name: &str) -> Map<String, Value> {
    let mut fragment = Map::new();
    fragment.insert("type".into(), Value::String(type_name.to_string()));
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Describe, IndexMode, PropertyDescriptor, TypeName};
    use jsonbind_core::ByteStream;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn generate(descriptor: &TypeDescriptor) -> Value {
        let formats = FormatRegistry::default();
        SchemaGenerator::new(&formats).generate(descriptor).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(generate(&bool::describe()), json!({"type": "boolean"}));
        assert_eq!(generate(&u64::describe()), json!({"type": "integer"}));
        assert_eq!(generate(&f64::describe()), json!({"type": "number"}));
        assert_eq!(generate(&String::describe()), json!({"type": "string"}));
        assert_eq!(generate(&Value::describe()), json!({"type": "any"}));
        assert_eq!(generate(&<()>::describe()), json!({"type": "null"}));
    }

    #[test]
    fn test_containers() {
        assert_eq!(
            generate(&Vec::<Option<i32>>::describe()),
            json!({"type": "array", "items": {"type": "integer"}})
        );
        assert_eq!(
            generate(&HashMap::<String, String>::describe()),
            json!({"type": "object", "additionalProperties": {"type": "string"}})
        );
    }

    #[test]
    fn test_registered_formats() {
        assert_eq!(
            generate(&PathBuf::describe()),
            json!({"type": "string", "format": "file"})
        );
        assert_eq!(
            generate(&ByteStream::describe()),
            json!({"type": "string", "format": "inputstream"})
        );
    }

    #[test]
    fn test_unregistered_opaque_is_any() {
        let descriptor = TypeDescriptor::Opaque(TypeName::new("Socket"));
        assert_eq!(generate(&descriptor), json!({"type": "any"}));
    }

    #[test]
    fn test_opaque_inherits_ancestor_format() {
        let descriptor = TypeDescriptor::Opaque(TypeName::new("GzipStream").extends("ByteStream"));
        assert_eq!(
            generate(&descriptor),
            json!({"type": "string", "format": "inputstream"})
        );
    }

    #[test]
    fn test_enumeration_lists_variants() {
        let descriptor = TypeDescriptor::enumeration("Color", ["Red", "Green"]);
        assert_eq!(
            generate(&descriptor),
            json!({"type": "string", "enum": ["Red", "Green"]})
        );
    }

    #[test]
    fn test_object_properties_in_declaration_order() {
        let descriptor: TypeDescriptor = ObjectDescriptor::new("Person")
            .property(PropertyDescriptor::of::<String>("name").required(true))
            .property(PropertyDescriptor::of::<u8>("age"))
            .property(PropertyDescriptor::of::<String>("city").index(IndexMode::Index))
            .into();
        let schema = generate(&descriptor);
        let names: Vec<&str> = schema["properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["name", "age", "city"]);
        assert_eq!(
            schema["properties"]["name"],
            json!({"type": "string", "title": "name", "required": true})
        );
        assert_eq!(schema["properties"]["age"]["title"], "age");
        assert_eq!(schema["properties"]["city"]["index"], "index");
    }

    #[test]
    fn test_property_enum_overrides_type_enumeration() {
        let descriptor: TypeDescriptor = ObjectDescriptor::new("Paint")
            .property(
                PropertyDescriptor::new(
                    "color",
                    TypeDescriptor::enumeration("Color", ["Red", "Green", "Blue"]),
                )
                .values_json(r#"["Red"]"#),
            )
            .into();
        assert_eq!(generate(&descriptor)["properties"]["color"]["enum"], json!(["Red"]));
    }

    #[test]
    fn test_nested_object_enrichment_errors_propagate() {
        let inner: TypeDescriptor = ObjectDescriptor::new("Inner")
            .property(PropertyDescriptor::of::<i32>("n").default_json("\"x\""))
            .into();
        let outer: TypeDescriptor = ObjectDescriptor::new("Outer")
            .property(PropertyDescriptor::new("inner", inner))
            .into();
        let formats = FormatRegistry::default();
        let err = SchemaGenerator::new(&formats).generate(&outer).unwrap_err();
        assert!(err.to_string().contains("Inner.n"), "got: {err}");
    }
}
