//! # Property Enrichment
//!
//! Populates a generated property fragment from the property's metadata.
//! Applied per property, in declaration order:
//!
//! 1. No metadata block: `title` is the property name, nothing else from
//!    the block is applied.
//! 2. Otherwise `title` is the declared title when non-empty, else the
//!    property name; `description` and `required` are copied as declared.
//! 3. A default-value expression is parsed as JSON and coerced to the
//!    property type. Failure aborts schema construction.
//! 4. Enumerated values come from the named values accessor when one is
//!    declared, else from the literal array. An unknown accessor or a
//!    literal that is not an array aborts schema construction.
//! 5. String fragments get a `format` tag from the [`FormatRegistry`]; see
//!    [`apply_format`].
//! 6. `index` and `dependsOn` are copied verbatim whenever declared,
//!    independent of the metadata block.
//!
//! Every failure here is a [`ConfigurationError`] naming `Type.property`.

use jsonbind_core::{ConfigurationError, NodeType};
use serde_json::{Map, Value};

use crate::descriptor::{ObjectDescriptor, PropertyDescriptor, TypeDescriptor, TypeName};
use crate::format::FormatRegistry;

/// Enriches `fragment`, the generated schema of `property` on `owner`.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidDefault`],
/// [`ConfigurationError::MissingAccessor`], or
/// [`ConfigurationError::InvalidEnumLiteral`] on bad metadata.
pub fn enrich_property(
    fragment: &mut Map<String, Value>,
    owner: &ObjectDescriptor,
    property: &PropertyDescriptor,
) -> Result<(), ConfigurationError> {
    let qualified = || format!("{}.{}", owner.name, property.name);

    match &property.metadata {
        None => {
            fragment.insert("title".into(), Value::String(property.name.clone()));
        }
        Some(metadata) => {
            let title = metadata
                .title
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or(&property.name);
            fragment.insert("title".into(), Value::String(title.to_string()));
            if let Some(description) = &metadata.description {
                fragment.insert("description".into(), Value::String(description.clone()));
            }
            if metadata.required {
                fragment.insert("required".into(), Value::Bool(true));
            }

            if let Some(expression) = &metadata.default_json {
                let default = coerce_default(expression, &property.ty).map_err(|reason| {
                    ConfigurationError::InvalidDefault {
                        property: qualified(),
                        reason,
                    }
                })?;
                if let Some(default) = default {
                    fragment.insert("default".into(), default);
                }
            }

            let accessor = metadata.values_accessor.as_deref().filter(|a| !a.is_empty());
            let literal = metadata.values_json.as_deref().filter(|l| !l.trim().is_empty());
            if let Some(name) = accessor {
                let values = owner.find_accessor(name).ok_or_else(|| {
                    ConfigurationError::MissingAccessor {
                        property: qualified(),
                        accessor: name.to_string(),
                    }
                })?;
                fragment.insert("enum".into(), Value::Array(values()));
            } else if let Some(literal) = literal {
                let values = parse_enum_literal(literal).map_err(|reason| {
                    ConfigurationError::InvalidEnumLiteral {
                        property: qualified(),
                        reason,
                    }
                })?;
                fragment.insert("enum".into(), Value::Array(values));
            }
        }
    }

    if let Some(mode) = property.index {
        let mode = serde_json::to_value(mode).unwrap_or(Value::Null);
        fragment.insert("index".into(), mode);
    }
    if let Some(depends_on) = &property.depends_on {
        let names = depends_on.iter().cloned().map(Value::String).collect();
        fragment.insert("dependsOn".into(), Value::Array(names));
    }
    Ok(())
}

/// Sets `format` on a string fragment when the registry resolves a tag for
/// `type_name`. Returns whether a tag was applied.
pub fn apply_format(
    fragment: &mut Map<String, Value>,
    type_name: &TypeName,
    registry: &FormatRegistry,
) -> bool {
    if fragment.get("type").and_then(Value::as_str) != Some("string") {
        return false;
    }
    match registry.resolve(type_name) {
        Some(tag) => {
            fragment.insert("format".into(), Value::String(tag.to_string()));
            true
        }
        None => false,
    }
}

/// Parses a default-value expression against `ty`.
///
/// Blank text and `null` mean "no default" and yield `Ok(None)`.
///
/// # Errors
///
/// Returns a human-readable reason when the text is not JSON or does not
/// fit the declared type.
pub fn coerce_default(expression: &str, ty: &TypeDescriptor) -> Result<Option<Value>, String> {
    if expression.trim().is_empty() {
        return Ok(None);
    }
    let parsed: Value = serde_json::from_str(expression)
        .map_err(|e| format!("'{expression}' is not valid JSON: {e}"))?;
    if parsed.is_null() {
        return Ok(None);
    }
    coerce(parsed, ty).map(Some)
}

fn coerce(value: Value, ty: &TypeDescriptor) -> Result<Value, String> {
    match (ty, value) {
        (TypeDescriptor::Any, v) => Ok(v),
        (TypeDescriptor::Optional(_), Value::Null) => Ok(Value::Null),
        (TypeDescriptor::Optional(inner), v) => coerce(v, inner),
        (TypeDescriptor::Null, Value::Null) => Ok(Value::Null),
        (TypeDescriptor::Boolean, v @ Value::Bool(_)) => Ok(v),
        (TypeDescriptor::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Ok(Value::Number(n))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(Value::from(f as i64)),
                    _ => Err(format!("expected integer, found non-integral number {n}")),
                }
            }
        }
        (TypeDescriptor::Number, v @ Value::Number(_)) => Ok(v),
        (TypeDescriptor::String(_) | TypeDescriptor::Opaque(_), v @ Value::String(_)) => Ok(v),
        (TypeDescriptor::String(_), Value::Number(n)) => Ok(Value::String(n.to_string())),
        (TypeDescriptor::String(_), Value::Bool(b)) => Ok(Value::String(b.to_string())),
        (TypeDescriptor::Enumeration(e), Value::String(s)) => {
            if e.variants.contains(&s) {
                Ok(Value::String(s))
            } else {
                Err(format!("'{s}' is not a variant of {}", e.name))
            }
        }
        (TypeDescriptor::Array(inner), Value::Array(items)) => items
            .into_iter()
            .map(|item| coerce(item, inner))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (TypeDescriptor::Map(inner), Value::Object(members)) => members
            .into_iter()
            .map(|(key, member)| coerce(member, inner).map(|member| (key, member)))
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        (TypeDescriptor::Object(object), Value::Object(members)) => {
            let mut coerced = Map::new();
            for (key, member) in members {
                let property = object
                    .find_property(&key)
                    .ok_or_else(|| format!("{} has no property '{key}'", object.name))?;
                let member = coerce(member, &property.ty).map_err(|e| format!("{key}: {e}"))?;
                coerced.insert(key, member);
            }
            Ok(Value::Object(coerced))
        }
        (ty, v) => Err(format!(
            "expected {}, found {}",
            ty.type_name(),
            NodeType::of(&v)
        )),
    }
}

fn parse_enum_literal(literal: &str) -> Result<Vec<Value>, String> {
    match serde_json::from_str::<Value>(literal) {
        Ok(Value::Array(values)) => Ok(values),
        Ok(other) => Err(format!(
            "expected a JSON array, found {}",
            NodeType::of(&other)
        )),
        Err(e) => Err(format!("'{literal}' is not valid JSON: {e}")),
    }
}
