//! # Draft-03 Normalization
//!
//! Schema documents use Draft-03 vocabulary; the conformance checker speaks
//! Draft 4. [`normalize`] rewrites a document into an equivalent Draft-4
//! schema before the checker sees it:
//!
//! - the root `$schema` header is dropped (the checker is pinned to Draft 4);
//! - `required: true` on a property moves into the parent's `required`
//!   array, and boolean `required` members are removed;
//! - `type: "any"`, or a union containing `"any"`, is removed;
//! - unions containing schemas become `anyOf`;
//! - `divisibleBy` becomes `multipleOf`, `extends` becomes `allOf`,
//!   `disallow` becomes `not`;
//! - string-valued `dependencies` become single-element arrays.
//!
//! Unknown keywords (`index`, `dependsOn`, custom `format` tags) pass
//! through untouched. The input document is not modified.

use serde_json::{json, Map, Value};

use crate::dialect::SCHEMA_KEYWORD;

/// Returns the Draft-4 equivalent of `schema`.
pub fn normalize(schema: &Value) -> Value {
    let mut normalized = schema.clone();
    if let Value::Object(members) = &mut normalized {
        members.remove(SCHEMA_KEYWORD);
    }
    normalize_schema(&mut normalized);
    normalized
}

fn normalize_schema(schema: &mut Value) {
    let Value::Object(members) = schema else {
        return;
    };

    if matches!(members.get("required"), Some(Value::Bool(_))) {
        members.remove("required");
    }
    normalize_type(members);
    rename(members, "divisibleBy", "multipleOf");

    if let Some(extends) = members.remove("extends") {
        let mut all_of = match extends {
            Value::Array(items) => items,
            single => vec![single],
        };
        all_of.iter_mut().for_each(normalize_schema);
        members.insert("allOf".into(), Value::Array(all_of));
    }
    if let Some(disallow) = members.remove("disallow") {
        members.insert("not".into(), disallowed(disallow));
    }

    if let Some(Value::Object(properties)) = members.get_mut("properties") {
        let required: Vec<Value> = properties
            .iter()
            .filter(|(_, property)| property.get("required") == Some(&Value::Bool(true)))
            .map(|(name, _)| Value::String(name.clone()))
            .collect();
        properties.values_mut().for_each(normalize_schema);
        if !required.is_empty() {
            match members.get_mut("required") {
                Some(Value::Array(existing)) => {
                    for name in required {
                        if !existing.contains(&name) {
                            existing.push(name);
                        }
                    }
                }
                _ => {
                    members.insert("required".into(), Value::Array(required));
                }
            }
        }
    }

    if let Some(Value::Object(dependencies)) = members.get_mut("dependencies") {
        for dependency in dependencies.values_mut() {
            if let Value::String(name) = dependency {
                let name = std::mem::take(name);
                *dependency = json!([name]);
            }
            normalize_schema(dependency);
        }
    }

    for keyword in ["patternProperties", "definitions"] {
        if let Some(Value::Object(schemas)) = members.get_mut(keyword) {
            schemas.values_mut().for_each(normalize_schema);
        }
    }
    for keyword in ["items", "additionalItems", "additionalProperties", "not"] {
        match members.get_mut(keyword) {
            Some(Value::Array(schemas)) if keyword == "items" => {
                schemas.iter_mut().for_each(normalize_schema)
            }
            Some(nested @ Value::Object(_)) => normalize_schema(nested),
            _ => {}
        }
    }
    for keyword in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(schemas)) = members.get_mut(keyword) {
            schemas.iter_mut().for_each(normalize_schema);
        }
    }
}

fn normalize_type(members: &mut Map<String, Value>) {
    let Some(ty) = members.get("type") else {
        return;
    };
    match ty {
        Value::String(name) if name == "any" => {
            members.remove("type");
        }
        Value::Array(types) if types.iter().any(|t| t == "any") => {
            members.remove("type");
        }
        Value::Array(types) if types.iter().any(Value::is_object) => {
            let any_of = types.iter().cloned().map(type_alternative).collect();
            members.remove("type");
            members.insert("anyOf".into(), Value::Array(any_of));
        }
        _ => {}
    }
}

/// One member of a Draft-03 type union as a standalone schema.
fn type_alternative(alternative: Value) -> Value {
    match alternative {
        Value::String(name) => json!({ "type": name }),
        mut schema => {
            normalize_schema(&mut schema);
            schema
        }
    }
}

fn disallowed(disallow: Value) -> Value {
    match disallow {
        Value::String(name) if name == "any" => json!({}),
        Value::String(name) => json!({ "type": name }),
        Value::Array(types) if types.iter().all(|t| t.is_string() && t != "any") => {
            json!({ "type": types })
        }
        Value::Array(types) => {
            let any_of: Vec<Value> = types
                .into_iter()
                .map(|t| match t {
                    Value::String(name) if name == "any" => json!({}),
                    other => type_alternative(other),
                })
                .collect();
            json!({ "anyOf": any_of })
        }
        mut schema => {
            normalize_schema(&mut schema);
            schema
        }
    }
}

fn rename(members: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = members.remove(from) {
        members.insert(to.to_string(), value);
    }
}
