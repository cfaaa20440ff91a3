//! # Dialect Header
//!
//! Every generated or parsed schema carries a `$schema` member naming the
//! dialect it is written in. [`with_dialect`] rewrites that header to the
//! configured URI, keeping exactly one header as the first member of the
//! root object.

use serde_json::{Map, Value};

/// Keyword carrying the schema dialect URI.
pub const SCHEMA_KEYWORD: &str = "$schema";

/// Returns `schema` with its `$schema` header set to `uri`.
///
/// Any existing header is removed and the new one becomes the first member
/// of the root object. Non-object schemas are returned unchanged.
pub fn with_dialect(schema: Value, uri: &str) -> Value {
    match schema {
        Value::Object(members) => {
            let mut rewritten = Map::with_capacity(members.len() + 1);
            rewritten.insert(SCHEMA_KEYWORD.to_string(), Value::String(uri.to_string()));
            rewritten.extend(members.into_iter().filter(|(key, _)| key != SCHEMA_KEYWORD));
            Value::Object(rewritten)
        }
        other => other,
    }
}
