//! # Null-Omitting Serializer
//!
//! Builds a `serde_json::Value` the way `serde_json::to_value` does, except
//! that struct fields whose value is `null` are left out. Only struct fields
//! are affected. Map entries, sequence items, and the members of `Value` and
//! [`ValueNode`](crate::node::ValueNode) trees (which serialize as maps) are
//! written unchanged, so a parsed tree serializes back to the same document.

use serde::ser::{self, Serializer as _};
use serde::Serialize;
use serde_json::{Error, Map, Value};

/// Serialize `value` into a tree, dropping `null` struct fields.
pub(crate) fn to_value_omitting_nulls<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
    value.serialize(OmitNullFields)
}

struct OmitNullFields;

macro_rules! delegate_scalars {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<Value, Error> {
                serde_json::value::Serializer.$method(v)
            }
        )*
    };
}

impl ser::Serializer for OmitNullFields {
    type Ok = Value;
    type Error = Error;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = VariantSeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = VariantStructBuilder;

    delegate_scalars! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    }

    fn serialize_none(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, Error> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        Ok(tagged(variant, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, Error> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqBuilder, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqBuilder, Error> {
        Ok(VariantSeqBuilder {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapBuilder, Error> {
        Ok(MapBuilder {
            members: Map::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<StructBuilder, Error> {
        Ok(StructBuilder {
            members: Map::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantStructBuilder, Error> {
        Ok(VariantStructBuilder {
            variant,
            fields: StructBuilder {
                members: Map::new(),
            },
        })
    }
}

/// Externally tagged enum representation: `{"<variant>": value}`.
fn tagged(variant: &'static str, value: Value) -> Value {
    let mut members = Map::with_capacity(1);
    members.insert(variant.to_owned(), value);
    Value::Object(members)
}

/// Map keys follow serde_json: strings as-is, numbers and booleans as text.
fn map_key(key: Value) -> Result<String, Error> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(<Error as ser::Error>::custom("key must be a string")),
    }
}

struct SeqBuilder {
    items: Vec<Value>,
}

impl SeqBuilder {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.items.push(value.serialize(OmitNullFields)?);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Array(self.items))
    }
}

struct VariantSeqBuilder {
    variant: &'static str,
    items: Vec<Value>,
}

impl ser::SerializeTupleVariant for VariantSeqBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        self.items.push(value.serialize(OmitNullFields)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(tagged(self.variant, Value::Array(self.items)))
    }
}

struct MapBuilder {
    members: Map<String, Value>,
    next_key: Option<String>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Error> {
        self.next_key = Some(map_key(key.serialize(OmitNullFields)?)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| <Error as ser::Error>::custom("map value serialized before its key"))?;
        self.members.insert(key, value.serialize(OmitNullFields)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Object(self.members))
    }
}

struct StructBuilder {
    members: Map<String, Value>,
}

impl StructBuilder {
    fn field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), Error> {
        let value = value.serialize(OmitNullFields)?;
        if !value.is_null() {
            self.members.insert(key.to_owned(), value);
        }
        Ok(())
    }
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.field(key, value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Object(self.members))
    }
}

struct VariantStructBuilder {
    variant: &'static str,
    fields: StructBuilder,
}

impl ser::SerializeStructVariant for VariantStructBuilder {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        self.fields.field(key, value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(tagged(self.variant, Value::Object(self.fields.members)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Address {
        city: Option<String>,
        zip: u32,
    }

    #[derive(Serialize)]
    enum Event {
        Moved { to: Option<u8>, by: u8 },
        Renamed(Option<String>),
        Pair(u8, Option<u8>),
        Cleared,
    }

    #[test]
    fn test_struct_fields_dropped_when_null() {
        let address = Address {
            city: None,
            zip: 10115,
        };
        assert_eq!(to_value_omitting_nulls(&address).unwrap(), json!({"zip": 10115}));
    }

    #[test]
    fn test_tree_members_kept() {
        let tree = json!({"a": null, "b": [{"c": null}]});
        assert_eq!(to_value_omitting_nulls(&tree).unwrap(), tree);
    }

    #[test]
    fn test_map_entries_and_items_kept() {
        let mut map = BTreeMap::new();
        map.insert(1u32, None::<u8>);
        map.insert(2u32, Some(7u8));
        assert_eq!(
            to_value_omitting_nulls(&map).unwrap(),
            json!({"1": null, "2": 7})
        );
        assert_eq!(
            to_value_omitting_nulls(&vec![None, Some(1)]).unwrap(),
            json!([null, 1])
        );
    }

    #[test]
    fn test_enum_variants_match_serde_json_layout() {
        let moved = Event::Moved { to: None, by: 2 };
        assert_eq!(to_value_omitting_nulls(&moved).unwrap(), json!({"Moved": {"by": 2}}));
        assert_eq!(
            to_value_omitting_nulls(&Event::Renamed(None)).unwrap(),
            json!({"Renamed": null})
        );
        assert_eq!(
            to_value_omitting_nulls(&Event::Pair(1, None)).unwrap(),
            json!({"Pair": [1, null]})
        );
        assert_eq!(to_value_omitting_nulls(&Event::Cleared).unwrap(), json!("Cleared"));
    }

    #[test]
    fn test_non_scalar_map_key_rejected() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1u8);
        assert!(to_value_omitting_nulls(&map).is_err());
    }
}
