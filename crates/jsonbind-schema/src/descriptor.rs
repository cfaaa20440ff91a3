//! # Type Descriptors
//!
//! Declarative description of a type and the metadata attached to each of
//! its properties. A descriptor is what the generator turns into a schema
//! fragment, and what enrichment reads its per-property decisions from.
//!
//! Types opt in through [`Describe`]. Built-in impls cover primitives,
//! strings, collections, string-keyed maps, smart pointers, `PathBuf`,
//! [`ByteStream`], and the untyped trees. Application structs build an
//! [`ObjectDescriptor`]:
//!
//! ```
//! use jsonbind_schema::{Describe, ObjectDescriptor, PropertyDescriptor, TypeDescriptor};
//!
//! struct Order {
//!     quantity: u32,
//! }
//!
//! impl Describe for Order {
//!     fn describe() -> TypeDescriptor {
//!         ObjectDescriptor::new("Order")
//!             .property(
//!                 PropertyDescriptor::of::<u32>("quantity")
//!                     .required(true)
//!                     .default_json("1"),
//!             )
//!             .into()
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use jsonbind_core::{ByteStream, ValueNode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A type that can describe its own JSON shape.
pub trait Describe {
    /// Returns the descriptor the schema generator works from.
    fn describe() -> TypeDescriptor;
}

/// Name of a described type plus its ancestor chain, nearest first.
///
/// Format lookup walks the chain in order, so a type registered under an
/// ancestor name inherits that ancestor's format tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    lineage: Vec<Cow<'static, str>>,
}

impl TypeName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            lineage: vec![name.into()],
        }
    }

    /// Appends `ancestor` to the lineage.
    pub fn extends(mut self, ancestor: impl Into<Cow<'static, str>>) -> Self {
        self.lineage.push(ancestor.into());
        self
    }

    /// The type's own name.
    pub fn name(&self) -> &str {
        self.lineage.first().map(|n| n.as_ref()).unwrap_or("")
    }

    /// The type's name followed by each ancestor, nearest first.
    pub fn lineage(&self) -> impl Iterator<Item = &str> + '_ {
        self.lineage.iter().map(|n| n.as_ref())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&'static str> for TypeName {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

/// Shape of a described type.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// Untyped; any JSON value.
    Any,
    Null,
    Boolean,
    Integer,
    Number,
    /// Serialized as a JSON string. The name drives format lookup.
    String(TypeName),
    /// A closed set of string values, such as a fieldless Rust enum.
    Enumeration(EnumDescriptor),
    /// Sequence of the inner type.
    Array(Box<TypeDescriptor>),
    /// String-keyed map of the inner type.
    Map(Box<TypeDescriptor>),
    /// The inner type or `null`.
    Optional(Box<TypeDescriptor>),
    /// A type with no JSON shape of its own. Described as a formatted string
    /// when the registry knows it, otherwise as `any`.
    Opaque(TypeName),
    Object(ObjectDescriptor),
}

impl TypeDescriptor {
    /// Plain string type.
    pub fn string() -> Self {
        Self::String(TypeName::new("String"))
    }

    /// String enumeration named `name` with the given variants.
    pub fn enumeration<I, S>(name: impl Into<TypeName>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enumeration(EnumDescriptor {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        })
    }

    pub fn array_of(inner: TypeDescriptor) -> Self {
        Self::Array(Box::new(inner))
    }

    pub fn map_of(inner: TypeDescriptor) -> Self {
        Self::Map(Box::new(inner))
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Name of the described type, for diagnostics.
    pub fn type_name(&self) -> Cow<'_, str> {
        match self {
            Self::Any => Cow::Borrowed("any"),
            Self::Null => Cow::Borrowed("null"),
            Self::Boolean => Cow::Borrowed("boolean"),
            Self::Integer => Cow::Borrowed("integer"),
            Self::Number => Cow::Borrowed("number"),
            Self::String(name) | Self::Opaque(name) => Cow::Borrowed(name.name()),
            Self::Enumeration(e) => Cow::Borrowed(e.name.name()),
            Self::Array(inner) => Cow::Owned(format!("array of {}", inner.type_name())),
            Self::Map(inner) => Cow::Owned(format!("map of {}", inner.type_name())),
            Self::Optional(inner) => Cow::Owned(format!("optional {}", inner.type_name())),
            Self::Object(o) => Cow::Borrowed(o.name.name()),
        }
    }
}

impl From<ObjectDescriptor> for TypeDescriptor {
    fn from(object: ObjectDescriptor) -> Self {
        Self::Object(object)
    }
}

/// A closed set of string values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: TypeName,
    pub variants: Vec<String>,
}

/// Zero-argument function producing enumerated values for a property.
pub type ValuesAccessor = fn() -> Vec<Value>;

/// A struct-like type: named properties in declaration order plus the
/// values accessors its properties may refer to by name.
#[derive(Debug, Clone)]
pub struct ObjectDescriptor {
    pub name: TypeName,
    pub properties: Vec<PropertyDescriptor>,
    accessors: Vec<(String, ValuesAccessor)>,
}

impl ObjectDescriptor {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            accessors: Vec::new(),
        }
    }

    /// Appends a property. Declaration order is schema order.
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Registers a named values accessor.
    pub fn accessor(mut self, name: impl Into<String>, accessor: ValuesAccessor) -> Self {
        self.accessors.push((name.into(), accessor));
        self
    }

    /// Looks up a values accessor by name.
    pub fn find_accessor(&self, name: &str) -> Option<ValuesAccessor> {
        self.accessors
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, accessor)| *accessor)
    }

    /// Looks up a property by name.
    pub fn find_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Indexing hint carried verbatim into the schema's `index` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    /// Searchable by value.
    Index,
    /// Searchable and aggregated for faceted navigation.
    Facet,
}

/// The metadata block of a property. Its presence alone changes how the
/// title is chosen, so it is kept distinct from "no metadata".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    /// JSON literal parsed against the property type.
    pub default_json: Option<String>,
    /// JSON array literal of enumerated values.
    pub values_json: Option<String>,
    /// Name of a values accessor on the owning type.
    pub values_accessor: Option<String>,
}

/// One property of an [`ObjectDescriptor`].
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
    pub metadata: Option<PropertyMetadata>,
    pub index: Option<IndexMode>,
    pub depends_on: Option<Vec<String>>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            metadata: None,
            index: None,
            depends_on: None,
        }
    }

    /// Property of type `T`.
    pub fn of<T: Describe + ?Sized>(name: impl Into<String>) -> Self {
        Self::new(name, T::describe())
    }

    /// Attaches an empty metadata block.
    pub fn annotated(mut self) -> Self {
        self.metadata_mut();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.metadata_mut().title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata_mut().description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.metadata_mut().required = required;
        self
    }

    pub fn default_json(mut self, expression: impl Into<String>) -> Self {
        self.metadata_mut().default_json = Some(expression.into());
        self
    }

    pub fn values_json(mut self, expression: impl Into<String>) -> Self {
        self.metadata_mut().values_json = Some(expression.into());
        self
    }

    pub fn values_accessor(mut self, accessor: impl Into<String>) -> Self {
        self.metadata_mut().values_accessor = Some(accessor.into());
        self
    }

    pub fn index(mut self, mode: IndexMode) -> Self {
        self.index = Some(mode);
        self
    }

    pub fn depends_on<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    fn metadata_mut(&mut self) -> &mut PropertyMetadata {
        self.metadata.get_or_insert_with(PropertyMetadata::default)
    }
}

macro_rules! describe_as {
    ($variant:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe() -> TypeDescriptor {
                    $variant
                }
            }
        )+
    };
}

describe_as!(TypeDescriptor::Boolean => bool);
describe_as!(TypeDescriptor::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
describe_as!(TypeDescriptor::Number => f32, f64);
describe_as!(TypeDescriptor::Null => ());
describe_as!(TypeDescriptor::Any => Value, ValueNode);
describe_as!(TypeDescriptor::string() => String, str);

impl Describe for char {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::String(TypeName::new("char"))
    }
}

impl Describe for PathBuf {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::String(TypeName::new("PathBuf"))
    }
}

impl Describe for ByteStream {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Opaque(TypeName::new("ByteStream"))
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::optional(T::describe())
    }
}

impl<T: Describe + ?Sized> Describe for Box<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}

impl<T: Describe + ?Sized> Describe for Arc<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}

impl<T: Describe + ?Sized> Describe for Rc<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}

impl<T: Describe + ?Sized> Describe for &T {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}

impl<T: Describe> Describe for [T] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::array_of(T::describe())
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::array_of(T::describe())
    }
}

macro_rules! describe_sequence {
    ($($ty:ident),+) => {
        $(
            impl<T: Describe> Describe for $ty<T> {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::array_of(T::describe())
                }
            }
        )+
    };
}

describe_sequence!(Vec, VecDeque, BTreeSet);

impl<T: Describe, S> Describe for HashSet<T, S> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::array_of(T::describe())
    }
}

impl<V: Describe, S> Describe for HashMap<String, V, S> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::map_of(V::describe())
    }
}

impl<V: Describe> Describe for BTreeMap<String, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::map_of(V::describe())
    }
}
