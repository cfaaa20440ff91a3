//! # jsonbind-schema: Schema Generation & Validation
//!
//! Generates JSON Schema (Draft-03 vocabulary) documents from declarative
//! type descriptors, enriches them with per-property metadata, and validates
//! value trees against schema documents.
//!
//! ## Generation (`descriptor`, `generate`, `enrich`, `format`)
//!
//! A type implements [`Describe`] to produce a [`TypeDescriptor`]. The
//! [`SchemaGenerator`] walks it depth-first; object properties are enriched
//! with titles, descriptions, `required`, defaults, enumerations, `index`,
//! and `dependsOn`. String fragments get a `format` tag from the
//! [`FormatRegistry`], with ancestor fallback. Bad metadata is a
//! [`ConfigurationError`](jsonbind_core::ConfigurationError) at generation
//! time.
//!
//! ## Validation (`document`, `draft3`)
//!
//! [`SchemaDocument`] wraps a schema tree, offers structural accessors, and
//! builds its `jsonschema` validator exactly once on first use. Documents
//! are normalized to Draft 4 before the checker sees them.
//!
//! ## Entry Point
//!
//! [`SchemaFactory`] ties it together: cached per-type documents, schema
//! text, and schema parsing with `$schema` header rewriting.
//!
//! ## Crate Policy
//!
//! - Depends only on `jsonbind-core` internally.
//! - Descriptors are plain data; nothing is discovered by reflection.

pub mod descriptor;
pub mod dialect;
pub mod document;
pub mod draft3;
pub mod enrich;
pub mod factory;
pub mod format;
pub mod generate;

pub use descriptor::{
    Describe, EnumDescriptor, IndexMode, ObjectDescriptor, PropertyDescriptor, PropertyMetadata,
    TypeDescriptor, TypeName, ValuesAccessor,
};
pub use dialect::with_dialect;
pub use document::{SchemaDocument, SchemaType};
pub use factory::SchemaFactory;
pub use format::{FormatRegistry, FILE_FORMAT, INPUT_STREAM_FORMAT};
pub use generate::SchemaGenerator;
