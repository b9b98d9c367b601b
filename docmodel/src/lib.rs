pub mod document;
pub mod error;
pub mod property;
pub mod schema;

pub use document::{
    Anchor, Document, Lookup, RecordId, SerializeOptions, SetOutcome, SharedDocument, Visit,
};
pub use error::{DocModelError, Result};
pub use property::{DocArray, Element, Item, Link, Property, PropertyKind, Reference};
pub use schema::{
    parse_schema, parse_schema_str, FieldOptions, FieldType, ScalarType, Schema, SchemaSet,
};
