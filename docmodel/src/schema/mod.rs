// Schema model and declarative schema loading

mod parser;
mod types;

pub use parser::{parse_schema, parse_schema_str, SchemaSet};
pub use types::{
    AutoValue, DefaultValue, FieldDescriptor, FieldOptions, FieldType, Producer, ScalarType,
    Schema, VirtualField, VirtualGetter,
};
