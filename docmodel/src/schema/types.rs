use crate::document::Document;
use crate::property::PropertyKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Scalar value types a primitive property coerces into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Datetime,
}

impl ScalarType {
    /// Resolve a declaration tag such as `"string"` or `"Number"`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "string" | "text" => Some(ScalarType::String),
            "number" | "float" | "double" => Some(ScalarType::Number),
            "integer" | "int" | "long" => Some(ScalarType::Integer),
            "boolean" | "bool" => Some(ScalarType::Boolean),
            "date" => Some(ScalarType::Date),
            "datetime" => Some(ScalarType::Datetime),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Integer => "integer",
            ScalarType::Boolean => "boolean",
            ScalarType::Date => "date",
            ScalarType::Datetime => "datetime",
        }
    }
}

/// Built-in default producers, evaluated once per document construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoValue {
    Ulid,
    Uuid,
    Nanoid,
    Now,
}

impl AutoValue {
    pub fn produce(&self) -> Value {
        let produced = match self {
            AutoValue::Ulid => ulid::Ulid::new().to_string(),
            AutoValue::Uuid => uuid::Uuid::new_v4().to_string(),
            AutoValue::Nanoid => nanoid::nanoid!(),
            AutoValue::Now => {
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            }
        };
        Value::String(produced)
    }
}

pub type Producer = Arc<dyn Fn() -> Value + Send + Sync>;

/// Declared default of a field: a literal, a built-in producer, or a closure
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Auto(AutoValue),
    Producer(Producer),
}

impl DefaultValue {
    pub fn producer(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        DefaultValue::Producer(Arc::new(f))
    }

    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Auto(auto) => auto.produce(),
            DefaultValue::Producer(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Auto(auto) => f.debug_tuple("Auto").field(auto).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        DefaultValue::Literal(value)
    }
}

/// Options attached to a single field declaration
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    pub default: Option<DefaultValue>,
    /// Field maps to the store's internal record identifier
    pub record_id: bool,
    /// Internal/system field, excluded from default serialization
    pub metadata: bool,
    /// The declaration exactly as written
    pub raw: Value,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn record_id(mut self) -> Self {
        self.record_id = true;
        self
    }

    pub fn metadata(mut self) -> Self {
        self.metadata = true;
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }

    /// Record identifiers are always treated as metadata.
    pub fn is_metadata(&self) -> bool {
        self.metadata || self.record_id
    }
}

/// The shape of a stored field; selects the property variant built for it
#[derive(Debug, Clone)]
pub enum FieldType {
    Scalar(ScalarType),
    Mixed,
    Object(Arc<Schema>),
    /// Array of scalars; `None` holds items of any shape
    Array(Option<ScalarType>),
    ObjectArray(Arc<Schema>),
    Reference(Arc<Schema>),
    /// Array of references to the target class
    ReferenceArray(Arc<Schema>),
}

impl FieldType {
    /// Tags without a nested schema. `"object"` without fields is schema-less.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "mixed" | "any" | "object" | "{}" => Some(FieldType::Mixed),
            "array" | "list" => Some(FieldType::Array(None)),
            other => ScalarType::from_tag(other).map(FieldType::Scalar),
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            FieldType::Scalar(_) => PropertyKind::Primitive,
            FieldType::Mixed => PropertyKind::Mixed,
            FieldType::Object(_) => PropertyKind::EmbeddedDocument,
            FieldType::Array(_) | FieldType::ReferenceArray(_) => PropertyKind::Array,
            FieldType::ObjectArray(_) => PropertyKind::EmbeddedArray,
            FieldType::Reference(_) => PropertyKind::Reference,
        }
    }

    pub fn sub_schema(&self) -> Option<&Arc<Schema>> {
        match self {
            FieldType::Object(schema)
            | FieldType::ObjectArray(schema)
            | FieldType::Reference(schema)
            | FieldType::ReferenceArray(schema) => Some(schema),
            _ => None,
        }
    }
}

/// A named stored field
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub options: FieldOptions,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type,
            options: FieldOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }
}

pub type VirtualGetter = Arc<dyn Fn(&Document) -> Value + Send + Sync>;

/// A computed, never stored field
#[derive(Clone)]
pub struct VirtualField {
    pub name: String,
    pub getter: VirtualGetter,
}

impl VirtualField {
    pub fn compute(&self, document: &Document) -> Value {
        (self.getter)(document)
    }
}

impl fmt::Debug for VirtualField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualField")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Compiled description of a document's shape.
///
/// Stored fields keep insertion order; names are unique because adding a
/// descriptor under an existing name replaces it in place. Once wrapped in an
/// `Arc` and handed to documents the schema is never mutated.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    class_name: Option<String>,
    fields: Vec<FieldDescriptor>,
    virtuals: Vec<VirtualField>,
    strict: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.with_descriptor(FieldDescriptor::new(name, field_type))
    }

    pub fn with_field_options(
        self,
        name: impl Into<String>,
        field_type: FieldType,
        options: FieldOptions,
    ) -> Self {
        self.with_descriptor(FieldDescriptor::new(name, field_type).with_options(options))
    }

    pub fn with_descriptor(mut self, descriptor: FieldDescriptor) -> Self {
        self.add_path(descriptor);
        self
    }

    pub fn with_virtual(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(&Document) -> Value + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        self.virtuals.retain(|v| v.name != name);
        self.virtuals.push(VirtualField {
            name,
            getter: Arc::new(getter),
        });
        self
    }

    /// Declare or redeclare a stored field. A redeclared field keeps its position.
    pub fn add_path(&mut self, descriptor: FieldDescriptor) {
        match self.fields.iter_mut().find(|f| f.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => self.fields.push(descriptor),
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn virtuals(&self) -> &[VirtualField] {
        &self.virtuals
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Visit every stored field in declaration order.
    pub fn traverse<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &FieldDescriptor),
    {
        for field in &self.fields {
            visitor(&field.name, field);
        }
    }

    /// Visit the flattened paths of the schema. Nested objects contribute
    /// `parent.child` paths instead of a path of their own; array elements
    /// are not paths.
    pub fn each_path<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &FieldDescriptor),
    {
        self.walk_paths("", &mut visitor);
    }

    fn walk_paths(&self, prefix: &str, visitor: &mut dyn FnMut(&str, &FieldDescriptor)) {
        for field in &self.fields {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{prefix}.{}", field.name)
            };

            match &field.field_type {
                FieldType::Object(nested) => nested.walk_paths(&path, visitor),
                _ => visitor(&path, field),
            }
        }
    }

    /// Look up a flattened path as produced by [`Schema::each_path`].
    pub fn path(&self, path: &str) -> Option<&FieldDescriptor> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let field = self.descriptor(head)?;
        match (&field.field_type, rest) {
            (FieldType::Object(_), None) => None,
            (_, None) => Some(field),
            (FieldType::Object(nested), Some(rest)) => nested.path(rest),
            (_, Some(_)) => None,
        }
    }

    /// Map a type tag to a field type for ad-hoc fields. Unknown tags fall
    /// back to a schema-less field.
    pub fn convert_type(&self, tag: &str) -> FieldType {
        FieldType::from_tag(tag).unwrap_or_else(|| {
            log::debug!("convert_type: unknown tag '{tag}', using mixed");
            FieldType::Mixed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn address() -> Arc<Schema> {
        Arc::new(
            Schema::new()
                .with_field_options(
                    "city",
                    FieldType::Scalar(ScalarType::String),
                    FieldOptions::new().with_default(json!("Kosice")),
                )
                .with_field("street1", FieldType::Scalar(ScalarType::String)),
        )
    }

    fn user() -> Schema {
        Schema::new()
            .with_class_name("User")
            .with_field("name", FieldType::Scalar(ScalarType::String))
            .with_field("tags", FieldType::Array(Some(ScalarType::String)))
            .with_field("address", FieldType::Object(address()))
            .with_field("images", FieldType::ObjectArray(address()))
    }

    #[test]
    fn test_traverse_keeps_declaration_order() {
        let schema = user();
        let mut first = Vec::new();
        let mut second = Vec::new();
        schema.traverse(|name, _| first.push(name.to_string()));
        schema.traverse(|name, _| second.push(name.to_string()));

        assert_eq!(first, vec!["name", "tags", "address", "images"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_each_path_flattens_objects_only() {
        let mut paths = Vec::new();
        user().each_path(|path, _| paths.push(path.to_string()));

        assert_eq!(
            paths,
            vec!["name", "tags", "address.city", "address.street1", "images"]
        );
    }

    #[test]
    fn test_path_lookup() {
        let schema = user();
        assert!(schema.path("name").is_some());
        assert!(schema.path("address").is_none());
        assert_eq!(schema.path("address.city").map(|f| f.name.as_str()), Some("city"));
        assert!(schema.path("images.city").is_none());
        assert!(schema.path("missing").is_none());
    }

    #[test]
    fn test_add_path_replaces_in_place() {
        let mut schema = user();
        schema.add_path(FieldDescriptor::new("tags", FieldType::Mixed));

        assert_eq!(schema.len(), 4);
        assert_eq!(schema.fields()[1].name, "tags");
        assert_eq!(schema.fields()[1].field_type.kind(), PropertyKind::Mixed);
    }

    #[test]
    fn test_convert_type() {
        let schema = Schema::new();
        assert_eq!(schema.convert_type("mixed").kind(), PropertyKind::Mixed);
        assert_eq!(schema.convert_type("String").kind(), PropertyKind::Primitive);
        assert_eq!(schema.convert_type("list").kind(), PropertyKind::Array);
        assert_eq!(schema.convert_type("whatever").kind(), PropertyKind::Mixed);
    }

    #[test]
    fn test_record_id_is_metadata() {
        let options = FieldOptions::new().record_id();
        assert!(options.is_metadata());
        assert!(!FieldOptions::new().is_metadata());
    }

    #[test]
    fn test_auto_defaults_produce_strings() {
        for auto in [AutoValue::Ulid, AutoValue::Uuid, AutoValue::Nanoid, AutoValue::Now] {
            let value = DefaultValue::Auto(auto).produce();
            assert!(value.as_str().is_some_and(|s| !s.is_empty()));
        }
        assert_ne!(AutoValue::Ulid.produce(), AutoValue::Ulid.produce());
    }
}
