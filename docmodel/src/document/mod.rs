// Schema-shaped documents: path access, dirty tracking, dynamic fields

mod path;
mod serialize;

pub use path::{split_path, Anchor};
pub use serialize::{ExcludeFn, RecordId, SerializeOptions, Shape};

use crate::property::{DocArray, Nested, Property, PropertyKind};
use crate::schema::{FieldDescriptor, Schema};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A top-level document linked from reference fields without being owned by
/// them. Its lifetime is independent of every document linking to it.
pub type SharedDocument = Arc<RwLock<Document>>;

pub(crate) fn read_shared(handle: &SharedDocument) -> RwLockReadGuard<'_, Document> {
    handle.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_shared(handle: &SharedDocument) -> RwLockWriteGuard<'_, Document> {
    handle.write().unwrap_or_else(PoisonError::into_inner)
}

/// Result of resolving a path. `Absent` is the single "not found" sentinel:
/// unknown fields, unset values, out-of-range indexes and paths that run
/// through a non-navigable value all resolve to it.
#[derive(Debug, Clone)]
pub enum Lookup<'a> {
    Absent,
    Value(Cow<'a, Value>),
    Document(&'a Document),
    Array(&'a DocArray),
    /// Linked document held through a shared handle
    Shared(&'a SharedDocument),
}

impl<'a> Lookup<'a> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Lookup::Value(value) => Some(&**value),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&'a Document> {
        match self {
            Lookup::Document(doc) => Some(*doc),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&'a DocArray> {
        match self {
            Lookup::Array(array) => Some(*array),
            _ => None,
        }
    }

    pub fn as_shared(&self) -> Option<&'a SharedDocument> {
        match self {
            Lookup::Shared(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Plain value of whatever was found; documents and arrays use their
    /// default object projection.
    pub fn to_value(&self) -> Option<Value> {
        let opts = SerializeOptions::default();
        match self {
            Lookup::Absent => None,
            Lookup::Value(value) => Some(value.clone().into_owned()),
            Lookup::Document(doc) => Some(Value::Object(doc.to_object(&opts))),
            Lookup::Array(array) => Some(array.to_object(&opts)),
            Lookup::Shared(handle) => Some(Value::Object(read_shared(handle).to_object(&opts))),
        }
    }

    /// Resolve `rest` below a navigable value. `None` when this value cannot
    /// be navigated. Results read through a shared link are copied out.
    pub(crate) fn descend(&self, rest: &str) -> Option<Lookup<'a>> {
        match *self {
            Lookup::Document(doc) => Some(doc.get(rest)),
            Lookup::Array(array) => Some(array.get(rest)),
            Lookup::Shared(handle) => {
                let found = read_shared(handle).get(rest).to_value();
                Some(found.map_or(Lookup::Absent, |value| Lookup::Value(Cow::Owned(value))))
            }
            Lookup::Absent | Lookup::Value(_) => None,
        }
    }

    pub(crate) fn modified_below(&self, rest: &str) -> Option<Option<bool>> {
        match *self {
            Lookup::Document(doc) => Some(doc.is_modified(rest)),
            Lookup::Array(array) => Some(array.is_modified_path(rest)),
            Lookup::Shared(handle) => Some(read_shared(handle).is_modified(rest)),
            Lookup::Absent | Lookup::Value(_) => None,
        }
    }
}

/// What a `set` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Applied,
    /// The field was unknown and materialized as a mixed field first
    Materialized,
    /// Unknown path, strict schema, non-navigable intermediate or rejected value
    Ignored,
}

/// Argument of [`Document::for_each`]
pub enum Visit<'a> {
    Value(Lookup<'a>),
    Property(&'a Property),
}

/// One record shaped by a schema.
///
/// Holds one property per stored field (plus virtual fields) in declaration
/// order, followed by fields materialized at runtime when the schema is not
/// strict. Nested documents and arrays are owned by the property holding
/// them.
#[derive(Debug, Clone)]
pub struct Document {
    schema: Arc<Schema>,
    properties: Vec<Property>,
    dynamic: Vec<Property>,
    class_name: Option<String>,
    anchor: Anchor,
}

impl Document {
    /// Build a top-level document and apply `initial` through [`Document::set`].
    pub fn new(schema: Arc<Schema>, initial: &Map<String, Value>) -> Self {
        let class_name = schema.class_name().map(str::to_string);
        let anchor = Anchor::root(class_name.clone());
        Self::with_anchor(schema, initial, class_name, anchor)
    }

    pub fn empty(schema: Arc<Schema>) -> Self {
        Self::new(schema, &Map::new())
    }

    /// Wrap the document in a handle that reference fields can link to.
    pub fn share(self) -> SharedDocument {
        Arc::new(RwLock::new(self))
    }

    /// Rebuild a document from data already persisted: every supplied value
    /// is committed as original.
    pub fn from_persisted(schema: Arc<Schema>, data: &Map<String, Value>) -> Self {
        let mut doc = Self::empty(schema);
        doc.setup_data(data);
        doc
    }

    /// Build a document positioned at `anchor` inside a larger tree.
    pub fn with_anchor(
        schema: Arc<Schema>,
        initial: &Map<String, Value>,
        class_name: Option<String>,
        anchor: Anchor,
    ) -> Self {
        let mut properties = Vec::with_capacity(schema.len() + schema.virtuals().len());
        schema.traverse(|name, descriptor| {
            properties.push(Property::new(descriptor, anchor.child(name)));
        });
        properties.extend(schema.virtuals().iter().map(Property::virtual_field));

        let mut doc = Document {
            schema,
            properties,
            dynamic: Vec::new(),
            class_name,
            anchor,
        };
        doc.set_all(initial, false);
        doc
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// All properties: schema fields, virtual fields, then dynamic fields in
    /// the order they were added.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().chain(self.dynamic.iter())
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties().find(|p| p.name() == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.properties().map(Property::name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.properties().position(|p| p.name() == name)
    }

    fn slot_mut(&mut self, index: usize) -> &mut Property {
        let fixed = self.properties.len();
        if index < fixed {
            &mut self.properties[index]
        } else {
            &mut self.dynamic[index - fixed]
        }
    }

    fn value_of<'a>(&'a self, property: &'a Property) -> Lookup<'a> {
        match property.as_virtual() {
            Some(field) => Lookup::Value(Cow::Owned(field.compute(self))),
            None => property.value(),
        }
    }

    /// Resolve `path`. Only the first `.` is consumed per level; the rest is
    /// resolved by the nested document or array the head field holds.
    pub fn get(&self, path: &str) -> Lookup<'_> {
        let (head, rest) = split_path(path);
        let Some(property) = self.property(head) else {
            log::debug!("{}: get path not exists: {path}", self.anchor);
            return Lookup::Absent;
        };

        let Some(rest) = rest else {
            return self.value_of(property);
        };

        property.value().descend(rest).unwrap_or_else(|| {
            log::debug!("{}: get deep path not navigable: {path}", self.anchor);
            Lookup::Absent
        })
    }

    /// Convenience for `get(path).to_value()`.
    pub fn get_value(&self, path: &str) -> Option<Value> {
        self.get(path).to_value()
    }

    /// Set the value at `path`, optionally committing it as original.
    ///
    /// An unknown top-level name is materialized as a mixed field when the
    /// schema is not strict and ignored otherwise. Dotted paths recurse into
    /// the nested document or array held by the head field.
    pub fn set(&mut self, path: &str, value: Value, commit: bool) -> SetOutcome {
        let (head, rest) = split_path(path);
        let Some(rest) = rest else {
            return self.set_field(head, value, commit);
        };

        let Some(index) = self.position(head) else {
            log::debug!("{}: set deep path not exists: {path}", self.anchor);
            return SetOutcome::Ignored;
        };

        let property = self.slot_mut(index);
        let embedded = property.kind() == PropertyKind::EmbeddedDocument;
        let Some(outcome) = property
            .nested_mut()
            .map(|nested| nested.set_path(rest, value, commit))
        else {
            log::debug!("{}: set deep path not navigable: {path}", self.anchor);
            return SetOutcome::Ignored;
        };

        // a declared object default is consumed by setting any of its fields
        if embedded && outcome != SetOutcome::Ignored {
            self.slot_mut(index).consume_default();
        }
        outcome
    }

    fn set_field(&mut self, name: &str, value: Value, commit: bool) -> SetOutcome {
        let (index, outcome) = match self.position(name) {
            Some(index) => (index, SetOutcome::Applied),
            None if self.schema.is_strict() => {
                log::debug!("{}: set path not exists: {name}", self.anchor);
                return SetOutcome::Ignored;
            }
            None => (self.materialize(name), SetOutcome::Materialized),
        };

        let property = self.slot_mut(index);
        if !property.assign(value) {
            return SetOutcome::Ignored;
        }
        if commit {
            property.set_as_original();
        }
        outcome
    }

    fn materialize(&mut self, name: &str) -> usize {
        let field_type = self.schema.convert_type("mixed");
        let descriptor = FieldDescriptor::new(name, field_type);
        log::debug!("{}: materializing dynamic field {}", self.anchor, self.anchor.qualify(name));

        self.dynamic.push(Property::new(&descriptor, self.anchor.child(name)));
        self.properties.len() + self.dynamic.len() - 1
    }

    /// Apply every entry of `values` independently with the same commit flag.
    pub fn set_all(&mut self, values: &Map<String, Value>, commit: bool) {
        for (path, value) in values {
            self.set(path, value.clone(), commit);
        }
    }

    /// Load values known to be persisted; they are born unmodified.
    pub fn setup_data(&mut self, values: &Map<String, Value>) {
        self.set_all(values, true);
    }

    /// Link the shared document into the reference field at `path`. The
    /// reference holds the handle; the document is neither copied nor owned.
    pub fn set_linked(&mut self, path: &str, linked: SharedDocument) -> SetOutcome {
        let (head, rest) = split_path(path);
        let Some(index) = self.position(head) else {
            log::debug!("{}: link path not exists: {path}", self.anchor);
            return SetOutcome::Ignored;
        };

        let property = self.slot_mut(index);
        let outcome = match rest {
            None => Some(if property.link_shared(linked) {
                SetOutcome::Applied
            } else {
                SetOutcome::Ignored
            }),
            Some(rest) => property
                .nested_mut()
                .map(|nested| nested.set_linked(rest, linked)),
        };
        outcome.unwrap_or_else(|| {
            log::debug!("{}: link deep path not navigable: {path}", self.anchor);
            SetOutcome::Ignored
        })
    }

    /// Modification flag of the property at `path`; `None` when the path
    /// does not resolve.
    pub fn is_modified(&self, path: &str) -> Option<bool> {
        let (head, rest) = split_path(path);
        let Some(property) = self.property(head) else {
            log::debug!("{}: isModified path not exists: {path}", self.anchor);
            return None;
        };

        let Some(rest) = rest else {
            return Some(property.is_modified());
        };

        property.value().modified_below(rest).unwrap_or_else(|| {
            log::debug!("{}: isModified deep path not navigable: {path}", self.anchor);
            None
        })
    }

    /// True when any property differs from its original.
    pub fn has_modifications(&self) -> bool {
        self.properties().any(Property::is_modified)
    }

    pub fn modified_fields(&self) -> Vec<&str> {
        self.properties()
            .filter(|p| p.is_modified())
            .map(Property::name)
            .collect()
    }

    pub(crate) fn has_defaults(&self) -> bool {
        self.properties().any(Property::has_default)
    }

    /// Commit every property.
    pub fn set_as_original(&mut self) {
        for property in self.properties.iter_mut().chain(self.dynamic.iter_mut()) {
            property.set_as_original();
        }
    }

    /// Committed values of all stored fields.
    pub fn original_values(&self) -> Map<String, Value> {
        self.properties()
            .filter_map(|p| p.original().map(|value| (p.name().to_string(), value)))
            .collect()
    }

    /// Visit every field in order. With `include_wrappers` the visitor gets
    /// the property itself, otherwise its current value.
    pub fn for_each<F>(&self, include_wrappers: bool, mut visitor: F)
    where
        F: FnMut(Visit<'_>, &str),
    {
        for property in self.properties() {
            let visit = if include_wrappers {
                Visit::Property(property)
            } else {
                Visit::Value(self.value_of(property))
            };
            visitor(visit, property.name());
        }
    }

    /// Dotted paths of every dynamically materialized field in this document
    /// and the documents nested below it.
    pub fn dynamic_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_dynamic("", &mut paths);
        paths
    }

    fn collect_dynamic(&self, prefix: &str, paths: &mut Vec<String>) {
        let join = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            }
        };

        for property in self.properties() {
            match property.value() {
                Lookup::Document(doc) => doc.collect_dynamic(&join(property.name()), paths),
                Lookup::Array(array) => {
                    for (index, doc) in array.documents() {
                        let item = join(&format!("{}.{index}", property.name()));
                        doc.collect_dynamic(&item, paths);
                    }
                }
                _ => {}
            }
        }
        paths.extend(self.dynamic.iter().map(|p| join(p.name())));
    }

    /// Mutable access to the nested document at `path`.
    pub fn document_mut(&mut self, path: &str) -> Option<&mut Document> {
        match self.resolve_mut(path)? {
            Nested::Document(doc) => Some(doc),
            Nested::Array(_) | Nested::Shared(_) => None,
        }
    }

    /// Mutable access to the array at `path`.
    pub fn array_mut(&mut self, path: &str) -> Option<&mut DocArray> {
        match self.resolve_mut(path)? {
            Nested::Array(array) => Some(array),
            Nested::Document(_) | Nested::Shared(_) => None,
        }
    }

    /// Move the document to `anchor`, relabelling everything it owns.
    pub(crate) fn reanchor(&mut self, anchor: Anchor) {
        for property in self.properties.iter_mut().chain(self.dynamic.iter_mut()) {
            property.reanchor(anchor.child(property.name()));
        }
        self.anchor = anchor;
    }

    pub(crate) fn resolve_mut(&mut self, path: &str) -> Option<Nested<'_>> {
        let (head, rest) = split_path(path);
        let index = self.position(head)?;
        let nested = self.slot_mut(index).nested_mut()?;
        match rest {
            None => Some(nested),
            Some(rest) => nested.resolve_mut(rest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldOptions, FieldType, ScalarType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

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

    fn user(strict: bool) -> Arc<Schema> {
        Arc::new(
            Schema::new()
                .with_class_name("User")
                .with_strict(strict)
                .with_field_options(
                    "name",
                    FieldType::Scalar(ScalarType::String),
                    FieldOptions::new().with_default(json!("Zlatko")),
                )
                .with_field("age", FieldType::Scalar(ScalarType::Integer))
                .with_field("address", FieldType::Object(address()))
                .with_field("images", FieldType::ObjectArray(address()))
                .with_field("tags", FieldType::Array(Some(ScalarType::String))),
        )
    }

    #[test]
    fn test_defaults_are_readable_and_clean() {
        let doc = Document::empty(user(true));
        assert_eq!(doc.get_value("name"), Some(json!("Zlatko")));
        assert_eq!(doc.is_modified("name"), Some(false));
        assert_eq!(doc.get_value("address.city"), Some(json!("Kosice")));
        assert!(doc.get("age").is_absent());
        assert!(!doc.has_modifications());
    }

    #[test]
    fn test_construction_routes_through_set() {
        let doc = Document::new(user(true), &obj(json!({ "age": "41", "address": { "street1": "Main" } })));
        assert_eq!(doc.get_value("age"), Some(json!(41)));
        assert_eq!(doc.is_modified("age"), Some(true));
        assert_eq!(doc.get_value("address.street1"), Some(json!("Main")));
        assert_eq!(doc.is_modified("address"), Some(true));
        assert_eq!(doc.is_modified("address.city"), Some(false));
    }

    #[test]
    fn test_dotted_set_then_get() {
        let mut doc = Document::empty(user(true));
        assert_eq!(doc.set("address.city", json!("Praha"), false), SetOutcome::Applied);
        assert_eq!(doc.get_value("address.city"), Some(json!("Praha")));
        assert_eq!(doc.is_modified("address.city"), Some(true));
    }

    #[test]
    fn test_misses_are_soft() {
        let mut doc = Document::empty(user(true));
        assert!(doc.get("missing").is_absent());
        assert!(doc.get("missing.deeper").is_absent());
        assert!(doc.get("name.length").is_absent());
        assert_eq!(doc.is_modified("missing"), None);
        assert_eq!(doc.is_modified("name.length"), None);
        assert_eq!(doc.set("name.length", json!(3), false), SetOutcome::Ignored);
        assert_eq!(doc.set("missing.deeper", json!(3), false), SetOutcome::Ignored);
        let other = Document::empty(user(true)).share();
        assert_eq!(doc.set_linked("name.first", other), SetOutcome::Ignored);
        assert_eq!(doc.get_value("name"), Some(json!("Zlatko")));
    }

    #[test]
    fn test_strict_schema_ignores_unknown_fields() {
        let mut doc = Document::empty(user(true));
        assert_eq!(doc.set("unknownField", json!(42), false), SetOutcome::Ignored);
        assert!(doc.get("unknownField").is_absent());
        assert!(doc.dynamic_paths().is_empty());
    }

    #[test]
    fn test_non_strict_schema_materializes_unknown_fields() {
        let mut doc = Document::empty(user(false));
        assert_eq!(doc.set("unknownField", json!(42), false), SetOutcome::Materialized);
        assert_eq!(doc.set("unknownField", json!(43), false), SetOutcome::Applied);
        assert_eq!(doc.get_value("unknownField"), Some(json!(43)));
        assert_eq!(
            doc.to_object(&SerializeOptions::default()).get("unknownField"),
            Some(&json!(43))
        );
        assert_eq!(doc.field_names().last(), Some("unknownField"));
    }

    #[test]
    fn test_dynamic_paths_cover_nested_documents() {
        let mut doc = Document::empty(user(false));
        doc.array_mut("images").unwrap().push(json!({}));
        doc.array_mut("images").unwrap().push(json!({}));

        assert_eq!(doc.set("images.1.addTest", json!(1234), false), SetOutcome::Materialized);
        assert_eq!(doc.set("address.zip", json!("04001"), false), SetOutcome::Materialized);
        doc.set("extra", json!(true), false);

        assert_eq!(doc.dynamic_paths(), vec!["address.zip", "images.1.addTest", "extra"]);
        assert_eq!(doc.get_value("images.1.addTest"), Some(json!(1234)));
    }

    #[test]
    fn test_setup_data_is_clean() {
        let mut doc = Document::empty(user(true));
        doc.setup_data(&obj(json!({ "name": "Adam", "age": 30, "tags": ["a"] })));
        assert!(!doc.has_modifications());
        assert_eq!(doc.modified_fields(), Vec::<&str>::new());

        doc.set("age", json!(31), false);
        assert_eq!(doc.modified_fields(), vec!["age"]);
    }

    #[test]
    fn test_commit_flag_on_set() {
        let mut doc = Document::empty(user(true));
        doc.set("age", json!(7), true);
        assert_eq!(doc.is_modified("age"), Some(false));
        assert_eq!(doc.property("age").and_then(Property::original), Some(json!(7)));
    }

    #[test]
    fn test_for_each_in_declaration_order() {
        let doc = Document::new(user(false), &obj(json!({ "zz": 1 })));

        let mut names = Vec::new();
        doc.for_each(false, |_, name| names.push(name.to_string()));
        assert_eq!(names, vec!["name", "age", "address", "images", "tags", "zz"]);

        let mut values = Vec::new();
        doc.for_each(false, |visit, _| {
            if let Visit::Value(lookup) = visit {
                values.push(lookup.to_value());
            }
        });
        assert_eq!(values[0], Some(json!("Zlatko")));
        assert_eq!(values[1], None);

        let mut kinds = Vec::new();
        doc.for_each(true, |visit, _| {
            if let Visit::Property(property) = visit {
                kinds.push(property.kind());
            }
        });
        assert_eq!(kinds.len(), 6);
    }

    #[test]
    fn test_embedded_wrapper_survives_set() {
        let mut doc = Document::empty(user(true));
        doc.set("address", json!({ "street1": "Main" }), false);
        doc.set("address", json!({ "city": "Praha" }), false);

        // merged, not replaced
        assert_eq!(
            doc.get_value("address"),
            Some(json!({ "city": "Praha", "street1": "Main" }))
        );
        assert_eq!(doc.set("address", json!("flat"), false), SetOutcome::Ignored);
    }

    #[test]
    fn test_original_values() {
        let mut doc = Document::empty(user(true));
        doc.setup_data(&obj(json!({ "age": 5 })));
        doc.set("age", json!(6), false);

        let original = doc.original_values();
        assert_eq!(original.get("age"), Some(&json!(5)));
        assert_eq!(original.get("address"), Some(&json!({ "city": "Kosice" })));
    }

    #[test]
    fn test_write_below_object_consumes_its_default() {
        let plain = Arc::new(
            Schema::new()
                .with_field("city", FieldType::Scalar(ScalarType::String))
                .with_field("street1", FieldType::Scalar(ScalarType::String)),
        );
        let schema = Arc::new(Schema::new().with_field_options(
            "address",
            FieldType::Object(plain),
            FieldOptions::new().with_default(json!({ "city": "Praha" })),
        ));
        let mut doc = Document::empty(schema);
        assert!(doc.property("address").unwrap().has_default());

        assert_eq!(doc.set("address.street1", json!("Main"), false), SetOutcome::Applied);
        assert!(!doc.property("address").unwrap().has_default());
        assert_eq!(doc.get_value("address.city"), Some(json!("Praha")));

        // a rejected write leaves the default in place
        let mut doc = Document::empty(doc.schema().clone());
        assert_eq!(doc.set("address.street1.x", json!(1), false), SetOutcome::Ignored);
        assert!(doc.property("address").unwrap().has_default());
    }

    #[test]
    fn test_dotted_paths_reach_through_shared_links() {
        let profile_schema = Arc::new(
            Schema::new()
                .with_class_name("Profile")
                .with_field("user", FieldType::Reference(user(true))),
        );
        let user_doc = Document::empty(user(true)).share();
        let mut profile = Document::empty(profile_schema);
        assert_eq!(profile.set_linked("user", user_doc.clone()), SetOutcome::Applied);

        assert_eq!(profile.set("user.age", json!(30), false), SetOutcome::Applied);
        assert_eq!(read_shared(&user_doc).get_value("age"), Some(json!(30)));
        assert_eq!(profile.get_value("user.age"), Some(json!(30)));
        assert_eq!(profile.is_modified("user.age"), Some(true));
        assert!(profile.get("user").as_shared().is_some());
        assert!(profile.document_mut("user").is_none());

        assert_eq!(profile.set_linked("user.age", user_doc.clone()), SetOutcome::Ignored);
        assert_eq!(profile.set_linked("missing", user_doc), SetOutcome::Ignored);
    }

    #[test]
    fn test_shifted_items_are_reanchored() {
        let mut doc = Document::empty(user(false));
        let images = doc.array_mut("images").unwrap();
        images.push(json!({ "city": "Brno" }));
        images.push(json!({ "city": "Praha" }));
        images.shift();

        let image = doc.get("images.0").as_document().unwrap();
        assert_eq!(image.anchor().path(), "images.0");
        assert_eq!(image.anchor().to_string(), "User:images.0");
        assert_eq!(image.property("city").and_then(|p| p.value().to_value()), Some(json!("Praha")));
    }

    #[test]
    fn test_document_mut_reaches_nested() {
        let mut doc = Document::empty(user(true));
        doc.array_mut("images").unwrap().push(json!({ "city": "Brno" }));

        let image = doc.document_mut("images.0").unwrap();
        image.set("street1", json!("Husova"), false);
        assert_eq!(doc.get_value("images.0.street1"), Some(json!("Husova")));
        assert!(doc.document_mut("name").is_none());
        assert!(doc.array_mut("address").is_none());
    }
}
