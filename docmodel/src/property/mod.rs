// Per-field property wrappers: current value, committed original, defaults

mod array;
mod embedded;
mod primitive;
mod reference;

pub use array::{DocArray, Element, Item};
pub use primitive::coerce;
pub use reference::{Link, Reference};

use crate::document::{
    write_shared, Anchor, Document, Lookup, SerializeOptions, SetOutcome, Shape, SharedDocument,
};
use crate::schema::{DefaultValue, FieldDescriptor, FieldOptions, FieldType, VirtualField};
use primitive::ScalarCell;
use serde_json::Value;
use std::borrow::Cow;

/// Closed set of property variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Primitive,
    EmbeddedDocument,
    Array,
    EmbeddedArray,
    Reference,
    Virtual,
    Mixed,
}

#[derive(Debug, Clone)]
enum Storage {
    /// Primitive and mixed fields
    Scalar(ScalarCell),
    Embedded(Box<Document>),
    /// Plain and embedded arrays
    Array(DocArray),
    Reference(Reference),
    Virtual(VirtualField),
}

/// Mutable view of a navigable property value
pub enum Nested<'a> {
    Document(&'a mut Document),
    Array(&'a mut DocArray),
    /// Linked document; writes go through its lock
    Shared(&'a SharedDocument),
}

impl<'a> Nested<'a> {
    pub(crate) fn resolve_mut(self, path: &str) -> Option<Nested<'a>> {
        match self {
            Nested::Document(doc) => doc.resolve_mut(path),
            Nested::Array(array) => array.resolve_mut(path),
            Nested::Shared(_) => {
                log::debug!("no borrowed access below a shared document: {path}");
                None
            }
        }
    }

    pub(crate) fn set_path(self, path: &str, value: Value, commit: bool) -> SetOutcome {
        match self {
            Nested::Document(doc) => doc.set(path, value, commit),
            Nested::Array(array) => array.set_path(path, value, commit),
            Nested::Shared(handle) => write_shared(handle).set(path, value, commit),
        }
    }

    pub(crate) fn set_linked(self, path: &str, linked: SharedDocument) -> SetOutcome {
        match self {
            Nested::Document(doc) => doc.set_linked(path, linked),
            Nested::Array(array) => array.link_path(path, linked),
            Nested::Shared(handle) => write_shared(handle).set_linked(path, linked),
        }
    }
}

/// One field of a document
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    kind: PropertyKind,
    options: FieldOptions,
    storage: Storage,
    /// Declared default still in place (never explicitly set or committed)
    default_pending: bool,
}

impl Property {
    pub(crate) fn new(descriptor: &FieldDescriptor, anchor: Anchor) -> Self {
        let default = descriptor.options.default.as_ref().map(DefaultValue::produce);
        let default_pending = default.is_some();

        let storage = match &descriptor.field_type {
            FieldType::Scalar(scalar) => Storage::Scalar(ScalarCell::new(Some(*scalar), default)),
            FieldType::Mixed => Storage::Scalar(ScalarCell::new(None, default)),
            FieldType::Object(schema) => {
                Storage::Embedded(Box::new(embedded::build(schema, anchor, default)))
            }
            FieldType::Array(scalar) => {
                Storage::Array(DocArray::new(Element::Value(*scalar), anchor, default))
            }
            FieldType::ObjectArray(schema) => {
                Storage::Array(DocArray::new(Element::Document(schema.clone()), anchor, default))
            }
            FieldType::ReferenceArray(target) => {
                Storage::Array(DocArray::new(Element::Reference(target.clone()), anchor, default))
            }
            FieldType::Reference(target) => {
                Storage::Reference(Reference::new(target.clone(), anchor, default))
            }
        };

        Property {
            name: descriptor.name.clone(),
            kind: descriptor.field_type.kind(),
            options: descriptor.options.clone(),
            storage,
            default_pending,
        }
    }

    pub(crate) fn virtual_field(field: &VirtualField) -> Self {
        Property {
            name: field.name.clone(),
            kind: PropertyKind::Virtual,
            options: FieldOptions::default(),
            storage: Storage::Virtual(field.clone()),
            default_pending: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    pub fn is_record_id(&self) -> bool {
        self.options.record_id
    }

    pub fn is_metadata(&self) -> bool {
        self.options.is_metadata()
    }

    pub fn is_virtual(&self) -> bool {
        self.kind == PropertyKind::Virtual
    }

    pub(crate) fn as_virtual(&self) -> Option<&VirtualField> {
        match &self.storage {
            Storage::Virtual(field) => Some(field),
            _ => None,
        }
    }

    /// True while a declared default is the value and the field has never
    /// been explicitly set or committed. Object fields report their children.
    pub fn has_default(&self) -> bool {
        match &self.storage {
            Storage::Embedded(doc) => self.default_pending || doc.has_defaults(),
            Storage::Array(array) => array.has_default(),
            _ => self.default_pending,
        }
    }

    pub fn is_modified(&self) -> bool {
        match &self.storage {
            Storage::Scalar(cell) => cell.is_modified(),
            Storage::Embedded(doc) => doc.has_modifications(),
            Storage::Array(array) => array.is_modified(),
            Storage::Reference(reference) => reference.is_modified(),
            Storage::Virtual(_) => false,
        }
    }

    /// Current value. Virtual fields need their document and read as absent
    /// here; [`Document::get`] computes them.
    pub fn value(&self) -> Lookup<'_> {
        match &self.storage {
            Storage::Scalar(cell) => cell
                .value()
                .map(|value| Lookup::Value(Cow::Borrowed(value)))
                .unwrap_or(Lookup::Absent),
            Storage::Embedded(doc) => Lookup::Document(doc),
            Storage::Array(array) => Lookup::Array(array),
            Storage::Reference(reference) => reference.lookup(),
            Storage::Virtual(_) => Lookup::Absent,
        }
    }

    /// Plain value as of the last commit.
    pub fn original(&self) -> Option<Value> {
        match &self.storage {
            Storage::Scalar(cell) => cell.original().cloned(),
            Storage::Embedded(doc) => Some(Value::Object(doc.original_values())),
            Storage::Array(array) => Some(Value::Array(array.original().to_vec())),
            Storage::Reference(reference) => reference.original().cloned(),
            Storage::Virtual(_) => None,
        }
    }

    pub fn link(&self) -> Option<&Link> {
        match &self.storage {
            Storage::Reference(reference) => reference.link(),
            _ => None,
        }
    }

    /// Apply a new value. Compound variants propagate it into their existing
    /// document or array. Returns false when the value was rejected.
    pub fn assign(&mut self, value: Value) -> bool {
        let applied = match &mut self.storage {
            Storage::Scalar(cell) => {
                let applied = cell.assign(value);
                if !applied {
                    log::debug!("property '{}' rejected an incompatible value", self.name);
                }
                applied
            }
            Storage::Embedded(doc) => embedded::assign(doc, value),
            Storage::Array(array) => array.replace(value),
            Storage::Reference(reference) => reference.assign(value),
            Storage::Virtual(_) => {
                log::debug!("virtual property '{}' is not settable", self.name);
                false
            }
        };

        if applied {
            self.default_pending = false;
        }
        applied
    }

    pub(crate) fn link_shared(&mut self, handle: SharedDocument) -> bool {
        match &mut self.storage {
            Storage::Reference(reference) => {
                reference.link_shared(handle);
                self.default_pending = false;
                true
            }
            _ => {
                log::debug!("property '{}' is not a reference", self.name);
                false
            }
        }
    }

    /// A write below the field counts as setting it.
    pub(crate) fn consume_default(&mut self) {
        self.default_pending = false;
    }

    pub(crate) fn reanchor(&mut self, anchor: Anchor) {
        match &mut self.storage {
            Storage::Embedded(doc) => doc.reanchor(anchor),
            Storage::Array(array) => array.reanchor(anchor),
            Storage::Reference(reference) => reference.reanchor(anchor),
            Storage::Scalar(_) | Storage::Virtual(_) => {}
        }
    }

    /// Make the current value the baseline for modification tracking.
    pub fn set_as_original(&mut self) {
        match &mut self.storage {
            Storage::Scalar(cell) => cell.commit(),
            Storage::Embedded(doc) => doc.set_as_original(),
            Storage::Array(array) => array.set_as_original(),
            Storage::Reference(reference) => reference.commit(),
            Storage::Virtual(_) => {}
        }
        self.default_pending = false;
    }

    /// Wire projection; `None` means the field is omitted from its parent.
    pub fn to_json(&self, opts: &SerializeOptions<'_>) -> Option<Value> {
        self.project(opts, Shape::Json)
    }

    /// In-memory projection; `None` means the field is omitted from its parent.
    pub fn to_object(&self, opts: &SerializeOptions<'_>) -> Option<Value> {
        self.project(opts, Shape::Object)
    }

    pub(crate) fn project(&self, opts: &SerializeOptions<'_>, shape: Shape) -> Option<Value> {
        match &self.storage {
            Storage::Scalar(cell) => cell.value().cloned(),
            Storage::Embedded(doc) => embedded::project(doc, opts, shape),
            Storage::Array(array) => Some(array.project(opts, shape)),
            Storage::Reference(reference) => reference.project(opts, shape),
            Storage::Virtual(_) => None,
        }
    }

    pub(crate) fn nested_mut(&mut self) -> Option<Nested<'_>> {
        match &mut self.storage {
            Storage::Embedded(doc) => Some(Nested::Document(doc)),
            Storage::Array(array) => Some(Nested::Array(array)),
            Storage::Reference(reference) => reference.nested_mut(),
            Storage::Scalar(_) | Storage::Virtual(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ScalarType, Schema};
    use serde_json::json;
    use std::sync::Arc;

    fn descriptor(name: &str, field_type: FieldType, default: Option<Value>) -> FieldDescriptor {
        let options = match default {
            Some(default) => FieldOptions::new().with_default(default),
            None => FieldOptions::new(),
        };
        FieldDescriptor::new(name, field_type).with_options(options)
    }

    #[test]
    fn test_kind_follows_field_type() {
        let cases = [
            (FieldType::Scalar(ScalarType::String), PropertyKind::Primitive),
            (FieldType::Mixed, PropertyKind::Mixed),
            (FieldType::Object(Arc::new(Schema::new())), PropertyKind::EmbeddedDocument),
            (FieldType::Array(None), PropertyKind::Array),
            (FieldType::ObjectArray(Arc::new(Schema::new())), PropertyKind::EmbeddedArray),
            (FieldType::Reference(Arc::new(Schema::new())), PropertyKind::Reference),
            (FieldType::ReferenceArray(Arc::new(Schema::new())), PropertyKind::Array),
        ];
        for (field_type, kind) in cases {
            let property = Property::new(&descriptor("f", field_type, None), Anchor::default());
            assert_eq!(property.kind(), kind);
        }
    }

    #[test]
    fn test_default_policy() {
        let mut property = Property::new(
            &descriptor("name", FieldType::Scalar(ScalarType::String), Some(json!("Zlatko"))),
            Anchor::default(),
        );
        assert!(property.has_default());
        assert!(!property.is_modified());
        assert_eq!(property.value().to_value(), Some(json!("Zlatko")));

        // setting the default's own literal still consumes the default
        assert!(property.assign(json!("Zlatko")));
        assert!(!property.has_default());
        assert!(!property.is_modified());
    }

    #[test]
    fn test_rejected_value_keeps_default() {
        let mut property = Property::new(
            &descriptor("age", FieldType::Scalar(ScalarType::Integer), Some(json!(3))),
            Anchor::default(),
        );
        assert!(!property.assign(json!("three")));
        assert!(property.has_default());
        assert_eq!(property.to_json(&SerializeOptions::default()), Some(json!(3)));
    }

    #[test]
    fn test_unset_mixed_is_omitted() {
        let mut property =
            Property::new(&descriptor("emptyMixed", FieldType::Mixed, None), Anchor::default());
        assert_eq!(property.to_object(&SerializeOptions::default()), None);
        assert!(property.value().is_absent());

        property.assign(json!({ "any": ["shape"] }));
        assert_eq!(
            property.to_object(&SerializeOptions::default()),
            Some(json!({ "any": ["shape"] }))
        );
        assert!(property.is_modified());
    }

    #[test]
    fn test_set_as_original_is_idempotent() {
        let mut property = Property::new(
            &descriptor("name", FieldType::Scalar(ScalarType::String), None),
            Anchor::default(),
        );
        property.assign(json!("Adam"));
        assert!(property.is_modified());

        property.set_as_original();
        assert!(!property.is_modified());
        property.set_as_original();
        assert!(!property.is_modified());
        assert_eq!(property.original(), Some(json!("Adam")));
    }

    #[test]
    fn test_reference_keeps_identifier_shape() {
        let target = Arc::new(Schema::new().with_field_options(
            "name",
            FieldType::Scalar(ScalarType::String),
            FieldOptions::new().with_default(json!("Zlatko")),
        ));
        let mut property =
            Property::new(&descriptor("user", FieldType::Reference(target), None), Anchor::default());

        property.assign(json!("1234"));
        assert!(matches!(property.link(), Some(Link::Id(id)) if id == "1234"));
        assert_eq!(property.to_json(&SerializeOptions::default()), Some(json!("1234")));

        property.assign(json!({}));
        assert!(matches!(property.link(), Some(Link::Document(_))));
        assert_eq!(
            property.to_json(&SerializeOptions::default()),
            Some(json!({ "name": "Zlatko" }))
        );

        assert!(!property.assign(json!([1, 2])));
        property.assign(Value::Null);
        assert!(property.link().is_none());
    }

    #[test]
    fn test_shared_link_tracks_the_live_document() {
        let target = Arc::new(Schema::new().with_field("name", FieldType::Scalar(ScalarType::String)));
        let user = Document::empty(target.clone()).share();
        let mut property =
            Property::new(&descriptor("user", FieldType::Reference(target), None), Anchor::default());

        assert!(property.link_shared(user.clone()));
        assert!(matches!(property.link(), Some(Link::Shared(_))));
        property.set_as_original();
        assert!(!property.is_modified());

        write_shared(&user).set("name", json!("Peter"), false);
        assert_eq!(
            property.to_object(&SerializeOptions::default()),
            Some(json!({ "name": "Peter" }))
        );
        assert!(property.is_modified());

        // merging an object writes through to the shared document
        assert!(property.assign(json!({ "name": "Adam" })));
        assert_eq!(crate::document::read_shared(&user).get_value("name"), Some(json!("Adam")));

        drop(property);
        assert_eq!(Arc::strong_count(&user), 1);
    }

    #[test]
    fn test_virtual_is_not_settable() {
        let schema = Schema::new().with_virtual("niceName", |_| json!("Mr. X"));
        let mut property = Property::virtual_field(&schema.virtuals()[0]);
        assert!(property.is_virtual());
        assert!(!property.assign(json!("Mr. Y")));
        assert!(!property.is_modified());
        assert_eq!(property.to_json(&SerializeOptions::default()), None);
    }
}
