use super::Document;
use crate::property::{Property, PropertyKind};
use crate::schema::FieldOptions;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// How the record identifier appears in wire output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecordId {
    #[default]
    Omit,
    Include,
    /// Include under the given key, e.g. the store's `@rid`
    Rename(String),
}

pub type ExcludeFn<'a> = &'a dyn Fn(&str, &FieldOptions) -> bool;

/// Options shared by the wire (`to_json`) and object (`to_object`) projections.
/// `record_id` and `exclude` only apply to the wire projection.
#[derive(Clone, Default)]
pub struct SerializeOptions<'a> {
    pub virtuals: bool,
    pub metadata: bool,
    /// Only fields that are modified or still carry their default
    pub modified: bool,
    pub record_id: RecordId,
    pub exclude: Option<ExcludeFn<'a>>,
}

impl<'a> SerializeOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain full content used as the baseline for modification tracking.
    pub fn snapshot() -> Self {
        SerializeOptions {
            metadata: true,
            ..Self::default()
        }
    }

    pub fn with_virtuals(mut self) -> Self {
        self.virtuals = true;
        self
    }

    pub fn with_metadata(mut self) -> Self {
        self.metadata = true;
        self
    }

    pub fn only_modified(mut self) -> Self {
        self.modified = true;
        self
    }

    pub fn with_record_id(mut self) -> Self {
        self.record_id = RecordId::Include;
        self
    }

    pub fn with_record_id_as(mut self, key: impl Into<String>) -> Self {
        self.record_id = RecordId::Rename(key.into());
        self
    }

    pub fn excluding(mut self, exclude: ExcludeFn<'a>) -> Self {
        self.exclude = Some(exclude);
        self
    }
}

impl fmt::Debug for SerializeOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializeOptions")
            .field("virtuals", &self.virtuals)
            .field("metadata", &self.metadata)
            .field("modified", &self.modified)
            .field("record_id", &self.record_id)
            .field("exclude", &self.exclude.is_some())
            .finish()
    }
}

/// Which projection is being built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// External/wire shape: record id handling and caller exclusion apply
    Json,
    /// In-memory plain values
    Object,
}

impl Document {
    /// Wire projection of the document.
    pub fn to_json(&self, opts: &SerializeOptions<'_>) -> Map<String, Value> {
        self.project(opts, Shape::Json)
    }

    /// Plain-value projection of the document.
    pub fn to_object(&self, opts: &SerializeOptions<'_>) -> Map<String, Value> {
        self.project(opts, Shape::Object)
    }

    pub(crate) fn project(&self, opts: &SerializeOptions<'_>, shape: Shape) -> Map<String, Value> {
        let mut out = Map::new();

        for property in self.properties() {
            if shape == Shape::Json && property.is_record_id() {
                let key = match &opts.record_id {
                    RecordId::Omit => continue,
                    RecordId::Include => property.name(),
                    RecordId::Rename(key) => key.as_str(),
                };
                if let Some(value) = self.project_property(property, opts, shape) {
                    out.insert(key.to_string(), value);
                }
                continue;
            }

            if !self.included(property, opts, shape) {
                continue;
            }

            if let Some(value) = self.project_property(property, opts, shape) {
                out.insert(property.name().to_string(), value);
            }
        }

        out
    }

    fn included(&self, property: &Property, opts: &SerializeOptions<'_>, shape: Shape) -> bool {
        match property.kind() {
            PropertyKind::Virtual if !opts.virtuals => return false,
            PropertyKind::Virtual
            | PropertyKind::Primitive
            | PropertyKind::Mixed
            | PropertyKind::EmbeddedDocument
            | PropertyKind::Array
            | PropertyKind::EmbeddedArray
            | PropertyKind::Reference => {}
        }

        if property.is_metadata() && !opts.metadata {
            return false;
        }

        if opts.modified && !property.is_modified() && !property.has_default() {
            return false;
        }

        match (shape, opts.exclude) {
            (Shape::Json, Some(exclude)) => !exclude(property.name(), property.options()),
            _ => true,
        }
    }

    fn project_property(
        &self,
        property: &Property,
        opts: &SerializeOptions<'_>,
        shape: Shape,
    ) -> Option<Value> {
        match property.as_virtual() {
            Some(field) => Some(field.compute(self)),
            None => property.project(opts, shape),
        }
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json(&SerializeOptions::default()).serialize(serializer)
    }
}
