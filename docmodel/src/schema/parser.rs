use super::types::{
    AutoValue, DefaultValue, FieldDescriptor, FieldOptions, FieldType, Schema,
};
use crate::error::{DocModelError, Result};
use serde_yaml::{Mapping, Value as Yaml};
use std::path::Path;
use std::sync::Arc;

/// Named schemas loaded from one declaration file, in declaration order
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    classes: Vec<(String, Arc<Schema>)>,
}

impl SchemaSet {
    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.classes
            .iter()
            .find(|(class, _)| class == name)
            .map(|(_, schema)| schema)
    }

    pub fn require(&self, name: &str) -> Result<Arc<Schema>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| DocModelError::UnknownClass(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Parse a schema.yaml file into a SchemaSet
pub fn parse_schema(path: &Path) -> Result<SchemaSet> {
    let content = std::fs::read_to_string(path)?;
    parse_schema_str(&content)
}

/// Parse a schema YAML string into a SchemaSet
pub fn parse_schema_str(content: &str) -> Result<SchemaSet> {
    let root: Yaml = serde_yaml::from_str(content)?;
    let classes = root
        .get("classes")
        .and_then(Yaml::as_mapping)
        .ok_or_else(|| DocModelError::Schema("missing top-level 'classes' mapping".into()))?;

    let mut set = SchemaSet::default();
    for (key, decl) in classes {
        let name = key_str(key)?;
        if set.get(&name).is_some() {
            return Err(DocModelError::Schema(format!("class '{name}' declared twice")));
        }
        let schema = parse_class(&name, decl, &set)?;
        set.classes.push((name, Arc::new(schema)));
    }

    Ok(set)
}

fn parse_class(name: &str, decl: &Yaml, known: &SchemaSet) -> Result<Schema> {
    let mapping = decl
        .as_mapping()
        .ok_or_else(|| DocModelError::Schema(format!("class '{name}' must be a mapping")))?;

    let strict = mapping.get("strict").and_then(Yaml::as_bool).unwrap_or(false);
    let empty = Mapping::new();
    let fields = match mapping.get("fields") {
        Some(fields) => fields.as_mapping().ok_or_else(|| {
            DocModelError::Schema(format!("class '{name}': 'fields' must be a mapping"))
        })?,
        None => &empty,
    };

    Ok(parse_fields(fields, strict, known)?.with_class_name(name))
}

fn parse_fields(fields: &Mapping, strict: bool, known: &SchemaSet) -> Result<Schema> {
    let mut schema = Schema::new().with_strict(strict);
    for (key, decl) in fields {
        let name = key_str(key)?;
        // `_id: false` inside array elements only disables per-item ids
        if name == "_id" {
            continue;
        }
        schema.add_path(parse_field(&name, decl, strict, known)?);
    }
    Ok(schema)
}

fn parse_field(name: &str, decl: &Yaml, strict: bool, known: &SchemaSet) -> Result<FieldDescriptor> {
    let raw = serde_json::to_value(decl)?;

    let (field_type, options) = match decl {
        Yaml::Mapping(mapping) if mapping.contains_key("type") => {
            let field_type = descriptor_type(name, mapping, strict, known)?;
            (field_type, parse_options(name, mapping)?)
        }
        other => (type_of(name, other, strict, known)?, FieldOptions::new()),
    };

    Ok(FieldDescriptor::new(name, field_type).with_options(options.with_raw(raw)))
}

fn descriptor_type(
    name: &str,
    mapping: &Mapping,
    strict: bool,
    known: &SchemaSet,
) -> Result<FieldType> {
    let ty = mapping.get("type").unwrap_or(&Yaml::Null);

    if let Some(tag) = ty.as_str() {
        if matches!(tag.to_ascii_lowercase().as_str(), "ref" | "link" | "reference") {
            let target = mapping
                .get("ref")
                .or_else(|| mapping.get("target"))
                .and_then(Yaml::as_str)
                .ok_or_else(|| {
                    DocModelError::Schema(format!("Field '{name}' (ref) needs a 'ref' class"))
                })?;
            return Ok(FieldType::Reference(known.require(target)?));
        }
    }

    type_of(name, ty, strict, known)
}

fn type_of(name: &str, ty: &Yaml, strict: bool, known: &SchemaSet) -> Result<FieldType> {
    match ty {
        Yaml::String(tag) => resolve_tag(name, tag, known),
        Yaml::Sequence(items) => array_type(name, items, strict, known),
        Yaml::Mapping(mapping) if mapping.is_empty() => Ok(FieldType::Mixed),
        Yaml::Mapping(mapping) => Ok(FieldType::Object(Arc::new(parse_fields(
            mapping, strict, known,
        )?))),
        other => Err(DocModelError::Schema(format!(
            "Field '{name}' has an unsupported declaration: {other:?}"
        ))),
    }
}

fn resolve_tag(name: &str, tag: &str, known: &SchemaSet) -> Result<FieldType> {
    if let Some(target) = known.get(tag) {
        return Ok(FieldType::Reference(target.clone()));
    }
    FieldType::from_tag(tag)
        .ok_or_else(|| DocModelError::Schema(format!("Field '{name}' has unknown type '{tag}'")))
}

fn array_type(name: &str, items: &[Yaml], strict: bool, known: &SchemaSet) -> Result<FieldType> {
    let element = match items {
        [] => return Ok(FieldType::Array(None)),
        [element] => element,
        _ => {
            return Err(DocModelError::Schema(format!(
                "Field '{name}' declares more than one array element type"
            )))
        }
    };

    let element_type = match element {
        Yaml::Mapping(mapping) if mapping.contains_key("type") => {
            descriptor_type(name, mapping, strict, known)?
        }
        other => type_of(name, other, strict, known)?,
    };

    match element_type {
        FieldType::Scalar(scalar) => Ok(FieldType::Array(Some(scalar))),
        FieldType::Mixed => Ok(FieldType::Array(None)),
        FieldType::Object(schema) => Ok(FieldType::ObjectArray(schema)),
        FieldType::Reference(target) => Ok(FieldType::ReferenceArray(target)),
        FieldType::Array(_) | FieldType::ObjectArray(_) | FieldType::ReferenceArray(_) => {
            Err(DocModelError::Schema(format!(
                "Field '{name}': nested arrays are not supported"
            )))
        }
    }
}

fn parse_options(name: &str, mapping: &Mapping) -> Result<FieldOptions> {
    let mut options = FieldOptions::new();

    if let Some(default) = mapping.get("default") {
        options.default = Some(parse_default(name, default)?);
    }
    options.record_id = flag(mapping, "record_id");
    options.metadata = flag(mapping, "metadata");

    Ok(options)
}

fn parse_default(name: &str, default: &Yaml) -> Result<DefaultValue> {
    if let Some(auto) = default.as_mapping().and_then(|m| m.get("auto")) {
        let auto: AutoValue = serde_yaml::from_value(auto.clone()).map_err(|e| {
            DocModelError::Schema(format!("Field '{name}': invalid auto default: {e}"))
        })?;
        return Ok(DefaultValue::Auto(auto));
    }
    Ok(DefaultValue::Literal(serde_json::to_value(default)?))
}

fn flag(mapping: &Mapping, key: &str) -> bool {
    mapping.get(key).and_then(Yaml::as_bool).unwrap_or(false)
}

fn key_str(key: &Yaml) -> Result<String> {
    key.as_str()
        .map(str::to_string)
        .ok_or_else(|| DocModelError::Schema(format!("keys must be strings, got {key:?}")))
}
