use crate::document::{Anchor, Document, SerializeOptions, Shape};
use crate::schema::Schema;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Build the nested document of an object field. A declared object default
/// becomes the committed content of the nested document.
pub(crate) fn build(schema: &Arc<Schema>, anchor: Anchor, default: Option<Value>) -> Document {
    let mut doc = Document::with_anchor(
        schema.clone(),
        &Map::new(),
        schema.class_name().map(str::to_string),
        anchor,
    );

    match default {
        Some(Value::Object(map)) => doc.setup_data(&map),
        Some(other) => log::debug!("{}: ignoring non-object default {other}", doc.anchor()),
        None => {}
    }
    doc
}

/// Objects are merged into the nested document field by field; the nested
/// document itself is never replaced.
pub(crate) fn assign(doc: &mut Document, value: Value) -> bool {
    match value {
        Value::Object(map) => {
            doc.set_all(&map, false);
            true
        }
        other => {
            log::debug!("{}: expected an object, got {other}", doc.anchor());
            false
        }
    }
}

/// An object field whose projection has no keys is omitted from its parent.
pub(crate) fn project(doc: &Document, opts: &SerializeOptions<'_>, shape: Shape) -> Option<Value> {
    let map = doc.project(opts, shape);
    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}
