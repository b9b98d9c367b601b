use super::Nested;
use crate::document::{
    read_shared, write_shared, Anchor, Document, Lookup, SerializeOptions, Shape, SharedDocument,
};
use crate::schema::Schema;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// The stored side of a reference field: whichever shape the caller gave
#[derive(Debug, Clone)]
pub enum Link {
    /// Bare identifier of the linked record
    Id(Value),
    /// Document materialized from a plain object, owned by the reference
    Document(Box<Document>),
    /// Live top-level document, shared with whoever else holds the handle
    Shared(SharedDocument),
}

/// Reference field or reference array item
#[derive(Debug, Clone)]
pub struct Reference {
    target: Arc<Schema>,
    anchor: Anchor,
    link: Option<Link>,
    original: Option<Value>,
}

impl Reference {
    pub(crate) fn new(target: Arc<Schema>, anchor: Anchor, default: Option<Value>) -> Self {
        let mut reference = Reference {
            target,
            anchor,
            link: None,
            original: None,
        };
        if let Some(default) = default {
            reference.assign(default);
            reference.commit();
        }
        reference
    }

    pub fn target(&self) -> &Arc<Schema> {
        &self.target
    }

    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    pub fn original(&self) -> Option<&Value> {
        self.original.as_ref()
    }

    /// The owned document, when one was built from a plain object.
    pub fn document(&self) -> Option<&Document> {
        match &self.link {
            Some(Link::Document(doc)) => Some(doc),
            _ => None,
        }
    }

    pub fn lookup(&self) -> Lookup<'_> {
        match &self.link {
            Some(Link::Id(id)) => Lookup::Value(Cow::Borrowed(id)),
            Some(Link::Document(doc)) => Lookup::Document(doc),
            Some(Link::Shared(handle)) => Lookup::Shared(handle),
            None => Lookup::Absent,
        }
    }

    /// Objects become (or merge into) a linked document; scalars are kept as
    /// identifiers. Neither shape is ever converted into the other.
    pub(crate) fn assign(&mut self, value: Value) -> bool {
        match value {
            Value::Object(map) => {
                match &mut self.link {
                    Some(Link::Document(doc)) => doc.set_all(&map, false),
                    Some(Link::Shared(handle)) => write_shared(handle).set_all(&map, false),
                    _ => {
                        let doc = Document::with_anchor(
                            self.target.clone(),
                            &map,
                            self.target.class_name().map(str::to_string),
                            self.anchor.clone(),
                        );
                        self.link = Some(Link::Document(Box::new(doc)));
                    }
                }
                true
            }
            Value::Null => {
                self.link = None;
                true
            }
            Value::Array(_) => {
                log::debug!("{}: a reference cannot hold an array", self.anchor);
                false
            }
            id => {
                self.link = Some(Link::Id(id));
                true
            }
        }
    }

    pub(crate) fn link_shared(&mut self, handle: SharedDocument) {
        self.link = Some(Link::Shared(handle));
    }

    pub(crate) fn nested_mut(&mut self) -> Option<Nested<'_>> {
        match &mut self.link {
            Some(Link::Document(doc)) => Some(Nested::Document(&mut **doc)),
            Some(Link::Shared(handle)) => Some(Nested::Shared(&*handle)),
            Some(Link::Id(_)) | None => None,
        }
    }

    pub(crate) fn reanchor(&mut self, anchor: Anchor) {
        if let Some(Link::Document(doc)) = &mut self.link {
            doc.reanchor(anchor.clone());
        }
        self.anchor = anchor;
    }

    fn snapshot(&self) -> Option<Value> {
        self.project(&SerializeOptions::snapshot(), Shape::Object)
    }

    pub fn is_modified(&self) -> bool {
        self.snapshot() != self.original
    }

    /// Commit the reference. An owned document is committed with it; a
    /// shared document keeps its own baseline and is only snapshotted.
    pub(crate) fn commit(&mut self) {
        if let Some(Link::Document(doc)) = &mut self.link {
            doc.set_as_original();
        }
        self.original = self.snapshot();
    }

    pub(crate) fn project(&self, opts: &SerializeOptions<'_>, shape: Shape) -> Option<Value> {
        match &self.link {
            Some(Link::Id(id)) => Some(id.clone()),
            Some(Link::Document(doc)) => Some(Value::Object(doc.project(opts, shape))),
            Some(Link::Shared(handle)) => Some(Value::Object(read_shared(handle).project(opts, shape))),
            None => None,
        }
    }
}
