use super::primitive::coerce;
use super::reference::Reference;
use super::Nested;
use crate::document::{
    split_path, Anchor, Document, Lookup, SerializeOptions, SetOutcome, Shape, SharedDocument,
};
use crate::schema::{ScalarType, Schema};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// What an array holds
#[derive(Debug, Clone)]
pub enum Element {
    /// Plain values, coerced to the scalar type when one is declared
    Value(Option<ScalarType>),
    /// Embedded documents built from the element schema
    Document(Arc<Schema>),
    /// References to the target class: identifiers or linked documents
    Reference(Arc<Schema>),
}

/// One entry of a [`DocArray`]
#[derive(Debug, Clone)]
pub enum Item {
    Value(Value),
    Document(Document),
    Reference(Reference),
}

impl Item {
    pub fn lookup(&self) -> Lookup<'_> {
        match self {
            Item::Value(value) => Lookup::Value(Cow::Borrowed(value)),
            Item::Document(doc) => Lookup::Document(doc),
            Item::Reference(reference) => reference.lookup(),
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Item::Document(doc) => Some(doc),
            Item::Reference(reference) => reference.document(),
            Item::Value(_) => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Item::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    fn project(&self, opts: &SerializeOptions<'_>, shape: Shape) -> Value {
        match self {
            Item::Value(value) => value.clone(),
            Item::Document(doc) => Value::Object(doc.project(opts, shape)),
            Item::Reference(reference) => reference.project(opts, shape).unwrap_or(Value::Null),
        }
    }

    fn commit(&mut self) {
        match self {
            Item::Document(doc) => doc.set_as_original(),
            Item::Reference(reference) => reference.commit(),
            Item::Value(_) => {}
        }
    }

    fn nested_mut(&mut self) -> Option<Nested<'_>> {
        match self {
            Item::Document(doc) => Some(Nested::Document(doc)),
            Item::Reference(reference) => reference.nested_mut(),
            Item::Value(_) => None,
        }
    }

    fn reanchor(&mut self, anchor: Anchor) {
        match self {
            Item::Document(doc) => doc.reanchor(anchor),
            Item::Reference(reference) => reference.reanchor(anchor),
            Item::Value(_) => {}
        }
    }

    fn snapshot(&self) -> Value {
        self.project(&SerializeOptions::snapshot(), Shape::Object)
    }
}

/// Live array held by an array property.
///
/// The wrapper stays in place for the lifetime of its document: assigning a
/// whole new array rebuilds the items inside it. Modification is the
/// comparison of the current items against the snapshot taken at the last
/// commit, so every mutating operation counts the same as a direct set.
#[derive(Debug, Clone)]
pub struct DocArray {
    element: Element,
    items: Vec<Item>,
    original: Vec<Value>,
    anchor: Anchor,
    default_pending: bool,
}

impl DocArray {
    pub(crate) fn new(element: Element, anchor: Anchor, default: Option<Value>) -> Self {
        let mut array = DocArray {
            element,
            items: Vec::new(),
            original: Vec::new(),
            anchor,
            default_pending: false,
        };

        match default {
            Some(Value::Array(values)) => {
                let items = array.make_items(0, values);
                array.items = items;
                array.original = array.snapshot();
                array.default_pending = true;
            }
            Some(other) => {
                log::debug!("{}: ignoring non-array default {other}", array.anchor);
            }
            None => {}
        }

        array
    }

    fn make_item(&self, index: usize, value: Value) -> Option<Item> {
        match &self.element {
            Element::Value(Some(scalar)) => coerce(*scalar, value).map(Item::Value),
            Element::Value(None) => Some(Item::Value(value)),
            Element::Document(schema) => match value {
                Value::Object(map) => Some(Item::Document(Document::with_anchor(
                    schema.clone(),
                    &map,
                    schema.class_name().map(str::to_string),
                    self.anchor.child(&index.to_string()),
                ))),
                other => {
                    log::debug!("{}: array item must be an object, got {other}", self.anchor);
                    None
                }
            },
            Element::Reference(target) => {
                let mut reference =
                    Reference::new(target.clone(), self.anchor.child(&index.to_string()), None);
                if value.is_null() || !reference.assign(value) {
                    log::debug!("{}: rejected reference item at {index}", self.anchor);
                    return None;
                }
                Some(Item::Reference(reference))
            }
        }
    }

    /// Relabel the items from `start` on after they moved.
    fn reindex(&mut self, start: usize) {
        for (index, item) in self.items.iter_mut().enumerate().skip(start) {
            item.reanchor(self.anchor.child(&index.to_string()));
        }
    }

    pub(crate) fn reanchor(&mut self, anchor: Anchor) {
        self.anchor = anchor;
        self.reindex(0);
    }

    fn make_items(&self, start: usize, values: Vec<Value>) -> Vec<Item> {
        values
            .into_iter()
            .enumerate()
            .filter_map(|(offset, value)| self.make_item(start + offset, value))
            .collect()
    }

    fn touch(&mut self) {
        self.default_pending = false;
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// The item at `index`, or [`Lookup::Absent`] when out of range.
    pub fn value_at(&self, index: usize) -> Lookup<'_> {
        self.items.get(index).map(Item::lookup).unwrap_or(Lookup::Absent)
    }

    pub fn document_at_mut(&mut self, index: usize) -> Option<&mut Document> {
        match self.items.get_mut(index) {
            Some(Item::Document(doc)) => Some(doc),
            _ => None,
        }
    }

    pub fn documents(&self) -> impl Iterator<Item = (usize, &Document)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_document().map(|doc| (index, doc)))
    }

    /// Resolve a dotted path whose first segment is an index.
    pub fn get(&self, path: &str) -> Lookup<'_> {
        let (head, rest) = split_path(path);
        let Some(index) = self.parse_index(head) else {
            return Lookup::Absent;
        };

        let Some(item) = self.items.get(index) else {
            return Lookup::Absent;
        };
        let Some(rest) = rest else {
            return item.lookup();
        };
        item.lookup().descend(rest).unwrap_or_else(|| {
            log::debug!("{}: item {index} is not navigable ({path})", self.anchor);
            Lookup::Absent
        })
    }

    /// Replace the item at `index`. Embedded documents receive an object by
    /// merging it into the existing item. Out-of-range indexes are ignored.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        if index >= self.items.len() {
            log::debug!(
                "{}: set index {index} out of range (len {})",
                self.anchor,
                self.items.len()
            );
            return false;
        }

        if let Item::Reference(reference) = &mut self.items[index] {
            let applied = !value.is_null() && reference.assign(value);
            if applied {
                self.touch();
            }
            return applied;
        }

        if let Value::Object(map) = &value {
            if let Item::Document(doc) = &mut self.items[index] {
                doc.set_all(map, false);
                self.touch();
                return true;
            }
        }

        match self.make_item(index, value) {
            Some(item) => {
                self.items[index] = item;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Append a value, returning the new length.
    pub fn push(&mut self, value: Value) -> usize {
        if let Some(item) = self.make_item(self.items.len(), value) {
            self.items.push(item);
            self.touch();
        }
        self.items.len()
    }

    pub fn pop(&mut self) -> Option<Value> {
        let item = self.items.pop()?;
        self.touch();
        Some(item.snapshot())
    }

    pub fn shift(&mut self) -> Option<Value> {
        if self.items.is_empty() {
            return None;
        }
        let item = self.items.remove(0);
        self.reindex(0);
        self.touch();
        Some(item.snapshot())
    }

    /// Prepend a value, returning the new length.
    pub fn unshift(&mut self, value: Value) -> usize {
        if let Some(item) = self.make_item(0, value) {
            self.items.insert(0, item);
            self.reindex(1);
            self.touch();
        }
        self.items.len()
    }

    /// Remove `delete_count` items starting at `start` and insert `insert`
    /// in their place. Returns the removed items.
    pub fn splice(&mut self, start: usize, delete_count: usize, insert: Vec<Value>) -> Vec<Value> {
        let start = start.min(self.items.len());
        let end = start.saturating_add(delete_count).min(self.items.len());
        let inserted = self.make_items(start, insert);

        let removed: Vec<Value> = self
            .items
            .splice(start..end, inserted)
            .map(|item| item.snapshot())
            .collect();
        self.reindex(start);
        self.touch();
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = Lookup<'_>> {
        self.items.iter().map(Item::lookup)
    }

    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(Lookup<'_>, usize),
    {
        for (index, item) in self.items.iter().enumerate() {
            f(item.lookup(), index);
        }
    }

    pub fn map<T, F>(&self, mut f: F) -> Vec<T>
    where
        F: FnMut(Lookup<'_>, usize) -> T,
    {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| f(item.lookup(), index))
            .collect()
    }

    /// Plain values of the items for which `f` returns true.
    pub fn filter<F>(&self, mut f: F) -> Vec<Value>
    where
        F: FnMut(&Lookup<'_>, usize) -> bool,
    {
        self.items
            .iter()
            .enumerate()
            .filter(|(index, item)| f(&item.lookup(), *index))
            .map(|(_, item)| item.snapshot())
            .collect()
    }

    pub fn join(&self, separator: &str) -> String {
        self.items
            .iter()
            .map(|item| match item.snapshot() {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn original(&self) -> &[Value] {
        &self.original
    }

    pub fn is_modified(&self) -> bool {
        self.items.len() != self.original.len()
            || self
                .items
                .iter()
                .zip(&self.original)
                .any(|(item, original)| item.snapshot() != *original)
    }

    /// True while a declared default is in place and nothing has touched it.
    pub fn has_default(&self) -> bool {
        self.default_pending
    }

    pub fn set_as_original(&mut self) {
        for item in &mut self.items {
            item.commit();
        }
        self.original = self.snapshot();
        self.default_pending = false;
    }

    pub fn to_json(&self, opts: &SerializeOptions<'_>) -> Value {
        self.project(opts, Shape::Json)
    }

    pub fn to_object(&self, opts: &SerializeOptions<'_>) -> Value {
        self.project(opts, Shape::Object)
    }

    pub(crate) fn project(&self, opts: &SerializeOptions<'_>, shape: Shape) -> Value {
        Value::Array(self.items.iter().map(|item| item.project(opts, shape)).collect())
    }

    fn snapshot(&self) -> Vec<Value> {
        self.items.iter().map(Item::snapshot).collect()
    }

    /// Assign a whole array. Null empties it.
    pub(crate) fn replace(&mut self, value: Value) -> bool {
        let values = match value {
            Value::Array(values) => values,
            Value::Null => Vec::new(),
            other => {
                log::debug!("{}: expected an array, got {other}", self.anchor);
                return false;
            }
        };

        let items = self.make_items(0, values);
        self.items = items;
        self.touch();
        true
    }

    pub(crate) fn set_path(&mut self, path: &str, value: Value, commit: bool) -> SetOutcome {
        let (head, rest) = split_path(path);
        let Some(index) = self.parse_index(head) else {
            return SetOutcome::Ignored;
        };

        let Some(rest) = rest else {
            if !self.set(index, value) {
                return SetOutcome::Ignored;
            }
            if commit {
                self.commit_item(index);
            }
            return SetOutcome::Applied;
        };

        match self.items.get_mut(index).and_then(Item::nested_mut) {
            Some(nested) => nested.set_path(rest, value, commit),
            None => {
                log::debug!("{}: set deep path not exists: {path}", self.anchor);
                SetOutcome::Ignored
            }
        }
    }

    /// Link a shared document into the reference item addressed by `path`.
    pub(crate) fn link_path(&mut self, path: &str, linked: SharedDocument) -> SetOutcome {
        let (head, rest) = split_path(path);
        let Some(index) = self.parse_index(head) else {
            return SetOutcome::Ignored;
        };

        let outcome = match (self.items.get_mut(index), rest) {
            (Some(Item::Reference(reference)), None) => {
                reference.link_shared(linked);
                Some(SetOutcome::Applied)
            }
            (Some(item), Some(rest)) => item.nested_mut().map(|nested| nested.set_linked(rest, linked)),
            _ => None,
        };
        match outcome {
            Some(outcome) => {
                if rest.is_none() {
                    self.touch();
                }
                outcome
            }
            None => {
                log::debug!("{}: link path not exists: {path}", self.anchor);
                SetOutcome::Ignored
            }
        }
    }

    fn commit_item(&mut self, index: usize) {
        let Some(item) = self.items.get_mut(index) else {
            return;
        };
        item.commit();
        let snapshot = item.snapshot();
        if let Some(original) = self.original.get_mut(index) {
            *original = snapshot;
        }
    }

    pub(crate) fn is_modified_path(&self, path: &str) -> Option<bool> {
        let (head, rest) = split_path(path);
        let index = self.parse_index(head)?;
        let item = self.items.get(index)?;

        match rest {
            None => Some(self.original.get(index) != Some(&item.snapshot())),
            Some(rest) => item.lookup().modified_below(rest).flatten(),
        }
    }

    pub(crate) fn resolve_mut(&mut self, path: &str) -> Option<Nested<'_>> {
        let (head, rest) = split_path(path);
        let index = self.parse_index(head)?;
        let nested = self.items.get_mut(index)?.nested_mut()?;
        match rest {
            None => Some(nested),
            Some(rest) => nested.resolve_mut(rest),
        }
    }

    fn parse_index(&self, segment: &str) -> Option<usize> {
        let index = segment.parse::<usize>().ok();
        if index.is_none() {
            log::debug!("{}: '{segment}' is not an array index", self.anchor);
        }
        index
    }
}
