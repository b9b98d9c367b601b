use std::fmt;

/// Split a dotted path on its first `.` only. A field whose name itself
/// contains dots cannot be addressed through a dotted path.
pub fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

/// Non-owning description of where a document sits inside the tree built
/// from one top-level document: the top-level class and the dotted path down
/// to this node. It carries no reference to the top-level document and never
/// keeps anything alive; it only labels diagnostics such as dynamic field
/// registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    root_class: Option<String>,
    path: String,
}

impl Anchor {
    pub fn root(root_class: Option<String>) -> Self {
        Anchor {
            root_class,
            path: String::new(),
        }
    }

    pub fn child(&self, segment: &str) -> Self {
        Anchor {
            root_class: self.root_class.clone(),
            path: self.qualify(segment),
        }
    }

    pub fn root_class(&self) -> Option<&str> {
        self.root_class.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Dotted path of `name` relative to the top-level document.
    pub fn qualify(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.path)
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = self.root_class.as_deref().unwrap_or("document");
        if self.path.is_empty() {
            write!(f, "{class}")
        } else {
            write!(f, "{class}:{}", self.path)
        }
    }
}
