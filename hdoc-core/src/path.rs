//! Paths: a user convenience for addressing a node without first resolving
//! an [`ElementRef`] by hand (spec §4.2 "Paths").

use std::fmt;

use jsonptr::{Pointer, Token};

use crate::document::NormalizedDocument;
use crate::error::DocumentError;
use crate::reference::ElementRef;

/// One step of a [`Path`]: a link-field selector.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Selector {
    /// Selects a single link field.
    Field(String),
    /// Selects an array link field at a concrete index.
    Index(String, usize),
    /// Selects a keyed-set link field by key.
    Key(String, String),
}

impl Selector {
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self {
            Selector::Field(f) | Selector::Index(f, _) | Selector::Key(f, _) => f,
        }
    }
}

/// A sequence of link-field selectors from the root. Internally the engine
/// always canonicalizes to [`ElementRef`]s; paths exist only as an
/// ergonomic input format (spec §4.2).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Path(pub Vec<Selector>);

impl Path {
    #[must_use]
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self(selectors)
    }

    /// Renders this path as a JSON Pointer (RFC 6901), field names and
    /// array indices/set keys each contributing one token. Used only for
    /// diagnostics: paths never leave the process as bytes (spec §1
    /// non-goal), so this is not a serialization format, just a readable
    /// `Display`.
    #[must_use]
    pub fn to_pointer(&self) -> Pointer {
        let mut ptr = Pointer::new(Vec::<&str>::new());
        for selector in &self.0 {
            match selector {
                Selector::Field(field) => ptr.push_back(Token::from(field.as_str())),
                Selector::Index(field, idx) => {
                    ptr.push_back(Token::from(field.as_str()));
                    ptr.push_back(Token::from(idx.to_string().as_str()));
                }
                Selector::Key(field, key) => {
                    ptr.push_back(Token::from(field.as_str()));
                    ptr.push_back(Token::from(key.as_str()));
                }
            }
        }
        ptr
    }

    /// Resolves this path against `doc`, starting from the root, following
    /// each selector in turn.
    pub fn resolve(&self, doc: &NormalizedDocument) -> Result<ElementRef, DocumentError> {
        let mut current = doc.root().clone();
        for selector in &self.0 {
            let node = doc
                .get(&current)
                .ok_or_else(|| DocumentError::BadReference(current.clone()))?;
            let link = node.children.get(selector.field_name()).ok_or_else(|| {
                DocumentError::BadPath(format!(
                    "{} has no link field {:?}",
                    current,
                    selector.field_name()
                ))
            })?;
            current = match (selector, link) {
                (Selector::Field(_), crate::node::ChildLink::Single(Some(r))) => r.clone(),
                (Selector::Field(_), crate::node::ChildLink::Single(None)) => {
                    return Err(DocumentError::BadPath(format!(
                        "{current} has no child at field {:?}",
                        selector.field_name()
                    )));
                }
                (Selector::Index(_, idx), crate::node::ChildLink::Array(v)) => v
                    .get(*idx)
                    .cloned()
                    .ok_or_else(|| DocumentError::BadPath(format!(
                        "index {idx} out of range for field {:?} on {current}",
                        selector.field_name()
                    )))?,
                (Selector::Key(_, key), crate::node::ChildLink::Set(m)) => m
                    .get(key)
                    .cloned()
                    .ok_or_else(|| DocumentError::BadPath(format!(
                        "no entry for key {key:?} in field {:?} on {current}",
                        selector.field_name()
                    )))?,
                _ => {
                    return Err(DocumentError::BadPath(format!(
                        "selector {selector:?} does not match link shape on {current}"
                    )));
                }
            };
        }
        Ok(current)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_pointer())
    }
}
