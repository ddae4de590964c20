//! Nodes and child links (spec §3.2).

use indexmap::IndexMap;

use crate::reference::{ElementRef, Id, NodeType};
use crate::scalar::Scalar;
use crate::schema::LinkVariant;

/// A mapping from field-name to scalar value (spec §3.2).
pub type DataRecord = IndexMap<String, Scalar>;

/// One of the three child-link shapes (spec §3.2).
#[derive(Clone, Debug, PartialEq)]
pub enum ChildLink {
    Single(Option<ElementRef>),
    Array(Vec<ElementRef>),
    Set(IndexMap<String, ElementRef>),
}

impl ChildLink {
    #[must_use]
    pub fn empty(variant: LinkVariant) -> Self {
        match variant {
            LinkVariant::Single => ChildLink::Single(None),
            LinkVariant::Array => ChildLink::Array(Vec::new()),
            LinkVariant::Set => ChildLink::Set(IndexMap::new()),
        }
    }

    #[must_use]
    pub fn variant(&self) -> LinkVariant {
        match self {
            ChildLink::Single(_) => LinkVariant::Single,
            ChildLink::Array(_) => LinkVariant::Array,
            ChildLink::Set(_) => LinkVariant::Set,
        }
    }

    /// All references held by this link, in iteration order (spec §4.1:
    /// arrays positional, sets by insertion order, single if present).
    pub fn refs(&self) -> Vec<ElementRef> {
        match self {
            ChildLink::Single(r) => r.iter().cloned().collect(),
            ChildLink::Array(v) => v.clone(),
            ChildLink::Set(m) => m.values().cloned().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, target: &ElementRef) -> bool {
        match self {
            ChildLink::Single(r) => r.as_ref() == Some(target),
            ChildLink::Array(v) => v.contains(target),
            ChildLink::Set(m) => m.values().any(|r| r == target),
        }
    }

    /// Removes `target` from this link if present. Returns whether anything
    /// was removed.
    pub fn remove(&mut self, target: &ElementRef) -> bool {
        match self {
            ChildLink::Single(r) => {
                if r.as_ref() == Some(target) {
                    *r = None;
                    true
                } else {
                    false
                }
            }
            ChildLink::Array(v) => {
                if let Some(idx) = v.iter().position(|r| r == target) {
                    v.remove(idx);
                    true
                } else {
                    false
                }
            }
            ChildLink::Set(m) => {
                let key = m
                    .iter()
                    .find(|(_, r)| *r == target)
                    .map(|(k, _)| k.clone());
                if let Some(key) = key {
                    m.shift_remove(&key);
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// The parent's element reference plus the link-field-name that contains
/// this node (spec §3.2). The root has no parent.
#[derive(Clone, Debug, PartialEq)]
pub struct ParentRef {
    pub parent: ElementRef,
    pub field: String,
}

/// A single node in the normalized document (spec §3.2).
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub node_type: NodeType,
    pub id: Id,
    pub data: DataRecord,
    pub children: IndexMap<String, ChildLink>,
    pub parent: Option<ParentRef>,
}

impl Node {
    #[must_use]
    pub fn element_ref(&self) -> ElementRef {
        ElementRef::new(self.node_type, self.id.clone())
    }

    #[must_use]
    pub fn orphans(&self) -> &[ElementRef] {
        match self.children.get(crate::schema::ORPHANS_FIELD) {
            Some(ChildLink::Array(v)) => v,
            _ => &[],
        }
    }

    /// All child references across every link field, in field-declaration
    /// order, excluding `__orphans`.
    pub fn child_refs(&self) -> Vec<(String, ElementRef)> {
        self.children
            .iter()
            .filter(|(field, _)| field.as_str() != crate::schema::ORPHANS_FIELD)
            .flat_map(|(field, link)| {
                link.refs()
                    .into_iter()
                    .map(move |r| (field.clone(), r))
            })
            .collect()
    }
}
