//! Identifiers and element references (spec §3.1).

use std::fmt;
use std::sync::{Arc, Mutex};

use ahash::AHashSet;
use once_cell::sync::Lazy;

/// The name of a node type as declared by a [`DocumentSchema`](crate::schema::DocumentSchema).
///
/// Node type names are interned as `&'static str` by convention: schemas are
/// declared once, ahead of time, by the application embedding this crate.
pub type NodeType = &'static str;

static INTERNED_NODE_TYPES: Lazy<Mutex<AHashSet<&'static str>>> = Lazy::new(|| Mutex::new(AHashSet::default()));

/// Interns `name`, returning the process-wide `&'static str` for it.
///
/// Node type names declared by a schema are already `&'static str` (string
/// literals), so this only does real work when a name arrives from outside
/// the process — deserializing an [`ElementRef`]/[`NewElement`]/[`Command`]
/// off the wire, where the source is an owned `String` that still needs to
/// become the same `NodeType` the rest of the document uses. The set of
/// distinct node type names is schema-bounded (small and fixed), so leaking
/// at most one allocation per distinct name is bounded, not per-call.
#[must_use]
pub fn intern_node_type(name: &str) -> NodeType {
    let mut set = INTERNED_NODE_TYPES.lock().expect("node-type intern table poisoned");
    if let Some(existing) = set.get(name) {
        return existing;
    }
    let leaked: &'static str = Box::leak(name.to_owned().into_boxed_str());
    set.insert(leaked);
    leaked
}

/// An opaque identifier. Equality is structural (spec §3.1).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display, derive_more::From)]
pub enum Id {
    #[display(fmt = "{_0}")]
    Str(Arc<str>),
    #[display(fmt = "{_0}")]
    Int(i64),
}

impl Id {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Id::Str(s) => Some(s),
            Id::Int(_) => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Id::Int(i) => Some(*i),
            Id::Str(_) => None,
        }
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Str(Arc::from(value))
    }
}
impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Str(Arc::from(value.as_str()))
    }
}
impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id::Int(i64::from(value))
    }
}

impl serde::Serialize for Id {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Id::Str(s) => serializer.serialize_str(s),
            Id::Int(i) => serializer.serialize_i64(*i),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Id {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(i64),
            Str(String),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Int(i) => Id::Int(i),
            Repr::Str(s) => Id::from(s),
        })
    }
}

/// The pair `(node-type, identifier)` addressing a node without carrying it
/// by value (spec §3.1).
///
/// `Deserialize` is hand-written rather than derived: `node_type` is
/// `NodeType = &'static str`, so a derived `impl<'de> Deserialize<'de>` would
/// only be generated for `'de = 'static` (serde_derive classifies a struct
/// holding a `&'static str` field as borrowing for `'static` only), which
/// leaves `ElementRef` without the general `impl<'de> Deserialize<'de>` that
/// [`Command`](crate::command::Command)'s own derive needs to compile
/// against. Deserializing `node_type` as an owned `String` and interning it
/// via [`intern_node_type`] sidesteps the borrow entirely.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ElementRef {
    pub node_type: NodeType,
    pub id: Id,
}

impl<'de> serde::Deserialize<'de> for ElementRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Repr {
            node_type: String,
            id: Id,
        }
        let repr = Repr::deserialize(deserializer)?;
        Ok(ElementRef {
            node_type: intern_node_type(&repr.node_type),
            id: repr.id,
        })
    }
}

impl ElementRef {
    pub fn new(node_type: NodeType, id: impl Into<Id>) -> Self {
        Self {
            node_type,
            id: id.into(),
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.node_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_equality_is_structural() {
        assert_eq!(Id::from("a"), Id::from("a".to_string()));
        assert_ne!(Id::from("1"), Id::Int(1));
    }

    #[test]
    fn element_ref_equality_requires_both_components() {
        let a = ElementRef::new("Node", 1);
        let b = ElementRef::new("Node", 1);
        let c = ElementRef::new("Other", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
