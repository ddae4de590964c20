//! Command records describing structural edits (spec §3.5, §4.3).

use either::Either;

use crate::node::DataRecord;
use crate::path::Path;
use crate::reference::{intern_node_type, ElementRef, Id, NodeType};

/// Where to place a reference within a parent's link field.
///
/// - `Field` addresses a single link.
/// - `Index` addresses an array link; `-1` means append.
/// - `Key` addresses a keyed-set link.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "field_kind")]
pub enum Position {
    Field { field: String },
    Index { field: String, index: i64 },
    Key { field: String, key: String },
}

impl Position {
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self {
            Position::Field { field } | Position::Index { field, .. } | Position::Key { field, .. } => field,
        }
    }
}

/// The payload of an `Insert` command: a freshly constructed element.
///
/// `Deserialize` is hand-written for the same reason as
/// [`ElementRef`](crate::reference::ElementRef)'s: `node_type` is
/// `&'static str`, which pins a derived impl to `'de = 'static` rather than
/// a general `impl<'de>` — see that type's doc comment.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct NewElement {
    pub node_type: NodeType,
    pub id: Option<Id>,
    pub data: DataRecord,
}

impl<'de> serde::Deserialize<'de> for NewElement {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Repr {
            node_type: String,
            id: Option<Id>,
            data: DataRecord,
        }
        let repr = Repr::deserialize(deserializer)?;
        Ok(NewElement {
            node_type: intern_node_type(&repr.node_type),
            id: repr.id,
            data: repr.data,
        })
    }
}

/// A reference to an existing node, or a path that must be resolved against
/// the document's current (mutated) view (spec §4.2 "Paths").
pub type RefOrPath = Either<ElementRef, Path>;

/// A structural edit (spec §3.5). Four kinds: Insert, Change, Move, Delete.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind")]
pub enum Command {
    Insert {
        parent: ElementRef,
        position: Position,
        element: NewElement,
    },
    Change {
        element: ElementRef,
        changes: DataRecord,
    },
    Move {
        element: ElementRef,
        to_parent: ElementRef,
        to_position: Position,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        changes: Option<DataRecord>,
    },
    Delete {
        element: ElementRef,
    },
}

impl Command {
    #[must_use]
    pub fn element(&self) -> Option<&ElementRef> {
        match self {
            Command::Insert { .. } => None,
            Command::Change { element, .. }
            | Command::Move { element, .. }
            | Command::Delete { element } => Some(element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Guards against the derive regressing back to a `'de = 'static`-only
    /// impl: the JSON here is owned by a local, non-`'static` `String`, so
    /// this only compiles and passes if `Command`'s `Deserialize` impl is
    /// generic over `'de`.
    #[test]
    fn command_round_trips_through_a_non_static_deserializer() {
        let json = String::from(
            r#"{"kind":"Insert","parent":{"node_type":"List","id":"root"},"position":{"field_kind":"Index","field":"items","index":-1},"element":{"node_type":"Item","id":"a","data":{}}}"#,
        );
        let command: Command = serde_json::from_str(&json).expect("non-static Deserialize impl");
        match command {
            Command::Insert { parent, element, .. } => {
                assert_eq!(parent.node_type, "List");
                assert_eq!(element.node_type, "Item");
                assert_eq!(element.id, Some(Id::from("a")));
            }
            other => panic!("expected Insert, got {other:?}"),
        }
    }

    #[test]
    fn command_move_round_trips_without_changes() {
        let json = String::from(
            r#"{"kind":"Move","element":{"node_type":"Item","id":"a"},"to_parent":{"node_type":"List","id":"root"},"to_position":{"field_kind":"Index","field":"items","index":0}}"#,
        );
        let command: Command = serde_json::from_str(&json).expect("move without changes deserializes");
        assert!(matches!(command, Command::Move { changes: None, .. }));
    }
}
