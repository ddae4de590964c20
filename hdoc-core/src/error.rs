//! Fatal errors raised while building or mutating a normalized document
//! (spec §7).

use thiserror::Error;

use crate::reference::ElementRef;
use crate::schema::LinkVariant;

/// Errors raised by [`crate::mutable::MutableDocument`] and by
/// [`crate::document::NormalizedDocument`] invariant checks.
///
/// Per spec §7, every variant here is fatal for the operation that raised
/// it; `schema-mismatch` is handled separately by `hdoc` (it is not fatal —
/// diff/merge fall back to documented defaults instead of erroring).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DocumentError {
    /// A path resolved to, or an operation referenced, a node that does not
    /// exist in the current view.
    #[error("no node found for reference {0}")]
    BadReference(ElementRef),

    /// A path could not be resolved against the current document.
    #[error("path could not be resolved: {0}")]
    BadPath(String),

    /// The children record held a shape other than the one the schema
    /// declares for that field.
    #[error(
        "expected a {expected} link for field {field:?} on {node_type}, found a {found} link"
    )]
    MalformedLinkShape {
        node_type: &'static str,
        field: String,
        expected: LinkVariant,
        found: LinkVariant,
    },

    /// An unrecognized command kind was applied.
    #[error("malformed command")]
    BadCommand,

    /// An array insertion/move index was out of range.
    #[error("index {index} out of range (length {len}) for field {field:?}")]
    BadIndex {
        field: String,
        index: i64,
        len: usize,
    },

    /// An internal inconsistency was detected — e.g. a duplicate reference in
    /// an array link, or a node whose parent back-reference disagrees with
    /// its parent's own link field.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
