//! Errors raised by the diff/merge engine (spec §7).
//!
//! `schema-mismatch` is deliberately *not* a variant here: per spec §7's
//! table, `diff` and `three_way_merge` absorb it and return their documented
//! fallback values directly rather than propagating an `Err`. Everything
//! else `hdoc_core::DocumentError` can raise is fatal and bubbles up.

use hdoc_core::DocumentError;
use thiserror::Error;

/// Fatal errors surfaced by [`crate::diff`] and [`crate::three_way_merge`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MergeError {
    #[error(transparent)]
    Document(#[from] DocumentError),
}
