#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]
#![cfg_attr(doc_cfg, feature(doc_cfg))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::result_large_err,
    clippy::enum_glob_use,
    clippy::implicit_hasher,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::missing_errors_doc,
    clippy::wildcard_imports,
    clippy::module_inception
)]
#![cfg_attr(test, allow(clippy::too_many_lines))]

//! Diff and three-way merge for [`hdoc_core`] documents: array diff/merge
//! (components E/F), a scalar three-way merge, a tree diff (component G),
//! and a tree three-way merge (component H) that ties all of the above
//! together with position-conflict resolution.
//!
//! Everything here is pure with respect to the documents it's handed —
//! state only exists in the process-wide merge-hook cache ([`hooks`]), which
//! is itself keyed to avoid cross-schema collisions.

pub mod array_diff;
pub mod array_merge;
pub mod conflict;
pub mod error;
pub mod hooks;
pub mod reducer;
pub mod scalar_merge;
pub mod tree_diff;
pub mod tree_merge;

pub use array_diff::{apply_array_diff, diff_array, ArrayDiff, ArrayDiffOp, ElementChange};
pub use array_merge::{three_way_merge_array, three_way_merge_array_detailed, ArrayMergeResult};
pub use conflict::{ConflictRecord, ConflictStatus, ConflictsMap, InfoConflict, PositionConflict};
pub use error::MergeError;
pub use hooks::{hooks_for, register_hooks, DefaultElementHooks, ElementHooks};
pub use reducer::doc_reducer;
pub use scalar_merge::merge_scalar;
pub use tree_diff::diff;
pub use tree_merge::{three_way_merge, MergeOptions, MergeOutcome};
