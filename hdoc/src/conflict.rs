//! Conflict records produced by scalar and tree three-way merges (spec
//! §4.6, §4.8.6).

use ahash::AHashMap;
use hdoc_core::{ElementRef, Scalar};

/// A single field-level conflict: both sides changed a scalar differently
/// and the merge had to pick a resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct InfoConflict {
    pub base: Scalar,
    pub conflict_values: [Scalar; 2],
    pub merged_value: Scalar,
    pub status: ConflictStatus,
}

impl InfoConflict {
    #[must_use]
    pub fn new(base: Scalar, mine: Scalar, their: Scalar, merged: Scalar) -> Self {
        Self {
            base,
            conflict_values: [mine, their],
            merged_value: merged,
            status: ConflictStatus::Open,
        }
    }
}

/// A structural conflict: an element was moved to incompatible positions by
/// both sides, so its subtree was cloned under a fresh identity on one side
/// (spec §4.8.5).
#[derive(Clone, Debug, PartialEq)]
pub struct PositionConflict {
    /// Identifiers of the cloned elements created to resolve the conflict.
    pub cloned_elements: Vec<ElementRef>,
    pub status: ConflictStatus,
}

/// Every conflict recorded by a three-way merge is left for a human (or a
/// higher layer) to review — the engine never auto-resolves past picking a
/// merged value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictStatus {
    Open,
    Resolved,
}

/// Everything recorded against one element: its per-field conflicts plus
/// any structural conflict.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConflictRecord {
    pub info_conflicts: AHashMap<String, InfoConflict>,
    pub position_conflicts: Option<PositionConflict>,
}

impl ConflictRecord {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.info_conflicts.is_empty() && self.position_conflicts.is_none()
    }
}

/// Conflicts keyed by the element they were recorded against, spec §4.8:
/// "a conflicts map keyed by (node-type, identifier)".
pub type ConflictsMap = AHashMap<ElementRef, ConflictRecord>;
