//! Per-(document-type, node-type) merge hook dispatch, with a process-wide
//! cache (spec §4.8.3/4.9, §5 "Global state").

use std::any::TypeId;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use either::Either;
use hdoc_core::{DataRecord, ElementRef, MutableDocument, NewElement, NodeType, Position};
use once_cell::sync::Lazy;

use crate::conflict::InfoConflict;
use crate::scalar_merge::merge_scalar;

/// Per-type overrides consulted while merging one node's position and data
/// (spec §4.8.3, §4.9, §6 "elementsOverrides"). Every hook has a sensible
/// default; callers only implement the ones whose type needs different
/// behavior.
pub trait ElementHooks: Send + Sync {
    /// Called when the same element was moved to incompatible positions by
    /// both sides. Returns `true` if mine's version should be treated as
    /// authoritative (their's gets cloned under a fresh id), `false` if
    /// their's should win instead.
    fn on_incompatible_element_versions(&self, _element: &ElementRef) -> bool {
        true
    }

    /// Orders two elements that must sit adjacent to each other within a
    /// conflict region (spec §4.9): default is "the base element wins;
    /// otherwise order by identifier".
    fn cmp_siblings(&self, a: &ElementRef, a_in_base: bool, b: &ElementRef, b_in_base: bool) -> Ordering {
        match (a_in_base, b_in_base) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.id.cmp(&b.id),
        }
    }

    /// Whether the positions both sides assigned to `element` should be
    /// treated as compatible (no clone needed). Only consulted once
    /// [`compute_decisions`](crate::tree_merge) already knows both sides
    /// moved the element to two different parents, which the glossary
    /// defines as positions that cannot be simultaneously realized — so the
    /// default is `false` (clone + record a conflict). Callers override to
    /// express a looser policy (e.g. "any destination is fine, mine wins").
    fn are_positions_compatible(&self, _element: &ElementRef) -> bool {
        false
    }

    /// Merges one node's data record across the three sides (spec §4.6 run
    /// per field). Default: per-field [`merge_scalar`], recording a conflict
    /// for every field both sides changed incompatibly.
    fn merge_element_info(
        &self,
        base: &DataRecord,
        mine: &DataRecord,
        their: &DataRecord,
    ) -> (DataRecord, AHashMap<String, InfoConflict>) {
        let mut keys = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for k in base.keys().chain(mine.keys()).chain(their.keys()) {
            if seen.insert(k.clone()) {
                keys.push(k.clone());
            }
        }
        let mut merged = DataRecord::new();
        let mut conflicts = AHashMap::default();
        for key in keys {
            match (base.get(&key), mine.get(&key), their.get(&key)) {
                (Some(b), Some(my), Some(th)) => {
                    let (value, conflict) = merge_scalar(b, my, th);
                    if let Some(c) = conflict {
                        conflicts.insert(key.clone(), c);
                    }
                    merged.insert(key, value);
                }
                (_, Some(my), _) => {
                    merged.insert(key, my.clone());
                }
                (_, None, Some(th)) => {
                    merged.insert(key, th.clone());
                }
                _ => {}
            }
        }
        (merged, conflicts)
    }

    /// Places an already-existing `target` under `parent` at `position` in
    /// the merged document. Default: the obvious [`MutableDocument::move_element`].
    fn move_to_merge_position(&self, merged: &mut MutableDocument, parent: &ElementRef, position: Position, target: &ElementRef) {
        let _ = merged.move_element(Either::Left(target.clone()), Either::Left(parent.clone()), position, None);
    }

    /// Inserts a brand-new (to the merged document) `target` under `parent`
    /// at `position`, carrying `data`. Default: the obvious
    /// [`MutableDocument::insert`] of a shallow copy.
    fn add_element(&self, merged: &mut MutableDocument, parent: &ElementRef, position: Position, target: &ElementRef, data: DataRecord) {
        let _ = merged.insert(
            Either::Left(parent.clone()),
            position,
            NewElement {
                node_type: target.node_type,
                id: Some(target.id.clone()),
                data,
            },
        );
    }

    /// Called during the final cleanup pass before deleting an element not
    /// present on either edited path. Returning `false` vetoes the delete.
    /// Default: always proceed.
    fn on_delete_element(&self, _element: &ElementRef) -> bool {
        true
    }
}

/// The hook set used when no override is registered for a `(document-type,
/// node-type)` pair.
#[derive(Default)]
pub struct DefaultElementHooks;

impl ElementHooks for DefaultElementHooks {}

type HookKey = (TypeId, NodeType);

static REGISTRY: Lazy<Mutex<AHashMap<HookKey, Arc<dyn ElementHooks>>>> = Lazy::new(|| Mutex::new(AHashMap::default()));

/// Registers `hooks` for every merge of `node_type` nodes within documents
/// tagged with `DocumentMarker`. `DocumentMarker` exists only to scope the
/// cache key so unrelated schemas using the same node-type name don't
/// collide (spec §5: "keyed to avoid cross-schema collisions").
pub fn register_hooks<DocumentMarker: 'static>(node_type: NodeType, hooks: Arc<dyn ElementHooks>) {
    let key = (TypeId::of::<DocumentMarker>(), node_type);
    REGISTRY.lock().expect("hook registry mutex poisoned").insert(key, hooks);
}

/// Looks up the hooks registered for `node_type` within `DocumentMarker`'s
/// schema, falling back to [`DefaultElementHooks`].
#[must_use]
pub fn hooks_for<DocumentMarker: 'static>(node_type: NodeType) -> Arc<dyn ElementHooks> {
    let key = (TypeId::of::<DocumentMarker>(), node_type);
    let registry = REGISTRY.lock().expect("hook registry mutex poisoned");
    registry
        .get(&key)
        .cloned()
        .unwrap_or_else(|| Arc::new(DefaultElementHooks) as Arc<dyn ElementHooks>)
}
