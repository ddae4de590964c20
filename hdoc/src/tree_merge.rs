//! Tree three-way merge (component H, spec §4.8): combines the scalar merge
//! (node data), the array merge (child ordering per link field), and
//! position-conflict resolution with subtree cloning under fresh identifiers.
//!
//! `Merged` starts as a mutable overlay of `mine` (the seed); `their`'s
//! changes that `mine` doesn't already reflect are the ones that drive
//! commands against it. A node's fate across both sides (kept in place,
//! moved to an agreed parent, or moved to two different parents) is decided
//! once per element up front, rather than threaded through each link field's
//! own ordering pass.

use std::collections::{HashSet, VecDeque};

use ahash::AHashMap;
use either::Either;
use hdoc_core::node::ChildLink;
use hdoc_core::schema::LinkVariant;
use hdoc_core::{mutable_document, DataRecord, ElementRef, MutableDocument, NewElement, NormalizedDocument, Node, Position};
use std::sync::Arc;

use crate::array_merge::three_way_merge_array_detailed;
use crate::conflict::{ConflictRecord, ConflictStatus, ConflictsMap, PositionConflict};
use crate::hooks::{hooks_for, register_hooks, ElementHooks};

/// Per-merge overrides consulted via [`crate::hooks`]'s process-wide cache
/// (spec §5: "memoization of options provided at merge time"). Entries here
/// are registered into that cache, scoped to `DocumentMarker`, before the
/// merge walk begins.
#[derive(Default)]
pub struct MergeOptions {
    pub elements_overrides: AHashMap<hdoc_core::NodeType, Arc<dyn ElementHooks>>,
}

/// Result of [`three_way_merge`]: the merged snapshot plus every conflict the
/// engine had to record along the way (spec §4.8.6).
pub struct MergeOutcome {
    pub merged_doc: NormalizedDocument,
    pub conflicts: ConflictsMap,
}

#[derive(Clone, Copy)]
enum Side {
    Mine,
    Their,
}

#[derive(Clone)]
enum Resolution {
    /// The element ends up under `parent`/`field` on both sides, or was
    /// edited by exactly one side, or untouched.
    Agree { parent: ElementRef, field: String },
    /// Both sides deleted it.
    Deleted,
    /// Both sides moved it to different parents and the positions were
    /// judged incompatible: `loser_side`'s subtree gets cloned under a fresh
    /// id at its own destination, while the original rides with the winner.
    Conflict {
        winner_parent: ElementRef,
        winner_field: String,
        loser_side: Side,
        loser_parent: ElementRef,
        loser_field: String,
    },
}

/// Three-way-merges `mine` and `their` against `base`, scoping hook
/// registration to `DocumentMarker` (spec §5's cache key — pass the same
/// marker type used when registering hooks with [`crate::hooks::register_hooks`]).
///
/// Returns `mine` unchanged with no conflicts if the three documents don't
/// share a schema and root identity (spec §7 `schema-mismatch`).
#[must_use]
pub fn three_way_merge<DocumentMarker: 'static>(
    base: &NormalizedDocument,
    mine: &NormalizedDocument,
    their: &NormalizedDocument,
    options: &MergeOptions,
) -> MergeOutcome {
    if !base.schema().is_compatible_with(mine.schema())
        || !base.schema().is_compatible_with(their.schema())
        || base.root() != mine.root()
        || base.root() != their.root()
    {
        return MergeOutcome {
            merged_doc: mine.clone(),
            conflicts: ConflictsMap::default(),
        };
    }

    for (node_type, hooks) in &options.elements_overrides {
        register_hooks::<DocumentMarker>(*node_type, hooks.clone());
    }

    let mine_refs = crate::tree_diff::all_refs(mine);
    let their_refs = crate::tree_diff::all_refs(their);
    let decisions = compute_decisions::<DocumentMarker>(base, mine, their);

    let mut merged = mutable_document(mine);
    let mut conflicts = ConflictsMap::default();
    let mut clone_counter: u64 = 0;
    let mut created_clones: HashSet<ElementRef> = HashSet::new();

    for (id, res) in &decisions {
        if let Resolution::Conflict {
            loser_side,
            loser_parent,
            loser_field,
            ..
        } = res
        {
            let loser_doc = match loser_side {
                Side::Mine => mine,
                Side::Their => their,
            };
            let variant = base
                .schema()
                .node_type(loser_parent.node_type)
                .and_then(|s| s.link_fields.get(loser_field.as_str()))
                .map_or(LinkVariant::Array, |f| f.variant);
            let cloned_ref = clone_subtree(
                loser_doc,
                id,
                &mut merged,
                loser_parent,
                loser_field,
                variant,
                &mut clone_counter,
                &mut created_clones,
            );
            conflicts.entry(id.clone()).or_default().position_conflicts = Some(PositionConflict {
                cloned_elements: vec![cloned_ref],
                status: ConflictStatus::Open,
            });
        }
    }

    let mut queue = VecDeque::new();
    queue.push_back(mine.root().clone());
    let mut visited = HashSet::new();

    while let Some(r) = queue.pop_front() {
        if !visited.insert(r.clone()) {
            continue;
        }
        let base_node = base.get(&r);
        let mine_node = mine.get(&r);
        let their_node = their.get(&r);
        let Some(primary) = mine_node.or(their_node) else {
            continue;
        };

        merge_node_data::<DocumentMarker>(&mut merged, &r, base_node, mine_node, their_node, &mut conflicts);

        let node_schema = mine.schema().node_type(primary.node_type).cloned().unwrap_or_default();
        for (field, field_schema) in &node_schema.link_fields {
            let next = reconcile_link_field::<DocumentMarker>(&mut merged, base, mine, their, &r, field, field_schema.variant, &decisions);
            for child in next {
                queue.push_back(child);
            }
        }
    }

    cleanup::<DocumentMarker>(&mut merged, &mine_refs, &their_refs, &created_clones);

    MergeOutcome {
        merged_doc: merged.materialize(),
        conflicts,
    }
}

fn destination(doc: &NormalizedDocument, id: &ElementRef) -> Option<(ElementRef, String)> {
    doc.get(id).and_then(|n| n.parent.clone()).map(|p| (p.parent, p.field))
}

fn compute_decisions<DocumentMarker: 'static>(
    base: &NormalizedDocument,
    mine: &NormalizedDocument,
    their: &NormalizedDocument,
) -> AHashMap<ElementRef, Resolution> {
    let mut map = AHashMap::default();
    for id in crate::tree_diff::all_refs(base) {
        if &id == base.root() {
            continue;
        }
        let base_dest = destination(base, &id);
        let mine_dest = destination(mine, &id);
        let their_dest = destination(their, &id);

        let resolution = match (&mine_dest, &their_dest) {
            (None, None) => Resolution::Deleted,
            (Some(m), None) => Resolution::Agree {
                parent: m.0.clone(),
                field: m.1.clone(),
            },
            (None, Some(t)) => Resolution::Agree {
                parent: t.0.clone(),
                field: t.1.clone(),
            },
            (Some(m), Some(t)) => {
                if m.0 == t.0 {
                    Resolution::Agree {
                        parent: m.0.clone(),
                        field: m.1.clone(),
                    }
                } else {
                    let mine_moved = mine_dest != base_dest;
                    let their_moved = their_dest != base_dest;
                    if mine_moved && their_moved {
                        let hooks = hooks_for::<DocumentMarker>(id.node_type);
                        if hooks.are_positions_compatible(&id) {
                            // Caller opted this node type into treating both
                            // destinations as fine: the seed (mine) wins
                            // silently. Not a CRDT — convergence under a
                            // disagreeing reorder isn't guaranteed (spec §12
                            // non-goals).
                            Resolution::Agree {
                                parent: m.0.clone(),
                                field: m.1.clone(),
                            }
                        } else if hooks.on_incompatible_element_versions(&id) {
                            Resolution::Conflict {
                                winner_parent: m.0.clone(),
                                winner_field: m.1.clone(),
                                loser_side: Side::Their,
                                loser_parent: t.0.clone(),
                                loser_field: t.1.clone(),
                            }
                        } else {
                            Resolution::Conflict {
                                winner_parent: t.0.clone(),
                                winner_field: t.1.clone(),
                                loser_side: Side::Mine,
                                loser_parent: m.0.clone(),
                                loser_field: m.1.clone(),
                            }
                        }
                    } else if mine_moved {
                        Resolution::Agree {
                            parent: m.0.clone(),
                            field: m.1.clone(),
                        }
                    } else {
                        Resolution::Agree {
                            parent: t.0.clone(),
                            field: t.1.clone(),
                        }
                    }
                }
            }
        };
        map.insert(id, resolution);
    }
    map
}

fn belongs_here(decisions: &AHashMap<ElementRef, Resolution>, id: &ElementRef, parent: &ElementRef, field: &str) -> bool {
    match decisions.get(id) {
        None => true,
        Some(Resolution::Deleted) => false,
        Some(Resolution::Agree { parent: p, field: f }) => p == parent && f == field,
        Some(Resolution::Conflict {
            winner_parent, winner_field, ..
        }) => winner_parent == parent && winner_field == field,
    }
}

fn link_seq_array(doc: &NormalizedDocument, r: &ElementRef, field: &str) -> Vec<ElementRef> {
    doc.get(r)
        .map(|n| match n.children.get(field) {
            Some(ChildLink::Array(v)) => v.clone(),
            _ => Vec::new(),
        })
        .unwrap_or_default()
}

fn link_single(doc: &NormalizedDocument, r: &ElementRef, field: &str) -> Option<ElementRef> {
    doc.get(r).and_then(|n| match n.children.get(field) {
        Some(ChildLink::Single(x)) => x.clone(),
        _ => None,
    })
}

fn link_set(doc: &NormalizedDocument, r: &ElementRef, field: &str) -> indexmap::IndexMap<String, ElementRef> {
    doc.get(r)
        .map(|n| match n.children.get(field) {
            Some(ChildLink::Set(s)) => s.clone(),
            _ => indexmap::IndexMap::new(),
        })
        .unwrap_or_default()
}

fn place_one<DocumentMarker: 'static>(
    merged: &mut MutableDocument,
    mine: &NormalizedDocument,
    their: &NormalizedDocument,
    parent: &ElementRef,
    position: Position,
    target: &ElementRef,
) {
    let hooks = hooks_for::<DocumentMarker>(target.node_type);
    if merged.contains(target) {
        hooks.move_to_merge_position(merged, parent, position, target);
    } else {
        let data = mine
            .get(target)
            .map(|n| n.data.clone())
            .or_else(|| their.get(target).map(|n| n.data.clone()))
            .unwrap_or_default();
        hooks.add_element(merged, parent, position, target, data);
    }
}

#[allow(clippy::too_many_arguments, clippy::too_many_lines)]
fn reconcile_link_field<DocumentMarker: 'static>(
    merged: &mut MutableDocument,
    base: &NormalizedDocument,
    mine: &NormalizedDocument,
    their: &NormalizedDocument,
    r: &ElementRef,
    field: &str,
    variant: LinkVariant,
    decisions: &AHashMap<ElementRef, Resolution>,
) -> Vec<ElementRef> {
    match variant {
        LinkVariant::Single => {
            let mine_t = link_single(mine, r, field).filter(|id| belongs_here(decisions, id, r, field));
            let their_t = link_single(their, r, field).filter(|id| belongs_here(decisions, id, r, field));
            let base_t = link_single(base, r, field).filter(|id| belongs_here(decisions, id, r, field));

            let desired = if mine_t == their_t {
                mine_t.clone().or_else(|| their_t.clone())
            } else if base_t == mine_t {
                their_t.clone()
            } else if base_t == their_t {
                mine_t.clone()
            } else {
                mine_t.clone()
            };

            let current = merged.get(r).and_then(|n| match n.children.get(field) {
                Some(ChildLink::Single(x)) => x.clone(),
                _ => None,
            });
            if current != desired {
                if let Some(target) = &desired {
                    place_one::<DocumentMarker>(merged, mine, their, r, Position::Field { field: field.to_string() }, target);
                }
            }
            desired.into_iter().collect()
        }
        LinkVariant::Array => {
            let base_seq: Vec<_> = link_seq_array(base, r, field)
                .into_iter()
                .filter(|id| belongs_here(decisions, id, r, field))
                .collect();
            let mine_seq: Vec<_> = link_seq_array(mine, r, field)
                .into_iter()
                .filter(|id| belongs_here(decisions, id, r, field))
                .collect();
            let their_seq: Vec<_> = link_seq_array(their, r, field)
                .into_iter()
                .filter(|id| belongs_here(decisions, id, r, field))
                .collect();

            let result = three_way_merge_array_detailed(&base_seq, &mine_seq, &their_seq, |a: &ElementRef, b: &ElementRef| a == b);
            let desired = result.merged;

            for (i, target) in desired.iter().enumerate() {
                let current_at_i = merged.get(r).and_then(|n| match n.children.get(field) {
                    Some(ChildLink::Array(v)) => v.get(i).cloned(),
                    _ => None,
                });
                if current_at_i.as_ref() == Some(target) {
                    continue;
                }
                let position = Position::Index {
                    field: field.to_string(),
                    index: i64::try_from(i).unwrap_or(i64::MAX),
                };
                place_one::<DocumentMarker>(merged, mine, their, r, position, target);
            }
            desired
        }
        LinkVariant::Set => {
            let mine_set = link_set(mine, r, field);
            let their_set = link_set(their, r, field);
            let mut desired = indexmap::IndexMap::new();
            for (k, v) in &mine_set {
                if belongs_here(decisions, v, r, field) {
                    desired.insert(k.clone(), v.clone());
                }
            }
            for (k, v) in &their_set {
                if belongs_here(decisions, v, r, field) {
                    desired.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
            for (key, target) in &desired {
                let current = merged.get(r).and_then(|n| match n.children.get(field) {
                    Some(ChildLink::Set(s)) => s.get(key).cloned(),
                    _ => None,
                });
                if current.as_ref() == Some(target) {
                    continue;
                }
                place_one::<DocumentMarker>(
                    merged,
                    mine,
                    their,
                    r,
                    Position::Key {
                        field: field.to_string(),
                        key: key.clone(),
                    },
                    target,
                );
            }
            desired.into_values().collect()
        }
    }
}

fn merge_node_data<DocumentMarker: 'static>(
    merged: &mut MutableDocument,
    r: &ElementRef,
    base_node: Option<&Arc<Node>>,
    mine_node: Option<&Arc<Node>>,
    their_node: Option<&Arc<Node>>,
    conflicts: &mut ConflictsMap,
) {
    let Some(mine_n) = mine_node else {
        return;
    };
    let Some(their_n) = their_node else {
        return;
    };
    let Some(base_n) = base_node else {
        return;
    };

    let hooks = hooks_for::<DocumentMarker>(r.node_type);
    let (merged_data, info_conflicts) = hooks.merge_element_info(&base_n.data, &mine_n.data, &their_n.data);

    if !info_conflicts.is_empty() {
        conflicts.entry(r.clone()).or_default().info_conflicts.extend(info_conflicts);
    }

    let current = merged.get(r).map(|n| n.data.clone()).unwrap_or_default();
    let delta: DataRecord = merged_data.into_iter().filter(|(k, v)| current.get(k) != Some(v)).collect();
    if !delta.is_empty() {
        let _ = merged.change(Either::Left(r.clone()), delta);
    }
}

#[allow(clippy::too_many_arguments)]
fn clone_subtree(
    source: &NormalizedDocument,
    source_ref: &ElementRef,
    merged: &mut MutableDocument,
    parent: &ElementRef,
    field: &str,
    variant: LinkVariant,
    counter: &mut u64,
    created: &mut HashSet<ElementRef>,
) -> ElementRef {
    let Some(node) = source.get(source_ref) else {
        return source_ref.clone();
    };
    let new_id = fresh_clone_id(counter);
    let new_ref = ElementRef::new(node.node_type, new_id.clone());
    let position = match variant {
        LinkVariant::Single => Position::Field { field: field.to_string() },
        LinkVariant::Array => Position::Index {
            field: field.to_string(),
            index: -1,
        },
        LinkVariant::Set => Position::Key {
            field: field.to_string(),
            key: new_id.to_string(),
        },
    };
    let _ = merged.insert(
        Either::Left(parent.clone()),
        position,
        NewElement {
            node_type: node.node_type,
            id: Some(new_id),
            data: node.data.clone(),
        },
    );
    created.insert(new_ref.clone());

    let schema = source.schema().node_type(node.node_type).cloned().unwrap_or_default();
    for (child_field, field_schema) in &schema.link_fields {
        match (field_schema.variant, node.children.get(child_field)) {
            (LinkVariant::Single, Some(ChildLink::Single(Some(child)))) => {
                clone_subtree(source, child, merged, &new_ref, child_field, LinkVariant::Single, counter, created);
            }
            (LinkVariant::Array, Some(ChildLink::Array(children))) => {
                for child in children {
                    clone_subtree(source, child, merged, &new_ref, child_field, LinkVariant::Array, counter, created);
                }
            }
            (LinkVariant::Set, Some(ChildLink::Set(set))) => {
                for child in set.values() {
                    clone_subtree(source, child, merged, &new_ref, child_field, LinkVariant::Set, counter, created);
                }
            }
            _ => {}
        }
    }
    new_ref
}

fn fresh_clone_id(counter: &mut u64) -> hdoc_core::Id {
    let n = *counter;
    *counter += 1;
    hdoc_core::Id::from(format!("__clone_{n}"))
}

fn cleanup<DocumentMarker: 'static>(
    merged: &mut MutableDocument,
    mine_refs: &HashSet<ElementRef>,
    their_refs: &HashSet<ElementRef>,
    created_clones: &HashSet<ElementRef>,
) {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    crate::tree_diff::collect_post_order(merged, &merged.root().clone(), &mut seen, &mut order);

    for r in order {
        if &r == merged.root() {
            continue;
        }
        if !mine_refs.contains(&r) && !their_refs.contains(&r) && !created_clones.contains(&r) {
            let hooks = hooks_for::<DocumentMarker>(r.node_type);
            if hooks.on_delete_element(&r) {
                let _ = merged.delete(Either::Left(r));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc as StdArc;

    use hdoc_core::{create_normalized_document, DocumentSchema, LinkFieldSchema, NodeTypeSchema, Scalar, ScalarType};

    use super::*;

    struct TestDoc;

    fn schema() -> StdArc<DocumentSchema> {
        StdArc::new(
            DocumentSchema::new("tree-merge-tests", "List")
                .with_node_type("List", NodeTypeSchema::new().with_link_field("items", LinkFieldSchema::array(vec!["Item"])))
                .with_node_type(
                    "Item",
                    NodeTypeSchema::new()
                        .with_data_field("text", ScalarType::String, Scalar::String(String::new()))
                        .with_data_field("is_checked", ScalarType::Boolean, Scalar::Bool(false))
                        .with_link_field("only_child", LinkFieldSchema::single(vec!["Item"])),
                ),
        )
    }

    fn empty_doc() -> NormalizedDocument {
        create_normalized_document(schema(), "root", DataRecord::new())
    }

    fn insert_item(m: &mut MutableDocument, parent: &ElementRef, index: i64, id: &str, text: &str) -> ElementRef {
        let mut data = DataRecord::new();
        data.insert("text".into(), Scalar::String(text.to_string()));
        m.insert(
            Either::Left(parent.clone()),
            Position::Index { field: "items".into(), index },
            NewElement { node_type: "Item", id: Some(id.into()), data },
        )
        .unwrap()
    }

    #[test]
    fn identical_sides_merge_to_base_with_no_conflicts() {
        let doc = empty_doc();
        let outcome = three_way_merge::<TestDoc>(&doc, &doc, &doc, &MergeOptions::default());
        assert_eq!(outcome.merged_doc.total_node_count(), doc.total_node_count());
        assert!(outcome.conflicts.values().all(ConflictRecord::is_empty));
    }

    #[test]
    fn mismatched_schema_falls_back_to_mine() {
        let base = empty_doc();
        let other_schema = StdArc::new(DocumentSchema::new("other", "List"));
        let their = create_normalized_document(other_schema, "root", DataRecord::new());
        let outcome = three_way_merge::<TestDoc>(&base, &base, &their, &MergeOptions::default());
        assert_eq!(outcome.merged_doc.total_node_count(), base.total_node_count());
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn only_mine_touched_a_field_wins_with_no_conflict() {
        let mut build = mutable_document(&empty_doc());
        insert_item(&mut build, &build.root().clone(), -1, "a", "first");
        let base = build.materialize();

        let mut mine_build = mutable_document(&base);
        mine_build
            .change(
                Either::Left(ElementRef::new("Item", "a")),
                DataRecord::from_iter([("is_checked".to_string(), Scalar::Bool(true))]),
            )
            .unwrap();
        let mine = mine_build.materialize();

        let outcome = three_way_merge::<TestDoc>(&base, &mine, &base, &MergeOptions::default());
        let a = outcome.merged_doc.get(&ElementRef::new("Item", "a")).unwrap();
        assert_eq!(a.data.get("is_checked"), Some(&Scalar::Bool(true)));
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn conflicting_scalar_edit_is_recorded() {
        let mut build = mutable_document(&empty_doc());
        insert_item(&mut build, &build.root().clone(), -1, "a", "first");
        let base = build.materialize();

        let mut mine_build = mutable_document(&base);
        mine_build
            .change(Either::Left(ElementRef::new("Item", "a")), DataRecord::from_iter([("text".to_string(), Scalar::String("mine".into()))]))
            .unwrap();
        let mine = mine_build.materialize();

        let mut their_build = mutable_document(&base);
        their_build
            .change(
                Either::Left(ElementRef::new("Item", "a")),
                DataRecord::from_iter([("text".to_string(), Scalar::String("their".into()))]),
            )
            .unwrap();
        let their = their_build.materialize();

        let outcome = three_way_merge::<TestDoc>(&base, &mine, &their, &MergeOptions::default());
        let record = outcome.conflicts.get(&ElementRef::new("Item", "a")).expect("conflict recorded");
        assert!(record.info_conflicts.contains_key("text"));
    }

    #[test]
    fn moving_to_two_different_parents_clones_the_losing_side() {
        let mut build = mutable_document(&empty_doc());
        let node1 = insert_item(&mut build, &build.root().clone(), -1, "Node1", "first");
        let node2 = insert_item(&mut build, &build.root().clone(), -1, "Node2", "second");
        let node3 = insert_item(&mut build, &build.root().clone(), -1, "Node3", "third");
        let node2_1 = build
            .insert(
                Either::Left(node2.clone()),
                Position::Field { field: "only_child".into() },
                NewElement {
                    node_type: "Item",
                    id: Some("Node2_1".into()),
                    data: DataRecord::from_iter([("text".to_string(), Scalar::String("moved node".into()))]),
                },
            )
            .unwrap();
        let base = build.materialize();

        let mut mine_build = mutable_document(&base);
        mine_build
            .move_element(
                Either::Left(node2_1.clone()),
                Either::Left(node1.clone()),
                Position::Field { field: "only_child".into() },
                Some(DataRecord::from_iter([("is_checked".to_string(), Scalar::Bool(true))])),
            )
            .unwrap();
        let mine = mine_build.materialize();

        let mut their_build = mutable_document(&base);
        their_build
            .move_element(
                Either::Left(node2_1.clone()),
                Either::Left(node3.clone()),
                Position::Field { field: "only_child".into() },
                None,
            )
            .unwrap();
        let their = their_build.materialize();

        let outcome = three_way_merge::<TestDoc>(&base, &mine, &their, &MergeOptions::default());
        let record = outcome.conflicts.get(&node2_1).expect("position conflict recorded");
        let position_conflict = record.position_conflicts.as_ref().expect("position conflict present");
        assert_eq!(position_conflict.cloned_elements.len(), 1);

        // The original rides with mine (under Node1, with mine's data change).
        let under_node1 = outcome.merged_doc.get(&node1).unwrap();
        assert!(matches!(&under_node1.children.get("only_child"), Some(ChildLink::Single(Some(r))) if *r == node2_1));

        // The clone lands under Node3, carrying their's version of the data.
        let under_node3 = outcome.merged_doc.get(&node3).unwrap();
        if let Some(ChildLink::Single(Some(clone_ref))) = under_node3.children.get("only_child") {
            assert_eq!(clone_ref, &position_conflict.cloned_elements[0]);
            let clone_node = outcome.merged_doc.get(clone_ref).unwrap();
            assert_eq!(clone_node.data.get("text"), Some(&Scalar::String("moved node".into())));
        } else {
            panic!("expected cloned element under Node3");
        }
    }

    #[test]
    fn an_override_can_treat_cross_parent_moves_as_compatible() {
        struct AnyParentIsFine;
        impl ElementHooks for AnyParentIsFine {
            fn are_positions_compatible(&self, _element: &ElementRef) -> bool {
                true
            }
        }

        let mut build = mutable_document(&empty_doc());
        let node1 = insert_item(&mut build, &build.root().clone(), -1, "Node1", "first");
        let node2 = insert_item(&mut build, &build.root().clone(), -1, "Node2", "second");
        let node3 = insert_item(&mut build, &build.root().clone(), -1, "Node3", "third");
        let node2_1 = build
            .insert(
                Either::Left(node2.clone()),
                Position::Field { field: "only_child".into() },
                NewElement {
                    node_type: "Item",
                    id: Some("Node2_1".into()),
                    data: DataRecord::new(),
                },
            )
            .unwrap();
        let base = build.materialize();

        let mut mine_build = mutable_document(&base);
        mine_build
            .move_element(Either::Left(node2_1.clone()), Either::Left(node1.clone()), Position::Field { field: "only_child".into() }, None)
            .unwrap();
        let mine = mine_build.materialize();

        let mut their_build = mutable_document(&base);
        their_build
            .move_element(Either::Left(node2_1.clone()), Either::Left(node3.clone()), Position::Field { field: "only_child".into() }, None)
            .unwrap();
        let their = their_build.materialize();

        let mut options = MergeOptions::default();
        options.elements_overrides.insert("Item", StdArc::new(AnyParentIsFine));

        let outcome = three_way_merge::<TestDoc>(&base, &mine, &their, &options);
        match outcome.conflicts.get(&node2_1) {
            None => {}
            Some(record) => assert!(record.position_conflicts.is_none()),
        }

        let under_node1 = outcome.merged_doc.get(&node1).unwrap();
        assert!(matches!(&under_node1.children.get("only_child"), Some(ChildLink::Single(Some(r))) if *r == node2_1));
        let under_node3 = outcome.merged_doc.get(&node3).unwrap();
        assert!(matches!(&under_node3.children.get("only_child"), Some(ChildLink::Single(None)) | None));
    }
}
