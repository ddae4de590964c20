//! Tree diff (component G, spec §4.4): walks `later` breadth-first against a
//! mutable overlay of `base`, reusing Move commands instead of delete+insert
//! wherever a node merely changed position, and cleaning up whatever is left
//! over in a final depth-first pass.

use std::collections::{HashSet, VecDeque};

use either::Either;
use hdoc_core::node::{ChildLink, DataRecord};
use hdoc_core::schema::{LinkVariant, ORPHANS_FIELD};
use hdoc_core::{mutable_document, Command, ElementRef, MutableDocument, NewElement, NormalizedDocument, Position};

/// Diffs `base` against `later`, producing a command list that, applied to
/// `base` via [`crate::doc_reducer`] or [`MutableDocument::apply`], yields a
/// document equal to `later` in all fields and structure.
///
/// Returns an empty list if the two documents do not share a schema and root
/// identity (spec §7 `schema-mismatch`: "Diff returns empty list").
#[must_use]
pub fn diff(base: &NormalizedDocument, later: &NormalizedDocument) -> Vec<Command> {
    if !base.schema().is_compatible_with(later.schema()) || base.root() != later.root() {
        return Vec::new();
    }

    let later_refs = all_refs(later);
    let mut m = mutable_document(base);

    let mut queue = VecDeque::new();
    queue.push_back(later.root().clone());
    let mut visited = HashSet::new();

    while let Some(n_ref) = queue.pop_front() {
        if !visited.insert(n_ref.clone()) {
            continue;
        }
        let Some(later_node) = later.get(&n_ref) else {
            continue;
        };

        if base.contains(&n_ref) {
            if let Some(current) = m.get(&n_ref) {
                let delta = data_delta(&current.data, &later_node.data);
                if !delta.is_empty() {
                    let _ = m.change(Either::Left(n_ref.clone()), delta);
                }
            }
        }

        let node_schema = later.schema().node_type(later_node.node_type).cloned().unwrap_or_default();
        for (field, field_schema) in &node_schema.link_fields {
            match field_schema.variant {
                LinkVariant::Single => {
                    let desired = match later_node.children.get(field) {
                        Some(ChildLink::Single(r)) => r.clone(),
                        _ => None,
                    };
                    diff_single(&mut m, base, later, &later_refs, &n_ref, field, desired.as_ref());
                }
                LinkVariant::Array => {
                    let desired = match later_node.children.get(field) {
                        Some(ChildLink::Array(v)) => v.clone(),
                        _ => Vec::new(),
                    };
                    diff_array_link(&mut m, base, later, &n_ref, field, &desired);
                }
                LinkVariant::Set => {
                    let desired = match later_node.children.get(field) {
                        Some(ChildLink::Set(s)) => s.clone(),
                        _ => indexmap::IndexMap::new(),
                    };
                    diff_set_link(&mut m, base, later, &n_ref, field, &desired);
                }
            }
        }

        for (_, child) in later_node.child_refs() {
            queue.push_back(child);
        }
    }

    cleanup(&mut m, &later_refs);

    m.log().to_vec()
}

pub(crate) fn all_refs(doc: &NormalizedDocument) -> HashSet<ElementRef> {
    let mut refs = HashSet::new();
    hdoc_core::visit_document(doc, &hdoc_core::WalkOptions::default(), |node| {
        refs.insert(node.element_ref());
    });
    refs
}

fn data_delta(current: &DataRecord, later: &DataRecord) -> DataRecord {
    let mut delta = DataRecord::new();
    for (k, v) in later {
        if current.get(k) != Some(v) {
            delta.insert(k.clone(), v.clone());
        }
    }
    delta
}

/// Places `target` (a shallow copy if new, a Move if already reachable)
/// under `parent` at `position`. `check_against_m` selects which document
/// "exists" is checked against: `true` for array links (spec §4.4: "if `D`
/// exists in `M`"), `false` for single/set links (spec: "exist in `base`").
fn place_child(
    m: &mut MutableDocument,
    base: &NormalizedDocument,
    later: &NormalizedDocument,
    parent: &ElementRef,
    position: Position,
    target: &ElementRef,
    check_against_m: bool,
) {
    let Some(later_target) = later.get(target) else {
        return;
    };
    let exists = if check_against_m { m.contains(target) } else { base.contains(target) };

    if exists {
        let changes = m
            .get(target)
            .map(|current| data_delta(&current.data, &later_target.data))
            .filter(|d| !d.is_empty());
        let _ = m.move_element(Either::Left(target.clone()), Either::Left(parent.clone()), position, changes);
    } else {
        let _ = m.insert(
            Either::Left(parent.clone()),
            position,
            NewElement {
                node_type: target.node_type,
                id: Some(target.id.clone()),
                data: later_target.data.clone(),
            },
        );
    }
}

fn diff_single(
    m: &mut MutableDocument,
    base: &NormalizedDocument,
    later: &NormalizedDocument,
    later_refs: &HashSet<ElementRef>,
    n_ref: &ElementRef,
    field: &str,
    desired: Option<&ElementRef>,
) {
    let current = match m.get(n_ref) {
        Some(node) => match node.children.get(field) {
            Some(ChildLink::Single(r)) => r.clone(),
            _ => None,
        },
        None => None,
    };

    if current.as_ref() == desired {
        return;
    }

    if let Some(old) = &current {
        if desired.is_none() {
            if later_refs.contains(old) {
                let root = m.root().clone();
                let _ = m.move_element(
                    Either::Left(old.clone()),
                    Either::Left(root),
                    Position::Index { field: ORPHANS_FIELD.to_string(), index: 0 },
                    None,
                );
            } else {
                let _ = m.delete(Either::Left(old.clone()));
            }
        }
    }

    if let Some(new) = desired {
        place_child(m, base, later, n_ref, Position::Field { field: field.to_string() }, new, false);
    }
}

fn diff_array_link(
    m: &mut MutableDocument,
    base: &NormalizedDocument,
    later: &NormalizedDocument,
    n_ref: &ElementRef,
    field: &str,
    desired: &[ElementRef],
) {
    for (i, target) in desired.iter().enumerate() {
        let current_at_i = m.get(n_ref).and_then(|node| match node.children.get(field) {
            Some(ChildLink::Array(v)) => v.get(i).cloned(),
            _ => None,
        });
        if current_at_i.as_ref() == Some(target) {
            continue;
        }
        let position = Position::Index { field: field.to_string(), index: i64::try_from(i).unwrap_or(i64::MAX) };
        place_child(m, base, later, n_ref, position, target, true);
    }
}

fn diff_set_link(
    m: &mut MutableDocument,
    base: &NormalizedDocument,
    later: &NormalizedDocument,
    n_ref: &ElementRef,
    field: &str,
    desired: &indexmap::IndexMap<String, ElementRef>,
) {
    let base_set = base.get(n_ref).and_then(|node| match node.children.get(field) {
        Some(ChildLink::Set(s)) => Some(s.clone()),
        _ => None,
    });

    for (key, target) in desired {
        if base_set.as_ref().and_then(|s| s.get(key)) == Some(target) {
            continue;
        }
        let position = Position::Key { field: field.to_string(), key: key.clone() };
        place_child(m, base, later, n_ref, position, target, false);
    }
}

/// Depth-first cleanup: anything still reachable from `m`'s root (including
/// through `__orphans`) that is not present anywhere in `later` gets
/// deleted, descendants first (spec §4.4 cleanup pass).
fn cleanup(m: &mut MutableDocument, later_refs: &HashSet<ElementRef>) {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    collect_post_order(m, &m.root().clone(), &mut seen, &mut order);

    for r in order {
        if &r == m.root() {
            continue;
        }
        if !later_refs.contains(&r) {
            let _ = m.delete(Either::Left(r));
        }
    }
}

pub(crate) fn collect_post_order(m: &MutableDocument, current: &ElementRef, seen: &mut HashSet<ElementRef>, order: &mut Vec<ElementRef>) {
    if !seen.insert(current.clone()) {
        return;
    }
    let Some(node) = m.get(current) else {
        return;
    };
    for (_, child) in node.child_refs() {
        collect_post_order(m, &child, seen, order);
    }
    for orphan in node.orphans() {
        collect_post_order(m, orphan, seen, order);
    }
    order.push(current.clone());
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hdoc_core::{create_normalized_document, DataRecord, DocumentSchema, LinkFieldSchema, NodeTypeSchema, Scalar, ScalarType};

    use super::*;

    fn schema() -> Arc<DocumentSchema> {
        Arc::new(
            DocumentSchema::new("tree-diff-tests", "List")
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
    fn identical_documents_diff_to_empty() {
        let doc = empty_doc();
        assert!(diff(&doc, &doc).is_empty());
    }

    #[test]
    fn mismatched_schema_diffs_to_empty() {
        let a = empty_doc();
        let other_schema = Arc::new(DocumentSchema::new("other", "List"));
        let b = create_normalized_document(other_schema, "root", DataRecord::new());
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn insert_then_reparent_matches_spec_scenario() {
        let base = empty_doc();
        let mut build = mutable_document(&base);
        insert_item(&mut build, base.root(), -1, "Node1", "first node");
        insert_item(&mut build, base.root(), -1, "Node2", "second node");
        let base = build.materialize();

        let mut build = mutable_document(&base);
        let node3 = insert_item(&mut build, base.root(), 0, "Node3", "third node");
        let node2_ref = ElementRef::new("Item", "Node2");
        build
            .move_element(
                Either::Left(node2_ref.clone()),
                Either::Left(node3.clone()),
                Position::Field { field: "only_child".into() },
                Some({
                    let mut changes = DataRecord::new();
                    changes.insert("is_checked".into(), Scalar::Bool(true));
                    changes.insert("text".into(), Scalar::String("second node".into()));
                    changes
                }),
            )
            .unwrap();
        let later = build.materialize();

        let commands = diff(&base, &later);
        assert!(commands.iter().any(|c| matches!(c, Command::Insert { .. })));
        assert!(commands.iter().any(|c| matches!(c, Command::Move { element, .. } if *element == node2_ref)));

        let replayed = crate::doc_reducer(&base, commands);
        assert_eq!(replayed.total_node_count(), later.total_node_count());
    }

    #[test]
    fn array_permutation_emits_moves_not_delete_insert() {
        let base = empty_doc();
        let mut build = mutable_document(&base);
        insert_item(&mut build, base.root(), -1, "a", "a");
        insert_item(&mut build, base.root(), -1, "b", "b");
        insert_item(&mut build, base.root(), -1, "c", "c");
        let base = build.materialize();

        let mut build = mutable_document(&base);
        build
            .move_element(
                Either::Left(ElementRef::new("Item", "c")),
                Either::Left(base.root().clone()),
                Position::Index { field: "items".into(), index: 0 },
                None,
            )
            .unwrap();
        let later = build.materialize();

        let commands = diff(&base, &later);
        assert!(commands.iter().all(|c| !matches!(c, Command::Insert { .. } | Command::Delete { .. })));
        let replayed = crate::doc_reducer(&base, commands);
        assert_eq!(replayed.total_node_count(), 4);
    }
}
