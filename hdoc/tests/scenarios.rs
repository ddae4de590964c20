//! End-to-end scenarios, one `#[test]` per literal example named in the
//! spec's testable-properties section, built as small in-memory documents
//! rather than against an external fixture corpus.

use either::Either;
use hdoc::{diff, three_way_merge, three_way_merge_array, MergeOptions};
use hdoc_core::{create_normalized_document, mutable_document, Command, DataRecord, DocumentSchema, ElementRef, LinkFieldSchema, MutableDocument, NewElement, NodeTypeSchema, Position, Scalar, ScalarType};
use std::sync::Arc;

struct ScenarioDoc;

fn schema() -> Arc<DocumentSchema> {
    Arc::new(
        DocumentSchema::new("scenario-tests", "List")
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

fn empty_doc() -> hdoc_core::NormalizedDocument {
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
fn scenario_1_array_merge_parallel_non_conflicting_additions() {
    let base: Vec<char> = "abcdef".chars().collect();
    let mine: Vec<char> = "gabhcdef".chars().collect();
    let their: Vec<char> = "faibcdef".chars().collect();

    let merged = three_way_merge_array(&base, &mine, &their, |a: &char, b: &char| a == b);
    let expected: Vec<char> = "gfaibhcdef".chars().collect();
    assert_eq!(merged, expected);
}

#[test]
fn scenario_2_array_merge_conflicting_moves() {
    let base: Vec<char> = "abcdef".chars().collect();
    let mine: Vec<char> = "aecbdf".chars().collect();
    let their: Vec<char> = "baecdf".chars().collect();

    let merged = three_way_merge_array(&base, &mine, &their, |a: &char, b: &char| a == b);
    let expected: Vec<char> = "baecdf".chars().collect();
    assert_eq!(merged, expected);
}

#[test]
fn scenario_3_tree_diff_no_change() {
    let doc = empty_doc();
    assert!(diff(&doc, &doc).is_empty());
}

#[test]
fn scenario_4_tree_diff_insert_then_reparent() {
    let base = empty_doc();
    let mut build = mutable_document(&base);
    insert_item(&mut build, base.root(), -1, "Node1", "first node");
    insert_item(&mut build, base.root(), -1, "Node2", "second node");
    let base = build.materialize();

    let mut build = mutable_document(&base);
    let node3 = insert_item(&mut build, base.root(), 0, "Node3", "third node");
    let node2 = ElementRef::new("Item", "Node2");
    build
        .move_element(
            Either::Left(node2.clone()),
            Either::Left(node3),
            Position::Field { field: "only_child".into() },
            Some(DataRecord::from_iter([
                ("is_checked".to_string(), Scalar::Bool(true)),
                ("text".to_string(), Scalar::String("second node".into())),
            ])),
        )
        .unwrap();
    let later = build.materialize();

    let commands = diff(&base, &later);
    assert!(commands.iter().any(|c| matches!(c, Command::Insert { .. })));
    assert!(commands.iter().any(|c| matches!(c, Command::Move { element, .. } if *element == node2)));
    assert_eq!(commands.len(), 2);

    let replayed = hdoc::doc_reducer(&base, commands);
    assert_eq!(replayed.total_node_count(), later.total_node_count());
}

#[test]
fn scenario_5_tree_merge_concurrent_moves_to_different_parents() {
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
                data: DataRecord::from_iter([("text".to_string(), Scalar::String("node2_1".into()))]),
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
            Some(DataRecord::from_iter([("text".to_string(), Scalar::String("Moved node".into()))])),
        )
        .unwrap();
    let their = their_build.materialize();

    let outcome = three_way_merge::<ScenarioDoc>(&base, &mine, &their, &MergeOptions::default());

    let record = outcome.conflicts.get(&node2_1).expect("conflict recorded for Node2_1");
    let position_conflict = record.position_conflicts.as_ref().expect("position conflict present");
    assert_eq!(position_conflict.cloned_elements.len(), 1);

    let under_node1 = outcome.merged_doc.get(&node1).unwrap();
    assert_eq!(under_node1.data.get("is_checked"), None);
    let placed = match under_node1.children.get("only_child") {
        Some(hdoc_core::node::ChildLink::Single(Some(r))) => r.clone(),
        _ => panic!("expected Node2_1 under Node1"),
    };
    assert_eq!(placed, node2_1);
    assert_eq!(outcome.merged_doc.get(&node2_1).unwrap().data.get("is_checked"), Some(&Scalar::Bool(true)));

    let under_node3 = outcome.merged_doc.get(&node3).unwrap();
    let clone_ref = match under_node3.children.get("only_child") {
        Some(hdoc_core::node::ChildLink::Single(Some(r))) => r.clone(),
        _ => panic!("expected a cloned element under Node3"),
    };
    assert_eq!(&clone_ref, &position_conflict.cloned_elements[0]);
    let clone_node = outcome.merged_doc.get(&clone_ref).unwrap();
    assert_eq!(clone_node.data.get("text"), Some(&Scalar::String("Moved node".into())));
}

#[test]
fn scenario_6_tree_merge_scalar_conflict() {
    let mut build = mutable_document(&empty_doc());
    insert_item(&mut build, &build.root().clone(), -1, "a", "secondNode");
    let base = build.materialize();
    let a = ElementRef::new("Item", "a");

    let mut mine_build = mutable_document(&base);
    mine_build
        .change(
            Either::Left(a.clone()),
            DataRecord::from_iter([
                ("text".to_string(), Scalar::String("second node".into())),
                ("is_checked".to_string(), Scalar::Bool(true)),
            ]),
        )
        .unwrap();
    let mine = mine_build.materialize();

    let mut their_build = mutable_document(&base);
    their_build
        .change(
            Either::Left(a.clone()),
            DataRecord::from_iter([("text".to_string(), Scalar::String("SeconD node".into()))]),
        )
        .unwrap();
    let their = their_build.materialize();

    let outcome = three_way_merge::<ScenarioDoc>(&base, &mine, &their, &MergeOptions::default());

    let merged_node = outcome.merged_doc.get(&a).unwrap();
    assert_eq!(merged_node.data.get("is_checked"), Some(&Scalar::Bool(true)));
    assert_eq!(merged_node.data.get("text"), Some(&Scalar::String("SeconD node".into())));

    let record = outcome.conflicts.get(&a).expect("text conflict recorded");
    let text_conflict = record.info_conflicts.get("text").expect("text conflict present");
    assert_eq!(text_conflict.base, Scalar::String("secondNode".into()));
    assert_eq!(
        text_conflict.conflict_values,
        [Scalar::String("second node".into()), Scalar::String("SeconD node".into())]
    );
    assert_eq!(text_conflict.merged_value, Scalar::String("SeconD node".into()));
}
