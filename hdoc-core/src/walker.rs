//! Breadth-first and depth-first traversal of a normalized document
//! (spec §4.1).

use std::collections::{HashSet, VecDeque};

use crate::document::NormalizedDocument;
use crate::node::Node;
use crate::reference::{ElementRef, NodeType};

/// Traversal order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Order {
    /// Parents before children (spec §4.1, default).
    #[default]
    BreadthFirst,
    /// Deepest leaves before their parents (spec §4.1).
    DepthFirstPostOrder,
}

/// Options restricting a [`visit_document`] walk.
#[derive(Clone, Debug, Default)]
pub struct WalkOptions {
    pub order: Order,
    /// Only these types are reported to the visitor (`None` = report all).
    pub types_to_visit: Option<HashSet<NodeType>>,
    /// Only descend through these types (`None` = descend through all).
    pub types_to_traverse: Option<HashSet<NodeType>>,
    /// Restrict the walk to this subtree (`None` = the document root).
    pub start: Option<ElementRef>,
}

impl WalkOptions {
    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }
    #[must_use]
    pub fn start(mut self, start: ElementRef) -> Self {
        self.start = Some(start);
        self
    }
    #[must_use]
    pub fn types_to_visit(mut self, types: impl IntoIterator<Item = NodeType>) -> Self {
        self.types_to_visit = Some(types.into_iter().collect());
        self
    }
    #[must_use]
    pub fn types_to_traverse(mut self, types: impl IntoIterator<Item = NodeType>) -> Self {
        self.types_to_traverse = Some(types.into_iter().collect());
        self
    }

    fn should_report(&self, node_type: NodeType) -> bool {
        self.types_to_visit
            .as_ref()
            .map_or(true, |set| set.contains(node_type))
    }

    fn should_descend(&self, node_type: NodeType) -> bool {
        self.types_to_traverse
            .as_ref()
            .map_or(true, |set| set.contains(node_type))
    }
}

/// Walks `doc`, invoking `visitor` synchronously for every selected node
/// (spec §4.1). No suspension: the entire walk runs to completion before
/// this function returns.
pub fn visit_document<V>(doc: &NormalizedDocument, options: &WalkOptions, mut visitor: V)
where
    V: FnMut(&Node),
{
    let start = options.start.clone().unwrap_or_else(|| doc.root().clone());
    match options.order {
        Order::BreadthFirst => breadth_first(doc, options, &start, &mut visitor),
        Order::DepthFirstPostOrder => {
            let mut visiting = HashSet::new();
            depth_first_post_order(doc, options, &start, &mut visitor, &mut visiting);
        }
    }
}

fn breadth_first<V>(doc: &NormalizedDocument, options: &WalkOptions, start: &ElementRef, visitor: &mut V)
where
    V: FnMut(&Node),
{
    let mut queue = VecDeque::new();
    queue.push_back(start.clone());
    while let Some(current) = queue.pop_front() {
        let Some(node) = doc.get(&current) else {
            continue;
        };
        if options.should_report(node.node_type) {
            visitor(node);
        }
        if options.should_descend(node.node_type) {
            for (_, child) in node.child_refs() {
                queue.push_back(child);
            }
        }
    }
}

fn depth_first_post_order<V>(
    doc: &NormalizedDocument,
    options: &WalkOptions,
    current: &ElementRef,
    visitor: &mut V,
    visiting: &mut HashSet<ElementRef>,
) where
    V: FnMut(&Node),
{
    if !visiting.insert(current.clone()) {
        return;
    }
    let Some(node) = doc.get(current) else {
        return;
    };
    if options.should_descend(node.node_type) {
        for (_, child) in node.child_refs() {
            depth_first_post_order(doc, options, &child, visitor, visiting);
        }
    }
    if options.should_report(node.node_type) {
        visitor(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::create_normalized_document;
    use crate::node::DataRecord;
    use crate::schema::{DocumentSchema, LinkFieldSchema, NodeTypeSchema};
    use std::sync::Arc;

    fn schema() -> Arc<DocumentSchema> {
        Arc::new(
            DocumentSchema::new("t", "Root")
                .with_node_type(
                    "Root",
                    NodeTypeSchema::new().with_link_field("children", LinkFieldSchema::array(vec!["Leaf"])),
                )
                .with_node_type("Leaf", NodeTypeSchema::new()),
        )
    }

    #[test]
    fn breadth_first_visits_parent_before_children() {
        let doc = create_normalized_document(schema(), "root", DataRecord::new());
        let mut seen = Vec::new();
        visit_document(&doc, &WalkOptions::default(), |n| seen.push(n.element_ref()));
        assert_eq!(seen, vec![doc.root().clone()]);
    }
}
