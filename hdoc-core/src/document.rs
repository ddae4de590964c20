//! The normalized document: a flat per-type-indexed snapshot (spec §3.4).

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::DocumentError;
use crate::node::{ChildLink, DataRecord, Node, ParentRef};
use crate::reference::{ElementRef, Id, NodeType};
use crate::schema::{DocumentSchema, ORPHANS_FIELD};

/// An immutable, per-type-indexed snapshot of a hierarchical document
/// (spec §3.4). Cloning a `NormalizedDocument` is cheap: every node is held
/// behind an `Arc`, so a clone only duplicates the index structure, not the
/// node data.
#[derive(Clone, Debug)]
pub struct NormalizedDocument {
    schema: Arc<DocumentSchema>,
    root: ElementRef,
    tables: IndexMap<NodeType, IndexMap<Id, Arc<Node>>>,
}

impl NormalizedDocument {
    pub(crate) fn from_parts(
        schema: Arc<DocumentSchema>,
        root: ElementRef,
        tables: IndexMap<NodeType, IndexMap<Id, Arc<Node>>>,
    ) -> Self {
        Self {
            schema,
            root,
            tables,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<DocumentSchema> {
        &self.schema
    }

    #[must_use]
    pub fn root(&self) -> &ElementRef {
        &self.root
    }

    #[must_use]
    pub fn get(&self, reference: &ElementRef) -> Option<&Arc<Node>> {
        self.tables.get(reference.node_type)?.get(&reference.id)
    }

    #[must_use]
    pub fn contains(&self, reference: &ElementRef) -> bool {
        self.get(reference).is_some()
    }

    #[must_use]
    pub fn type_table(&self, node_type: NodeType) -> Option<&IndexMap<Id, Arc<Node>>> {
        self.tables.get(node_type)
    }

    #[must_use]
    pub fn node_count(&self, node_type: NodeType) -> usize {
        self.tables.get(node_type).map_or(0, IndexMap::len)
    }

    #[must_use]
    pub fn total_node_count(&self) -> usize {
        self.tables.values().map(IndexMap::len).sum()
    }

    pub(crate) fn tables(&self) -> &IndexMap<NodeType, IndexMap<Id, Arc<Node>>> {
        &self.tables
    }

    /// Checks spec §3.4 invariants 1-6 against the current snapshot.
    ///
    /// # Errors
    /// Returns the first violated invariant found.
    pub fn check_invariants(&self) -> Result<(), DocumentError> {
        // Invariant 6 + 1 + 5: every link target exists, arrays have no
        // duplicates, set keys are (trivially) unique via the map itself.
        for nodes in self.tables.values() {
            for node in nodes.values() {
                for (field, link) in &node.children {
                    if field == ORPHANS_FIELD {
                        continue;
                    }
                    if let ChildLink::Array(refs) = link {
                        let mut seen = std::collections::HashSet::new();
                        for r in refs {
                            if !seen.insert(r.clone()) {
                                return Err(DocumentError::InvariantViolation(format!(
                                    "duplicate reference {r} in array link {field:?} on {}",
                                    node.element_ref()
                                )));
                            }
                        }
                    }
                    for target in link.refs() {
                        if !self.contains(&target) {
                            return Err(DocumentError::InvariantViolation(format!(
                                "dangling reference {target} in link {field:?} on {}",
                                node.element_ref()
                            )));
                        }
                    }
                }
            }
        }

        // Invariant 2: parent back-references agree with the parent's link.
        for nodes in self.tables.values() {
            for node in nodes.values() {
                if node.element_ref() == self.root {
                    continue;
                }
                let Some(ParentRef { parent, field }) = &node.parent else {
                    return Err(DocumentError::InvariantViolation(format!(
                        "non-root node {} has no parent back-reference",
                        node.element_ref()
                    )));
                };
                let parent_node = self.get(parent).ok_or_else(|| {
                    DocumentError::InvariantViolation(format!(
                        "{} has parent back-reference to missing node {parent}",
                        node.element_ref()
                    ))
                })?;
                let link = parent_node.children.get(field).ok_or_else(|| {
                    DocumentError::InvariantViolation(format!(
                        "parent {parent} has no link field {field:?} named by child {}",
                        node.element_ref()
                    ))
                })?;
                if !link.contains(&node.element_ref()) {
                    return Err(DocumentError::InvariantViolation(format!(
                        "parent {parent} link field {field:?} does not contain child {}",
                        node.element_ref()
                    )));
                }
            }
        }

        // Invariant 3: each node appears in at most one link field of at
        // most one parent, excluding __orphans.
        let mut owners: IndexMap<ElementRef, ElementRef> = IndexMap::new();
        for nodes in self.tables.values() {
            for node in nodes.values() {
                for (field, target) in node.child_refs() {
                    if field == ORPHANS_FIELD {
                        continue;
                    }
                    if let Some(existing) = owners.insert(target.clone(), node.element_ref()) {
                        return Err(DocumentError::InvariantViolation(format!(
                            "{target} is referenced by both {existing} and {}",
                            node.element_ref()
                        )));
                    }
                }
            }
        }

        // Invariant 4: every node is reachable from the root.
        let mut reachable = std::collections::HashSet::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(self.root.clone());
        reachable.insert(self.root.clone());
        while let Some(current) = queue.pop_front() {
            let Some(node) = self.get(&current) else {
                continue;
            };
            for (_, target) in node.child_refs() {
                if reachable.insert(target.clone()) {
                    queue.push_back(target);
                }
            }
        }
        if reachable.len() != self.total_node_count() {
            return Err(DocumentError::InvariantViolation(
                "not every node is reachable from the root".to_string(),
            ));
        }

        Ok(())
    }
}

/// Constructs an empty document with a single root node whose data is
/// `root_data` (spec §6 `createNormalizedDocument`).
#[must_use]
pub fn create_normalized_document(
    schema: Arc<DocumentSchema>,
    root_id: impl Into<Id>,
    root_data: DataRecord,
) -> NormalizedDocument {
    let root_type = schema.root_type;
    let root_id = root_id.into();
    let root_ref = ElementRef::new(root_type, root_id.clone());

    let root_node = Arc::new(schema.instantiate_node(root_type, root_id.clone(), root_data));

    let mut tables: IndexMap<NodeType, IndexMap<Id, Arc<Node>>> = IndexMap::new();
    tables
        .entry(root_type)
        .or_default()
        .insert(root_id, root_node);

    NormalizedDocument::from_parts(schema, root_ref, tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NodeTypeSchema;

    #[test]
    fn fresh_document_satisfies_invariants() {
        let schema = Arc::new(DocumentSchema::new("t", "Root").with_node_type("Root", NodeTypeSchema::new()));
        let doc = create_normalized_document(schema, "root", DataRecord::new());
        doc.check_invariants().unwrap();
        assert_eq!(doc.total_node_count(), 1);
    }
}
