//! Mutable document overlay: buffers structural edits and records them as a
//! command list (spec §4.2).

use std::sync::Arc;

use either::Either;
use indexmap::IndexMap;

use crate::command::{Command, NewElement, Position, RefOrPath};
use crate::document::NormalizedDocument;
use crate::error::DocumentError;
use crate::node::{ChildLink, DataRecord, Node, ParentRef};
use crate::path::Path;
use crate::reference::{ElementRef, Id, NodeType};
use crate::schema::{DocumentSchema, LinkVariant, ORPHANS_FIELD};

/// Wraps a base snapshot and a lazy copy-on-write per-type node map,
/// recording every applied command in a change log (spec §4.2).
///
/// Only nodes actually touched are ever copied: `overlay` holds, per type, a
/// sparse map from id to either a replacement node (`Some`) or a tombstone
/// (`None`) for a node deleted relative to `base`.
#[derive(Debug)]
pub struct MutableDocument {
    base: NormalizedDocument,
    overlay: IndexMap<NodeType, IndexMap<Id, Option<Arc<Node>>>>,
    log: Vec<Command>,
    next_id: u64,
}

impl MutableDocument {
    #[must_use]
    pub fn new(base: NormalizedDocument) -> Self {
        Self {
            base,
            overlay: IndexMap::new(),
            log: Vec::new(),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<DocumentSchema> {
        self.base.schema()
    }

    #[must_use]
    pub fn root(&self) -> &ElementRef {
        self.base.root()
    }

    #[must_use]
    pub fn log(&self) -> &[Command] {
        &self.log
    }

    #[must_use]
    pub fn get(&self, reference: &ElementRef) -> Option<Arc<Node>> {
        if let Some(entry) = self
            .overlay
            .get(reference.node_type)
            .and_then(|m| m.get(&reference.id))
        {
            return entry.clone();
        }
        self.base.get(reference).cloned()
    }

    #[must_use]
    pub fn contains(&self, reference: &ElementRef) -> bool {
        self.get(reference).is_some()
    }

    fn set_node(&mut self, node: Node) {
        let reference = node.element_ref();
        self.overlay
            .entry(reference.node_type)
            .or_default()
            .insert(reference.id, Some(Arc::new(node)));
    }

    fn tombstone(&mut self, reference: &ElementRef) {
        self.overlay
            .entry(reference.node_type)
            .or_default()
            .insert(reference.id.clone(), None);
    }

    /// Resolves a reference or path against the *current* (possibly
    /// mutated) view.
    pub fn resolve(&self, target: &RefOrPath) -> Result<ElementRef, DocumentError> {
        match target {
            Either::Left(r) => {
                if self.contains(r) {
                    Ok(r.clone())
                } else {
                    Err(DocumentError::BadReference(r.clone()))
                }
            }
            Either::Right(path) => self.resolve_path(path),
        }
    }

    fn resolve_path(&self, path: &Path) -> Result<ElementRef, DocumentError> {
        let mut current = self.root().clone();
        for selector in &path.0 {
            let node = self
                .get(&current)
                .ok_or_else(|| DocumentError::BadReference(current.clone()))?;
            let link = node.children.get(selector.field_name()).ok_or_else(|| {
                DocumentError::BadPath(format!(
                    "{current} has no link field {:?}",
                    selector.field_name()
                ))
            })?;
            current = match (selector, link) {
                (crate::path::Selector::Field(_), ChildLink::Single(Some(r))) => r.clone(),
                (crate::path::Selector::Index(_, idx), ChildLink::Array(v)) => {
                    v.get(*idx).cloned().ok_or_else(|| {
                        DocumentError::BadPath(format!("index {idx} out of range"))
                    })?
                }
                (crate::path::Selector::Key(_, key), ChildLink::Set(m)) => {
                    m.get(key).cloned().ok_or_else(|| {
                        DocumentError::BadPath(format!("no entry for key {key:?}"))
                    })?
                }
                _ => {
                    return Err(DocumentError::BadPath(format!(
                        "selector {selector:?} does not match link shape"
                    )))
                }
            };
        }
        Ok(current)
    }

    fn fresh_id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        Id::Str(Arc::from(format!("__gen_{id}").as_str()))
    }

    fn node_or_err(&self, reference: &ElementRef) -> Result<Arc<Node>, DocumentError> {
        self.get(reference)
            .ok_or_else(|| DocumentError::BadReference(reference.clone()))
    }

    fn place_in_link(
        &self,
        node_type: NodeType,
        link: &mut ChildLink,
        position: &Position,
        target: ElementRef,
    ) -> Result<(), DocumentError> {
        match (position, link) {
            (Position::Field { .. }, ChildLink::Single(slot)) => {
                *slot = Some(target);
            }
            (Position::Index { index, field }, ChildLink::Array(v)) => {
                let len = v.len();
                let idx = if *index < 0 {
                    len
                } else {
                    let idx = usize::try_from(*index).unwrap_or(usize::MAX);
                    if idx > len {
                        return Err(DocumentError::BadIndex {
                            field: field.clone(),
                            index: *index,
                            len,
                        });
                    }
                    idx
                };
                v.insert(idx, target);
            }
            (Position::Key { key, .. }, ChildLink::Set(m)) => {
                m.insert(key.clone(), target);
            }
            (position, link) => {
                return Err(DocumentError::MalformedLinkShape {
                    node_type,
                    field: position.field_name().to_string(),
                    expected: link.variant(),
                    found: link.variant(),
                })
            }
        }
        Ok(())
    }

    /// Implements spec §4.2 `Insert`.
    pub fn insert(
        &mut self,
        parent: RefOrPath,
        position: Position,
        element: NewElement,
    ) -> Result<ElementRef, DocumentError> {
        let parent_ref = self.resolve(&parent)?;
        let id = match element.id.clone() {
            Some(id) => {
                let candidate = ElementRef::new(element.node_type, id.clone());
                if self.contains(&candidate) {
                    return Err(DocumentError::InvariantViolation(format!(
                        "{candidate} already exists"
                    )));
                }
                id
            }
            None => self.fresh_id(),
        };

        let schema = Arc::clone(self.schema());
        let mut node = schema.instantiate_node(element.node_type, id.clone(), element.data.clone());
        node.parent = Some(ParentRef {
            parent: parent_ref.clone(),
            field: position.field_name().to_string(),
        });
        let new_ref = node.element_ref();
        self.set_node(node);

        let mut parent_node = (*self.node_or_err(&parent_ref)?).clone();
        let link = parent_node
            .children
            .get_mut(position.field_name())
            .ok_or_else(|| DocumentError::BadPath(format!(
                "{parent_ref} has no link field {:?}",
                position.field_name()
            )))?;
        self.place_in_link(parent_node.node_type, link, &position, new_ref.clone())?;
        self.set_node(parent_node);

        self.log.push(Command::Insert {
            parent: parent_ref,
            position,
            element: NewElement {
                node_type: element.node_type,
                id: Some(id),
                data: element.data,
            },
        });
        Ok(new_ref)
    }

    /// Implements spec §4.2 `Change`.
    pub fn change(&mut self, element: RefOrPath, changes: DataRecord) -> Result<(), DocumentError> {
        let reference = self.resolve(&element)?;
        let mut node = (*self.node_or_err(&reference)?).clone();
        let before = node.data.clone();
        for (k, v) in &changes {
            node.data.insert(k.clone(), v.clone());
        }
        if node.data == before {
            return Ok(());
        }
        self.set_node(node);
        self.log.push(Command::Change {
            element: reference,
            changes,
        });
        Ok(())
    }

    /// Implements spec §4.2 `Move`.
    pub fn move_element(
        &mut self,
        element: RefOrPath,
        to_parent: RefOrPath,
        to_position: Position,
        changes: Option<DataRecord>,
    ) -> Result<(), DocumentError> {
        let reference = self.resolve(&element)?;
        let to_parent_ref = self.resolve(&to_parent)?;

        let node = self.node_or_err(&reference)?;
        if let Some(ParentRef { parent: old_parent, field: old_field }) = node.parent.clone() {
            let mut old_parent_node = (*self.node_or_err(&old_parent)?).clone();
            if let Some(link) = old_parent_node.children.get_mut(&old_field) {
                link.remove(&reference);
            }
            self.set_node(old_parent_node);
        }

        let mut moved = (*self.node_or_err(&reference)?).clone();
        moved.parent = Some(ParentRef {
            parent: to_parent_ref.clone(),
            field: to_position.field_name().to_string(),
        });
        if let Some(changes) = &changes {
            for (k, v) in changes {
                moved.data.insert(k.clone(), v.clone());
            }
        }
        self.set_node(moved);

        let mut new_parent_node = (*self.node_or_err(&to_parent_ref)?).clone();
        let link = new_parent_node
            .children
            .get_mut(to_position.field_name())
            .ok_or_else(|| DocumentError::BadPath(format!(
                "{to_parent_ref} has no link field {:?}",
                to_position.field_name()
            )))?;
        self.place_in_link(new_parent_node.node_type, link, &to_position, reference.clone())?;
        self.set_node(new_parent_node);

        self.log.push(Command::Move {
            element: reference,
            to_parent: to_parent_ref,
            to_position,
            changes,
        });
        Ok(())
    }

    /// Implements spec §4.2 `Delete`: silent no-op if the target does not
    /// exist, otherwise removes it from its parent and recursively erases
    /// the entire subtree, emitting exactly one `Delete` command.
    pub fn delete(&mut self, element: RefOrPath) -> Result<(), DocumentError> {
        let reference = match self.resolve(&element) {
            Ok(r) => r,
            Err(_) => return Ok(()),
        };
        let Some(node) = self.get(&reference) else {
            return Ok(());
        };

        if let Some(ParentRef { parent, field }) = node.parent.clone() {
            if let Some(mut parent_node) = self.get(&parent).map(|n| (*n).clone()) {
                if let Some(link) = parent_node.children.get_mut(&field) {
                    link.remove(&reference);
                }
                self.set_node(parent_node);
            }
        }

        let mut stack = vec![reference.clone()];
        let mut to_remove = Vec::new();
        while let Some(current) = stack.pop() {
            let Some(current_node) = self.get(&current) else {
                continue;
            };
            to_remove.push(current.clone());
            for (_, child) in current_node.child_refs() {
                stack.push(child);
            }
            for orphan in current_node.orphans() {
                stack.push(orphan.clone());
            }
        }
        for r in to_remove {
            self.tombstone(&r);
        }

        self.log.push(Command::Delete { element: reference });
        Ok(())
    }

    /// Dispatches a single command by kind (spec §4.2 `Apply`).
    ///
    /// # Errors
    /// Returns [`DocumentError::BadCommand`] only for command kinds this
    /// document does not recognize — the four kinds in spec §3.5 are always
    /// recognized, so in practice this surfaces whichever error the
    /// dispatched operation itself returns.
    pub fn apply_command(&mut self, command: Command) -> Result<(), DocumentError> {
        match command {
            Command::Insert {
                parent,
                position,
                element,
            } => {
                self.insert(Either::Left(parent), position, element)?;
            }
            Command::Change { element, changes } => {
                self.change(Either::Left(element), changes)?;
            }
            Command::Move {
                element,
                to_parent,
                to_position,
                changes,
            } => {
                self.move_element(Either::Left(element), Either::Left(to_parent), to_position, changes)?;
            }
            Command::Delete { element } => {
                self.delete(Either::Left(element))?;
            }
        }
        Ok(())
    }

    /// Applies a sequence of commands in order.
    pub fn apply(&mut self, commands: impl IntoIterator<Item = Command>) -> Result<(), DocumentError> {
        for command in commands {
            self.apply_command(command)?;
        }
        Ok(())
    }

    /// Folds the overlay over the base into a fresh snapshot, sharing
    /// unchanged node records (spec §3.6).
    #[must_use]
    pub fn materialize(self) -> NormalizedDocument {
        let mut tables = self.base.tables().clone();
        for (node_type, changes) in self.overlay {
            let table = tables.entry(node_type).or_default();
            for (id, value) in changes {
                match value {
                    Some(node) => {
                        table.insert(id, node);
                    }
                    None => {
                        table.shift_remove(&id);
                    }
                }
            }
        }
        NormalizedDocument::from_parts(Arc::clone(self.base.schema()), self.base.root().clone(), tables)
    }
}

/// Constructs a mutable overlay over `doc` (spec §6 `mutableDocument`).
#[must_use]
pub fn mutable_document(doc: &NormalizedDocument) -> MutableDocument {
    MutableDocument::new(doc.clone())
}
