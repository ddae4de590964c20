//! Declares node types, their scalar data fields, and their child-link
//! fields (spec §3.3).

use indexmap::IndexMap;

use crate::reference::NodeType;
use crate::scalar::{Scalar, ScalarType};

/// The reserved link-field name used by [`crate::mutable::MutableDocument`] to
/// stash nodes temporarily detached during a structural rewrite (spec §3.3).
pub const ORPHANS_FIELD: &str = "__orphans";

/// The shape of a child-holding field on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LinkVariant {
    Single,
    Array,
    Set,
}

/// Declaration of one child-link field.
#[derive(Clone, Debug)]
pub struct LinkFieldSchema {
    pub variant: LinkVariant,
    /// Node types permitted as the target of this link.
    pub permitted_types: Vec<NodeType>,
}

impl LinkFieldSchema {
    #[must_use]
    pub fn single(permitted_types: Vec<NodeType>) -> Self {
        Self {
            variant: LinkVariant::Single,
            permitted_types,
        }
    }
    #[must_use]
    pub fn array(permitted_types: Vec<NodeType>) -> Self {
        Self {
            variant: LinkVariant::Array,
            permitted_types,
        }
    }
    #[must_use]
    pub fn set(permitted_types: Vec<NodeType>) -> Self {
        Self {
            variant: LinkVariant::Set,
            permitted_types,
        }
    }
}

/// Declaration of one scalar data field.
#[derive(Clone, Debug)]
pub struct DataFieldSchema {
    pub scalar_type: ScalarType,
    pub default: Scalar,
}

/// Declaration of a single node type: its data fields and its link fields.
#[derive(Clone, Debug, Default)]
pub struct NodeTypeSchema {
    pub data_fields: IndexMap<String, DataFieldSchema>,
    pub link_fields: IndexMap<String, LinkFieldSchema>,
}

impl NodeTypeSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_data_field(
        mut self,
        name: impl Into<String>,
        scalar_type: ScalarType,
        default: Scalar,
    ) -> Self {
        self.data_fields.insert(
            name.into(),
            DataFieldSchema {
                scalar_type,
                default,
            },
        );
        self
    }

    #[must_use]
    pub fn with_link_field(mut self, name: impl Into<String>, field: LinkFieldSchema) -> Self {
        self.link_fields.insert(name.into(), field);
        self
    }
}

/// Declares, per node type, its data-field names/types and link-field
/// names/variants, plus the root type (spec §3.3).
#[derive(Clone, Debug)]
pub struct DocumentSchema {
    /// Distinguishes this schema from others sharing the process, so that the
    /// per-type merge-hook cache (spec §5) never collides across schemas.
    pub name: &'static str,
    pub root_type: NodeType,
    pub node_types: IndexMap<NodeType, NodeTypeSchema>,
}

impl DocumentSchema {
    #[must_use]
    pub fn new(name: &'static str, root_type: NodeType) -> Self {
        Self {
            name,
            root_type,
            node_types: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_node_type(mut self, node_type: NodeType, schema: NodeTypeSchema) -> Self {
        self.node_types.insert(node_type, schema);
        self
    }

    #[must_use]
    pub fn node_type(&self, node_type: NodeType) -> Option<&NodeTypeSchema> {
        self.node_types.get(node_type)
    }

    /// Two schemas are the "same schema" for diff/merge purposes when their
    /// `name` and `root_type` match (spec §7: `schema-mismatch`).
    #[must_use]
    pub fn is_compatible_with(&self, other: &DocumentSchema) -> bool {
        self.name == other.name && self.root_type == other.root_type
    }

    /// Builds a fresh [`crate::node::Node`] of `node_type`: the schema's
    /// default data fields merged under `data`, and an empty children
    /// record with the appropriate empty shape per declared link field, plus
    /// `__orphans` (spec §4.2 Insert step 2).
    #[must_use]
    pub fn instantiate_node(
        &self,
        node_type: NodeType,
        id: crate::reference::Id,
        data: crate::node::DataRecord,
    ) -> crate::node::Node {
        let node_schema = self.node_type(node_type).cloned().unwrap_or_default();
        let mut full_data = crate::node::DataRecord::new();
        for (name, field) in &node_schema.data_fields {
            full_data.insert(name.clone(), field.default.clone());
        }
        for (k, v) in data {
            full_data.insert(k, v);
        }

        let mut children = IndexMap::new();
        for (name, field) in &node_schema.link_fields {
            children.insert(name.clone(), crate::node::ChildLink::empty(field.variant));
        }
        children.insert(
            ORPHANS_FIELD.to_string(),
            crate::node::ChildLink::empty(LinkVariant::Array),
        );

        crate::node::Node {
            node_type,
            id,
            data: full_data,
            children,
            parent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> DocumentSchema {
        DocumentSchema::new("todo", "List").with_node_type(
            "List",
            NodeTypeSchema::new()
                .with_data_field("title", ScalarType::String, Scalar::String(String::new()))
                .with_link_field("items", LinkFieldSchema::array(vec!["Item"])),
        )
    }

    #[test]
    fn compatible_schemas_match_name_and_root() {
        let a = schema();
        let b = schema();
        assert!(a.is_compatible_with(&b));
        let c = DocumentSchema::new("other", "List");
        assert!(!a.is_compatible_with(&c));
    }
}
