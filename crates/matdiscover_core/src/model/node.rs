//! Provenance node model.
//!
//! # Responsibility
//! - Represent one node of the provenance graph as returned by the store.
//! - Provide typed accessors over its JSON attribute and extra payloads.
//!
//! # Invariants
//! - `uuid` is stable and is the only identity used for external links.
//! - `attributes` and `extras` are JSON objects, never arrays or scalars.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Stable identifier of a provenance node.
pub type NodeId = Uuid;

/// Coarse node kind stored alongside each provenance node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Crystal structure; `content` holds the CIF text.
    Structure,
    /// Key-value result record (geometry analysis, isotherm, ...).
    Record,
    /// Workflow orchestration node.
    Workchain,
    /// Single calculation node.
    Calculation,
}

impl NodeType {
    /// Storage spelling used by the `nodes.node_type` column.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Record => "record",
            Self::Workchain => "workchain",
            Self::Calculation => "calculation",
        }
    }

    /// Parses the storage spelling back into a node kind.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "structure" => Some(Self::Structure),
            "record" => Some(Self::Record),
            "workchain" => Some(Self::Workchain),
            "calculation" => Some(Self::Calculation),
            _ => None,
        }
    }
}

/// One node of the provenance graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreNode {
    /// Stable global ID used to build provenance links.
    pub uuid: NodeId,
    pub node_type: NodeType,
    /// Free-form label; structure nodes carry the material refcode here.
    pub label: String,
    /// Semantic role of the node, e.g. `orig_cif` or `isot_co2`.
    pub tag: Option<String>,
    /// Computed payload (e.g. geometry analysis output).
    pub attributes: Map<String, Value>,
    /// Curation metadata (e.g. `name_conventional`, `doi_ref`).
    pub extras: Map<String, Value>,
    /// Raw text payload; CIF file content for structures.
    pub content: Option<String>,
}

impl StoreNode {
    /// Creates an untagged node with a generated stable ID.
    pub fn new(node_type: NodeType, label: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), node_type, label)
    }

    /// Creates an untagged node with a caller-provided stable ID.
    pub fn with_id(uuid: NodeId, node_type: NodeType, label: impl Into<String>) -> Self {
        Self {
            uuid,
            node_type,
            label: label.into(),
            tag: None,
            attributes: Map::new(),
            extras: Map::new(),
            content: None,
        }
    }

    /// Builder-style tag assignment.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Numeric attribute; integers are widened to `f64`.
    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(Value::as_f64)
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    /// String-valued extra; non-string extras are rendered as JSON text.
    pub fn extra_string(&self, key: &str) -> Option<String> {
        match self.extras.get(key)? {
            Value::String(value) => Some(value.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeType, StoreNode};
    use serde_json::json;

    #[test]
    fn node_type_round_trips_through_storage_spelling() {
        for kind in [
            NodeType::Structure,
            NodeType::Record,
            NodeType::Workchain,
            NodeType::Calculation,
        ] {
            assert_eq!(NodeType::parse(kind.as_db_str()), Some(kind));
        }
        assert_eq!(NodeType::parse("group"), None);
    }

    #[test]
    fn numeric_attributes_widen_integers() {
        let mut node = StoreNode::new(NodeType::Record, "zeopp");
        node.attributes.insert("Density".to_string(), json!(1));
        node.attributes.insert("name".to_string(), json!("x"));
        assert_eq!(node.attribute_f64("Density"), Some(1.0));
        assert_eq!(node.attribute_f64("name"), None);
        assert_eq!(node.attribute_f64("missing"), None);
    }

    #[test]
    fn extra_string_renders_non_string_values() {
        let mut node = StoreNode::new(NodeType::Structure, "BOLZIN");
        node.extras.insert("workflow_version".to_string(), json!(2));
        node.extras.insert("doi_ref".to_string(), json!("10.1/x"));
        node.extras.insert("empty".to_string(), json!(null));
        assert_eq!(node.extra_string("workflow_version").as_deref(), Some("2"));
        assert_eq!(node.extra_string("doi_ref").as_deref(), Some("10.1/x"));
        assert_eq!(node.extra_string("empty"), None);
    }
}
