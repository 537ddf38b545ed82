//! Wire model for documents and folders as served by the document API.

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned node identifier, stable across reloads.
pub type NodeId = i64;

/// A tag attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Folder-or-file payload of a node, keyed on the wire by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Folder {
        #[serde(default, deserialize_with = "null_as_empty")]
        children: Vec<Node>,
    },
    File {
        #[serde(default)]
        file_size: Option<u64>,
        #[serde(default)]
        file_type: Option<String>,
    },
}

/// A folder or file record from the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    /// Child nodes; always empty for files.
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Folder { children } => children,
            NodeKind::File { .. } => &[],
        }
    }
}

/// Extended record returned by `GET /api/documents/{id}/detail`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDetail {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_vectorized: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Descendant summary returned by `GET /api/documents/{id}/children`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChildrenSummary {
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub children_summary: Option<String>,
    #[serde(default)]
    pub total_descendants: u64,
}

/// Treat an explicit JSON `null` the same as an absent list.
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
