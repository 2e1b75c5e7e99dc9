//! # Document Snapshots
//!
//! JSON interchange form of a document. Nodes are nested and tagged by `type`:
//!
//! ```json
//! { "type": "root", "children": [
//!   { "type": "paragraph", "children": [
//!     { "type": "text", "text": "Hel" },
//!     { "type": "delete", "username": "bob", "id": "…", "date": "5 Mar 2024 2:07:09 PM",
//!       "children": [{ "type": "text", "text": "lo" }] }
//!   ] }
//! ] }
//! ```
//!
//! Keys are not part of the snapshot. On import they are handed out in
//! depth-first order starting with the root, so the same snapshot always loads
//! with the same keys.

use crate::document::{Annotation, AnnotationKind, Document, NodeKey, NodeKind};
use crate::errors::{EditorError, SnapshotError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SerializedNode {
    Root { children: Vec<SerializedNode> },
    Paragraph { children: Vec<SerializedNode> },
    Insert(SerializedAnnotation),
    Delete(SerializedAnnotation),
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedAnnotation {
    pub username: String,
    pub id: String,
    pub date: String,
    pub children: Vec<SerializedNode>,
}

impl SerializedNode {
    fn name(&self) -> &'static str {
        match self {
            SerializedNode::Root { .. } => "root",
            SerializedNode::Paragraph { .. } => "paragraph",
            SerializedNode::Insert(_) => "insert",
            SerializedNode::Delete(_) => "delete",
            SerializedNode::Text { .. } => "text",
        }
    }
}

impl Document {
    pub fn to_snapshot(&self) -> SerializedNode {
        self.snapshot_node(self.root())
    }

    fn snapshot_node(&self, key: NodeKey) -> SerializedNode {
        let children = || {
            self.children(key)
                .iter()
                .map(|&child| self.snapshot_node(child))
                .collect::<Vec<_>>()
        };
        let annotation = |a: &Annotation| SerializedAnnotation {
            username: a.author.clone(),
            id: a.id.clone(),
            date: a.timestamp.clone(),
            children: children(),
        };
        match self.kind(key) {
            Some(NodeKind::Root) | None => SerializedNode::Root {
                children: children(),
            },
            Some(NodeKind::Block) => SerializedNode::Paragraph {
                children: children(),
            },
            Some(NodeKind::Insert(a)) => SerializedNode::Insert(annotation(a)),
            Some(NodeKind::Delete(a)) => SerializedNode::Delete(annotation(a)),
            Some(NodeKind::Text(text)) => SerializedNode::Text { text: text.clone() },
        }
    }

    /// Rebuild a document, rejecting trees the engines cannot edit
    pub fn from_snapshot(snapshot: &SerializedNode) -> Result<Self, SnapshotError> {
        let children = match snapshot {
            SerializedNode::Root { children } => children,
            _ => return Err(SnapshotError::MissingRoot),
        };
        let mut doc = Document::new();
        let root = doc.root();
        for child in children {
            doc.import_node(root, "root", child)?;
        }
        debug!(nodes = doc.node_count(), "Imported snapshot");
        Ok(doc)
    }

    fn import_node(
        &mut self,
        parent: NodeKey,
        parent_name: &'static str,
        node: &SerializedNode,
    ) -> Result<(), SnapshotError> {
        let allowed = match parent_name {
            "root" => matches!(node, SerializedNode::Paragraph { .. }),
            "paragraph" => matches!(
                node,
                SerializedNode::Insert(_) | SerializedNode::Delete(_) | SerializedNode::Text { .. }
            ),
            _ => matches!(node, SerializedNode::Text { .. }),
        };
        if !allowed {
            return Err(SnapshotError::MisplacedNode {
                child: node.name(),
                parent: parent_name,
            });
        }

        let (key, children) = match node {
            SerializedNode::Paragraph { children } => (self.create_block(), children.as_slice()),
            SerializedNode::Insert(a) | SerializedNode::Delete(a) => {
                if a.children.is_empty() {
                    return Err(SnapshotError::EmptyAnnotation(a.id.clone()));
                }
                let kind = match node {
                    SerializedNode::Insert(_) => AnnotationKind::Insert,
                    _ => AnnotationKind::Delete,
                };
                let annotation = Annotation {
                    id: a.id.clone(),
                    author: a.username.clone(),
                    timestamp: a.date.clone(),
                };
                (self.create_annotation(kind, annotation), a.children.as_slice())
            }
            SerializedNode::Text { text } => (self.create_text(text.as_str()), &[][..]),
            SerializedNode::Root { .. } => {
                return Err(SnapshotError::MisplacedNode {
                    child: "root",
                    parent: parent_name,
                })
            }
        };
        self.append(parent, key)
            .map_err(|_| SnapshotError::MisplacedNode {
                child: node.name(),
                parent: parent_name,
            })?;

        for child in children {
            self.import_node(key, node.name(), child)?;
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let snapshot: SerializedNode = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(&snapshot)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }

    /// Load a snapshot from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write a snapshot to disk
    pub fn save(&self, path: impl AsRef<Path>, pretty: bool) -> Result<(), EditorError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        std::fs::write(path, json)?;
        Ok(())
    }
}
