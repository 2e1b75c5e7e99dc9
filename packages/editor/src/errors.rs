//! Error types for the editor

use crate::document::NodeKey;
use thiserror::Error;

/// Contract violations and structural misuse reported by the edit engines.
///
/// Every engine entry point validates its inputs before touching the tree, so an
/// `Err` always means the document is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Offset {offset} is outside 0..={len}")]
    InvalidOffset { offset: usize, len: usize },

    #[error("Cannot insert empty text")]
    EmptyOperand,

    #[error("Node {0} is not attached to the document")]
    DetachedNode(NodeKey),

    #[error("No position precedes the start of the document")]
    UnreachableBoundary,

    #[error("Node {0} is not a text run")]
    NotText(NodeKey),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

/// Problems found while importing a document snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Snapshot must start with a root node")]
    MissingRoot,

    #[error("A {child} node cannot be placed inside a {parent} node")]
    MisplacedNode {
        child: &'static str,
        parent: &'static str,
    },

    #[error("Annotation '{0}' has no children")]
    EmptyAnnotation(String),
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
