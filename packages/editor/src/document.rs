//! # Document Tree
//!
//! Arena-backed tree of paragraphs, annotations and text runs.
//!
//! ```text
//! Root
//!  └─ Block (paragraph)
//!      ├─ Text "Hel"
//!      ├─ Delete { id, author, timestamp }
//!      │   └─ Text "lo"
//!      └─ Insert { id, author, timestamp }
//!          └─ Text "p!"
//! ```
//!
//! ## Ownership
//!
//! Every node is owned by the arena and addressed by a [`NodeKey`]. A node stores
//! its parent key and the ordered keys of its children; the parent key is only
//! used for navigation. Keys are handed out sequentially and never reused, so a
//! key that has been removed stays detached forever.
//!
//! ## Offsets
//!
//! Text positions count characters, not bytes. Element positions count children.

use crate::errors::EditError;
use crate::position::Caret;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable handle to a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(u32);

impl NodeKey {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Edit metadata carried by insert and delete annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Opaque identifier, unique within the document
    pub id: String,

    /// Author of the change
    pub author: String,

    /// Last modification time, see [`crate::clock::TIMESTAMP_FORMAT`]
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Insert,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Block,
    Insert(Annotation),
    Delete(Annotation),
    Text(String),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Block => "paragraph",
            NodeKind::Insert(_) => "insert",
            NodeKind::Delete(_) => "delete",
            NodeKind::Text(_) => "text",
        }
    }

    pub fn annotation(&self) -> Option<&Annotation> {
        match self {
            NodeKind::Insert(a) | NodeKind::Delete(a) => Some(a),
            _ => None,
        }
    }

    fn annotation_mut(&mut self) -> Option<&mut Annotation> {
        match self {
            NodeKind::Insert(a) | NodeKind::Delete(a) => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

/// Editable track-changes document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: HashMap<NodeKey, Node>,
    root: NodeKey,
    next_key: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the root
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: HashMap::new(),
            root: NodeKey(0),
            next_key: 0,
        };
        doc.root = doc.create(NodeKind::Root);
        doc
    }

    /// Create a document with one paragraph per entry in `paragraphs`
    ///
    /// Empty strings produce empty paragraphs.
    pub fn from_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> Self {
        let mut doc = Self::new();
        for text in paragraphs {
            let block = doc.append_block();
            if !text.as_ref().is_empty() {
                let run = doc.create_text(text.as_ref());
                doc.link(block, run);
            }
        }
        doc
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of live nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn kind(&self, key: NodeKey) -> Option<&NodeKind> {
        self.nodes.get(&key).map(|n| &n.kind)
    }

    pub fn annotation(&self, key: NodeKey) -> Option<&Annotation> {
        self.kind(key).and_then(NodeKind::annotation)
    }

    pub fn text(&self, key: NodeKey) -> Option<&str> {
        match self.kind(key) {
            Some(NodeKind::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self, key: NodeKey) -> bool {
        matches!(self.kind(key), Some(NodeKind::Text(_)))
    }

    pub fn is_block(&self, key: NodeKey) -> bool {
        matches!(self.kind(key), Some(NodeKind::Block))
    }

    pub fn is_insert(&self, key: NodeKey) -> bool {
        matches!(self.kind(key), Some(NodeKind::Insert(_)))
    }

    pub fn is_delete(&self, key: NodeKey) -> bool {
        matches!(self.kind(key), Some(NodeKind::Delete(_)))
    }

    pub fn is_annotation(&self, key: NodeKey) -> bool {
        self.annotation(key).is_some()
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|n| n.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&key)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|&c| c == key)
    }

    pub fn previous_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent(key)?;
        let index = self.index_in_parent(key)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent(key)?;
        let index = self.index_in_parent(key)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Length of the position space of `key`: characters for text, children otherwise
    pub fn len(&self, key: NodeKey) -> usize {
        match self.kind(key) {
            Some(NodeKind::Text(text)) => char_len(text),
            Some(_) => self.children(key).len(),
            None => 0,
        }
    }

    /// Concatenated text of every run below `key`, deleted text included
    pub fn text_content(&self, key: NodeKey) -> String {
        self.text_leaves(key)
            .into_iter()
            .filter_map(|leaf| self.text(leaf))
            .collect()
    }

    /// Whether `key` can be reached from the root
    pub fn is_attached(&self, key: NodeKey) -> bool {
        let mut current = key;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Nearest block at or above `key`
    pub fn enclosing_block(&self, key: NodeKey) -> Option<NodeKey> {
        let mut current = key;
        loop {
            if self.is_block(current) {
                return Some(current);
            }
            current = self.parent(current)?;
        }
    }

    /// Blocks of the document in order
    pub fn blocks(&self) -> &[NodeKey] {
        self.children(self.root)
    }

    /// Text runs below `key` in document order (`key` itself if it is a run)
    pub fn text_leaves(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut leaves = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if self.is_text(current) {
                leaves.push(current);
            } else {
                stack.extend(self.children(current).iter().rev());
            }
        }
        leaves
    }

    pub fn first_text_descendant(&self, key: NodeKey) -> Option<NodeKey> {
        self.text_leaves(key).first().copied()
    }

    pub fn last_text_descendant(&self, key: NodeKey) -> Option<NodeKey> {
        self.text_leaves(key).last().copied()
    }

    /// First text run that follows `key` in document order, outside its subtree
    pub fn next_leaf(&self, key: NodeKey) -> Option<NodeKey> {
        let mut current = key;
        loop {
            let next = loop {
                if let Some(sibling) = self.next_sibling(current) {
                    break sibling;
                }
                current = self.parent(current)?;
            };
            if let Some(leaf) = self.first_text_descendant(next) {
                return Some(leaf);
            }
            current = next;
        }
    }

    /// Caret at the very end of `key`'s content
    pub fn end_of(&self, key: NodeKey) -> Caret {
        match self.last_text_descendant(key) {
            Some(leaf) => Caret::new(leaf, self.len(leaf)),
            None => Caret::new(key, self.len(key)),
        }
    }

    /// Caret at the end of the document, where a fresh session starts typing
    pub fn end_caret(&self) -> Caret {
        match self.blocks().last() {
            Some(&block) => self.end_of(block),
            None => Caret::new(self.root, 0),
        }
    }

    /// Position immediately before `key`, expressed without referring to `key`
    ///
    /// Climbs out of annotations that `key` opens so the result survives the
    /// removal of `key` and of any annotation it empties.
    pub fn caret_before(&self, key: NodeKey) -> Caret {
        let mut current = key;
        loop {
            if let Some(previous) = self.previous_sibling(current) {
                return self.end_of(previous);
            }
            match self.parent(current) {
                Some(parent) if self.is_annotation(parent) => current = parent,
                Some(parent) => return Caret::new(parent, 0),
                None => return Caret::new(current, 0),
            }
        }
    }

    /// Validate that `caret` addresses a live position
    pub fn check_caret(&self, caret: Caret) -> Result<(), EditError> {
        if !self.is_attached(caret.node) {
            return Err(EditError::DetachedNode(caret.node));
        }
        let len = self.len(caret.node);
        if caret.offset > len {
            return Err(EditError::InvalidOffset {
                offset: caret.offset,
                len,
            });
        }
        Ok(())
    }

    // Construction

    fn create(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.nodes.insert(
            key,
            Node {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        key
    }

    /// Create a detached text run
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeKey {
        self.create(NodeKind::Text(text.into()))
    }

    /// Create a detached paragraph
    pub fn create_block(&mut self) -> NodeKey {
        self.create(NodeKind::Block)
    }

    /// Create a detached, still empty annotation
    pub fn create_annotation(&mut self, kind: AnnotationKind, annotation: Annotation) -> NodeKey {
        match kind {
            AnnotationKind::Insert => self.create(NodeKind::Insert(annotation)),
            AnnotationKind::Delete => self.create(NodeKind::Delete(annotation)),
        }
    }

    /// Append a new paragraph to the root
    pub fn append_block(&mut self) -> NodeKey {
        let block = self.create_block();
        self.link(self.root, block);
        block
    }

    /// Append a freshly created, detached `child` to `parent`
    fn link(&mut self, parent: NodeKey, child: NodeKey) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
    }

    /// Append a new text run to `parent`
    pub fn append_text(&mut self, parent: NodeKey, text: &str) -> Result<NodeKey, EditError> {
        let run = self.create_text(text);
        self.append(parent, run)?;
        Ok(run)
    }

    /// Append a new annotation wrapping a single run of `text`
    pub fn append_annotation(
        &mut self,
        parent: NodeKey,
        kind: AnnotationKind,
        annotation: Annotation,
        text: &str,
    ) -> Result<NodeKey, EditError> {
        let node = self.create_annotation(kind, annotation);
        self.append(parent, node)?;
        self.append_text(node, text)?;
        Ok(node)
    }

    // Structural mutation

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut Node, EditError> {
        self.nodes.get_mut(&key).ok_or(EditError::DetachedNode(key))
    }

    /// Unlink `key` from its parent, keeping it (and its subtree) in the arena
    pub fn detach(&mut self, key: NodeKey) -> Result<(), EditError> {
        let parent = match self.node_mut(key)?.parent.take() {
            Some(parent) => parent,
            None => return Ok(()),
        };
        self.node_mut(parent)?.children.retain(|&c| c != key);
        Ok(())
    }

    /// Reject links that would make a run a parent or close a cycle
    fn check_link(&self, parent: NodeKey, child: NodeKey) -> Result<(), EditError> {
        if !self.contains(parent) {
            return Err(EditError::DetachedNode(parent));
        }
        if !self.contains(child) {
            return Err(EditError::DetachedNode(child));
        }
        if self.is_text(parent) {
            return Err(EditError::NotText(parent));
        }
        let mut current = Some(parent);
        while let Some(ancestor) = current {
            if ancestor == child {
                return Err(EditError::InvalidStructure(format!(
                    "{} cannot be moved below itself",
                    child
                )));
            }
            current = self.parent(ancestor);
        }
        Ok(())
    }

    /// Move `child` under `parent` at `index` (clamped to the child count)
    pub fn insert_at(
        &mut self,
        parent: NodeKey,
        index: usize,
        child: NodeKey,
    ) -> Result<(), EditError> {
        self.check_link(parent, child)?;
        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn append(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), EditError> {
        let index = self.children(parent).len();
        self.insert_at(parent, index, child)
    }

    /// Place `node` directly before `reference`
    pub fn insert_before(&mut self, node: NodeKey, reference: NodeKey) -> Result<(), EditError> {
        let parent = self
            .parent(reference)
            .ok_or(EditError::DetachedNode(reference))?;
        self.check_link(parent, node)?;
        self.detach(node)?;
        let index = self
            .index_in_parent(reference)
            .ok_or(EditError::DetachedNode(reference))?;
        self.insert_at(parent, index, node)
    }

    /// Place `node` directly after `reference`
    pub fn insert_after(&mut self, node: NodeKey, reference: NodeKey) -> Result<(), EditError> {
        let parent = self
            .parent(reference)
            .ok_or(EditError::DetachedNode(reference))?;
        self.check_link(parent, node)?;
        self.detach(node)?;
        let index = self
            .index_in_parent(reference)
            .ok_or(EditError::DetachedNode(reference))?;
        self.insert_at(parent, index + 1, node)
    }

    /// Detach `key` and free its whole subtree
    pub fn remove(&mut self, key: NodeKey) -> Result<(), EditError> {
        if key == self.root {
            return Err(EditError::InvalidStructure(
                "The root cannot be removed".to_string(),
            ));
        }
        self.detach(key)?;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// Remove `key` together with every annotation it leaves empty
    ///
    /// Returns the position where the removed content used to start.
    pub fn remove_and_caret(&mut self, key: NodeKey) -> Result<Caret, EditError> {
        let mut top = key;
        while let Some(parent) = self.parent(top) {
            if self.is_annotation(parent) && self.children(parent).len() == 1 {
                top = parent;
            } else {
                break;
            }
        }
        let caret = self.caret_before(top);
        self.remove(top)?;
        Ok(caret)
    }

    pub(crate) fn set_text(&mut self, key: NodeKey, text: String) -> Result<(), EditError> {
        match &mut self.node_mut(key)?.kind {
            NodeKind::Text(current) => {
                *current = text;
                Ok(())
            }
            _ => Err(EditError::NotText(key)),
        }
    }

    /// Splice `text` into the run at character `offset`
    pub(crate) fn insert_chars(
        &mut self,
        key: NodeKey,
        offset: usize,
        text: &str,
    ) -> Result<(), EditError> {
        let current = self.text(key).ok_or(EditError::NotText(key))?;
        let len = char_len(current);
        if offset > len {
            return Err(EditError::InvalidOffset { offset, len });
        }
        let mut updated = current.to_string();
        updated.insert_str(byte_offset(current, offset), text);
        self.set_text(key, updated)
    }

    /// Drop the characters in `from..to` from the run
    pub(crate) fn remove_chars(
        &mut self,
        key: NodeKey,
        from: usize,
        to: usize,
    ) -> Result<(), EditError> {
        let current = self.text(key).ok_or(EditError::NotText(key))?;
        let len = char_len(current);
        if from > to || to > len {
            return Err(EditError::InvalidOffset { offset: to, len });
        }
        let mut updated = current.to_string();
        updated.replace_range(byte_offset(current, from)..byte_offset(current, to), "");
        self.set_text(key, updated)
    }

    /// Refresh the timestamp of an annotation
    pub(crate) fn touch(&mut self, key: NodeKey, timestamp: String) -> Result<(), EditError> {
        let annotation = self
            .node_mut(key)?
            .kind
            .annotation_mut()
            .ok_or_else(|| EditError::InvalidStructure(format!("{} is not an annotation", key)))?;
        annotation.timestamp = timestamp;
        Ok(())
    }

    // Views

    /// Every character in the document, one line per paragraph, deleted text included
    pub fn plain_text(&self) -> String {
        self.blocks()
            .iter()
            .map(|&block| self.text_content(block))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Compact markup of the annotated content, one line per paragraph
    ///
    /// Inserts render as `{+author:text+}`, deletes as `[-author:text-]`.
    pub fn markup(&self) -> String {
        self.blocks()
            .iter()
            .map(|&block| {
                let mut line = String::new();
                self.write_markup(block, &mut line);
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn write_markup(&self, key: NodeKey, out: &mut String) {
        match self.kind(key) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Insert(a)) => {
                out.push_str("{+");
                out.push_str(&a.author);
                out.push(':');
                self.write_children_markup(key, out);
                out.push_str("+}");
            }
            Some(NodeKind::Delete(a)) => {
                out.push_str("[-");
                out.push_str(&a.author);
                out.push(':');
                self.write_children_markup(key, out);
                out.push_str("-]");
            }
            Some(_) => self.write_children_markup(key, out),
            None => {}
        }
    }

    fn write_children_markup(&self, key: NodeKey, out: &mut String) {
        for &child in self.children(key) {
            self.write_markup(child, out);
        }
    }

    /// Indented listing of every node with its key
    pub fn outline(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((key, depth)) = stack.pop() {
            let Some(kind) = self.kind(key) else { continue };
            out.push_str(&"  ".repeat(depth));
            match kind {
                NodeKind::Text(text) => out.push_str(&format!("{} text {:?}", key, text)),
                NodeKind::Insert(a) | NodeKind::Delete(a) => out.push_str(&format!(
                    "{} {} author={} id={} date={:?}",
                    key,
                    kind.name(),
                    a.author,
                    a.id,
                    a.timestamp
                )),
                _ => out.push_str(&format!("{} {}", key, kind.name())),
            }
            out.push('\n');
            for &child in self.children(key).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub(crate) fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

pub(crate) fn char_slice(text: &str, from: usize, to: usize) -> &str {
    &text[byte_offset(text, from)..byte_offset(text, to)]
}
