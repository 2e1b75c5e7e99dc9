//! # Insert Engine
//!
//! Typing never edits committed text in place. Depending on where the caret is:
//!
//! | Context       | Effect                                                     |
//! |---------------|------------------------------------------------------------|
//! | `Plain`       | new insert annotation placed at the caret                  |
//! | `InsertSelf`  | text spliced into the author's own run, timestamp refreshed |
//! | `InsertOther` | foreign insert split around a new insert by the author     |
//! | `Delete`      | new insert placed right after the delete annotation        |
//!
//! A caret on the root bootstraps a paragraph holding the new insert.

use crate::classify::{classify, EditContext};
use crate::document::{char_len, AnnotationKind, Document, NodeKey, NodeKind};
use crate::errors::EditError;
use crate::normalize::normalize;
use crate::position::Caret;
use crate::session::SessionContext;
use crate::split::split_text;
use tracing::{debug, instrument};

/// Where new text lands once element carets are resolved
enum InsertionPoint {
    /// Child index of the root; a paragraph has to be created
    Root(usize),
    /// Child index of an element without usable text around it
    Element { parent: NodeKey, index: usize },
    /// Character offset in a text run
    Text(Caret),
}

/// Insert `text` at `caret`, returning the caret after the inserted text
#[instrument(skip(doc, ctx), fields(author = ctx.author()))]
pub fn insert(
    doc: &mut Document,
    ctx: &SessionContext,
    caret: Caret,
    text: &str,
) -> Result<Caret, EditError> {
    if text.is_empty() {
        return Err(EditError::EmptyOperand);
    }
    doc.check_caret(caret)?;

    let caret = match insertion_point(doc, caret) {
        InsertionPoint::Root(index) => {
            let block = doc.create_block();
            let root = doc.root();
            doc.insert_at(root, index, block)?;
            let run = new_insert_at(doc, ctx, block, 0, text)?;
            debug!(block = %block, "Bootstrapped paragraph for insertion");
            Caret::new(run, char_len(text))
        }
        InsertionPoint::Element { parent, index } => {
            let run = new_insert_at(doc, ctx, parent, index, text)?;
            Caret::new(run, char_len(text))
        }
        InsertionPoint::Text(caret) => insert_into_run(doc, ctx, caret, text)?,
    };

    if let Some(block) = doc.enclosing_block(caret.node) {
        normalize(doc, block)?;
    }
    Ok(caret)
}

fn insertion_point(doc: &Document, caret: Caret) -> InsertionPoint {
    match doc.kind(caret.node) {
        Some(NodeKind::Text(_)) => InsertionPoint::Text(caret),
        Some(NodeKind::Root) => InsertionPoint::Root(caret.offset),
        Some(NodeKind::Insert(_)) | Some(NodeKind::Delete(_)) => {
            let children = doc.children(caret.node);
            let leaf = if caret.offset > 0 {
                doc.last_text_descendant(children[caret.offset - 1])
                    .map(|leaf| Caret::new(leaf, doc.len(leaf)))
            } else {
                children
                    .first()
                    .and_then(|&first| doc.first_text_descendant(first))
                    .map(|leaf| Caret::new(leaf, 0))
            };
            match (leaf, doc.parent(caret.node), doc.index_in_parent(caret.node)) {
                (Some(leaf), _, _) => InsertionPoint::Text(leaf),
                (None, Some(parent), Some(index)) => InsertionPoint::Element {
                    parent,
                    index: index + usize::from(caret.offset > 0),
                },
                _ => InsertionPoint::Element {
                    parent: caret.node,
                    index: caret.offset,
                },
            }
        }
        _ => InsertionPoint::Element {
            parent: caret.node,
            index: caret.offset,
        },
    }
}

fn insert_into_run(
    doc: &mut Document,
    ctx: &SessionContext,
    caret: Caret,
    text: &str,
) -> Result<Caret, EditError> {
    let run = caret.node;
    let parent = doc.parent(run).ok_or(EditError::DetachedNode(run))?;
    let inserted = char_len(text);

    match classify(doc, run, ctx.author()) {
        EditContext::InsertSelf => {
            doc.insert_chars(run, caret.offset, text)?;
            doc.touch(parent, ctx.timestamp())?;
            Ok(Caret::new(run, caret.offset + inserted))
        }
        EditContext::Plain => {
            let pieces = split_text(doc, run, &[caret.offset])?;
            let index = doc
                .index_in_parent(pieces[0])
                .ok_or(EditError::DetachedNode(run))?;
            let index = if caret.offset == 0 { index } else { index + 1 };
            let new_run = new_insert_at(doc, ctx, parent, index, text)?;
            Ok(Caret::new(new_run, inserted))
        }
        EditContext::InsertOther => split_foreign_insert(doc, ctx, caret, parent, text),
        EditContext::Delete => {
            let outer = doc.parent(parent).ok_or(EditError::DetachedNode(parent))?;
            let index = doc
                .index_in_parent(parent)
                .ok_or(EditError::DetachedNode(parent))?;
            let new_run = new_insert_at(doc, ctx, outer, index + 1, text)?;
            Ok(Caret::new(new_run, inserted))
        }
    }
}

/// Split another author's insert at the caret and place the new insert between
/// the halves. The tail keeps the original author under a fresh id; a half that
/// would be empty is never created.
fn split_foreign_insert(
    doc: &mut Document,
    ctx: &SessionContext,
    caret: Caret,
    foreign: NodeKey,
    text: &str,
) -> Result<Caret, EditError> {
    let pieces = split_text(doc, caret.node, &[caret.offset])?;
    let run_index = doc
        .index_in_parent(pieces[0])
        .ok_or(EditError::DetachedNode(caret.node))?;
    let split_index = if caret.offset == 0 {
        run_index
    } else {
        run_index + 1
    };

    let outer = doc.parent(foreign).ok_or(EditError::DetachedNode(foreign))?;
    let foreign_index = doc
        .index_in_parent(foreign)
        .ok_or(EditError::DetachedNode(foreign))?;
    let count = doc.children(foreign).len();

    let new_index = if split_index == 0 {
        foreign_index
    } else if split_index >= count {
        foreign_index + 1
    } else {
        let original = doc
            .annotation(foreign)
            .cloned()
            .ok_or_else(|| EditError::InvalidStructure(format!("{} is not an annotation", foreign)))?;
        let mut tail_annotation = ctx.annotation_for(&original.author);
        tail_annotation.timestamp = original.timestamp;
        let tail = doc.create_annotation(AnnotationKind::Insert, tail_annotation);

        let moved = doc.children(foreign)[split_index..].to_vec();
        for child in moved {
            doc.append(tail, child)?;
        }
        doc.insert_at(outer, foreign_index + 1, tail)?;
        debug!(foreign = %foreign, tail = %tail, "Split foreign insert");
        foreign_index + 1
    };

    let new_run = new_insert_at(doc, ctx, outer, new_index, text)?;
    Ok(Caret::new(new_run, char_len(text)))
}

/// Create an insert by the session author holding `text` at `parent[index]`
fn new_insert_at(
    doc: &mut Document,
    ctx: &SessionContext,
    parent: NodeKey,
    index: usize,
    text: &str,
) -> Result<NodeKey, EditError> {
    let node = doc.create_annotation(AnnotationKind::Insert, ctx.new_annotation());
    let run = doc.create_text(text);
    doc.append(node, run)?;
    doc.insert_at(parent, index, node)?;
    Ok(run)
}
