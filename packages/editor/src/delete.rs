//! # Delete Engine
//!
//! A backspace never removes committed text. Characters outside any insert are
//! wrapped in a delete annotation, characters inside an insert are physically
//! removed, and already deleted text is skipped over.
//!
//! At the start of a run the caret walks backward through the tree until it
//! finds content. Inside a paragraph the deletion then proceeds at the new
//! position; crossing into the previous paragraph only moves the caret, since
//! merging paragraphs is left to the host.

use crate::classify::{classify, EditContext};
use crate::document::{AnnotationKind, Document, NodeKey, NodeKind};
use crate::errors::EditError;
use crate::normalize::normalize;
use crate::position::Caret;
use crate::session::SessionContext;
use crate::split::split_range;
use tracing::{debug, instrument};

enum Step {
    /// Finished; `touched` is the block that needs normalizing
    Done {
        caret: Caret,
        touched: Option<NodeKey>,
    },
    /// Continue the deletion at another position
    Retry(Caret),
}

/// Delete the character before `caret`, returning the caret after the edit
///
/// Deleting at the very start of the document changes nothing and returns
/// `caret` unchanged.
#[instrument(skip(doc, ctx), fields(author = ctx.author()))]
pub fn delete_one_unit(
    doc: &mut Document,
    ctx: &SessionContext,
    caret: Caret,
) -> Result<Caret, EditError> {
    doc.check_caret(caret)?;

    let mut current = caret;
    loop {
        let step = match step(doc, ctx, current) {
            Ok(step) => step,
            Err(EditError::UnreachableBoundary) => {
                debug!(node = %caret.node, "Nothing to delete before the caret");
                return Ok(caret);
            }
            Err(err) => return Err(err),
        };

        match step {
            Step::Retry(next) => current = next,
            Step::Done { caret, touched } => {
                if let Some(block) = touched {
                    normalize(doc, block)?;
                }
                return Ok(caret);
            }
        }
    }
}

fn step(doc: &mut Document, ctx: &SessionContext, caret: Caret) -> Result<Step, EditError> {
    if !doc.is_text(caret.node) {
        return element_step(doc, caret);
    }
    if caret.offset == 0 {
        return cross_boundary(doc, caret.node);
    }

    let run = caret.node;
    let parent = doc.parent(run).ok_or(EditError::DetachedNode(run))?;
    let block = doc.enclosing_block(run);

    match classify(doc, run, ctx.author()) {
        EditContext::Plain => {
            let split = split_range(doc, run, caret.offset - 1, caret.offset)?;
            let del = doc.create_annotation(AnnotationKind::Delete, ctx.new_annotation());
            doc.insert_before(del, split.middle)?;
            doc.append(del, split.middle)?;
            let caret = match split.before {
                Some(before) => Caret::new(before, doc.len(before)),
                None => doc.caret_before(del),
            };
            Ok(Step::Done {
                caret,
                touched: block,
            })
        }
        EditContext::InsertSelf | EditContext::InsertOther => {
            doc.remove_chars(run, caret.offset - 1, caret.offset)?;
            let caret = if doc.len(run) > 0 {
                Caret::new(run, caret.offset - 1)
            } else {
                doc.remove_and_caret(run)?
            };
            Ok(Step::Done {
                caret,
                touched: block,
            })
        }
        EditContext::Delete => Ok(Step::Done {
            caret: doc.caret_before(parent),
            touched: None,
        }),
    }
}

/// Caret between children: continue from the end of the child before it
fn element_step(doc: &Document, caret: Caret) -> Result<Step, EditError> {
    if caret.offset == 0 {
        return cross_boundary(doc, caret.node);
    }
    let previous = doc.children(caret.node)[caret.offset - 1];
    Ok(match last_filled_leaf(doc, previous) {
        Some(leaf) => Step::Retry(Caret::new(leaf, doc.len(leaf))),
        None => Step::Retry(Caret::new(caret.node, caret.offset - 1)),
    })
}

/// Walk upward from `node` looking for content before it
fn cross_boundary(doc: &Document, node: NodeKey) -> Result<Step, EditError> {
    let mut current = node;
    loop {
        match doc.kind(current) {
            Some(NodeKind::Block) => {
                let previous = doc
                    .previous_sibling(current)
                    .ok_or(EditError::UnreachableBoundary)?;
                return Ok(Step::Done {
                    caret: doc.end_of(previous),
                    touched: None,
                });
            }
            Some(NodeKind::Root) => return Err(EditError::UnreachableBoundary),
            Some(_) => {}
            None => return Err(EditError::DetachedNode(current)),
        }

        let mut sibling = doc.previous_sibling(current);
        while let Some(candidate) = sibling {
            if let Some(leaf) = last_filled_leaf(doc, candidate) {
                return Ok(Step::Retry(Caret::new(leaf, doc.len(leaf))));
            }
            sibling = doc.previous_sibling(candidate);
        }
        current = doc.parent(current).ok_or(EditError::DetachedNode(current))?;
    }
}

/// Last non-empty text run at or below `key`
fn last_filled_leaf(doc: &Document, key: NodeKey) -> Option<NodeKey> {
    doc.text_leaves(key)
        .into_iter()
        .rev()
        .find(|&leaf| doc.len(leaf) > 0)
}
