//! # Selection Resolver
//!
//! Deletes (and optionally replaces) a range spanning any number of text runs.
//! Every spanned run is treated by its context:
//!
//! - committed text is wrapped in a delete annotation
//! - inserted text is physically removed, dropping inserts it empties
//! - already deleted text is left as it is
//!
//! Only the boundary runs are split; interior runs are handled whole.

use crate::classify::{classify, EditContext};
use crate::delete::delete_one_unit;
use crate::document::{AnnotationKind, Document, NodeKey};
use crate::errors::EditError;
use crate::insert::insert;
use crate::normalize::normalize;
use crate::position::{Caret, Selection};
use crate::session::SessionContext;
use crate::split::split_range;
use tracing::{debug, instrument, warn};

/// Carets on either side of a marked range once it has been processed
#[derive(Debug, Clone, Copy)]
struct Marked {
    before: Caret,
    after: Caret,
}

/// Delete the selected content, then type `text` in its place when given
///
/// Returns the collapsed caret: the start of the range for a deletion, the
/// end of the inserted text for a replacement.
#[instrument(skip(doc, ctx), fields(author = ctx.author()))]
pub fn apply_to_selection(
    doc: &mut Document,
    ctx: &SessionContext,
    selection: Selection,
    text: Option<&str>,
) -> Result<Caret, EditError> {
    if text == Some("") {
        return Err(EditError::EmptyOperand);
    }

    let selection = match reattach(doc, selection) {
        Some(selection) => selection,
        None => {
            warn!(
                anchor = %selection.anchor.node,
                focus = %selection.focus.node,
                "Selection no longer points into the document"
            );
            return Ok(selection.anchor);
        }
    };
    doc.check_caret(selection.anchor)?;
    doc.check_caret(selection.focus)?;

    if selection.is_collapsed() {
        return match text {
            Some(text) => insert(doc, ctx, selection.focus, text),
            None => delete_one_unit(doc, ctx, selection.focus),
        };
    }

    let (anchor, focus) = match (text_point(doc, selection.anchor), text_point(doc, selection.focus)) {
        (Some(anchor), Some(focus)) => (anchor, focus),
        _ => return finish(doc, ctx, selection.anchor, text),
    };
    if anchor == focus {
        return finish(doc, ctx, anchor, text);
    }

    let (forward, leaves) = match span(doc, anchor, focus) {
        Some(leaves) => (true, leaves),
        None => (
            false,
            span(doc, focus, anchor).ok_or_else(|| {
                EditError::InvalidStructure("Selection ends are not connected".to_string())
            })?,
        ),
    };
    let (start, end) = if forward { (anchor, focus) } else { (focus, anchor) };

    let mut blocks: Vec<NodeKey> = Vec::new();
    for block in leaves.iter().filter_map(|&leaf| doc.enclosing_block(leaf)) {
        if !blocks.contains(&block) {
            blocks.push(block);
        }
    }

    let last = leaves.len() - 1;
    let mut first_marked = None;
    let mut last_marked = None;
    for (i, &leaf) in leaves.iter().enumerate() {
        let from = if i == 0 { start.offset } else { 0 };
        let to = if i == last { end.offset } else { doc.len(leaf) };
        let marked = mark_range(doc, ctx, leaf, from, to)?;
        if i == 0 {
            first_marked = Some(marked);
        }
        if i == last {
            last_marked = Some(marked);
        }
    }
    debug!(runs = leaves.len(), forward, "Marked selection");

    for &block in &blocks {
        normalize(doc, block)?;
    }

    let (first, last) = match (first_marked, last_marked) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(EditError::InvalidStructure("Empty selection span".to_string())),
    };
    match text {
        None => Ok(first.before),
        Some(text) => {
            let caret = if forward { last.after } else { first.before };
            insert(doc, ctx, caret, text)
        }
    }
}

/// Keep a selection whose ends are both attached; collapse onto the surviving
/// end when only one of them is
fn reattach(doc: &Document, selection: Selection) -> Option<Selection> {
    let clamp = |caret: Caret| Caret::new(caret.node, caret.offset.min(doc.len(caret.node)));
    match (
        doc.is_attached(selection.anchor.node),
        doc.is_attached(selection.focus.node),
    ) {
        (true, true) => Some(selection),
        (true, false) => Some(Selection::collapsed(clamp(selection.anchor))),
        (false, true) => Some(Selection::collapsed(clamp(selection.focus))),
        (false, false) => None,
    }
}

/// Express `caret` as a position inside a text run
///
/// Element carets resolve to the end of the run before them, or failing that
/// the start of the run after them.
fn text_point(doc: &Document, caret: Caret) -> Option<Caret> {
    if doc.is_text(caret.node) {
        return Some(caret);
    }
    let children = doc.children(caret.node);
    let offset = caret.offset.min(children.len());
    children[..offset]
        .iter()
        .rev()
        .find_map(|&child| doc.last_text_descendant(child))
        .map(|leaf| Caret::new(leaf, doc.len(leaf)))
        .or_else(|| {
            children[offset..]
                .iter()
                .find_map(|&child| doc.first_text_descendant(child))
                .map(|leaf| Caret::new(leaf, 0))
        })
}

/// Runs from `from` to `to` in document order, if `to` is not before `from`
fn span(doc: &Document, from: Caret, to: Caret) -> Option<Vec<NodeKey>> {
    if from.node == to.node {
        return (from.offset <= to.offset).then(|| vec![from.node]);
    }
    let mut leaves = vec![from.node];
    let mut current = from.node;
    while current != to.node {
        current = doc.next_leaf(current)?;
        leaves.push(current);
    }
    Some(leaves)
}

/// Apply the deletion rules to characters `from..to` of `leaf`
fn mark_range(
    doc: &mut Document,
    ctx: &SessionContext,
    leaf: NodeKey,
    from: usize,
    to: usize,
) -> Result<Marked, EditError> {
    let untouched = Marked {
        before: Caret::new(leaf, from),
        after: Caret::new(leaf, to),
    };
    if from >= to {
        return Ok(untouched);
    }

    match classify(doc, leaf, ctx.author()) {
        EditContext::Delete => Ok(untouched),
        EditContext::InsertSelf | EditContext::InsertOther => {
            doc.remove_chars(leaf, from, to)?;
            let caret = if doc.len(leaf) > 0 {
                Caret::new(leaf, from)
            } else {
                doc.remove_and_caret(leaf)?
            };
            Ok(Marked {
                before: caret,
                after: caret,
            })
        }
        EditContext::Plain => {
            let split = split_range(doc, leaf, from, to)?;
            let del = doc.create_annotation(AnnotationKind::Delete, ctx.new_annotation());
            doc.insert_before(del, split.middle)?;
            doc.append(del, split.middle)?;
            let before = match split.before {
                Some(piece) => Caret::new(piece, doc.len(piece)),
                None => doc.caret_before(del),
            };
            let after = match split.after {
                Some(piece) => Caret::new(piece, 0),
                None => Caret::new(split.middle, doc.len(split.middle)),
            };
            Ok(Marked { before, after })
        }
    }
}

/// Nothing selectable between the ends: type at `caret` or just return it
fn finish(
    doc: &mut Document,
    ctx: &SessionContext,
    caret: Caret,
    text: Option<&str>,
) -> Result<Caret, EditError> {
    match text {
        Some(text) => insert(doc, ctx, caret, text),
        None => Ok(caret),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::document::Annotation;
    use chrono::NaiveDate;

    fn context(author: &str) -> SessionContext {
        let at = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        SessionContext::with_clock(author, FixedClock::new(at))
    }

    fn annotation(author: &str) -> Annotation {
        Annotation {
            id: format!("{}-id", author),
            author: author.to_string(),
            timestamp: "1 Jan 2024 9:00:00 AM".to_string(),
        }
    }

    fn run_of(doc: &Document, block: usize) -> NodeKey {
        doc.first_text_descendant(doc.blocks()[block]).unwrap()
    }

    #[test]
    fn test_single_run_range_is_wrapped() {
        let mut doc = Document::from_paragraphs(&["Hello world"]);
        let run = run_of(&doc, 0);
        let selection = Selection::new(Caret::new(run, 2), Caret::new(run, 7));

        let caret = apply_to_selection(&mut doc, &context("bob"), selection, None).unwrap();

        assert_eq!(doc.markup(), "He[-bob:llo w-]orld");
        assert_eq!(caret, Caret::new(run, 2));
    }

    #[test]
    fn test_backward_selection_matches_forward() {
        let mut forward = Document::from_paragraphs(&["Hello world"]);
        let run = run_of(&forward, 0);
        let mut backward = forward.clone();
        let ctx = context("bob");

        apply_to_selection(
            &mut forward,
            &ctx,
            Selection::new(Caret::new(run, 1), Caret::new(run, 4)),
            None,
        )
        .unwrap();
        let caret = apply_to_selection(
            &mut backward,
            &ctx,
            Selection::new(Caret::new(run, 4), Caret::new(run, 1)),
            None,
        )
        .unwrap();

        assert_eq!(forward.markup(), backward.markup());
        assert_eq!(caret, Caret::new(run, 1));
    }

    #[test]
    fn test_range_across_paragraphs() {
        let mut doc = Document::from_paragraphs(&["one", "two", "three"]);
        let first = run_of(&doc, 0);
        let third = run_of(&doc, 2);
        let selection = Selection::new(Caret::new(first, 1), Caret::new(third, 2));

        let caret = apply_to_selection(&mut doc, &context("bob"), selection, None).unwrap();

        assert_eq!(doc.markup(), "o[-bob:ne-]\n[-bob:two-]\n[-bob:th-]ree");
        assert_eq!(caret, Caret::new(first, 1));
        assert_eq!(doc.plain_text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_mixed_contexts_in_one_paragraph() {
        let mut doc = Document::from_paragraphs(&["ab"]);
        let block = doc.blocks()[0];
        doc.append_annotation(block, AnnotationKind::Insert, annotation("alice"), "cd")
            .unwrap();
        doc.append_annotation(block, AnnotationKind::Delete, annotation("alice"), "ef")
            .unwrap();
        let tail = doc.append_text(block, "gh").unwrap();
        let head = doc.children(block)[0];

        let selection = Selection::new(Caret::new(head, 1), Caret::new(tail, 1));
        let caret = apply_to_selection(&mut doc, &context("bob"), selection, None).unwrap();

        assert_eq!(doc.markup(), "a[-bob:befg-]h");
        assert_eq!(caret, Caret::new(head, 1));
    }

    #[test]
    fn test_partial_insert_boundary_keeps_rest() {
        let mut doc = Document::from_paragraphs(&[""]);
        let block = doc.blocks()[0];
        let ins = doc
            .append_annotation(block, AnnotationKind::Insert, annotation("alice"), "wxyz")
            .unwrap();
        let inserted = doc.children(ins)[0];
        let tail = doc.append_text(block, "ab").unwrap();

        let selection = Selection::new(Caret::new(inserted, 2), Caret::new(tail, 1));
        apply_to_selection(&mut doc, &context("bob"), selection, None).unwrap();

        assert_eq!(doc.markup(), "{+alice:wx+}[-bob:a-]b");
    }

    #[test]
    fn test_replacement_lands_at_forward_focus() {
        let mut doc = Document::from_paragraphs(&["one", "two"]);
        let first = run_of(&doc, 0);
        let second = run_of(&doc, 1);
        let selection = Selection::new(Caret::new(first, 2), Caret::new(second, 1));

        let caret = apply_to_selection(&mut doc, &context("bob"), selection, Some("X")).unwrap();

        assert_eq!(doc.markup(), "on[-bob:e-]\n[-bob:t-]{+bob:X+}wo");
        assert_eq!(doc.text(caret.node), Some("X"));
    }

    #[test]
    fn test_backward_replacement_lands_at_start() {
        let mut doc = Document::from_paragraphs(&["one", "two"]);
        let first = run_of(&doc, 0);
        let second = run_of(&doc, 1);
        let selection = Selection::new(Caret::new(second, 1), Caret::new(first, 2));

        apply_to_selection(&mut doc, &context("bob"), selection, Some("X")).unwrap();

        assert_eq!(doc.markup(), "on{+bob:X+}[-bob:e-]\n[-bob:t-]wo");
    }

    #[test]
    fn test_collapsed_selection_routes_to_engines() {
        let mut doc = Document::from_paragraphs(&["ab"]);
        let run = run_of(&doc, 0);
        let ctx = context("bob");

        let caret = apply_to_selection(
            &mut doc,
            &ctx,
            Selection::collapsed(Caret::new(run, 2)),
            None,
        )
        .unwrap();
        assert_eq!(doc.markup(), "a[-bob:b-]");

        apply_to_selection(&mut doc, &ctx, Selection::collapsed(caret), Some("z")).unwrap();
        assert_eq!(doc.markup(), "a{+bob:z+}[-bob:b-]");
    }

    #[test]
    fn test_detached_end_collapses_to_survivor() {
        let mut doc = Document::from_paragraphs(&["abc"]);
        let run = run_of(&doc, 0);
        let block = doc.blocks()[0];
        let gone = doc
            .append_annotation(block, AnnotationKind::Insert, annotation("bob"), "x")
            .unwrap();
        let gone_run = doc.children(gone)[0];
        doc.remove(gone).unwrap();

        let selection = Selection::new(Caret::new(run, 3), Caret::new(gone_run, 1));
        apply_to_selection(&mut doc, &context("bob"), selection, None).unwrap();
        assert_eq!(doc.markup(), "ab[-bob:c-]");

        let loose = doc.create_text("loose");
        let selection = Selection::new(Caret::new(gone_run, 0), Caret::new(loose, 2));
        let before = doc.outline();
        let caret = apply_to_selection(&mut doc, &context("bob"), selection, None).unwrap();
        assert_eq!(caret, Caret::new(gone_run, 0));
        assert_eq!(doc.outline(), before);
    }

    #[test]
    fn test_contract_violations_are_rejected_before_mutation() {
        let mut doc = Document::from_paragraphs(&["abc"]);
        let run = run_of(&doc, 0);
        let ctx = context("bob");
        let before = doc.outline();

        let selection = Selection::new(Caret::new(run, 0), Caret::new(run, 2));
        assert_eq!(
            apply_to_selection(&mut doc, &ctx, selection, Some("")),
            Err(EditError::EmptyOperand)
        );
        let selection = Selection::new(Caret::new(run, 0), Caret::new(run, 9));
        assert_eq!(
            apply_to_selection(&mut doc, &ctx, selection, None),
            Err(EditError::InvalidOffset { offset: 9, len: 3 })
        );
        assert_eq!(doc.outline(), before);
    }
}
