//! Property-based tests for the tracked-change invariants.

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::BTreeMap;
use redline_editor::{
    apply_to_selection, delete_one_unit, insert, normalize, split_text, Caret, Document,
    EditError, FixedClock, NodeKey, NodeKind, Selection, SessionContext,
};

// =============================================================================
// Test helpers
// =============================================================================

const AUTHORS: [&str; 3] = ["alice", "bob", "carol"];

#[derive(Clone, Debug)]
enum EditOp {
    Insert { author: usize, at: f64, text: String },
    Delete { author: usize, at: f64 },
    Replace { author: usize, from: f64, to: f64, text: Option<String> },
}

fn arbitrary_edit_op() -> impl Strategy<Value = EditOp> {
    prop_oneof![
        (0..AUTHORS.len(), 0.0..=1.0f64, "[a-z ]{1,6}")
            .prop_map(|(author, at, text)| EditOp::Insert { author, at, text }),
        (0..AUTHORS.len(), 0.0..=1.0f64).prop_map(|(author, at)| EditOp::Delete { author, at }),
        (
            0..AUTHORS.len(),
            0.0..=1.0f64,
            0.0..=1.0f64,
            proptest::option::of("[A-Z]{1,3}")
        )
            .prop_map(|(author, from, to, text)| EditOp::Replace {
                author,
                from,
                to,
                text
            }),
    ]
}

fn context(author: usize) -> SessionContext {
    let at = NaiveDate::from_ymd_opt(2024, 3, 5)
        .unwrap()
        .and_hms_opt(14, 7, 9)
        .unwrap();
    SessionContext::with_clock(AUTHORS[author], FixedClock::new(at))
}

/// Every caret position in the document, in order
fn positions(doc: &Document) -> Vec<Caret> {
    let mut carets = Vec::new();
    for &block in doc.blocks() {
        let leaves = doc.text_leaves(block);
        if leaves.is_empty() {
            carets.push(Caret::new(block, 0));
        }
        for leaf in leaves {
            for offset in 0..=doc.len(leaf) {
                carets.push(Caret::new(leaf, offset));
            }
        }
    }
    carets
}

fn pick(doc: &Document, pct: f64) -> Caret {
    let carets = positions(doc);
    let index = ((pct * carets.len() as f64) as usize).min(carets.len() - 1);
    carets[index]
}

fn apply_edit(doc: &mut Document, op: &EditOp) -> Result<Caret, EditError> {
    match op {
        EditOp::Insert { author, at, text } => {
            let caret = pick(doc, *at);
            insert(doc, &context(*author), caret, text)
        }
        EditOp::Delete { author, at } => {
            let caret = pick(doc, *at);
            delete_one_unit(doc, &context(*author), caret)
        }
        EditOp::Replace {
            author,
            from,
            to,
            text,
        } => {
            let selection = Selection::new(pick(doc, *from), pick(doc, *to));
            apply_to_selection(doc, &context(*author), selection, text.as_deref())
        }
    }
}

/// Text outside insert annotations, one line per paragraph
fn committed_text(doc: &Document) -> String {
    doc.blocks()
        .iter()
        .map(|&block| {
            doc.text_leaves(block)
                .into_iter()
                .filter(|&leaf| !doc.parent(leaf).map_or(false, |p| doc.is_insert(p)))
                .filter_map(|leaf| doc.text(leaf))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text inside insert annotations, in document order
fn typed_text(doc: &Document) -> String {
    doc.blocks()
        .iter()
        .flat_map(|&block| doc.text_leaves(block))
        .filter(|&leaf| doc.parent(leaf).map_or(false, |p| doc.is_insert(p)))
        .filter_map(|leaf| doc.text(leaf))
        .collect()
}

fn char_counts(text: &str) -> BTreeMap<char, usize> {
    let mut counts = BTreeMap::new();
    for c in text.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}

/// Whether every character of `part` is available in `whole`
fn is_sub_multiset(part: &str, whole: &str) -> bool {
    let available = char_counts(whole);
    char_counts(part)
        .into_iter()
        .all(|(c, n)| available.get(&c).copied().unwrap_or(0) >= n)
}

fn check_structure(doc: &Document) -> Result<(), TestCaseError> {
    for &block in doc.blocks() {
        let children = doc.children(block);
        for (i, &child) in children.iter().enumerate() {
            if doc.is_annotation(child) {
                let inner = doc.children(child);
                prop_assert!(!inner.is_empty(), "empty annotation {}", child);
                prop_assert!(
                    inner.iter().all(|&k| doc.is_text(k)),
                    "nested annotation in {}",
                    child
                );
            }
            if i > 0 {
                prop_assert!(
                    !(doc.is_delete(child) && doc.is_delete(children[i - 1])),
                    "adjacent deletes at {}",
                    child
                );
            }
        }
    }
    Ok(())
}

// =============================================================================
// Invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Committed text survives any edit sequence and the tree stays well formed
    #[test]
    fn edits_preserve_committed_text(
        paragraphs in prop::collection::vec("[a-z]{0,8}", 1..4),
        ops in prop::collection::vec(arbitrary_edit_op(), 1..30),
    ) {
        let mut doc = Document::from_paragraphs(&paragraphs);
        let original = paragraphs.join("\n");

        for op in &ops {
            let caret = apply_edit(&mut doc, op);
            let caret = caret.map_err(|err| TestCaseError::fail(format!("{:?} failed: {}", op, err)))?;
            prop_assert!(doc.check_caret(caret).is_ok(), "{:?} returned dead caret {:?}", op, caret);
            check_structure(&doc)?;
            prop_assert_eq!(committed_text(&doc), original.clone());
        }
    }

    /// Typed text only grows by what is typed and only shrinks through deletion
    #[test]
    fn typed_text_survives_until_deleted(
        paragraphs in prop::collection::vec("[a-z]{0,8}", 1..4),
        ops in prop::collection::vec(arbitrary_edit_op(), 1..30),
    ) {
        let mut doc = Document::from_paragraphs(&paragraphs);

        for op in &ops {
            let before = typed_text(&doc);
            apply_edit(&mut doc, op)
                .map_err(|err| TestCaseError::fail(format!("{:?} failed: {}", op, err)))?;
            let after = typed_text(&doc);
            let before_len = before.chars().count();
            let after_len = after.chars().count();

            match op {
                EditOp::Insert { text, .. } => {
                    prop_assert_eq!(after_len, before_len + text.chars().count());
                    prop_assert_eq!(char_counts(&after), char_counts(&(before.clone() + text)));
                }
                EditOp::Delete { .. } => {
                    prop_assert!(after_len <= before_len, "{:?} grew typed text", op);
                    prop_assert!(after_len + 1 >= before_len, "{:?} removed more than one character", op);
                    prop_assert!(is_sub_multiset(&after, &before), "{:?} changed typed text", op);
                }
                EditOp::Replace { text, .. } => {
                    let typed = text.clone().unwrap_or_default();
                    prop_assert!(
                        is_sub_multiset(&after, &(before.clone() + &typed)),
                        "{:?} changed typed text",
                        op
                    );
                    prop_assert!(after_len <= before_len + typed.chars().count());
                }
            }
        }
    }

    /// Normalizing an already normalized paragraph changes nothing
    #[test]
    fn normalize_is_idempotent(
        ops in prop::collection::vec(arbitrary_edit_op(), 1..20),
    ) {
        let mut doc = Document::from_paragraphs(&["the quick brown fox"]);
        for op in &ops {
            let _ = apply_edit(&mut doc, op);
        }

        let before = doc.outline();
        let blocks: Vec<NodeKey> = doc.blocks().to_vec();
        for block in blocks {
            prop_assert_eq!(normalize(&mut doc, block).unwrap(), 0);
        }
        prop_assert_eq!(doc.outline(), before);
    }

    /// Splitting a run never gains or loses characters
    #[test]
    fn split_reproduces_text(text in "[a-zé€ ]{1,12}", cut in 0.0..=1.0f64) {
        let mut doc = Document::from_paragraphs(&[text.as_str()]);
        let run = doc.children(doc.blocks()[0])[0];
        let offset = (cut * doc.len(run) as f64) as usize;

        let pieces = split_text(&mut doc, run, &[offset]).unwrap();

        let joined: String = pieces.iter().filter_map(|&p| doc.text(p)).collect();
        prop_assert_eq!(joined, text);
        prop_assert_eq!(pieces[0], run);
        prop_assert!(pieces.iter().all(|&p| matches!(doc.kind(p), Some(NodeKind::Text(t)) if !t.is_empty())));
    }
}
