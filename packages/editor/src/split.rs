//! # Text Splitting
//!
//! Cuts a text run into adjacent sibling runs. The left-most piece keeps the
//! original key; every other piece gets a fresh key and is placed after it in the
//! same parent. Offsets at either edge never produce an empty piece, so the
//! concatenated pieces always reproduce the original text.

use crate::document::{char_len, char_slice, Document, NodeKey};
use crate::errors::EditError;

/// Split `node` at every offset in `offsets`, returning the pieces in order
pub fn split_text(
    doc: &mut Document,
    node: NodeKey,
    offsets: &[usize],
) -> Result<Vec<NodeKey>, EditError> {
    let text = doc.text(node).ok_or(EditError::NotText(node))?.to_string();
    let len = char_len(&text);
    if let Some(&offset) = offsets.iter().find(|&&o| o > len) {
        return Err(EditError::InvalidOffset { offset, len });
    }
    if doc.parent(node).is_none() {
        return Err(EditError::DetachedNode(node));
    }

    let mut cuts: Vec<usize> = offsets
        .iter()
        .copied()
        .filter(|&o| o > 0 && o < len)
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    if cuts.is_empty() {
        return Ok(vec![node]);
    }

    let mut bounds = Vec::with_capacity(cuts.len() + 2);
    bounds.push(0);
    bounds.extend(cuts);
    bounds.push(len);

    let mut pieces = bounds
        .windows(2)
        .map(|w| char_slice(&text, w[0], w[1]).to_string());
    if let Some(first) = pieces.next() {
        doc.set_text(node, first)?;
    }

    let mut keys = vec![node];
    let mut previous = node;
    for piece in pieces {
        let key = doc.create_text(piece);
        doc.insert_after(key, previous)?;
        keys.push(key);
        previous = key;
    }
    Ok(keys)
}

/// Pieces of a run around a selected character range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSplit {
    pub before: Option<NodeKey>,
    pub middle: NodeKey,
    pub after: Option<NodeKey>,
}

/// Isolate the characters `from..to` of `node` into their own run
///
/// `from < to` is required; the middle piece is never empty.
pub fn split_range(
    doc: &mut Document,
    node: NodeKey,
    from: usize,
    to: usize,
) -> Result<RangeSplit, EditError> {
    let len = doc.len(node);
    if from >= to || to > len {
        return Err(EditError::InvalidOffset { offset: to, len });
    }
    let pieces = split_text(doc, node, &[from, to])?;
    let middle_index = usize::from(from > 0);
    Ok(RangeSplit {
        before: (from > 0).then(|| pieces[0]),
        middle: pieces[middle_index],
        after: (to < len).then(|| pieces[pieces.len() - 1]),
    })
}
