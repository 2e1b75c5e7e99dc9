//! # Delete-Run Normalization
//!
//! Post-pass run after every edit. Consecutive delete annotations in a block are
//! folded into the first one of the run, which receives the children of the
//! others in order. Annotations left without children are dropped in the same
//! scan. Running the pass twice has no further effect.

use crate::document::{Document, NodeKey};
use crate::errors::EditError;
use tracing::debug;

/// Normalize the direct children of `block`, returning how many nodes were removed
pub fn normalize(doc: &mut Document, block: NodeKey) -> Result<usize, EditError> {
    let children = doc.children(block).to_vec();
    let mut run_head: Option<NodeKey> = None;
    let mut removed = 0;

    for child in children {
        if doc.is_annotation(child) && doc.children(child).is_empty() {
            doc.remove(child)?;
            removed += 1;
            continue;
        }

        if !doc.is_delete(child) {
            run_head = None;
            continue;
        }

        match run_head {
            Some(head) => {
                let moved = doc.children(child).to_vec();
                for grandchild in moved {
                    doc.append(head, grandchild)?;
                }
                doc.remove(child)?;
                removed += 1;
            }
            None => run_head = Some(child),
        }
    }

    if removed > 0 {
        debug!(block = %block, removed, "Normalized delete runs");
    }
    Ok(removed)
}
