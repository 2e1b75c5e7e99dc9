use crate::document::NodeKey;
use serde::{Deserialize, Serialize};

/// A single position in the document
///
/// On a text run the offset counts characters; on any other node it is a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caret {
    pub node: NodeKey,
    pub offset: usize,
}

impl Caret {
    pub fn new(node: NodeKey, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Anchor/focus pair as reported by the host
///
/// The anchor is where the selection started; it may come after the focus in
/// document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Caret,
    pub focus: Caret,
}

impl Selection {
    pub fn new(anchor: Caret, focus: Caret) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(caret: Caret) -> Self {
        Self {
            anchor: caret,
            focus: caret,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

impl From<Caret> for Selection {
    fn from(caret: Caret) -> Self {
        Selection::collapsed(caret)
    }
}
