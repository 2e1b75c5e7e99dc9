//! # Edit Intents
//!
//! Serializable user actions, as produced by a host or read from a script.
//!
//! ## Intent Semantics
//!
//! ### InsertText
//! - Types at the caret, replacing the selection if there is one
//! - Empty text is rejected
//!
//! ### DeleteBackward
//! - One character before the caret, or the selected content
//!
//! ### DeleteWordBackward / DeleteLineBackward
//! - Reduced to a selection spanning the unit, then deleted like one
//!
//! ### Select
//! - Replaces the session selection; both ends must address live positions

use crate::document::Document;
use crate::errors::EditError;
use crate::position::Caret;
use serde::{Deserialize, Serialize};

/// User action applied through an [`crate::EditSession`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditIntent {
    /// Type text at the selection
    InsertText { text: String },

    /// Backspace
    DeleteBackward,

    /// Remove the word before the caret
    DeleteWordBackward,

    /// Remove from the start of the paragraph up to the caret
    DeleteLineBackward,

    /// Move the selection
    Select { anchor: Caret, focus: Caret },
}

impl EditIntent {
    /// Check the intent against the document before anything is mutated
    pub fn validate(&self, doc: &Document) -> Result<(), EditError> {
        match self {
            EditIntent::InsertText { text } if text.is_empty() => Err(EditError::EmptyOperand),
            EditIntent::Select { anchor, focus } => {
                doc.check_caret(*anchor)?;
                doc.check_caret(*focus)
            }
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditIntent::InsertText { .. } => "insert_text",
            EditIntent::DeleteBackward => "delete_backward",
            EditIntent::DeleteWordBackward => "delete_word_backward",
            EditIntent::DeleteLineBackward => "delete_line_backward",
            EditIntent::Select { .. } => "select",
        }
    }
}
