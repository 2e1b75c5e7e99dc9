//! # Edit Session Management
//!
//! An `EditSession` is one author's view of a document: who is typing, which
//! clock stamps their changes, and where their selection currently is. The
//! engines never read process-wide state; everything they need arrives through
//! the [`SessionContext`].

use crate::clock::{format_timestamp, Clock, SystemClock};
use crate::delete::delete_one_unit;
use crate::document::{Annotation, Document};
use crate::errors::EditError;
use crate::insert::insert;
use crate::intents::EditIntent;
use crate::position::{Caret, Selection};
use crate::selection::apply_to_selection;
use tracing::{debug, warn};
use uuid::Uuid;

/// Author identity and time source handed to every engine call
#[derive(Debug)]
pub struct SessionContext {
    author: String,
    clock: Box<dyn Clock>,
}

impl SessionContext {
    /// Context stamped by the local wall clock
    pub fn new(author: impl Into<String>) -> Self {
        Self::with_clock(author, SystemClock)
    }

    pub fn with_clock(author: impl Into<String>, clock: impl Clock + 'static) -> Self {
        Self {
            author: author.into(),
            clock: Box::new(clock),
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Current time in the interchange format
    pub fn timestamp(&self) -> String {
        format_timestamp(&self.clock.now())
    }

    /// Metadata for a brand-new annotation by this author
    pub fn new_annotation(&self) -> Annotation {
        self.annotation_for(&self.author)
    }

    /// Metadata for a brand-new annotation attributed to `author`
    pub fn annotation_for(&self, author: &str) -> Annotation {
        Annotation {
            id: Uuid::new_v4().to_string(),
            author: author.to_string(),
            timestamp: self.timestamp(),
        }
    }
}

/// Single author's editing state
#[derive(Debug)]
pub struct EditSession {
    context: SessionContext,

    /// Current selection; collapsed when it is a plain caret
    selection: Selection,

    /// Number of intents applied so far
    applied: u64,
}

impl EditSession {
    /// Create a session with its caret at `caret`
    pub fn new(context: SessionContext, caret: Caret) -> Self {
        Self {
            context,
            selection: Selection::collapsed(caret),
            applied: 0,
        }
    }

    /// Create a session whose caret sits at the end of `doc`
    pub fn at_end(context: SessionContext, doc: &Document) -> Self {
        Self::new(context, doc.end_caret())
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn author(&self) -> &str {
        self.context.author()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Focus of the selection, the caret after any edit
    pub fn caret(&self) -> Caret {
        self.selection.focus
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn applied_count(&self) -> u64 {
        self.applied
    }

    /// Type `text` at the selection, replacing any selected content
    pub fn insert_text(&mut self, doc: &mut Document, text: &str) -> Result<Caret, EditError> {
        let caret = if self.selection.is_collapsed() {
            insert(doc, &self.context, self.selection.focus, text)?
        } else {
            apply_to_selection(doc, &self.context, self.selection, Some(text))?
        };
        Ok(self.collapse_to(caret))
    }

    /// Remove one character before the caret, or the selected content
    pub fn delete_backward(&mut self, doc: &mut Document) -> Result<Caret, EditError> {
        let caret = if self.selection.is_collapsed() {
            delete_one_unit(doc, &self.context, self.selection.focus)?
        } else {
            apply_to_selection(doc, &self.context, self.selection, None)?
        };
        Ok(self.collapse_to(caret))
    }

    /// Remove the word before the caret
    ///
    /// Trailing whitespace is taken together with the word. The span never
    /// leaves the caret's text run; at the start of a run this falls back to a
    /// single-character deletion.
    pub fn delete_word_backward(&mut self, doc: &mut Document) -> Result<Caret, EditError> {
        if !self.selection.is_collapsed() {
            return self.delete_backward(doc);
        }
        let caret = self.selection.focus;
        doc.check_caret(caret)?;
        let start = match doc.text(caret.node) {
            Some(text) => word_start(text, caret.offset),
            None => caret.offset,
        };
        if start == caret.offset || !doc.is_text(caret.node) {
            return self.delete_backward(doc);
        }
        let span = Selection::new(caret, Caret::new(caret.node, start));
        let caret = apply_to_selection(doc, &self.context, span, None)?;
        Ok(self.collapse_to(caret))
    }

    /// Remove everything between the start of the caret's paragraph and the caret
    pub fn delete_line_backward(&mut self, doc: &mut Document) -> Result<Caret, EditError> {
        if !self.selection.is_collapsed() {
            return self.delete_backward(doc);
        }
        let caret = self.selection.focus;
        doc.check_caret(caret)?;
        let line_start = doc
            .enclosing_block(caret.node)
            .and_then(|block| doc.first_text_descendant(block))
            .map(|leaf| Caret::new(leaf, 0));
        match line_start {
            Some(start) if start != caret && doc.is_text(caret.node) => {
                let span = Selection::new(caret, start);
                let caret = apply_to_selection(doc, &self.context, span, None)?;
                Ok(self.collapse_to(caret))
            }
            _ => self.delete_backward(doc),
        }
    }

    /// Validate and dispatch a serialized intent
    pub fn apply(&mut self, doc: &mut Document, intent: &EditIntent) -> Result<Caret, EditError> {
        if let Err(err) = intent.validate(doc) {
            warn!(intent = intent.name(), error = %err, "Rejected edit intent");
            return Err(err);
        }

        let caret = match intent {
            EditIntent::InsertText { text } => self.insert_text(doc, text)?,
            EditIntent::DeleteBackward => self.delete_backward(doc)?,
            EditIntent::DeleteWordBackward => self.delete_word_backward(doc)?,
            EditIntent::DeleteLineBackward => self.delete_line_backward(doc)?,
            EditIntent::Select { anchor, focus } => {
                self.selection = Selection::new(*anchor, *focus);
                *focus
            }
        };

        self.applied += 1;
        debug!(
            intent = intent.name(),
            node = %caret.node,
            offset = caret.offset,
            "Applied edit intent"
        );
        Ok(caret)
    }

    fn collapse_to(&mut self, caret: Caret) -> Caret {
        self.selection = Selection::collapsed(caret);
        caret
    }
}

/// Character offset where the word ending at `offset` begins
fn word_start(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().take(offset).collect();
    let mut start = chars.len();
    while start > 0 && chars[start - 1].is_whitespace() {
        start -= 1;
    }
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    start
}
