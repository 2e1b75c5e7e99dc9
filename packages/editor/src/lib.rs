//! # Redline Editor
//!
//! Track-changes editing engine for rich-text documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ session: author + clock + selection         │
//! │  - Dispatch edit intents                    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ engines: insert / delete / selection        │
//! │  - Classify the caret's context             │
//! │  - Split runs, wrap or remove characters    │
//! │  - Normalize touched paragraphs             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: arena tree + JSON snapshots       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Committed text is never erased**: deleting it wraps it in a delete annotation
//! 2. **Inserted text is provisional**: deleting it removes it outright
//! 3. **Authors are explicit**: the engines never read global state
//! 4. **All or nothing**: invalid input is rejected before the tree is touched
//!
//! ## Usage
//!
//! ```rust,ignore
//! use redline_editor::{Document, EditSession, SessionContext};
//!
//! let mut doc = Document::from_paragraphs(&["Hi there"]);
//! let mut session = EditSession::at_end(SessionContext::new("alice"), &doc);
//!
//! session.insert_text(&mut doc, "!")?;
//! session.delete_backward(&mut doc)?;
//! session.delete_backward(&mut doc)?;
//!
//! assert_eq!(doc.markup(), "Hi ther[-alice:e-]");
//! doc.save("document.json", true)?;
//! ```

mod classify;
mod clock;
mod delete;
mod document;
mod errors;
mod insert;
mod intents;
mod normalize;
mod position;
mod selection;
mod session;
mod snapshot;
mod split;

pub use classify::{classify, EditContext};
pub use clock::{format_timestamp, Clock, FixedClock, SystemClock, TIMESTAMP_FORMAT};
pub use delete::delete_one_unit;
pub use document::{Annotation, AnnotationKind, Document, NodeKey, NodeKind};
pub use errors::{EditError, EditorError, SnapshotError};
pub use insert::insert;
pub use intents::EditIntent;
pub use normalize::normalize;
pub use position::{Caret, Selection};
pub use selection::apply_to_selection;
pub use session::{EditSession, SessionContext};
pub use snapshot::{SerializedAnnotation, SerializedNode};
pub use split::{split_range, split_text, RangeSplit};
