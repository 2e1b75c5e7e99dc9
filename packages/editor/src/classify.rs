use crate::document::{Document, NodeKey, NodeKind};

/// What kind of region a node sits in, from the point of view of one author
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditContext {
    /// Committed text, directly inside a block
    Plain,
    /// Inside an insertion made by the editing author
    InsertSelf,
    /// Inside an insertion made by someone else
    InsertOther,
    /// Inside text already marked as deleted
    Delete,
}

impl EditContext {
    pub fn is_insert(self) -> bool {
        matches!(self, EditContext::InsertSelf | EditContext::InsertOther)
    }
}

/// Classify `node` by the annotation that directly contains it
///
/// Always computed from the live tree; the shape changes between edits.
pub fn classify(doc: &Document, node: NodeKey, author: &str) -> EditContext {
    match doc.parent(node).and_then(|parent| doc.kind(parent)) {
        Some(NodeKind::Insert(annotation)) if annotation.author == author => {
            EditContext::InsertSelf
        }
        Some(NodeKind::Insert(_)) => EditContext::InsertOther,
        Some(NodeKind::Delete(_)) => EditContext::Delete,
        _ => EditContext::Plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Annotation, AnnotationKind};

    fn annotation(author: &str) -> Annotation {
        Annotation {
            id: "a".to_string(),
            author: author.to_string(),
            timestamp: String::new(),
        }
    }

    #[test]
    fn test_classify_each_context() {
        let mut doc = Document::new();
        let block = doc.append_block();
        let plain = doc.append_text(block, "plain").unwrap();
        let ins = doc
            .append_annotation(block, AnnotationKind::Insert, annotation("alice"), "new")
            .unwrap();
        let del = doc
            .append_annotation(block, AnnotationKind::Delete, annotation("alice"), "old")
            .unwrap();
        let inserted = doc.children(ins)[0];
        let deleted = doc.children(del)[0];

        assert_eq!(classify(&doc, plain, "alice"), EditContext::Plain);
        assert_eq!(classify(&doc, inserted, "alice"), EditContext::InsertSelf);
        assert_eq!(classify(&doc, inserted, "bob"), EditContext::InsertOther);
        assert_eq!(classify(&doc, deleted, "bob"), EditContext::Delete);
        assert_eq!(classify(&doc, block, "alice"), EditContext::Plain);
    }
}
