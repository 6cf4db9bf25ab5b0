//! Serialize/re-parse fence
//!
//! After a structural edit the whole tree is written out and read back. The
//! re-read tree must equal the live one; it then replaces it, so nothing
//! built against the old tree survives the edit.

use crate::error::ReintegrationError;
use tme_document::{yaml, Document};

/// Text and tree produced by a successful fence
#[derive(Debug, Clone)]
pub struct Reintegrated {
    /// Serialized document
    pub text: String,
    /// Tree read back from `text`
    pub document: Document,
}

/// Write `doc`, read it back and check both trees agree
///
/// # Errors
/// Returns [`ReintegrationError`] when writing or reading fails, or when the
/// trees differ.
pub fn reintegrate(doc: &Document, indent: usize) -> Result<Reintegrated, ReintegrationError> {
    let text = yaml::to_string_with_indent(doc, indent)?;
    let document = yaml::parse(&text)?;
    if document != *doc {
        return Err(ReintegrationError::Diverged);
    }
    tracing::debug!(bytes = text.len(), "reintegrated document");
    Ok(Reintegrated { text, document })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tme_document::{DocPath, Node};

    #[test]
    fn clean_document_passes() {
        let doc = yaml::parse("a: &x 1\nb: *x\n").unwrap();
        let out = reintegrate(&doc, 2).unwrap();
        assert_eq!(out.text, "a: &x 1\nb: *x\n");
        assert_eq!(out.document, doc);
    }

    #[test]
    fn alias_without_anchor_fails_to_reparse() {
        let mut doc = yaml::parse("a: &x 1\nb: *x\n").unwrap();
        doc.delete(&DocPath::from(["a"])).unwrap();
        assert!(matches!(
            reintegrate(&doc, 2),
            Err(ReintegrationError::Parse(_))
        ));
    }

    #[test]
    fn unwritable_anchor_fails_to_serialize() {
        let mut doc = yaml::parse("a: 1\n").unwrap();
        doc.set(&DocPath::from(["a"]), Node::scalar(1_i64).with_anchor("no good"))
            .unwrap();
        assert!(matches!(
            reintegrate(&doc, 2),
            Err(ReintegrationError::Serialize(_))
        ));
    }
}
