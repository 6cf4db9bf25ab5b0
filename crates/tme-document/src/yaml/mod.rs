//! YAML text codec
//!
//! Reads and writes threat-model YAML through the `libyaml-safer` event
//! stream while keeping anchors and aliases as nodes in the tree, so they can
//! be renamed and retargeted instead of being expanded.
//!
//! # Example
//!
//! ```rust
//! use tme_document::yaml;
//!
//! let doc = yaml::parse("base: &base\n  level: high\nother:\n  <<: *base\n").unwrap();
//! let text = yaml::to_string(&doc).unwrap();
//! assert_eq!(yaml::parse(&text).unwrap(), doc);
//! ```

mod reader;
pub(crate) mod scalar;
mod writer;

use crate::document::Document;
use crate::error::{ParseError, SerializeError};

/// Default indentation width
pub const DEFAULT_INDENT: usize = 2;

/// Check whether a name can be written as an anchor or alias
#[must_use]
pub fn is_valid_anchor_name(name: &str) -> bool {
    scalar::is_valid_anchor(name)
}

/// Parse YAML text into a document
///
/// # Errors
/// Returns [`ParseError`] with the offending line on malformed input,
/// aliases to anchors not defined earlier, duplicate keys, tags, complex
/// keys or more than one document.
pub fn parse(text: &str) -> Result<Document, ParseError> {
    let mut input = text.as_bytes();
    let root = reader::Reader::new(&mut input).read_document()?;
    tracing::trace!(lines = text.lines().count(), "parsed yaml document");
    Ok(Document::from(root))
}

/// Write a document as block-style YAML with the default indentation
///
/// # Errors
/// Returns [`SerializeError`] for collection or alias map keys, anchor
/// names that cannot be written, or an emitter failure.
pub fn to_string(doc: &Document) -> Result<String, SerializeError> {
    to_string_with_indent(doc, DEFAULT_INDENT)
}

/// Write a document with a given indentation width (clamped to 2..=8)
///
/// # Errors
/// See [`to_string`].
pub fn to_string_with_indent(doc: &Document, indent: usize) -> Result<String, SerializeError> {
    writer::write(doc, indent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::path::DocPath;
    use pretty_assertions::assert_eq;

    const MODEL: &str = r#"title: Demo model
tags_available:
  - web
  - "db"
data_assets:
  customer-data: &customer-data
    id: da-1
    confidentiality: confidential
  derived:
    <<: *customer-data
    id: da-2
technical_assets:
  web-server:
    id: ta-1
    data_assets_processed: [da-1, da-2]
    communication_links:
      to-db:
        target: ta-2
        data_assets_sent:
          - da-1
risk_tracking:
  sql-injection@ta-1:
    status: mitigated
"#;

    #[test]
    fn model_round_trips() {
        let doc = parse(MODEL).unwrap();
        let text = to_string(&doc).unwrap();
        assert_eq!(parse(&text).unwrap(), doc);
    }

    #[test]
    fn writes_model_in_block_style() {
        let doc = parse(MODEL).unwrap();
        let text = to_string(&doc).unwrap();
        assert!(text.contains("  customer-data: &customer-data\n"));
        assert!(text.contains("    <<: *customer-data\n"));
        assert!(text.contains("    data_assets_processed:\n    - da-1\n    - da-2\n"));
        assert!(text.starts_with("title: Demo model\n"));
    }

    #[test]
    fn indent_is_configurable() {
        let doc = parse("a:\n  b: 1\n").unwrap();
        assert_eq!(to_string_with_indent(&doc, 4).unwrap(), "a:\n    b: 1\n");
        assert_eq!(to_string_with_indent(&doc, 0).unwrap(), "a:\n  b: 1\n");
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let doc = parse("\u{feff}a: 1\n").unwrap();
        assert!(doc.has(&DocPath::from(["a"])));
        assert_eq!(to_string(&doc).unwrap(), "a: 1\n");
    }

    #[test]
    fn edited_tree_serializes() {
        let mut doc = parse(MODEL).unwrap();
        doc.set(&DocPath::from(["title"]), Node::string("42")).unwrap();
        let text = to_string(&doc).unwrap();
        assert!(text.starts_with("title: \"42\"\n"));
    }
}
