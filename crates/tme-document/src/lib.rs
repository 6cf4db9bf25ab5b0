//! TME Document
//!
//! Anchor-preserving YAML document tree for threat models.
//!
//! # Core Concepts
//!
//! - [`Document`]: Single-owner tree with path-scoped get/set/delete
//! - [`Node`]: Map, sequence, scalar or alias; every non-alias node may carry an anchor
//! - [`DocPath`]: Hierarchical address made of map keys and sequence indices
//! - [`yaml`]: Text codec that keeps anchors and aliases as written
//!
//! # Example
//!
//! ```rust
//! use tme_document::{yaml, DocPath, Node};
//!
//! let mut doc = yaml::parse("technical_assets:\n  web:\n    id: ta-1\n").unwrap();
//! let id: DocPath = "technical_assets.web.id".parse().unwrap();
//! assert_eq!(doc.get(&id).and_then(Node::as_str), Some("ta-1"));
//!
//! doc.set(&id, Node::string("ta-web")).unwrap();
//! assert_eq!(
//!     yaml::to_string(&doc).unwrap(),
//!     "technical_assets:\n  web:\n    id: ta-web\n"
//! );
//! ```

#![warn(unreachable_pub)]

// Core modules
mod document;
mod error;
mod node;
mod path;
mod visit;

pub mod yaml;

// Re-exports
pub use document::Document;
pub use error::{DocumentError, ParseError, ParseErrorKind, SerializeError};
pub use node::{AliasNode, MapNode, Node, NodeKind, Pair, Scalar, ScalarNode, SeqNode};
pub use path::{DocPath, PathError, Segment};
pub use visit::{walk, walk_mut, NodeRole};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn edit_then_round_trip() {
        let mut doc = yaml::parse("data_assets:\n  secret: &secret\n    id: da-1\n").unwrap();
        let assets = DocPath::from(["data_assets"]);
        let map = doc.get_mut(&assets).and_then(Node::as_map_mut).unwrap();
        assert_eq!(map.rename_key("secret", "credentials"), Ok(true));

        let text = yaml::to_string(&doc).unwrap();
        assert_eq!(text, "data_assets:\n  credentials: &secret\n    id: da-1\n");
        assert_eq!(yaml::parse(&text).unwrap(), doc);
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
