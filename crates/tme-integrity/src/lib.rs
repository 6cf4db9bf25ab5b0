//! TME Integrity
//!
//! Reference-integrity passes over threat-model documents.
//!
//! # Core Concepts
//!
//! - [`IdentifierCollection`]: Uniform view of an identifier array, document or host side
//! - [`rename_anchor`]: Rename an anchor and retarget every alias in one traversal
//! - [`update_references`] / [`remove_references`]: Follow an entity id change
//!   through every identifier array, link target and risk tracking key
//! - [`Trace`]: Ordered record of every location a pass visited or changed
//!
//! Passes are total: missing sections are skipped, malformed locations are
//! logged and recorded as skipped, and running a pass twice changes nothing
//! the second time.
//!
//! # Example
//!
//! ```rust
//! use tme_document::yaml;
//! use tme_integrity::{remove_references, ReferenceOptions, Trace};
//!
//! let mut doc = yaml::parse(
//!     "technical_assets:\n  web:\n    id: ta-1\n    data_assets_processed: [da-1, da-2]\n",
//! )
//! .unwrap();
//! let mut trace = Trace::new();
//! let report = remove_references(&mut doc, "da-1", &ReferenceOptions::default(), &mut trace);
//!
//! assert_eq!(report.array_items_changed, 1);
//! assert_eq!(
//!     yaml::to_string(&doc).unwrap(),
//!     "technical_assets:\n  web:\n    id: ta-1\n    data_assets_processed:\n    - da-2\n"
//! );
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod anchors;
pub mod collection;
pub mod error;
pub mod references;
pub mod risk_tracking;
pub mod schema;
pub mod trace;

// Re-exports
pub use anchors::{
    alias_count, find_alias_dependents, find_alias_dependents_transitive, rename_anchor, AnchorRename,
};
pub use collection::{
    classify, for_each_indexed, is_identifier_collection, is_identifier_list, positions_of,
    remove_value, replace_value, IdentifierCollection, PlainListAdapter, SequenceNodeAdapter,
};
pub use error::CollectionError;
pub use references::{remove_references, update_references, ReferenceOptions, ReferenceReport};
pub use risk_tracking::RiskTrackingPolicy;
pub use trace::{Trace, TraceEntry, TraceKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tme_document::{yaml, DocPath, Node};

    #[test]
    fn anchor_rename_and_id_update_compose() {
        let mut doc = yaml::parse(
            "data_assets:\n  secret: &secret\n    id: da-1\n  copy:\n    <<: *secret\n    id: da-2\ntechnical_assets:\n  web:\n    data_assets_stored: [da-1]\n",
        )
        .unwrap();
        let mut trace = Trace::new();

        rename_anchor(&mut doc, "secret", "credentials", &mut trace);
        update_references(&mut doc, "da-1", "da-cred", &ReferenceOptions::default(), &mut trace);

        let stored: DocPath = "technical_assets.web.data_assets_stored[0]".parse().unwrap();
        assert_eq!(doc.get(&stored).and_then(Node::as_str), Some("da-cred"));
        assert_eq!(alias_count(&doc, "credentials"), 1);
        assert_eq!(trace.count(TraceKind::AnchorRenamed), 1);
        assert_eq!(trace.count(TraceKind::Updated), 1);
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
