//! Error types for integrity passes

use tme_document::NodeKind;

/// Identifier collection that cannot be edited
///
/// Never fatal: passes log it, record a skip in the trace and move on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    /// Node is not a sequence of scalars
    #[error("unsupported collection shape: {kind} ({reason})")]
    UnsupportedShape {
        /// Kind of the offending node
        kind: NodeKind,
        /// What is wrong with it
        reason: &'static str,
    },
}
