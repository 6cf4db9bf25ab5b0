//! Error types for the editor
//!
//! Intents fail in two ways:
//! - Rejected during validation: the document is untouched
//! - Failed after mutation started: the document may be partly changed and
//!   the editor is left `Failed`

use crate::state::EditState;
use tme_document::{DocumentError, NodeKind, ParseError, SerializeError};

/// Main editor error type
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// Target key already exists in the collection
    #[error("key '{key}' already exists in {collection}")]
    Collision {
        /// Collection path
        collection: String,
        /// Existing key
        key: String,
    },

    /// Field path is malformed or empty
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Key is empty or cannot be used
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Collection path names no entity kind
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// No entity under the key
    #[error("{collection} has no entity '{key}'")]
    EntityNotFound {
        /// Collection path
        collection: String,
        /// Missing key
        key: String,
    },

    /// New id is already used by another entity
    #[error("id '{0}' is already in use")]
    IdCollision(String),

    /// New anchor name is already defined elsewhere
    #[error("anchor '{0}' is already defined")]
    AnchorCollision(String),

    /// Deleting the entity would leave aliases to its anchor behind
    #[error(
        "{collection} '{key}' is still aliased {aliases} time(s); merged into [{}]",
        .dependents.join(", ")
    )]
    AnchorInUse {
        /// Collection path
        collection: String,
        /// Entity that was to be deleted
        key: String,
        /// Entities merging its anchor, directly or through each other
        dependents: Vec<String>,
        /// Aliases that would be left dangling
        aliases: usize,
    },

    /// New entity body is not a map
    #[error("entity body must be a map, found {0}")]
    InvalidBody(NodeKind),

    /// No unused key or id found within the attempt budget
    #[error("could not issue an unused {what} after {attempts} attempts")]
    IssueExhausted {
        /// "key" or "id"
        what: &'static str,
        /// Attempts made
        attempts: usize,
    },

    /// Serialize/re-parse fence failed
    #[error("reintegration failed: {0}")]
    ReintegrationFailure(#[from] ReintegrationError),

    /// Document rejected a mutation; the tree is unchanged
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Editor is in a state that cannot take this step
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: EditState,
        /// Requested state
        to: EditState,
    },
}

impl EditError {
    /// Check if the intent was rejected before anything changed
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Collision { .. }
                | Self::InvalidPath(_)
                | Self::InvalidKey(_)
                | Self::UnknownCollection(_)
                | Self::EntityNotFound { .. }
                | Self::IdCollision(_)
                | Self::AnchorCollision(_)
                | Self::AnchorInUse { .. }
                | Self::InvalidBody(_)
                | Self::IssueExhausted { .. }
                | Self::Document(_)
        )
    }

    /// Check if the host should reload a snapshot
    #[inline]
    #[must_use]
    pub fn requires_undo(&self) -> bool {
        matches!(self, Self::ReintegrationFailure(_))
    }
}

/// Failure of the serialize/re-parse fence
#[derive(Debug, thiserror::Error)]
pub enum ReintegrationError {
    /// Tree could not be written
    #[error("serialize: {0}")]
    Serialize(#[from] SerializeError),

    /// Written text could not be read back
    #[error("re-parse: {0}")]
    Parse(#[from] ParseError),

    /// Re-parsed tree differs from the live tree
    #[error("re-parsed document differs from the live tree")]
    Diverged,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// YAML could not be read into a config
    #[error("invalid config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Value out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_recoverable() {
        let err = EditError::Collision {
            collection: "technical_assets".to_string(),
            key: "web".to_string(),
        };
        assert!(err.is_recoverable());
        assert!(!err.requires_undo());
        assert_eq!(err.to_string(), "key 'web' already exists in technical_assets");
    }

    #[test]
    fn anchor_in_use_lists_dependents() {
        let err = EditError::AnchorInUse {
            collection: "data_assets".to_string(),
            key: "secret".to_string(),
            dependents: vec!["derived".to_string(), "derived2".to_string()],
            aliases: 2,
        };
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "data_assets 'secret' is still aliased 2 time(s); merged into [derived, derived2]"
        );
    }

    #[test]
    fn reintegration_failure_requires_undo() {
        let err = EditError::from(ReintegrationError::Diverged);
        assert!(err.requires_undo());
        assert!(!err.is_recoverable());
    }
}
