//! Error types for the document tree
//!
//! Provides error handling for:
//! - Path-scoped tree operations
//! - YAML text parsing (ingress)
//! - YAML text emission (egress)

use crate::path::{DocPath, PathError};

/// Errors from path-scoped document operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Path argument is malformed or not usable for the operation
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Target key already exists in the map
    #[error("key '{key}' already exists at {path}")]
    KeyExists {
        /// Map that already holds the key
        path: DocPath,
        /// Conflicting key
        key: String,
    },
}

impl From<PathError> for DocumentError {
    fn from(err: PathError) -> Self {
        Self::InvalidPath(err.to_string())
    }
}

/// Error while reading YAML text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    /// What went wrong
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Categories of YAML read failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// Scanner or parser rejected the text
    #[error("{0}")]
    Syntax(String),

    /// Same key twice in one mapping
    #[error("duplicate key '{0}'")]
    DuplicateKey(String),

    /// Alias refers to an anchor not defined before it
    #[error("alias '*{0}' refers to an undefined anchor")]
    UndefinedAlias(String),

    /// Explicit tags are not supported
    #[error("tags are not supported: '{0}'")]
    UnsupportedTag(String),

    /// Collection or alias used as a mapping key
    #[error("complex mapping keys are not supported")]
    ComplexKey,

    /// More than one document in the stream
    #[error("multiple documents are not supported")]
    MultipleDocuments,
}

/// Error while writing YAML text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    /// Map key is a collection or alias
    #[error("unsupported non-scalar key at {0}")]
    UnsupportedKey(DocPath),

    /// Anchor or alias name cannot be written
    #[error("invalid anchor name '{name}' at {path}")]
    InvalidAnchorName {
        /// Location of the node
        path: DocPath,
        /// Offending name
        name: String,
    },

    /// Writer rejected the event stream
    #[error("cannot write yaml: {0}")]
    Emit(String),
}
