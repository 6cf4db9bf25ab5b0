//! Edit lifecycle
//!
//! ```text
//! Idle -> Validating -> Mutating -> Reintegrating -> Idle
//!             |             |             |
//!             v             v             v
//!        Idle/Failed      Failed        Failed
//! ```
//!
//! A rejected intent goes back to where it started. `Failed` keeps the
//! mutated document; the host retries from there or reloads a snapshot.

use crate::error::EditError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// State of the editor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    /// Ready for an intent
    #[default]
    Idle,
    /// Checking an intent against the document
    Validating,
    /// Changing the live tree
    Mutating,
    /// Serialize/re-parse fence
    Reintegrating,
    /// An operation failed after the document was touched
    Failed,
}

impl EditState {
    /// Check if a new intent may start from this state
    #[inline]
    #[must_use]
    pub fn accepts_intents(self) -> bool {
        matches!(self, Self::Idle | Self::Failed)
    }
}

impl Display for EditState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Mutating => "mutating",
            Self::Reintegrating => "reintegrating",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Validate a state transition
///
/// # Errors
/// Returns [`EditError::IllegalTransition`] when `to` is not reachable from
/// `from`.
pub fn validate_transition(from: EditState, to: EditState) -> Result<(), EditError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(EditError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: EditState) -> Vec<EditState> {
    use EditState::{Failed, Idle, Mutating, Reintegrating, Validating};
    match from {
        Idle => vec![Validating],
        Validating => vec![Mutating, Idle, Failed],
        Mutating => vec![Reintegrating, Idle, Failed],
        Reintegrating => vec![Idle, Failed],
        Failed => vec![Validating, Idle],
    }
}

fn allowed(from: EditState, to: EditState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
