//! TME Editor
//!
//! Entity rename/delete orchestration over a threat-model document.
//!
//! # Core Concepts
//!
//! - [`Editor`]: Sole mutator of one document; runs every intent through
//!   validation, mutation and the reintegration fence
//! - [`EntityKind`]: Which collection an intent addresses
//! - [`EditState`]: Idle → Validating → Mutating → Reintegrating → Idle, with
//!   `Failed` when an edit cannot be completed
//! - [`KeyIssuer`]: Prefixed random keys and ids for new entities
//!
//! A rejected intent leaves the document byte-identical. A failed one leaves
//! the editor `Failed` until the host reloads a snapshot. Deleting an entity
//! whose anchor is still aliased elsewhere is a rejection, not a failure.
//!
//! # Example
//!
//! ```rust
//! use tme_editor::{DeleteMode, Editor, EditorConfig, EntityKind};
//!
//! let mut editor = Editor::from_yaml(
//!     "data_assets:\n  token:\n    id: da-1\ntechnical_assets:\n  web:\n    id: ta-1\n    data_assets_sent: [da-1]\n",
//!     EditorConfig::default(),
//! )
//! .unwrap();
//!
//! let outcome = editor
//!     .delete_entity(&EntityKind::DataAsset, "token", DeleteMode::Cascade)
//!     .unwrap();
//!
//! assert_eq!(
//!     outcome.text,
//!     "data_assets: {}\ntechnical_assets:\n  web:\n    id: ta-1\n    data_assets_sent: []\n"
//! );
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod editor;
pub mod entity;
pub mod error;
pub mod keys;
pub mod reintegrate;
pub mod state;

// Re-exports
pub use config::EditorConfig;
pub use editor::{CreatedEntity, DeleteMode, DeleteOutcome, Editor, RenameOutcome, SetOutcome};
pub use entity::EntityKind;
pub use error::{ConfigError, EditError, ReintegrationError};
pub use keys::KeyIssuer;
pub use reintegrate::{reintegrate, Reintegrated};
pub use state::{allowed_transitions, validate_transition, EditState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
