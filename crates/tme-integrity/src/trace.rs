//! Diagnostic trace of integrity passes
//!
//! Every pass appends an entry per visited location and per change, so the
//! host can show exactly what a rename or delete touched.

use serde::{Deserialize, Serialize};
use tme_document::DocPath;

/// What happened at a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// Location was inspected
    Visited,
    /// A value was rewritten
    Updated,
    /// A value or entry was removed
    Removed,
    /// Location was left alone (unsupported shape, collision, policy)
    Skipped,
    /// A node's anchor name was changed
    AnchorRenamed,
    /// An alias was pointed at a new anchor name
    AliasRetargeted,
    /// A reference to a removed id remains
    Dangling,
}

/// One trace record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Kind of event
    pub kind: TraceKind,
    /// Where it happened
    pub location: DocPath,
    /// Value before the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    /// Value after the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
    /// Free-form explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TraceEntry {
    /// Create entry without values
    #[inline]
    #[must_use]
    pub fn new(kind: TraceKind, location: DocPath) -> Self {
        Self {
            kind,
            location,
            old: None,
            new: None,
            detail: None,
        }
    }

    /// Set the old value
    #[inline]
    #[must_use]
    pub fn with_old(mut self, old: impl Into<String>) -> Self {
        self.old = Some(old.into());
        self
    }

    /// Set the new value
    #[inline]
    #[must_use]
    pub fn with_new(mut self, new: impl Into<String>) -> Self {
        self.new = Some(new.into());
        self
    }

    /// Set the explanation
    #[inline]
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Ordered list of trace entries
///
/// A disabled trace accepts records and drops them, so passes never need to
/// branch on whether tracing is wanted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    entries: Vec<TraceEntry>,
    #[serde(skip, default = "enabled")]
    enabled: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl Trace {
    /// Create recording trace
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            enabled: true,
        }
    }

    /// Create trace that discards everything
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            entries: Vec::new(),
            enabled: false,
        }
    }

    /// Check if entries are kept
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append an entry
    pub fn record(&mut self, entry: TraceEntry) {
        if self.enabled {
            self.entries.push(entry);
        }
    }

    /// Record a visited location
    pub fn visited(&mut self, location: &DocPath) {
        self.record(TraceEntry::new(TraceKind::Visited, location.clone()));
    }

    /// Record a rewritten value
    pub fn updated(&mut self, location: DocPath, old: &str, new: &str) {
        self.record(
            TraceEntry::new(TraceKind::Updated, location)
                .with_old(old)
                .with_new(new),
        );
    }

    /// Record a removed value
    pub fn removed(&mut self, location: DocPath, old: &str) {
        self.record(TraceEntry::new(TraceKind::Removed, location).with_old(old));
    }

    /// Record a skipped location with the reason
    pub fn skipped(&mut self, location: DocPath, detail: impl Into<String>) {
        self.record(TraceEntry::new(TraceKind::Skipped, location).with_detail(detail));
    }

    /// Record a dangling reference
    pub fn dangling(&mut self, location: DocPath, id: &str) {
        self.record(TraceEntry::new(TraceKind::Dangling, location).with_old(id));
    }

    /// Entries in recording order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of one kind
    #[must_use]
    pub fn count(&self, kind: TraceKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Entries of one kind
    pub fn of_kind(&self, kind: TraceKind) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Move all entries of another trace to the end of this one
    pub fn append(&mut self, other: &mut Trace) {
        if self.enabled {
            self.entries.append(&mut other.entries);
        } else {
            other.entries.clear();
        }
    }

    /// Consume into entries
    #[inline]
    #[must_use]
    pub fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }
}
