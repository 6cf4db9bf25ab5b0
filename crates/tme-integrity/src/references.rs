//! Identifier reference updating and removal
//!
//! When an entity's `id` changes or the entity goes away, every identifier
//! array that mentions the id is rewritten. Locations are visited in a fixed
//! order:
//!
//! 1. `technical_assets.*.data_assets_processed` / `data_assets_stored`
//! 2. `technical_assets.*.communication_links.*.data_assets_sent` / `data_assets_received`
//! 3. `communication_links.*.data_assets_sent` / `data_assets_received`
//! 4. `trust_boundaries.*.technical_assets_inside` / `trust_boundaries_nested`,
//!    `shared_runtimes.*.technical_assets_running`
//! 5. link `target` scalars
//! 6. `risk_tracking` keys
//!
//! Missing sections are skipped and malformed locations are logged and
//! skipped; a pass never fails.

use crate::collection::{classify, positions_of, remove_value, replace_value};
use crate::risk_tracking::{self, RiskTrackingPolicy};
use crate::schema::{
    COMMUNICATION_LINKS, DATA_ASSETS_PROCESSED, DATA_ASSETS_RECEIVED, DATA_ASSETS_SENT,
    DATA_ASSETS_STORED, SHARED_RUNTIMES, TARGET, TECHNICAL_ASSETS, TECHNICAL_ASSETS_INSIDE,
    TECHNICAL_ASSETS_RUNNING, TRUST_BOUNDARIES, TRUST_BOUNDARIES_NESTED,
};
use crate::trace::Trace;
use serde::{Deserialize, Serialize};
use tme_document::{DocPath, Document, MapNode, Node, Scalar};

/// Options for reference passes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceOptions {
    /// How `risk_tracking` keys follow id changes
    pub risk_tracking: RiskTrackingPolicy,
    /// Rewrite link `target` scalars on id changes
    pub cascade_link_targets: bool,
}

impl Default for ReferenceOptions {
    fn default() -> Self {
        Self {
            risk_tracking: RiskTrackingPolicy::Cascade,
            cascade_link_targets: true,
        }
    }
}

impl ReferenceOptions {
    /// Create with defaults
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set risk tracking policy
    #[inline]
    #[must_use]
    pub fn with_risk_tracking(mut self, policy: RiskTrackingPolicy) -> Self {
        self.risk_tracking = policy;
        self
    }

    /// Enable or disable link target rewriting
    #[inline]
    #[must_use]
    pub fn with_cascade_link_targets(mut self, enabled: bool) -> Self {
        self.cascade_link_targets = enabled;
        self
    }
}

/// Counts from one reference pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceReport {
    /// Identifier arrays inspected
    pub locations_visited: usize,
    /// Array items rewritten or removed
    pub array_items_changed: usize,
    /// Link `target` scalars rewritten
    pub link_targets_changed: usize,
    /// Links still targeting a removed id
    pub dangling_links: Vec<DocPath>,
    /// Risk tracking keys renamed or removed
    pub risk_keys_changed: usize,
    /// Risk tracking keys left referring to the old id
    pub risk_keys_stale: usize,
    /// Locations skipped because of their shape or a collision
    pub skipped: usize,
}

impl ReferenceReport {
    /// Total number of changes made to the document
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.array_items_changed + self.link_targets_changed + self.risk_keys_changed
    }

    /// Check if the pass changed nothing
    #[inline]
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.total_changes() == 0
    }

    /// Add the counts of another pass to this one
    pub fn merge(&mut self, other: ReferenceReport) {
        self.locations_visited += other.locations_visited;
        self.array_items_changed += other.array_items_changed;
        self.link_targets_changed += other.link_targets_changed;
        self.dangling_links.extend(other.dangling_links);
        self.risk_keys_changed += other.risk_keys_changed;
        self.risk_keys_stale += other.risk_keys_stale;
        self.skipped += other.skipped;
    }
}

/// Edit applied to every matching identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdEdit<'a> {
    Rename { old: &'a str, new: &'a str },
    Remove { id: &'a str },
}

impl IdEdit<'_> {
    pub(crate) fn verb(self) -> &'static str {
        match self {
            Self::Rename { .. } => "rename",
            Self::Remove { .. } => "remove",
        }
    }
}

/// Rewrite every reference to `old_id` as `new_id`
///
/// `old_id == new_id` and an empty `old_id` change nothing. Running it twice
/// is the same as running it once.
pub fn update_references(
    doc: &mut Document,
    old_id: &str,
    new_id: &str,
    options: &ReferenceOptions,
    trace: &mut Trace,
) -> ReferenceReport {
    if old_id == new_id || old_id.is_empty() {
        tracing::debug!(old_id, new_id, "reference update is a no-op");
        return ReferenceReport::default();
    }
    let report = run(
        doc,
        IdEdit::Rename {
            old: old_id,
            new: new_id,
        },
        options,
        trace,
    );
    tracing::info!(
        old_id,
        new_id,
        changed = report.total_changes(),
        visited = report.locations_visited,
        "updated references"
    );
    report
}

/// Remove every reference to `id` from identifier arrays
///
/// Link targets still pointing at `id` are reported as dangling, never
/// deleted. Running it twice is the same as running it once.
pub fn remove_references(
    doc: &mut Document,
    id: &str,
    options: &ReferenceOptions,
    trace: &mut Trace,
) -> ReferenceReport {
    if id.is_empty() {
        tracing::debug!("reference removal for empty id is a no-op");
        return ReferenceReport::default();
    }
    let report = run(doc, IdEdit::Remove { id }, options, trace);
    tracing::info!(
        id,
        removed = report.total_changes(),
        dangling = report.dangling_links.len(),
        visited = report.locations_visited,
        "removed references"
    );
    report
}

fn run(
    doc: &mut Document,
    edit: IdEdit<'_>,
    options: &ReferenceOptions,
    trace: &mut Trace,
) -> ReferenceReport {
    let mut pass = Pass {
        edit,
        options,
        trace,
        report: ReferenceReport::default(),
    };
    let Some(root) = doc.root_mut().as_map_mut() else {
        tracing::warn!("document root is not a map; nothing to {}", edit.verb());
        return pass.report;
    };

    pass.technical_asset_arrays(root);
    pass.nested_link_arrays(root);
    pass.top_level_link_arrays(root);
    pass.boundary_and_runtime_arrays(root);
    pass.link_targets(root);
    risk_tracking::apply(root, edit, options.risk_tracking, &mut pass.report, pass.trace);
    pass.report
}

struct Pass<'a, 't> {
    edit: IdEdit<'a>,
    options: &'a ReferenceOptions,
    trace: &'t mut Trace,
    report: ReferenceReport,
}

impl Pass<'_, '_> {
    fn technical_asset_arrays(&mut self, root: &mut MapNode) {
        let base = DocPath::from([TECHNICAL_ASSETS]);
        for (path, node) in children(root.get_mut(TECHNICAL_ASSETS), &base) {
            let Some(asset) = self.entity_map(&path, node) else {
                continue;
            };
            self.edit_array(asset, &path, DATA_ASSETS_PROCESSED);
            self.edit_array(asset, &path, DATA_ASSETS_STORED);
        }
    }

    fn nested_link_arrays(&mut self, root: &mut MapNode) {
        let base = DocPath::from([TECHNICAL_ASSETS]);
        for (path, node) in children(root.get_mut(TECHNICAL_ASSETS), &base) {
            let Some(asset) = node.as_map_mut() else {
                continue;
            };
            let links_path = path.key(COMMUNICATION_LINKS);
            for (link_path, link) in children(asset.get_mut(COMMUNICATION_LINKS), &links_path) {
                let Some(link) = self.entity_map(&link_path, link) else {
                    continue;
                };
                self.edit_array(link, &link_path, DATA_ASSETS_SENT);
                self.edit_array(link, &link_path, DATA_ASSETS_RECEIVED);
            }
        }
    }

    fn top_level_link_arrays(&mut self, root: &mut MapNode) {
        let base = DocPath::from([COMMUNICATION_LINKS]);
        for (path, node) in children(root.get_mut(COMMUNICATION_LINKS), &base) {
            let Some(link) = self.entity_map(&path, node) else {
                continue;
            };
            self.edit_array(link, &path, DATA_ASSETS_SENT);
            self.edit_array(link, &path, DATA_ASSETS_RECEIVED);
        }
    }

    fn boundary_and_runtime_arrays(&mut self, root: &mut MapNode) {
        let base = DocPath::from([TRUST_BOUNDARIES]);
        for (path, node) in children(root.get_mut(TRUST_BOUNDARIES), &base) {
            let Some(boundary) = self.entity_map(&path, node) else {
                continue;
            };
            self.edit_array(boundary, &path, TECHNICAL_ASSETS_INSIDE);
            self.edit_array(boundary, &path, TRUST_BOUNDARIES_NESTED);
        }

        let base = DocPath::from([SHARED_RUNTIMES]);
        for (path, node) in children(root.get_mut(SHARED_RUNTIMES), &base) {
            let Some(runtime) = self.entity_map(&path, node) else {
                continue;
            };
            self.edit_array(runtime, &path, TECHNICAL_ASSETS_RUNNING);
        }
    }

    fn link_targets(&mut self, root: &mut MapNode) {
        let base = DocPath::from([TECHNICAL_ASSETS]);
        for (path, node) in children(root.get_mut(TECHNICAL_ASSETS), &base) {
            let Some(asset) = node.as_map_mut() else {
                continue;
            };
            let links_path = path.key(COMMUNICATION_LINKS);
            for (link_path, link) in children(asset.get_mut(COMMUNICATION_LINKS), &links_path) {
                if let Some(link) = link.as_map_mut() {
                    self.edit_target(link, &link_path);
                }
            }
        }

        let base = DocPath::from([COMMUNICATION_LINKS]);
        for (path, node) in children(root.get_mut(COMMUNICATION_LINKS), &base) {
            if let Some(link) = node.as_map_mut() {
                self.edit_target(link, &path);
            }
        }
    }

    /// Entity body as a map; null bodies are skipped quietly, other shapes
    /// with a warning
    fn entity_map<'n>(&mut self, path: &DocPath, node: &'n mut Node) -> Option<&'n mut MapNode> {
        match node {
            Node::Map(map) => Some(map),
            Node::Scalar(scalar) if scalar.value.is_null() => None,
            other => {
                let kind = other.kind();
                tracing::warn!(location = %path, %kind, "skipping entity that is not a map");
                self.report.skipped += 1;
                self.trace
                    .skipped(path.clone(), format!("expected a map, found {kind}"));
                None
            }
        }
    }

    fn edit_array(&mut self, owner: &mut MapNode, owner_path: &DocPath, field: &str) {
        let Some(node) = owner.get_mut(field) else {
            return;
        };
        if node.as_scalar().is_some_and(Scalar::is_null) {
            return;
        }

        let location = owner_path.key(field);
        self.report.locations_visited += 1;
        self.trace.visited(&location);
        tracing::debug!(location = %location, "visiting identifier array");

        let mut items = match classify(node) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(location = %location, "skipping identifier array: {}", err);
                self.report.skipped += 1;
                self.trace.skipped(location, err.to_string());
                return;
            }
        };

        match self.edit {
            IdEdit::Rename { old, new } => {
                let positions = positions_of(&items, old);
                replace_value(&mut items, old, new);
                for &index in positions.iter().rev() {
                    self.trace.updated(location.index(index), old, new);
                }
                self.report.array_items_changed += positions.len();
            }
            IdEdit::Remove { id } => {
                let positions = positions_of(&items, id);
                remove_value(&mut items, id);
                for &index in &positions {
                    self.trace.removed(location.index(index), id);
                }
                self.report.array_items_changed += positions.len();
            }
        }
    }

    fn edit_target(&mut self, link: &mut MapNode, link_path: &DocPath) {
        let Some(Node::Scalar(target)) = link.get_mut(TARGET) else {
            return;
        };
        let location = link_path.key(TARGET);
        match self.edit {
            IdEdit::Rename { old, new } if target.value.as_str() == Some(old) => {
                if !self.options.cascade_link_targets {
                    self.report.skipped += 1;
                    self.trace
                        .skipped(location, "link target cascade disabled");
                    return;
                }
                target.value = Scalar::Str(new.to_string());
                self.report.link_targets_changed += 1;
                self.trace.updated(location, old, new);
            }
            IdEdit::Remove { id } if target.value.as_str() == Some(id) => {
                tracing::warn!(link = %link_path, id, "link still targets removed id");
                self.report.dangling_links.push(link_path.clone());
                self.trace.dangling(location, id);
            }
            _ => {}
        }
    }
}

/// Entries of a map-valued section with their paths
fn children<'m>(node: Option<&'m mut Node>, base: &DocPath) -> Vec<(DocPath, &'m mut Node)> {
    let Some(map) = node.and_then(Node::as_map_mut) else {
        return Vec::new();
    };
    map.items
        .iter_mut()
        .filter_map(|pair| {
            let key = pair.key_text()?.into_owned();
            Some((base.key(key), &mut pair.value))
        })
        .collect()
}
