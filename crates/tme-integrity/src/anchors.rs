//! Anchor and alias rewriting

use crate::trace::{Trace, TraceEntry, TraceKind};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use tme_document::{Document, Node};

/// Result of [`rename_anchor`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnchorRename {
    /// At least one node carried the old anchor name
    pub anchor_updated: bool,
    /// Number of aliases retargeted
    pub aliases_updated: usize,
}

impl AnchorRename {
    /// Check if anything changed
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        self.anchor_updated || self.aliases_updated > 0
    }
}

/// Rename an anchor and retarget every alias to it
///
/// One pre-order pass over every node, map keys included. Every node
/// carrying `old` is renamed, so duplicate definitions move together.
/// `old == new` and names that occur nowhere leave the document untouched.
pub fn rename_anchor(doc: &mut Document, old: &str, new: &str, trace: &mut Trace) -> AnchorRename {
    let mut result = AnchorRename::default();
    if old == new {
        return result;
    }

    doc.walk_mut(&mut |path, _, node| {
        if let Node::Alias(alias) = node {
            if alias.source == old {
                new.clone_into(&mut alias.source);
                result.aliases_updated += 1;
                trace.record(
                    TraceEntry::new(TraceKind::AliasRetargeted, path.clone())
                        .with_old(old)
                        .with_new(new),
                );
            }
        } else if node.anchor() == Some(old) {
            node.set_anchor(Some(new.to_string()));
            result.anchor_updated = true;
            trace.record(
                TraceEntry::new(TraceKind::AnchorRenamed, path.clone())
                    .with_old(old)
                    .with_new(new),
            );
        }
    });

    tracing::info!(
        old,
        new,
        anchor_updated = result.anchor_updated,
        aliases = result.aliases_updated,
        "renamed anchor"
    );
    result
}

/// Number of aliases pointing at `anchor`
#[must_use]
pub fn alias_count(doc: &Document, anchor: &str) -> usize {
    let mut count = 0;
    doc.walk(&mut |_, _, node| {
        if matches!(node, Node::Alias(alias) if alias.source == anchor) {
            count += 1;
        }
    });
    count
}

/// Keys of entities in `collection` whose `<<` merge key aliases `anchor`
///
/// Both `<<: *a` and `<<: [*a, *b]` count.
#[must_use]
pub fn find_alias_dependents(doc: &Document, collection: &str, anchor: &str) -> Vec<String> {
    let Some(entities) = doc
        .root_map()
        .and_then(|root| root.get(collection))
        .and_then(Node::as_map)
    else {
        return Vec::new();
    };

    entities
        .entries()
        .filter(|(_, entity)| {
            entity
                .as_map()
                .and_then(|body| body.get("<<"))
                .is_some_and(|merge| merges_anchor(merge, anchor))
        })
        .map(|(key, _)| key.into_owned())
        .collect()
}

/// Keys of entities in `collection` that merge `anchor` directly or through
/// another dependent's own anchor, nearest first
///
/// `derived2: {<<: *derived}` depends on `secret` when `derived` carries
/// `&derived` and merges `*secret`. Cycles are visited once.
#[must_use]
pub fn find_alias_dependents_transitive(
    doc: &Document,
    collection: &str,
    anchor: &str,
) -> Vec<String> {
    let entities = doc
        .root_map()
        .and_then(|root| root.get(collection))
        .and_then(Node::as_map);

    let mut found: Vec<String> = Vec::new();
    let mut seen = HashSet::from([anchor.to_string()]);
    let mut pending = VecDeque::from([anchor.to_string()]);
    while let Some(current) = pending.pop_front() {
        for key in find_alias_dependents(doc, collection, &current) {
            if found.contains(&key) {
                continue;
            }
            let own_anchor = entities
                .and_then(|map| map.get(&key))
                .and_then(Node::anchor);
            if let Some(next) = own_anchor {
                if seen.insert(next.to_string()) {
                    pending.push_back(next.to_string());
                }
            }
            found.push(key);
        }
    }
    found
}

fn merges_anchor(merge: &Node, anchor: &str) -> bool {
    match merge {
        Node::Alias(alias) => alias.source == anchor,
        Node::Seq(seq) => seq.items.iter().any(|item| merges_anchor(item, anchor)),
        Node::Map(_) | Node::Scalar(_) => false,
    }
}
