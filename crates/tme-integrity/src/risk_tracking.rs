//! Synthetic risk id maintenance
//!
//! `risk_tracking` is keyed by `category@id[@id...]`. The segments after the
//! category are entity ids, so they go stale when an id changes.

use crate::references::{IdEdit, ReferenceReport};
use crate::schema::{RISK_ID_SEPARATOR, RISK_TRACKING};
use crate::trace::Trace;
use serde::{Deserialize, Serialize};
use tme_document::{DocPath, MapNode, Node};

/// How `risk_tracking` keys follow id changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTrackingPolicy {
    /// Rewrite id segments on rename, drop entries on removal
    #[default]
    Cascade,
    /// Leave keys alone and report each stale one
    Ignore,
}

/// Id segments of a synthetic risk id (everything after the category)
pub fn synthetic_ids(key: &str) -> impl Iterator<Item = &str> {
    key.split(RISK_ID_SEPARATOR).skip(1)
}

/// Check if a synthetic risk id mentions `id`
#[must_use]
pub fn mentions(key: &str, id: &str) -> bool {
    synthetic_ids(key).any(|segment| segment == id)
}

/// Synthetic risk id with every `old` segment replaced by `new`
#[must_use]
pub fn rewrite_key(key: &str, old: &str, new: &str) -> String {
    let mut segments = key.split(RISK_ID_SEPARATOR);
    let mut out = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        out.push(RISK_ID_SEPARATOR);
        out.push_str(if segment == old { new } else { segment });
    }
    out
}

pub(crate) fn apply(
    root: &mut MapNode,
    edit: IdEdit<'_>,
    policy: RiskTrackingPolicy,
    report: &mut ReferenceReport,
    trace: &mut Trace,
) {
    let Some(tracking) = root.get_mut(RISK_TRACKING).and_then(Node::as_map_mut) else {
        return;
    };
    let base = DocPath::from([RISK_TRACKING]);
    let id = match edit {
        IdEdit::Rename { old, .. } => old,
        IdEdit::Remove { id } => id,
    };
    let stale: Vec<String> = tracking
        .keys()
        .into_iter()
        .filter(|key| mentions(key, id))
        .collect();

    for key in stale {
        let location = base.key(key.as_str());
        if policy == RiskTrackingPolicy::Ignore {
            tracing::warn!(key = %key, id, "risk tracking key refers to a changed id");
            report.risk_keys_stale += 1;
            trace.skipped(location, format!("stale risk tracking key for id '{id}'"));
            continue;
        }

        match edit {
            IdEdit::Rename { old, new } => {
                let renamed = rewrite_key(&key, old, new);
                match tracking.rename_key(&key, &renamed) {
                    Ok(true) => {
                        report.risk_keys_changed += 1;
                        trace.updated(location, &key, &renamed);
                    }
                    Ok(false) => {}
                    Err(_) => {
                        tracing::warn!(key = %key, renamed = %renamed, "risk tracking key collision, leaving entry");
                        report.skipped += 1;
                        trace.skipped(location, format!("'{renamed}' already tracked"));
                    }
                }
            }
            IdEdit::Remove { .. } => {
                if tracking.remove(&key).is_some() {
                    report.risk_keys_changed += 1;
                    trace.removed(location, &key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::references::{remove_references, update_references, ReferenceOptions};
    use crate::trace::TraceKind;
    use pretty_assertions::assert_eq;
    use tme_document::yaml;

    const MODEL: &str = "\
risk_tracking:
  sql-injection@ta-1:
    status: mitigated
  missing-auth@ta-1@ta-2:
    status: accepted
  missing-auth@ta-3@ta-2:
    status: unchecked
  unencrypted@ta-10:
    status: in-progress
";

    fn keys(doc: &tme_document::Document) -> Vec<String> {
        doc.get(&DocPath::from([RISK_TRACKING]))
            .and_then(Node::as_map)
            .map(MapNode::keys)
            .unwrap_or_default()
    }

    #[test]
    fn key_helpers() {
        assert!(mentions("missing-auth@ta-1@ta-2", "ta-2"));
        assert!(!mentions("ta-1@x", "ta-1"));
        assert_eq!(rewrite_key("a@x@y@x", "x", "z"), "a@z@y@z");
    }

    #[test]
    fn cascade_renames_keys_in_place() {
        let mut doc = yaml::parse(MODEL).unwrap();
        let report = update_references(&mut doc, "ta-1", "ta-web", &ReferenceOptions::default(), &mut Trace::new());
        assert_eq!(
            keys(&doc),
            vec![
                "sql-injection@ta-web",
                "missing-auth@ta-web@ta-2",
                "missing-auth@ta-3@ta-2",
                "unencrypted@ta-10",
            ]
        );
        assert_eq!(report.risk_keys_changed, 2);
    }

    #[test]
    fn cascade_skips_colliding_rename() {
        let mut doc = yaml::parse(MODEL).unwrap();
        let mut trace = Trace::new();
        // missing-auth@ta-3@ta-2 would become missing-auth@ta-1@ta-2
        let report = update_references(&mut doc, "ta-3", "ta-1", &ReferenceOptions::default(), &mut trace);
        assert_eq!(report.risk_keys_changed, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(trace.count(TraceKind::Skipped), 1);
        assert_eq!(
            keys(&doc),
            vec![
                "sql-injection@ta-1",
                "missing-auth@ta-1@ta-2",
                "missing-auth@ta-3@ta-2",
                "unencrypted@ta-10",
            ]
        );
    }

    #[test]
    fn cascade_removes_entries() {
        let mut doc = yaml::parse(MODEL).unwrap();
        let report = remove_references(&mut doc, "ta-2", &ReferenceOptions::default(), &mut Trace::new());
        assert_eq!(keys(&doc), vec!["sql-injection@ta-1", "unencrypted@ta-10"]);
        assert_eq!(report.risk_keys_changed, 2);
    }

    #[test]
    fn ignore_policy_reports_stale_keys() {
        let mut doc = yaml::parse(MODEL).unwrap();
        let before = doc.clone();
        let options = ReferenceOptions::new().with_risk_tracking(RiskTrackingPolicy::Ignore);
        let mut trace = Trace::new();
        let report = remove_references(&mut doc, "ta-1", &options, &mut trace);
        assert_eq!(report.risk_keys_stale, 2);
        assert_eq!(trace.count(TraceKind::Skipped), 2);
        assert_eq!(doc, before);
    }
}
