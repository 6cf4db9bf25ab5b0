//! Functional tests for the editor's rename/delete/set intents.
//!
//! Each test drives the editor the way a diagram host would and checks the
//! document afterwards. It focuses on:
//! - Keys moving without losing the entity or its position.
//! - Anchors and merge keys following a data asset rename.
//! - Cascade and item-only deletes differing only in the references left.
//! - Rejected intents leaving the text byte-identical.
//! - Anchored assets deleted together with every merge dependent, or not at all.
//! - Failed reintegration being recoverable from a snapshot.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tme_document::{DocPath, Node};
use tme_editor::{DeleteMode, EditError, EditState, Editor, EditorConfig, EntityKind};
use tme_integrity::RiskTrackingPolicy;
use tme_test_utils::{assert_no_references, ids_at, occurrences, path, sample_document, str_at};

fn sample_editor() -> Editor {
    Editor::new(sample_document(), EditorConfig::default())
}

/// Tenet: a renamed entity is found under its new key and only there.
#[test]
fn renamed_server_keeps_its_id() {
    let mut editor = Editor::from_yaml(
        "technical_assets:\n  server:\n    id: ta-1\n    data_assets_processed: [da-1]\n",
        EditorConfig::default(),
    )
    .unwrap();

    editor
        .rename_entity_key(&EntityKind::TechnicalAsset, "server", "web-server")
        .unwrap();

    let doc = editor.document();
    assert_eq!(str_at(doc, "technical_assets.web-server.id").as_deref(), Some("ta-1"));
    assert!(doc.get(&path("technical_assets.server")).is_none());
    assert_eq!(ids_at(doc, "technical_assets.web-server.data_assets_processed"), vec!["da-1"]);
}

/// Tenet: a data asset's anchor and every merge key follow its key.
///
/// `derived` merges `secret`; after renaming `secret` to `credentials` the
/// merge key aliases `credentials` and still resolves to the same body.
#[test]
fn renamed_data_asset_carries_its_merge_dependents() {
    let mut editor = Editor::from_yaml(
        "data_assets:\n  secret: &secret\n    id: da-1\n  derived:\n    <<: *secret\n",
        EditorConfig::default(),
    )
    .unwrap();

    let outcome = editor
        .rename_entity_key(&EntityKind::DataAsset, "secret", "credentials")
        .unwrap();

    assert_eq!(
        outcome.text,
        "data_assets:\n  credentials: &credentials\n    id: da-1\n  derived:\n    <<: *credentials\n"
    );
    assert_eq!(outcome.anchor.map(|a| a.aliases_updated), Some(1));
    let merge = DocPath::from(["data_assets", "derived", "<<"]);
    assert!(matches!(
        editor.document().get(&merge),
        Some(Node::Alias(alias)) if alias.source == "credentials"
    ));
    assert_eq!(
        editor.view(&merge),
        editor.view(&DocPath::from(["data_assets", "credentials"]))
    );
}

/// Tenet: a cascade delete strips the id from every link, keeping order.
#[test]
fn deleted_data_asset_leaves_links_in_order() {
    let mut editor = sample_editor();

    let outcome = editor
        .delete_entity(&EntityKind::DataAsset, "session-token", DeleteMode::Cascade)
        .unwrap();

    let doc = editor.document();
    assert_eq!(outcome.id.as_deref(), Some("da-2"));
    assert_eq!(
        ids_at(doc, "technical_assets.web-server.communication_links.to-db.data_assets_sent"),
        vec!["da-1"]
    );
    assert_eq!(ids_at(doc, "communication_links.web-to-db.data_assets_sent"), vec!["da-3"]);
    assert_no_references(doc, "da-2");
    assert_eq!(outcome.report.map(|r| r.array_items_changed), Some(3));
}

/// Tenet: cascade and item-only deletes differ only in the references left.
#[test]
fn cascade_and_item_only_delete_of_technical_asset() {
    let mut cascade = sample_editor();
    let mut item_only = sample_editor();

    cascade
        .delete_entity(&EntityKind::TechnicalAsset, "database", DeleteMode::Cascade)
        .unwrap();
    let outcome = item_only
        .delete_entity(&EntityKind::TechnicalAsset, "database", DeleteMode::ItemOnly)
        .unwrap();

    // link targets are reported, never rewritten
    assert_eq!(
        occurrences(cascade.document(), "ta-2"),
        vec![
            path("technical_assets.web-server.communication_links.to-db.target"),
            path("communication_links.web-to-db.target"),
        ]
    );
    assert_eq!(ids_at(cascade.document(), "shared_runtimes.cluster.technical_assets_running"), vec!["ta-1"]);
    assert!(cascade.document().get(&path("risk_tracking")).and_then(Node::as_map).is_some_and(|m| m.is_empty()));

    assert!(outcome.report.is_none());
    assert_eq!(ids_at(item_only.document(), "trust_boundaries.internal.technical_assets_inside"), vec!["ta-2"]);
    assert_eq!(ids_at(item_only.document(), "shared_runtimes.cluster.technical_assets_running"), vec!["ta-1", "ta-2"]);
    assert!(item_only.document().get(&path("technical_assets.database")).is_none());
}

/// Tenet: a rejected rename changes nothing, not even formatting.
#[test]
fn colliding_rename_leaves_text_identical() {
    let mut editor = sample_editor();
    let before = editor.snapshot_text().unwrap();

    let err = editor
        .rename_entity_key(&EntityKind::TechnicalAsset, "web-server", "database")
        .unwrap_err();

    assert!(matches!(err, EditError::Collision { ref key, .. } if key == "database"));
    assert!(err.is_recoverable());
    assert_eq!(editor.state(), EditState::Idle);
    assert_eq!(editor.snapshot_text().unwrap(), before);
}

/// Tenet: a new id reaches every array, link target and risk key.
#[test]
fn changed_id_cascades_everywhere() {
    let mut editor = sample_editor();

    let outcome = editor
        .set_field(&EntityKind::TechnicalAsset, "database", &DocPath::from(["id"]), Node::string("ta-db"))
        .unwrap();

    let report = outcome.report.unwrap();
    assert_eq!(report.link_targets_changed, 2);
    assert_eq!(report.risk_keys_changed, 2);
    let doc = editor.document();
    assert_eq!(ids_at(doc, "shared_runtimes.cluster.technical_assets_running"), vec!["ta-1", "ta-db"]);
    assert_eq!(str_at(doc, "communication_links.web-to-db.target").as_deref(), Some("ta-db"));
    assert_eq!(
        doc.get(&path("risk_tracking")).and_then(Node::as_map).map(|m| m.keys()),
        Some(vec![
            "sql-injection@ta-db".to_string(),
            "missing-authentication@ta-1@ta-db".to_string(),
        ])
    );
    assert_no_references(doc, "ta-2");
}

/// Tenet: with the ignore policy risk keys are reported, not touched.
#[test]
fn ignored_risk_keys_are_reported_stale() {
    let config = EditorConfig::default().with_risk_tracking(RiskTrackingPolicy::Ignore);
    let mut editor = Editor::new(sample_document(), config);

    let outcome = editor
        .set_field(&EntityKind::TechnicalAsset, "database", &DocPath::from(["id"]), Node::string("ta-db"))
        .unwrap();

    assert_eq!(outcome.report.map(|r| r.risk_keys_stale), Some(2));
    assert!(editor.document().has(&path("risk_tracking.sql-injection@ta-2")));
}

/// Tenet: a broken fence leaves the editor failed until a snapshot is reloaded.
///
/// Replacing `a.tags` drops the `&pii` anchor that `b.tags` still aliases,
/// so the written text cannot be read back.
#[test]
fn failed_reintegration_recovers_from_snapshot() {
    let snapshot = "data_assets:\n  a:\n    id: da-1\n    tags: &pii [pii]\n  b:\n    id: da-2\n    tags: *pii\n";
    let mut editor = Editor::from_yaml(snapshot, EditorConfig::default()).unwrap();

    let err = editor
        .set_field(&EntityKind::DataAsset, "a", &DocPath::from(["tags"]), Node::string_seq(["x"]))
        .unwrap_err();

    assert!(err.requires_undo());
    assert_eq!(editor.state(), EditState::Failed);

    editor.reload(snapshot).unwrap();
    assert_eq!(editor.state(), EditState::Idle);
    assert_eq!(
        editor.view(&DocPath::from(["data_assets", "b", "tags"])),
        Some(serde_json::json!(["pii"]))
    );
}

/// Tenet: an anchored asset that others merge is not deleted alone.
///
/// Cascade and item-only deletes of `customer-data` would leave the
/// `<<: *customer-data` of `session-token` dangling; both are turned away
/// before anything changes, naming the dependents.
#[test]
fn merged_anchor_delete_is_rejected_with_dependents() {
    for mode in [DeleteMode::Cascade, DeleteMode::ItemOnly] {
        let mut editor = sample_editor();
        let before = editor.snapshot_text().unwrap();

        let err = editor
            .delete_entity(&EntityKind::DataAsset, "customer-data", mode)
            .unwrap_err();

        match &err {
            EditError::AnchorInUse { key, dependents, aliases, .. } => {
                assert_eq!(key, "customer-data");
                assert_eq!(dependents, &vec!["session-token".to_string()]);
                assert_eq!(*aliases, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_recoverable());
        assert_eq!(editor.state(), EditState::Idle);
        assert_eq!(editor.snapshot_text().unwrap(), before);
    }
}

/// Tenet: merge chains are followed to the end before anything is deleted.
///
/// `derived` merges `secret` and carries its own anchor, which `derived2`
/// merges; deleting `secret` with its dependents takes all three.
#[test]
fn delete_with_dependents_follows_merge_chain() {
    let mut editor = Editor::from_yaml(
        "\
data_assets:
  secret: &secret
    id: da-1
  derived: &derived
    <<: *secret
    id: da-2
  derived2:
    <<: *derived
    id: da-3
technical_assets:
  web:
    id: ta-1
    data_assets_processed: [da-1, da-2, da-3, da-4]
",
        EditorConfig::default(),
    )
    .unwrap();

    let outcome = editor
        .delete_entity(&EntityKind::DataAsset, "secret", DeleteMode::CascadeWithDependents)
        .unwrap();

    assert_eq!(outcome.dependents, vec!["derived", "derived2"]);
    assert_eq!(outcome.deleted_dependents, vec!["derived", "derived2"]);
    assert!(editor.entity_keys(&EntityKind::DataAsset).is_empty());
    assert_eq!(ids_at(editor.document(), "technical_assets.web.data_assets_processed"), vec!["da-4"]);
    assert_eq!(editor.state(), EditState::Idle);
}

/// Tenet: deleting with dependents removes merged assets and their ids.
#[test]
fn delete_with_dependents_removes_merged_assets() {
    let mut editor = sample_editor();

    let outcome = editor
        .delete_entity(&EntityKind::DataAsset, "customer-data", DeleteMode::CascadeWithDependents)
        .unwrap();

    assert_eq!(outcome.deleted_dependents, vec!["session-token"]);
    assert_eq!(editor.entity_keys(&EntityKind::DataAsset), vec!["audit-log"]);
    assert_no_references(editor.document(), "da-1");
    assert_no_references(editor.document(), "da-2");
    assert_eq!(ids_at(editor.document(), "technical_assets.database.data_assets_stored"), vec!["da-3"]);
}

/// Tenet: created entities get fresh, well-formed keys and ids.
#[test]
fn created_link_has_key_but_no_id() {
    let mut editor = sample_editor().with_key_seed(5);
    let kind = EntityKind::CommunicationLink {
        owner: "database".to_string(),
    };

    let created = editor
        .create_entity(&kind, Node::from_json(&serde_json::json!({"target": "ta-1"})))
        .unwrap();

    assert!(created.key.starts_with("Com-"));
    assert_eq!(created.id, None);
    assert_eq!(editor.entity_keys(&kind), vec![created.key.clone()]);
    assert_eq!(
        str_at(editor.document(), &format!("technical_assets.database.communication_links.{}.target", created.key))
            .as_deref(),
        Some("ta-1")
    );
}

proptest! {
    /// Renaming a key away and back restores the exact text
    #[test]
    fn prop_rename_round_trip(key in "[a-z][a-z0-9-]{0,12}") {
        prop_assume!(key != "web-server" && key != "database");
        let mut editor = sample_editor();
        let before = editor.snapshot_text().unwrap();

        editor.rename_entity_key(&EntityKind::TechnicalAsset, "web-server", &key).unwrap();
        prop_assert_eq!(editor.entity_keys(&EntityKind::TechnicalAsset), vec![key.clone(), "database".to_string()]);
        editor.rename_entity_key(&EntityKind::TechnicalAsset, &key, "web-server").unwrap();

        prop_assert_eq!(editor.snapshot_text().unwrap(), before);
    }
}
