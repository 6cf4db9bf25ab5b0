//! Entity rename/delete orchestration
//!
//! The [`Editor`] is the only mutator of its document. Every intent runs
//! Validating → Mutating → Reintegrating and hands back the re-serialized
//! text together with the trace of what it touched.

use crate::config::EditorConfig;
use crate::entity::EntityKind;
use crate::error::{EditError, ReintegrationError};
use crate::keys::KeyIssuer;
use crate::reintegrate::{reintegrate, Reintegrated};
use crate::state::{validate_transition, EditState};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use tme_document::{
    yaml, DocPath, Document, MapNode, Node, NodeRole, ParseError, Scalar, Segment, SeqNode,
};
use tme_integrity::schema::{DATA_ASSETS, ID, TAGS, TAGS_AVAILABLE};
use tme_integrity::{
    find_alias_dependents_transitive, remove_references, rename_anchor, update_references, AnchorRename,
    ReferenceReport, Trace, TraceEntry, TraceKind,
};

/// How a delete treats references to the deleted entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Remove the entity's id from every identifier array, then the entity
    #[default]
    Cascade,
    /// As `Cascade`, and also delete the data assets merging this one via
    /// `<<`, directly or through another merged asset
    CascadeWithDependents,
    /// Delete only the entity, leaving its id wherever it is referenced
    ItemOnly,
}

impl Display for DeleteMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cascade => "cascade",
            Self::CascadeWithDependents => "cascade-with-dependents",
            Self::ItemOnly => "item-only",
        })
    }
}

impl FromStr for DeleteMode {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cascade" => Ok(Self::Cascade),
            "cascade-with-dependents" | "cascade_with_dependents" => {
                Ok(Self::CascadeWithDependents)
            }
            "item-only" | "item_only" => Ok(Self::ItemOnly),
            other => Err(EditError::InvalidKey(format!("unknown delete mode '{other}'"))),
        }
    }
}

/// Result of [`Editor::rename_entity_key`]
#[derive(Debug, Clone, Serialize)]
pub struct RenameOutcome {
    /// Entity kind
    pub kind: EntityKind,
    /// Key before
    pub old_key: String,
    /// Key after
    pub new_key: String,
    /// Anchor rewrite, for kinds whose key doubles as an anchor name
    pub anchor: Option<AnchorRename>,
    /// Re-serialized document
    pub text: String,
    /// What the operation touched
    pub trace: Trace,
}

/// Result of [`Editor::delete_entity`]
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    /// Entity kind
    pub kind: EntityKind,
    /// Deleted key
    pub key: String,
    /// Id of the deleted entity, if it had one
    pub id: Option<String>,
    /// Mode used
    pub mode: DeleteMode,
    /// Data assets whose `<<` merge aliased the deleted entity
    pub dependents: Vec<String>,
    /// Dependents deleted along with it
    pub deleted_dependents: Vec<String>,
    /// Reference removal counts; `None` in item-only mode
    pub report: Option<ReferenceReport>,
    /// Re-serialized document
    pub text: String,
    /// What the operation touched
    pub trace: Trace,
}

/// Result of [`Editor::set_field`]
#[derive(Debug, Clone, Serialize)]
pub struct SetOutcome {
    /// Entity kind
    pub kind: EntityKind,
    /// Entity key
    pub key: String,
    /// Field path relative to the entity
    pub field: DocPath,
    /// False when an intermediate node of the field path is missing
    pub applied: bool,
    /// Reference update counts when the `id` changed
    pub report: Option<ReferenceReport>,
    /// Tags appended to `tags_available`
    pub tags_added: Vec<String>,
    /// Re-serialized document
    pub text: String,
    /// What the operation touched
    pub trace: Trace,
}

/// Result of [`Editor::create_entity`]
#[derive(Debug, Clone, Serialize)]
pub struct CreatedEntity {
    /// Entity kind
    pub kind: EntityKind,
    /// Issued key
    pub key: String,
    /// Issued id; links carry none
    pub id: Option<String>,
    /// Re-serialized document
    pub text: String,
    /// What the operation touched
    pub trace: Trace,
}

/// Single-owner editor over one threat-model document
#[derive(Debug)]
pub struct Editor {
    document: Document,
    config: EditorConfig,
    state: EditState,
    issuer: KeyIssuer,
}

impl Editor {
    /// Create editor over a document
    #[must_use]
    pub fn new(document: Document, config: EditorConfig) -> Self {
        let issuer = KeyIssuer::new(config.max_key_attempts);
        Self {
            document,
            config,
            state: EditState::Idle,
            issuer,
        }
    }

    /// Parse YAML text and create an editor over it
    ///
    /// # Errors
    /// Returns [`ParseError`] when the text is not a readable document.
    pub fn from_yaml(text: &str, config: EditorConfig) -> Result<Self, ParseError> {
        Ok(Self::new(yaml::parse(text)?, config))
    }

    /// Use a seeded key issuer, for reproducible keys and ids
    #[must_use]
    pub fn with_key_seed(mut self, seed: u64) -> Self {
        self.issuer = KeyIssuer::with_seed(seed, self.config.max_key_attempts);
        self
    }

    /// Live document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> EditState {
        self.state
    }

    /// Read-only JSON view of the node at path, aliases resolved
    #[must_use]
    pub fn view(&self, path: &DocPath) -> Option<serde_json::Value> {
        self.document.to_plain_object(path)
    }

    /// Serialized text of the live document
    ///
    /// Hosts keep this before a risky intent and [`reload`](Self::reload) it
    /// if the intent fails.
    ///
    /// # Errors
    /// Returns [`EditError::ReintegrationFailure`] when the tree cannot be
    /// written.
    pub fn snapshot_text(&self) -> Result<String, EditError> {
        yaml::to_string_with_indent(&self.document, self.config.indent)
            .map_err(|err| ReintegrationError::from(err).into())
    }

    /// Replace the live document with parsed text and return to idle
    ///
    /// # Errors
    /// Returns [`ParseError`] when the text is not readable; the editor is
    /// unchanged then.
    pub fn reload(&mut self, text: &str) -> Result<(), ParseError> {
        self.document = yaml::parse(text)?;
        if self.state != EditState::Idle {
            tracing::info!(from = %self.state, "reloaded document");
        }
        self.state = EditState::Idle;
        Ok(())
    }

    /// Id of an entity, if it has a string `id`
    #[must_use]
    pub fn entity_id(&self, kind: &EntityKind, key: &str) -> Option<String> {
        self.document
            .get(&kind.entity_path(key).key(ID))
            .and_then(Node::as_str)
            .map(str::to_string)
    }

    /// Keys of every entity of a kind, in document order
    #[must_use]
    pub fn entity_keys(&self, kind: &EntityKind) -> Vec<String> {
        self.document
            .get(&kind.collection_path())
            .and_then(Node::as_map)
            .map(MapNode::keys)
            .unwrap_or_default()
    }

    /// Rename an entity's key
    ///
    /// The entity keeps its position in the collection. For data assets the
    /// anchor named after the old key, and every alias to it, follow.
    ///
    /// # Errors
    /// - [`EditError::InvalidKey`] for empty keys, or a data asset key that
    ///   cannot be an anchor name
    /// - [`EditError::EntityNotFound`] when the old key is missing
    /// - [`EditError::Collision`] when the new key exists; the document is
    ///   untouched
    /// - [`EditError::AnchorCollision`] when a data asset would take over an
    ///   anchor defined elsewhere
    /// - [`EditError::ReintegrationFailure`] when the fence fails; the editor
    ///   is left `Failed`
    pub fn rename_entity_key(
        &mut self,
        kind: &EntityKind,
        old_key: &str,
        new_key: &str,
    ) -> Result<RenameOutcome, EditError> {
        let origin = self.begin()?;
        tracing::info!("Renaming {} '{}' -> '{}'", kind.label(), old_key, new_key);

        if let Err(err) = self.validate_rename(kind, old_key, new_key) {
            return Err(self.reject(origin, err));
        }
        let mut trace = self.new_trace();

        if old_key == new_key {
            self.settle(origin);
            return Ok(RenameOutcome {
                kind: kind.clone(),
                old_key: old_key.to_string(),
                new_key: new_key.to_string(),
                anchor: None,
                text: self.snapshot_text()?,
                trace,
            });
        }

        self.transition(EditState::Mutating)?;
        let anchor = match self.apply_rename(kind, old_key, new_key, &mut trace) {
            Ok(anchor) => anchor,
            Err(err) => return Err(self.fail(err)),
        };
        let text = self.reintegrate_live()?;

        Ok(RenameOutcome {
            kind: kind.clone(),
            old_key: old_key.to_string(),
            new_key: new_key.to_string(),
            anchor,
            text,
            trace,
        })
    }

    /// Delete an entity
    ///
    /// # Errors
    /// - [`EditError::InvalidKey`] for an empty key
    /// - [`EditError::EntityNotFound`] when the key is missing
    /// - [`EditError::AnchorInUse`] when aliases to an anchor inside the
    ///   deleted entity would remain; nothing is changed
    /// - [`EditError::ReintegrationFailure`] when the fence fails; the editor
    ///   is left `Failed`
    pub fn delete_entity(
        &mut self,
        kind: &EntityKind,
        key: &str,
        mode: DeleteMode,
    ) -> Result<DeleteOutcome, EditError> {
        let origin = self.begin()?;
        tracing::info!("Deleting {} '{}' ({})", kind.label(), key, mode);

        if let Err(err) = self.require_entity(kind, key).map(|_| ()) {
            return Err(self.reject(origin, err));
        }
        let id = self.entity_id(kind, key);
        let dependents = self.alias_dependents(kind, key);
        if !dependents.is_empty() {
            tracing::warn!(key, dependents = ?dependents, "entity is merged into other data assets");
        }
        // without the fence a dangling alias is the host's to resolve
        if self.config.reintegrate_after_delete {
            let mut removed = vec![kind.entity_path(key)];
            if mode == DeleteMode::CascadeWithDependents {
                removed.extend(dependents.iter().map(|dependent| kind.entity_path(dependent)));
            }
            let aliases = dangling_aliases(&self.document, &removed);
            if aliases > 0 {
                let err = EditError::AnchorInUse {
                    collection: kind.to_string(),
                    key: key.to_string(),
                    dependents,
                    aliases,
                };
                return Err(self.reject(origin, err));
            }
        }
        let mut trace = self.new_trace();

        self.transition(EditState::Mutating)?;
        let result = self.apply_delete(kind, key, id.as_deref(), mode, &dependents, &mut trace);
        let (report, deleted_dependents) = match result {
            Ok(done) => done,
            Err(err) => return Err(self.fail(err)),
        };

        let text = if self.config.reintegrate_after_delete {
            self.reintegrate_live()?
        } else {
            self.finish_without_fence()?
        };

        Ok(DeleteOutcome {
            kind: kind.clone(),
            key: key.to_string(),
            id,
            mode,
            dependents,
            deleted_dependents,
            report,
            text,
            trace,
        })
    }

    /// Set a field of an entity
    ///
    /// Setting `id` rewrites every reference to the old id. Setting `tags`
    /// appends unknown tags to `tags_available`.
    ///
    /// # Errors
    /// - [`EditError::InvalidPath`] for an empty or unusable field path
    /// - [`EditError::EntityNotFound`] when the key is missing
    /// - [`EditError::InvalidKey`] when a new `id` is not a non-empty string
    /// - [`EditError::IdCollision`] when the new `id` is used elsewhere
    /// - [`EditError::ReintegrationFailure`] when the fence fails
    pub fn set_field(
        &mut self,
        kind: &EntityKind,
        key: &str,
        field: &DocPath,
        value: Node,
    ) -> Result<SetOutcome, EditError> {
        let origin = self.begin()?;
        tracing::info!("Setting {}.{} on {} '{}'", kind, field, kind.label(), key);

        let id_change = match self.validate_set(kind, key, field, &value) {
            Ok(change) => change,
            Err(err) => return Err(self.reject(origin, err)),
        };
        let mut trace = self.new_trace();

        self.transition(EditState::Mutating)?;
        let path = kind.entity_path(key).join(field);
        let applied = match self.document.set(&path, value) {
            Ok(applied) => applied,
            Err(err) => return Err(self.reject(origin, err.into())),
        };
        if !applied {
            tracing::debug!(path = %path, "field parent missing, nothing set");
            self.settle(origin);
            return Ok(SetOutcome {
                kind: kind.clone(),
                key: key.to_string(),
                field: field.clone(),
                applied,
                report: None,
                tags_added: Vec::new(),
                text: self.snapshot_text()?,
                trace,
            });
        }
        trace.record(TraceEntry::new(TraceKind::Updated, path.clone()).with_detail("field set"));

        let report = id_change.map(|(old, new)| {
            update_references(
                &mut self.document,
                &old,
                &new,
                &self.config.reference_options(),
                &mut trace,
            )
        });
        let tags_added = if is_field(field, TAGS) {
            self.merge_tags(&path, &mut trace)
        } else {
            Vec::new()
        };
        let text = self.reintegrate_live()?;

        Ok(SetOutcome {
            kind: kind.clone(),
            key: key.to_string(),
            field: field.clone(),
            applied,
            report,
            tags_added,
            text,
            trace,
        })
    }

    /// Create an entity with an issued key and id
    ///
    /// `body` must be a map (or null for an empty entity); its `id`, if any,
    /// is replaced by the issued one, which comes first.
    ///
    /// # Errors
    /// - [`EditError::InvalidBody`] when `body` is not a map
    /// - [`EditError::EntityNotFound`] when a link's owner is missing
    /// - [`EditError::InvalidPath`] when the collection exists but is not a map
    /// - [`EditError::IssueExhausted`] when no unused key or id was found
    pub fn create_entity(&mut self, kind: &EntityKind, body: Node) -> Result<CreatedEntity, EditError> {
        let origin = self.begin()?;
        tracing::info!("Creating {} in {}", kind.label(), kind);

        let issued = self.validate_create(kind, &body).and_then(|()| {
            let key = self.issuer.issue_key(&self.document, kind)?;
            let id = self.issuer.issue_id(&self.document, kind)?;
            Ok((key, id))
        });
        let (key, id) = match issued {
            Ok(issued) => issued,
            Err(err) => return Err(self.reject(origin, err)),
        };
        let mut trace = self.new_trace();

        self.transition(EditState::Mutating)?;
        if let Err(err) = self.insert_entity(kind, &key, id.as_deref(), body, &mut trace) {
            return Err(self.fail(err));
        }
        let text = self.reintegrate_live()?;
        tracing::info!(key = %key, id = ?id, "created {}", kind.label());

        Ok(CreatedEntity {
            kind: kind.clone(),
            key,
            id,
            text,
            trace,
        })
    }

    fn validate_rename(&self, kind: &EntityKind, old_key: &str, new_key: &str) -> Result<(), EditError> {
        if new_key.is_empty() {
            return Err(EditError::InvalidKey("new key must not be empty".to_string()));
        }
        let collection = self.require_entity(kind, old_key)?;
        if old_key == new_key {
            return Ok(());
        }
        if collection.contains_key(new_key) {
            return Err(EditError::Collision {
                collection: kind.to_string(),
                key: new_key.to_string(),
            });
        }
        if kind.is_anchor_target() {
            let anchors = self.document.anchors();
            if anchors.iter().any(|(_, name)| name == old_key) {
                if !yaml::is_valid_anchor_name(new_key) {
                    return Err(EditError::InvalidKey(format!(
                        "'{new_key}' cannot be used as an anchor name"
                    )));
                }
                if anchors.iter().any(|(_, name)| name == new_key) {
                    return Err(EditError::AnchorCollision(new_key.to_string()));
                }
            }
        }
        Ok(())
    }

    fn apply_rename(
        &mut self,
        kind: &EntityKind,
        old_key: &str,
        new_key: &str,
        trace: &mut Trace,
    ) -> Result<Option<AnchorRename>, EditError> {
        let collection_path = kind.collection_path();
        let collection = self
            .document
            .get_mut(&collection_path)
            .and_then(Node::as_map_mut)
            .ok_or_else(|| not_found(kind, old_key))?;
        if !collection.rename_key(old_key, new_key)? {
            return Err(not_found(kind, old_key));
        }
        trace.record(
            TraceEntry::new(TraceKind::Updated, collection_path.key(new_key))
                .with_old(old_key)
                .with_new(new_key)
                .with_detail("key renamed"),
        );

        if !kind.is_anchor_target() {
            return Ok(None);
        }
        Ok(Some(rename_anchor(&mut self.document, old_key, new_key, trace)))
    }

    fn apply_delete(
        &mut self,
        kind: &EntityKind,
        key: &str,
        id: Option<&str>,
        mode: DeleteMode,
        dependents: &[String],
        trace: &mut Trace,
    ) -> Result<(Option<ReferenceReport>, Vec<String>), EditError> {
        let options = self.config.reference_options();
        let mut report = None;
        if mode != DeleteMode::ItemOnly {
            let mut total = ReferenceReport::default();
            if let Some(id) = id {
                total.merge(remove_references(&mut self.document, id, &options, trace));
            } else {
                tracing::debug!(key, "entity has no id, no references to remove");
            }
            report = Some(total);
        }

        let mut deleted_dependents = Vec::new();
        if mode == DeleteMode::CascadeWithDependents {
            for dependent in dependents {
                if let (Some(total), Some(dependent_id)) =
                    (report.as_mut(), self.entity_id(kind, dependent))
                {
                    total.merge(remove_references(
                        &mut self.document,
                        &dependent_id,
                        &options,
                        trace,
                    ));
                }
                let path = kind.entity_path(dependent);
                if self.document.delete(&path)? {
                    trace.removed(path, dependent);
                    deleted_dependents.push(dependent.clone());
                }
            }
        }

        let path = kind.entity_path(key);
        if !self.document.delete(&path)? {
            return Err(not_found(kind, key));
        }
        trace.removed(path, key);
        Ok((report, deleted_dependents))
    }

    /// Id change carried by a set, checked against every id in the document
    fn validate_set(
        &self,
        kind: &EntityKind,
        key: &str,
        field: &DocPath,
        value: &Node,
    ) -> Result<Option<(String, String)>, EditError> {
        if field.is_empty() {
            return Err(EditError::InvalidPath("field path must not be empty".to_string()));
        }
        self.require_entity(kind, key)?;
        if !is_field(field, ID) {
            return Ok(None);
        }

        let new_id = value
            .as_str()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EditError::InvalidKey("id must be a non-empty string".to_string()))?;
        let Some(old_id) = self.entity_id(kind, key) else {
            return Ok(None);
        };
        if old_id == new_id {
            return Ok(None);
        }
        if ids_in(&self.document).contains(new_id) {
            return Err(EditError::IdCollision(new_id.to_string()));
        }
        Ok(Some((old_id, new_id.to_string())))
    }

    /// Append tags of the entity at `tags_path` missing from `tags_available`
    fn merge_tags(&mut self, tags_path: &DocPath, trace: &mut Trace) -> Vec<String> {
        let tags: Vec<String> = self
            .document
            .get(tags_path)
            .and_then(Node::as_seq)
            .map(|seq| {
                seq.items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        if tags.is_empty() {
            return Vec::new();
        }

        let available_path = DocPath::from([TAGS_AVAILABLE]);
        let missing_or_null = self
            .document
            .get(&available_path)
            .map_or(true, |node| node.as_scalar().is_some_and(Scalar::is_null));
        if missing_or_null {
            if let Err(err) = self
                .document
                .set(&available_path, Node::Seq(SeqNode::new()))
            {
                tracing::warn!("cannot create {}: {}", TAGS_AVAILABLE, err);
                return Vec::new();
            }
        }
        let Some(available) = self
            .document
            .get_mut(&available_path)
            .and_then(Node::as_seq_mut)
        else {
            tracing::warn!("{} is not a sequence, tags not merged", TAGS_AVAILABLE);
            return Vec::new();
        };

        let mut known: HashSet<String> = available
            .items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect();
        let mut added = Vec::new();
        for tag in tags {
            if known.insert(tag.clone()) {
                trace.record(
                    TraceEntry::new(TraceKind::Updated, available_path.index(available.len()))
                        .with_new(tag.as_str())
                        .with_detail("tag registered"),
                );
                available.push(Node::string(tag.as_str()));
                added.push(tag);
            }
        }
        added
    }

    fn validate_create(&self, kind: &EntityKind, body: &Node) -> Result<(), EditError> {
        match body {
            Node::Map(_) => {}
            Node::Scalar(scalar) if scalar.value.is_null() => {}
            other => return Err(EditError::InvalidBody(other.kind())),
        }
        if let EntityKind::CommunicationLink { owner } = kind {
            let owner_path = EntityKind::TechnicalAsset.entity_path(owner);
            if self.document.get(&owner_path).and_then(Node::as_map).is_none() {
                return Err(not_found(&EntityKind::TechnicalAsset, owner));
            }
        }
        match self.document.get(&kind.collection_path()) {
            None | Some(Node::Map(_)) => Ok(()),
            Some(Node::Scalar(scalar)) if scalar.value.is_null() => Ok(()),
            Some(_) => Err(EditError::InvalidPath(format!("{kind} is not a map"))),
        }
    }

    fn insert_entity(
        &mut self,
        kind: &EntityKind,
        key: &str,
        id: Option<&str>,
        body: Node,
        trace: &mut Trace,
    ) -> Result<(), EditError> {
        let collection_path = kind.collection_path();
        if self
            .document
            .get(&collection_path)
            .and_then(Node::as_map)
            .is_none()
        {
            self.document.set(&collection_path, Node::map())?;
        }

        let mut entity = MapNode::new();
        if let Some(id) = id {
            entity.insert(ID, Node::string(id));
        }
        if let Node::Map(body) = body {
            for pair in body.items {
                if id.is_some() && pair.key_text().as_deref() == Some(ID) {
                    continue;
                }
                entity.items.push(pair);
            }
        }

        let path = collection_path.key(key);
        if !self.document.set(&path, Node::Map(entity))? {
            return Err(EditError::InvalidPath(format!("cannot create {path}")));
        }
        let mut entry = TraceEntry::new(TraceKind::Updated, path)
            .with_new(key)
            .with_detail("entity created");
        if let Some(id) = id {
            entry = entry.with_old(id);
        }
        trace.record(entry);
        Ok(())
    }

    fn require_entity(&self, kind: &EntityKind, key: &str) -> Result<&MapNode, EditError> {
        if key.is_empty() {
            return Err(EditError::InvalidKey("key must not be empty".to_string()));
        }
        self.document
            .get(&kind.collection_path())
            .and_then(Node::as_map)
            .filter(|collection| collection.contains_key(key))
            .ok_or_else(|| not_found(kind, key))
    }

    /// Data assets merging the anchor carried by this entity, transitively
    fn alias_dependents(&self, kind: &EntityKind, key: &str) -> Vec<String> {
        if !kind.is_anchor_target() {
            return Vec::new();
        }
        let Some(anchor) = self
            .document
            .get(&kind.entity_path(key))
            .and_then(Node::anchor)
        else {
            return Vec::new();
        };
        find_alias_dependents_transitive(&self.document, DATA_ASSETS, anchor)
            .into_iter()
            .filter(|dependent| dependent != key)
            .collect()
    }

    fn new_trace(&self) -> Trace {
        if self.config.record_trace {
            Trace::new()
        } else {
            Trace::disabled()
        }
    }

    fn transition(&mut self, to: EditState) -> Result<(), EditError> {
        validate_transition(self.state, to)?;
        tracing::debug!(from = %self.state, to = %to, "edit state");
        self.state = to;
        Ok(())
    }

    fn begin(&mut self) -> Result<EditState, EditError> {
        let origin = self.state;
        self.transition(EditState::Validating)?;
        Ok(origin)
    }

    /// Return to the state the intent started from; nothing was changed
    fn settle(&mut self, origin: EditState) {
        self.state = origin;
    }

    fn reject(&mut self, origin: EditState, err: EditError) -> EditError {
        tracing::warn!("Intent rejected: {}", err);
        self.settle(origin);
        err
    }

    fn fail(&mut self, err: EditError) -> EditError {
        tracing::error!("Edit failed: {}", err);
        self.state = EditState::Failed;
        err
    }

    fn reintegrate_live(&mut self) -> Result<String, EditError> {
        self.transition(EditState::Reintegrating)?;
        match reintegrate(&self.document, self.config.indent) {
            Ok(Reintegrated { text, document }) => {
                self.document = document;
                self.transition(EditState::Idle)?;
                Ok(text)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    fn finish_without_fence(&mut self) -> Result<String, EditError> {
        match yaml::to_string_with_indent(&self.document, self.config.indent) {
            Ok(text) => {
                self.transition(EditState::Idle)?;
                Ok(text)
            }
            Err(err) => Err(self.fail(ReintegrationError::from(err).into())),
        }
    }
}

fn not_found(kind: &EntityKind, key: &str) -> EditError {
    EditError::EntityNotFound {
        collection: kind.to_string(),
        key: key.to_string(),
    }
}

/// Aliases outside the `removed` subtrees to anchors defined only inside them
fn dangling_aliases(doc: &Document, removed: &[DocPath]) -> usize {
    let inside = |path: &DocPath| removed.iter().any(|root| root.is_prefix_of(path));
    let mut lost = HashSet::new();
    let mut kept = HashSet::new();
    doc.walk(&mut |path, _, node| {
        if let Some(anchor) = node.anchor() {
            if inside(path) {
                lost.insert(anchor.to_string());
            } else {
                kept.insert(anchor.to_string());
            }
        }
    });
    lost.retain(|anchor| !kept.contains(anchor));
    if lost.is_empty() {
        return 0;
    }

    let mut count = 0;
    doc.walk(&mut |path, _, node| {
        if matches!(node, Node::Alias(alias) if lost.contains(&alias.source)) && !inside(path) {
            count += 1;
        }
    });
    count
}

fn is_field(field: &DocPath, name: &str) -> bool {
    matches!(field.segments(), [Segment::Key(key)] if key == name)
}

/// Every `id` value in the document
fn ids_in(doc: &Document) -> HashSet<String> {
    let mut ids = HashSet::new();
    doc.walk(&mut |path, role, node| {
        if role == NodeRole::MapValue && path.last().and_then(Segment::as_key) == Some(ID) {
            if let Some(id) = node.as_str() {
                ids.insert(id.to_string());
            }
        }
    });
    ids
}
