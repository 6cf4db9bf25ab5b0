//! Path-addressed document tree

use crate::error::DocumentError;
use crate::node::{MapNode, Node};
use crate::path::{DocPath, Segment};
use crate::visit::{self, NodeRole};
use serde_json::{Map as JsonMap, Value};
use std::collections::HashMap;

/// In-memory YAML document
///
/// Holds a single root node. All mutations happen in place on the tree;
/// nothing here re-serializes.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Node,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Node> for Document {
    fn from(root: Node) -> Self {
        Self { root }
    }
}

impl Document {
    /// Create a document with an empty map at the root
    #[must_use]
    pub fn new() -> Self {
        Self { root: Node::map() }
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Mutable root node
    #[inline]
    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Consume into the root node
    #[inline]
    #[must_use]
    pub fn into_root(self) -> Node {
        self.root
    }

    /// Root as a map, if it is one
    #[inline]
    #[must_use]
    pub fn root_map(&self) -> Option<&MapNode> {
        self.root.as_map()
    }

    /// Node at path
    #[must_use]
    pub fn get(&self, path: &DocPath) -> Option<&Node> {
        path.iter()
            .try_fold(&self.root, |node, segment| node.child(segment))
    }

    /// Mutable node at path
    pub fn get_mut(&mut self, path: &DocPath) -> Option<&mut Node> {
        path.iter()
            .try_fold(&mut self.root, |node, segment| node.child_mut(segment))
    }

    /// Check if a node exists at path
    #[inline]
    #[must_use]
    pub fn has(&self, path: &DocPath) -> bool {
        self.get(path).is_some()
    }

    /// Set the node at path
    ///
    /// Map entries are replaced in place or appended. A sequence index equal
    /// to the length appends. Returns `Ok(false)` when the parent does not
    /// exist as addressed: a missing intermediate, an index past the end, or
    /// a segment that does not fit the parent's kind.
    ///
    /// # Errors
    /// Returns [`DocumentError::InvalidPath`] for the root path
    pub fn set(&mut self, path: &DocPath, node: Node) -> Result<bool, DocumentError> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| DocumentError::InvalidPath("cannot set the document root".into()))?;
        let parent_path = DocPath::new(parents.to_vec());
        let Some(parent) = self.get_mut(&parent_path) else {
            return Ok(false);
        };

        match (parent, last) {
            (Node::Map(map), Segment::Key(key)) => {
                map.insert(key.clone(), node);
                Ok(true)
            }
            (Node::Seq(seq), Segment::Index(index)) if *index <= seq.len() => {
                if *index == seq.len() {
                    seq.push(node);
                } else {
                    seq.items[*index] = node;
                }
                Ok(true)
            }
            (parent, _) => {
                tracing::debug!(path = %path, parent = %parent.kind(), "set target not addressable");
                Ok(false)
            }
        }
    }

    /// Remove the node at path
    ///
    /// Returns `Ok(false)` when nothing exists there.
    ///
    /// # Errors
    /// Returns [`DocumentError::InvalidPath`] for the root path
    pub fn delete(&mut self, path: &DocPath) -> Result<bool, DocumentError> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| DocumentError::InvalidPath("cannot delete the document root".into()))?;
        let parent_path = DocPath::new(parents.to_vec());
        let Some(parent) = self.get_mut(&parent_path) else {
            return Ok(false);
        };

        Ok(match (parent, last) {
            (Node::Map(map), Segment::Key(key)) => map.remove(key).is_some(),
            (Node::Seq(seq), Segment::Index(index)) if *index < seq.len() => {
                seq.items.remove(*index);
                true
            }
            _ => false,
        })
    }

    /// Visit every node in document order
    pub fn walk<'a, F>(&'a self, visitor: &mut F)
    where
        F: FnMut(&DocPath, NodeRole, &'a Node),
    {
        visit::walk(&self.root, visitor);
    }

    /// Visit every node in document order with mutable access
    pub fn walk_mut<F>(&mut self, visitor: &mut F)
    where
        F: FnMut(&DocPath, NodeRole, &mut Node),
    {
        visit::walk_mut(&mut self.root, visitor);
    }

    /// Anchor names defined anywhere in the document, in order
    #[must_use]
    pub fn anchors(&self) -> Vec<(DocPath, String)> {
        let mut found = Vec::new();
        self.walk(&mut |path, _, node| {
            if let Some(anchor) = node.anchor() {
                found.push((path.clone(), anchor.to_string()));
            }
        });
        found
    }

    /// Read-only JSON projection of the node at path
    ///
    /// Aliases are replaced by the current value of their anchor, so a merge
    /// key `<<` stays a literal key whose value is the resolved target. When
    /// an anchor name is defined more than once the last definition wins.
    /// Recursive or unresolvable aliases project as `null`.
    #[must_use]
    pub fn to_plain_object(&self, path: &DocPath) -> Option<Value> {
        let node = self.get(path)?;
        let mut anchors: HashMap<&str, &Node> = HashMap::new();
        self.walk(&mut |_, _, node| {
            if let Some(anchor) = node.anchor() {
                anchors.insert(anchor, node);
            }
        });
        let mut resolving = Vec::new();
        Some(project(node, &anchors, &mut resolving))
    }
}

fn project<'a>(node: &'a Node, anchors: &HashMap<&'a str, &'a Node>, resolving: &mut Vec<&'a str>) -> Value {
    if let Some(anchor) = node.anchor() {
        resolving.push(anchor);
    }
    let value = match node {
        Node::Scalar(scalar) => scalar.value.to_json(),
        Node::Seq(seq) => Value::Array(
            seq.items
                .iter()
                .map(|item| project(item, anchors, resolving))
                .collect(),
        ),
        Node::Map(map) => {
            let mut object = JsonMap::new();
            for pair in &map.items {
                let key = match pair.key_text() {
                    Some(text) => text.into_owned(),
                    None => project(&pair.key, anchors, resolving).to_string(),
                };
                object.insert(key, project(&pair.value, anchors, resolving));
            }
            Value::Object(object)
        }
        Node::Alias(alias) => {
            let source = alias.source.as_str();
            if resolving.contains(&source) {
                tracing::warn!(anchor = source, "recursive alias projected as null");
                Value::Null
            } else if let Some(target) = anchors.get(source) {
                project(target, anchors, resolving)
            } else {
                tracing::warn!(anchor = source, "alias to undefined anchor projected as null");
                Value::Null
            }
        }
    };
    if node.anchor().is_some() {
        resolving.pop();
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        let mut doc = Document::new();
        doc.set(&DocPath::from(["technical_assets"]), Node::map()).unwrap();
        doc.set(
            &DocPath::from(["technical_assets", "web"]),
            Node::from_json(&json!({"id": "ta-1", "data_assets_processed": ["da-1"]})),
        )
        .unwrap();
        doc
    }

    #[test]
    fn get_and_has() {
        let doc = doc();
        let path: DocPath = "technical_assets.web.data_assets_processed[0]".parse().unwrap();
        assert!(doc.has(&path));
        assert_eq!(doc.get(&path).and_then(Node::as_str), Some("da-1"));
        assert!(!doc.has(&DocPath::from(["technical_assets", "db"])));
    }

    #[test]
    fn set_missing_intermediate_returns_false() {
        let mut doc = doc();
        let path = DocPath::from(["data_assets", "secret", "id"]);
        assert_eq!(doc.set(&path, Node::string("da-1")), Ok(false));
        assert!(!doc.has(&DocPath::from(["data_assets"])));
    }

    #[test]
    fn set_appends_at_sequence_end() {
        let mut doc = doc();
        let list: DocPath = "technical_assets.web.data_assets_processed".parse().unwrap();
        assert_eq!(doc.set(&list.index(1), Node::string("da-2")), Ok(true));
        assert_eq!(doc.get(&list).and_then(Node::as_seq).map(|s| s.len()), Some(2));
    }

    #[test]
    fn set_past_sequence_end_returns_false() {
        let mut doc = doc();
        let list: DocPath = "technical_assets.web.data_assets_processed".parse().unwrap();
        let before = doc.clone();
        assert_eq!(doc.set(&list.index(5), Node::null()), Ok(false));
        assert_eq!(doc.set(&list.index(5).key("x"), Node::null()), Ok(false));
        assert_eq!(doc, before);
    }

    #[test]
    fn set_root_is_invalid() {
        let mut doc = doc();
        assert!(matches!(
            doc.set(&DocPath::root(), Node::null()),
            Err(DocumentError::InvalidPath(_))
        ));
        assert!(matches!(doc.delete(&DocPath::root()), Err(DocumentError::InvalidPath(_))));
    }

    #[test]
    fn set_under_scalar_or_mismatched_parent_returns_false() {
        let mut doc = doc();
        let before = doc.clone();
        let under_scalar = DocPath::from(["technical_assets", "web", "id", "x"]);
        assert_eq!(doc.set(&under_scalar, Node::null()), Ok(false));
        let key_on_list: DocPath = "technical_assets.web.data_assets_processed.x".parse().unwrap();
        assert_eq!(doc.set(&key_on_list, Node::null()), Ok(false));
        assert_eq!(doc.set(&DocPath::from(["technical_assets"]).index(0), Node::null()), Ok(false));
        assert_eq!(doc, before);
    }

    #[test]
    fn delete_entry_and_item() {
        let mut doc = doc();
        let item: DocPath = "technical_assets.web.data_assets_processed[0]".parse().unwrap();
        assert_eq!(doc.delete(&item), Ok(true));
        assert_eq!(doc.delete(&item), Ok(false));
        let web = DocPath::from(["technical_assets", "web"]);
        assert_eq!(doc.delete(&web), Ok(true));
        assert!(!doc.has(&web));
    }

    #[test]
    fn projection_resolves_aliases_and_keeps_merge_key() {
        let mut doc = Document::new();
        doc.set(
            &DocPath::from(["base"]),
            Node::from_json(&json!({"confidentiality": "confidential"})).with_anchor("base"),
        )
        .unwrap();
        let mut derived = MapNode::new();
        derived.insert("<<", Node::alias("base"));
        derived.insert("id", Node::string("da-2"));
        doc.set(&DocPath::from(["derived"]), Node::Map(derived)).unwrap();

        let value = doc.to_plain_object(&DocPath::from(["derived"])).unwrap();
        assert_eq!(
            value,
            json!({"<<": {"confidentiality": "confidential"}, "id": "da-2"})
        );
    }

    #[test]
    fn projection_breaks_recursive_alias() {
        let mut seq = crate::node::SeqNode::new();
        seq.push(Node::alias("loop"));
        let mut doc = Document::new();
        doc.set(&DocPath::from(["a"]), Node::Seq(seq).with_anchor("loop")).unwrap();
        assert_eq!(doc.to_plain_object(&DocPath::root()), Some(json!({"a": [null]})));
    }

    #[test]
    fn anchors_lists_definitions() {
        let mut doc = Document::new();
        doc.set(&DocPath::from(["a"]), Node::scalar(1_i64).with_anchor("one")).unwrap();
        assert_eq!(doc.anchors(), vec![(DocPath::from(["a"]), "one".to_string())]);
    }
}
