//! Document tree nodes
//!
//! A [`Node`] is one of four kinds: map, sequence, scalar or alias. Every
//! kind except alias may carry an anchor name that aliases elsewhere in the
//! document refer to.

use crate::error::DocumentError;
use crate::path::{DocPath, Segment};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

/// Leaf value of a scalar node
#[derive(Debug, Clone)]
pub enum Scalar {
    /// `null` / `~` / empty
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // NaN must compare equal to itself for round-trip checks
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Scalar {
    /// String content, if this is a string scalar
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Check for null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text used when this scalar serves as a map key
    #[must_use]
    pub fn key_text(&self) -> Cow<'_, str> {
        match self {
            Self::Str(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// JSON projection of this scalar
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

/// Scalar leaf
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarNode {
    /// Value
    pub value: Scalar,
    /// Optional anchor name
    pub anchor: Option<String>,
}

/// Ordered sequence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeqNode {
    /// Items in document order
    pub items: Vec<Node>,
    /// Optional anchor name
    pub anchor: Option<String>,
}

impl SeqNode {
    /// Create empty sequence
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check for no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at index
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.items.get(index)
    }

    /// Mutable item at index
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.items.get_mut(index)
    }

    /// Append item
    #[inline]
    pub fn push(&mut self, node: Node) {
        self.items.push(node);
    }
}

impl FromIterator<Node> for SeqNode {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            anchor: None,
        }
    }
}

/// Key/value entry of a map
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    /// Key node (a scalar in every document this crate writes)
    pub key: Node,
    /// Value node
    pub value: Node,
}

impl Pair {
    /// Key text, if the key is a scalar
    #[inline]
    #[must_use]
    pub fn key_text(&self) -> Option<Cow<'_, str>> {
        self.key.as_scalar().map(Scalar::key_text)
    }

    fn key_is(&self, key: &str) -> bool {
        self.key_text().is_some_and(|k| k == key)
    }
}

/// Ordered map
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapNode {
    /// Entries in document order
    pub items: Vec<Pair>,
    /// Optional anchor name
    pub anchor: Option<String>,
}

impl MapNode {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check for no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of the entry with this key
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|pair| pair.key_is(key))
    }

    /// Check if key is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Value for key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.items
            .iter()
            .find(|pair| pair.key_is(key))
            .map(|pair| &pair.value)
    }

    /// Mutable value for key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.items
            .iter_mut()
            .find(|pair| pair.key_is(key))
            .map(|pair| &mut pair.value)
    }

    /// Insert or replace a value
    ///
    /// Replacing keeps the entry position and the existing key node; new
    /// keys are appended. Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) -> Option<Node> {
        let key = key.into();
        match self.position(&key) {
            Some(pos) => Some(std::mem::replace(&mut self.items[pos].value, value)),
            None => {
                self.items.push(Pair {
                    key: Node::string(key),
                    value,
                });
                None
            }
        }
    }

    /// Remove an entry, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let pos = self.position(key)?;
        Some(self.items.remove(pos).value)
    }

    /// Move an entry to a new key, keeping its position
    ///
    /// Returns `Ok(false)` when `old` is absent. The key node is replaced by
    /// a fresh string scalar; the value node (and any anchor it carries) is
    /// untouched.
    ///
    /// # Errors
    /// Returns [`DocumentError::KeyExists`] if `new` is already present
    pub fn rename_key(&mut self, old: &str, new: &str) -> Result<bool, DocumentError> {
        if old == new {
            return Ok(self.contains_key(old));
        }
        if self.contains_key(new) {
            return Err(DocumentError::KeyExists {
                path: DocPath::root(),
                key: new.to_string(),
            });
        }
        let Some(pos) = self.position(old) else {
            return Ok(false);
        };
        self.items[pos].key = Node::string(new);
        Ok(true)
    }

    /// Iterator over `(key text, value)` for scalar keys
    pub fn entries(&self) -> impl Iterator<Item = (Cow<'_, str>, &Node)> {
        self.items
            .iter()
            .filter_map(|pair| pair.key_text().map(|k| (k, &pair.value)))
    }

    /// Key texts of all scalar keys, in order
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|pair| pair.key_text().map(Cow::into_owned))
            .collect()
    }
}

/// Reference to an anchored node by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasNode {
    /// Anchor name this alias points to
    pub source: String,
}

/// Node kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Map
    Map,
    /// Sequence
    Seq,
    /// Scalar
    Scalar,
    /// Alias
    Alias,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Map => "map",
            Self::Seq => "sequence",
            Self::Scalar => "scalar",
            Self::Alias => "alias",
        })
    }
}

/// Any document tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Ordered key/value map
    Map(MapNode),
    /// Ordered sequence
    Seq(SeqNode),
    /// Leaf value
    Scalar(ScalarNode),
    /// Reference to an anchored node
    Alias(AliasNode),
}

impl Default for Node {
    fn default() -> Self {
        Self::null()
    }
}

impl Node {
    /// Create a scalar node
    #[inline]
    #[must_use]
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Self::Scalar(ScalarNode {
            value: value.into(),
            anchor: None,
        })
    }

    /// Create a string scalar node
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::scalar(Scalar::Str(value.into()))
    }

    /// Create a null scalar node
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::scalar(Scalar::Null)
    }

    /// Create an alias node
    #[inline]
    #[must_use]
    pub fn alias(source: impl Into<String>) -> Self {
        Self::Alias(AliasNode {
            source: source.into(),
        })
    }

    /// Create an empty map node
    #[inline]
    #[must_use]
    pub fn map() -> Self {
        Self::Map(MapNode::new())
    }

    /// Create a sequence of string scalars
    #[must_use]
    pub fn string_seq<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Seq(items.into_iter().map(Self::string).collect())
    }

    /// Build a node from a JSON value
    ///
    /// Objects become maps, arrays sequences; numbers become integers when
    /// they fit an `i64`.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::null(),
            Value::Bool(b) => Self::scalar(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::scalar(i),
                None => Self::scalar(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::string(s.as_str()),
            Value::Array(items) => Self::Seq(items.iter().map(Self::from_json).collect()),
            Value::Object(entries) => Self::Map(MapNode {
                items: entries
                    .iter()
                    .map(|(k, v)| Pair {
                        key: Self::string(k.as_str()),
                        value: Self::from_json(v),
                    })
                    .collect(),
                anchor: None,
            }),
        }
    }

    /// Attach an anchor, returning the node
    ///
    /// Aliases cannot carry anchors; for them this is a no-op.
    #[must_use]
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.set_anchor(Some(anchor.into()));
        self
    }

    /// Node kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Map(_) => NodeKind::Map,
            Self::Seq(_) => NodeKind::Seq,
            Self::Scalar(_) => NodeKind::Scalar,
            Self::Alias(_) => NodeKind::Alias,
        }
    }

    /// Anchor name carried by this node
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        match self {
            Self::Map(m) => m.anchor.as_deref(),
            Self::Seq(s) => s.anchor.as_deref(),
            Self::Scalar(s) => s.anchor.as_deref(),
            Self::Alias(_) => None,
        }
    }

    /// Replace the anchor name; returns false for aliases
    pub fn set_anchor(&mut self, anchor: Option<String>) -> bool {
        match self {
            Self::Map(m) => m.anchor = anchor,
            Self::Seq(s) => s.anchor = anchor,
            Self::Scalar(s) => s.anchor = anchor,
            Self::Alias(_) => return false,
        }
        true
    }

    /// Map view
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&MapNode> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable map view
    #[inline]
    pub fn as_map_mut(&mut self) -> Option<&mut MapNode> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Sequence view
    #[inline]
    #[must_use]
    pub fn as_seq(&self) -> Option<&SeqNode> {
        match self {
            Self::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable sequence view
    #[inline]
    pub fn as_seq_mut(&mut self) -> Option<&mut SeqNode> {
        match self {
            Self::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar value view
    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(&s.value),
            _ => None,
        }
    }

    /// String content of a string scalar
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// Child addressed by one path segment
    #[must_use]
    pub fn child(&self, segment: &Segment) -> Option<&Node> {
        match (self, segment) {
            (Self::Map(m), Segment::Key(k)) => m.get(k),
            (Self::Seq(s), Segment::Index(i)) => s.get(*i),
            _ => None,
        }
    }

    /// Mutable child addressed by one path segment
    pub fn child_mut(&mut self, segment: &Segment) -> Option<&mut Node> {
        match (self, segment) {
            (Self::Map(m), Segment::Key(k)) => m.get_mut(k),
            (Self::Seq(s), Segment::Index(i)) => s.get_mut(*i),
            _ => None,
        }
    }
}

impl From<MapNode> for Node {
    fn from(map: MapNode) -> Self {
        Self::Map(map)
    }
}

impl From<SeqNode> for Node {
    fn from(seq: SeqNode) -> Self {
        Self::Seq(seq)
    }
}
