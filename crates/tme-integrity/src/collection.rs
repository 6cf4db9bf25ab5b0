//! Identifier collections
//!
//! An identifier array may come from the document (a sequence node) or from
//! the host (a plain `Vec<String>`). Both are edited through
//! [`IdentifierCollection`], so removal and replacement are written once.

use crate::error::CollectionError;
use tme_document::{Node, Scalar, SeqNode};

/// Indexed list of identifier strings that can be edited in place
pub trait IdentifierCollection {
    /// Number of items
    fn len(&self) -> usize;

    /// Check for no items
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifier at index; `None` for items that are not strings
    fn item(&self, index: usize) -> Option<&str>;

    /// Remove the item at index
    fn remove_at(&mut self, index: usize);

    /// Overwrite the item at index, keeping its position
    fn replace_at(&mut self, index: usize, value: &str);
}

/// Adapter over a host-side list of strings
#[derive(Debug)]
pub struct PlainListAdapter<'a> {
    items: &'a mut Vec<String>,
}

impl<'a> PlainListAdapter<'a> {
    /// Wrap a list
    #[inline]
    pub fn new(items: &'a mut Vec<String>) -> Self {
        Self { items }
    }
}

impl IdentifierCollection for PlainListAdapter<'_> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn item(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    fn remove_at(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    fn replace_at(&mut self, index: usize, value: &str) {
        if let Some(item) = self.items.get_mut(index) {
            value.clone_into(item);
        }
    }
}

/// Adapter over a document sequence of scalars
#[derive(Debug)]
pub struct SequenceNodeAdapter<'a> {
    seq: &'a mut SeqNode,
}

impl<'a> SequenceNodeAdapter<'a> {
    /// Wrap a sequence node
    #[inline]
    pub fn new(seq: &'a mut SeqNode) -> Self {
        Self { seq }
    }
}

impl IdentifierCollection for SequenceNodeAdapter<'_> {
    fn len(&self) -> usize {
        self.seq.len()
    }

    fn item(&self, index: usize) -> Option<&str> {
        self.seq.get(index).and_then(Node::as_str)
    }

    fn remove_at(&mut self, index: usize) {
        if index < self.seq.len() {
            self.seq.items.remove(index);
        }
    }

    fn replace_at(&mut self, index: usize, value: &str) {
        // the item keeps its own anchor
        if let Some(Node::Scalar(scalar)) = self.seq.get_mut(index) {
            scalar.value = Scalar::Str(value.to_string());
        }
    }
}

/// Check if a node is an editable identifier collection
///
/// True for sequences whose items are all scalars, including the empty
/// sequence.
#[must_use]
pub fn is_identifier_collection(node: &Node) -> bool {
    node.as_seq()
        .is_some_and(|seq| seq.items.iter().all(|item| matches!(item, Node::Scalar(_))))
}

/// Plain lists are always identifier collections
#[inline]
#[must_use]
pub fn is_identifier_list(_items: &[String]) -> bool {
    true
}

/// Pick the adapter for a document node
///
/// # Errors
/// Returns [`CollectionError::UnsupportedShape`] for maps, scalars, aliases
/// and sequences holding non-scalar items.
pub fn classify(node: &mut Node) -> Result<SequenceNodeAdapter<'_>, CollectionError> {
    let kind = node.kind();
    match node {
        Node::Seq(seq) if seq.items.iter().all(|item| matches!(item, Node::Scalar(_))) => {
            Ok(SequenceNodeAdapter::new(seq))
        }
        Node::Seq(_) => Err(CollectionError::UnsupportedShape {
            kind,
            reason: "sequence holds non-scalar items",
        }),
        _ => Err(CollectionError::UnsupportedShape {
            kind,
            reason: "expected a sequence",
        }),
    }
}

/// Visit string items from the highest index down to zero
pub fn for_each_indexed<C, F>(collection: &C, mut f: F)
where
    C: IdentifierCollection + ?Sized,
    F: FnMut(usize, &str),
{
    for index in (0..collection.len()).rev() {
        if let Some(value) = collection.item(index) {
            f(index, value);
        }
    }
}

/// Indices of items equal to `value`, highest first
#[must_use]
pub fn positions_of<C>(collection: &C, value: &str) -> Vec<usize>
where
    C: IdentifierCollection + ?Sized,
{
    let mut found = Vec::new();
    for_each_indexed(collection, |index, item| {
        if item == value {
            found.push(index);
        }
    });
    found
}

/// Remove every item equal to `value`, returning how many were removed
///
/// Works back to front so earlier indices stay valid. Running it twice
/// removes nothing the second time.
pub fn remove_value<C>(collection: &mut C, value: &str) -> usize
where
    C: IdentifierCollection + ?Sized,
{
    let positions = positions_of(collection, value);
    for &index in &positions {
        collection.remove_at(index);
    }
    positions.len()
}

/// Rewrite every item equal to `old` to `new` in place
///
/// Returns the number of rewritten items; `old == new` rewrites nothing.
pub fn replace_value<C>(collection: &mut C, old: &str, new: &str) -> usize
where
    C: IdentifierCollection + ?Sized,
{
    if old == new {
        return 0;
    }
    let positions = positions_of(collection, old);
    for &index in &positions {
        collection.replace_at(index, new);
    }
    positions.len()
}
