//! Pre-order traversal over every node, map keys included

use crate::node::Node;
use crate::path::{DocPath, Segment};

/// Position of a visited node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Document root
    Root,
    /// Key node of a map entry
    MapKey,
    /// Value node of a map entry
    MapValue,
    /// Item of a sequence
    SeqItem,
}

/// Visit `node` and all descendants in document order
///
/// Parents are visited before children; in a map entry the key is visited
/// before the value. Keys and values of one entry share the entry's path.
/// Entries with non-scalar keys are reported under the map's own path.
pub fn walk<'a, F>(node: &'a Node, visitor: &mut F)
where
    F: FnMut(&DocPath, NodeRole, &'a Node),
{
    let mut path = DocPath::root();
    walk_inner(node, &mut path, NodeRole::Root, visitor);
}

fn walk_inner<'a, F>(node: &'a Node, path: &mut DocPath, role: NodeRole, visitor: &mut F)
where
    F: FnMut(&DocPath, NodeRole, &'a Node),
{
    visitor(path, role, node);
    match node {
        Node::Map(map) => {
            for pair in &map.items {
                let segment = pair.key_text().map(|k| Segment::Key(k.into_owned()));
                let pushed = segment.is_some();
                if let Some(segment) = segment {
                    path.push(segment);
                }
                walk_inner(&pair.key, path, NodeRole::MapKey, visitor);
                walk_inner(&pair.value, path, NodeRole::MapValue, visitor);
                if pushed {
                    path.pop();
                }
            }
        }
        Node::Seq(seq) => {
            for (i, item) in seq.items.iter().enumerate() {
                path.push(Segment::Index(i));
                walk_inner(item, path, NodeRole::SeqItem, visitor);
                path.pop();
            }
        }
        Node::Scalar(_) | Node::Alias(_) => {}
    }
}

/// Mutable counterpart of [`walk`]
///
/// The visitor runs before the children of a node are entered, so changes
/// it makes to a collection are reflected in what is visited next. The path
/// of a map entry is computed before its key is visited.
pub fn walk_mut<F>(node: &mut Node, visitor: &mut F)
where
    F: FnMut(&DocPath, NodeRole, &mut Node),
{
    let mut path = DocPath::root();
    walk_mut_inner(node, &mut path, NodeRole::Root, visitor);
}

fn walk_mut_inner<F>(node: &mut Node, path: &mut DocPath, role: NodeRole, visitor: &mut F)
where
    F: FnMut(&DocPath, NodeRole, &mut Node),
{
    visitor(path, role, node);
    match node {
        Node::Map(map) => {
            for pair in &mut map.items {
                let segment = pair.key_text().map(|k| Segment::Key(k.into_owned()));
                let pushed = segment.is_some();
                if let Some(segment) = segment {
                    path.push(segment);
                }
                walk_mut_inner(&mut pair.key, path, NodeRole::MapKey, visitor);
                walk_mut_inner(&mut pair.value, path, NodeRole::MapValue, visitor);
                if pushed {
                    path.pop();
                }
            }
        }
        Node::Seq(seq) => {
            for (i, item) in seq.items.iter_mut().enumerate() {
                path.push(Segment::Index(i));
                walk_mut_inner(item, path, NodeRole::SeqItem, visitor);
                path.pop();
            }
        }
        Node::Scalar(_) | Node::Alias(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{MapNode, Pair};

    fn sample() -> Node {
        let mut inner = MapNode::new();
        inner.insert("id", Node::string("da-1"));
        let mut root = MapNode::new();
        root.insert("secret", Node::Map(inner).with_anchor("secret"));
        root.insert("ids", Node::string_seq(["a", "b"]));
        Node::Map(root)
    }

    #[test]
    fn walk_visits_keys_and_values_in_order() {
        let root = sample();
        let mut seen = Vec::new();
        walk(&root, &mut |path, role, _| seen.push((path.to_string(), role)));
        assert_eq!(
            seen,
            vec![
                (String::new(), NodeRole::Root),
                ("secret".into(), NodeRole::MapKey),
                ("secret".into(), NodeRole::MapValue),
                ("secret.id".into(), NodeRole::MapKey),
                ("secret.id".into(), NodeRole::MapValue),
                ("ids".into(), NodeRole::MapKey),
                ("ids".into(), NodeRole::MapValue),
                ("ids[0]".into(), NodeRole::SeqItem),
                ("ids[1]".into(), NodeRole::SeqItem),
            ]
        );
    }

    #[test]
    fn walk_mut_sees_anchored_keys() {
        let mut map = MapNode::new();
        map.items.push(Pair {
            key: Node::string("k").with_anchor("x"),
            value: Node::alias("x"),
        });
        let mut root = Node::Map(map);
        let mut renamed = 0;
        walk_mut(&mut root, &mut |_, role, node| {
            if role == NodeRole::MapKey && node.anchor() == Some("x") {
                node.set_anchor(Some("y".into()));
                renamed += 1;
            }
        });
        assert_eq!(renamed, 1);
        let pair = &root.as_map().unwrap().items[0];
        assert_eq!(pair.key.anchor(), Some("y"));
    }
}
