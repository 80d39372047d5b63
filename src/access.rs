//! Key and index navigation
//!
//! Reads never change the tree: [`Node::get`] returns a detached read-only
//! view on a miss and [`Node::try_get`] returns `None`. Only
//! [`Node::get_or_create`] links new locations into the tree.

use generational_arena::Index;
use tracing::instrument;

use crate::arena::{Content, NodeArena, Snapshot, SnapshotContent};
use crate::errors::StructuralError;
use crate::node::Node;
use crate::types::NodeType;

/// Something that addresses a child: a map key, a sequence index, or a key node.
#[derive(Debug, Clone)]
pub enum Key {
    Name(String),
    Index(usize),
    /// Matches map keys that are structurally equal; a scalar holding a
    /// non-negative integer also addresses a sequence element.
    Node(Node),
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// Negative indices address nothing in a sequence but still name the map
/// key `"-1"`.
impl From<i32> for Key {
    fn from(index: i32) -> Self {
        match usize::try_from(index) {
            Ok(index) => Key::Index(index),
            Err(_) => Key::Name(index.to_string()),
        }
    }
}

impl From<Node> for Key {
    fn from(node: Node) -> Self {
        Key::Node(node)
    }
}

impl From<&Node> for Key {
    fn from(node: &Node) -> Self {
        Key::Node(node.clone())
    }
}

/// A key resolved into something that can be compared against arena slots
/// without borrowing the key's own tree.
enum Target {
    Text(String),
    Index(usize),
    Node(Snapshot),
}

impl Target {
    fn from_key(key: &Key) -> Self {
        match key {
            Key::Name(name) => Target::Text(name.clone()),
            Key::Index(index) => Target::Index(*index),
            Key::Node(node) => Target::Node(node.snapshot()),
        }
    }

    /// Position addressed in a sequence, if any.
    fn sequence_index(&self) -> Option<usize> {
        match self {
            Target::Index(index) => Some(*index),
            Target::Node(Snapshot {
                content: SnapshotContent::Scalar(text),
                ..
            }) => text.parse().ok(),
            _ => None,
        }
    }

    fn matches_key(&self, arena: &NodeArena, key: Index) -> bool {
        match self {
            Target::Text(name) => arena.scalar(key) == Some(name.as_str()),
            Target::Index(index) => arena.scalar(key) == Some(index.to_string().as_str()),
            Target::Node(snapshot) => arena.matches(key, snapshot),
        }
    }

    /// Snapshot to store when this key is linked into a map.
    fn to_snapshot(&self) -> Snapshot {
        match self {
            Target::Text(name) => scalar_snapshot(name.clone()),
            Target::Index(index) => scalar_snapshot(index.to_string()),
            Target::Node(snapshot) => snapshot.clone(),
        }
    }
}

fn scalar_snapshot(text: String) -> Snapshot {
    Snapshot {
        content: SnapshotContent::Scalar(text),
        ..Snapshot::default()
    }
}

/// Position of the matching map entry: the first visible one, else the first
/// placeholder.
fn find_entry(arena: &NodeArena, entries: &[(Index, Index)], target: &Target) -> Option<usize> {
    let mut placeholder = None;
    for (pos, &(key, value)) in entries.iter().enumerate() {
        if target.matches_key(arena, key) {
            if arena.is_visible(value) {
                return Some(pos);
            }
            placeholder.get_or_insert(pos);
        }
    }
    placeholder
}

/// Location addressed by `target` under `container`, without mutating.
fn lookup(arena: &NodeArena, container: Index, target: &Target) -> Option<Index> {
    match arena.content(container)? {
        Content::Sequence(items) => target
            .sequence_index()
            .and_then(|index| items.get(index).copied()),
        Content::Map(entries) => {
            find_entry(arena, entries, target).map(|pos| entries[pos].1)
        }
        _ => None,
    }
}

impl Node {
    /// Child at `key`, or a detached read-only `Undefined` view when absent.
    pub fn get(&self, key: impl Into<Key>) -> Node {
        self.try_get(key).unwrap_or_else(|| self.detached())
    }

    /// Child at `key`, or `None` when absent. Never links anything.
    pub fn try_get(&self, key: impl Into<Key>) -> Option<Node> {
        let container = self.index?;
        let target = Target::from_key(&key.into());
        let found = lookup(&self.tree.borrow(), container, &target)?;
        Some(self.alias(found))
    }

    /// Child at `key`, created as a linked `Undefined` location when absent.
    ///
    /// An `Undefined` or `Null` node becomes a map first. Sequences are only
    /// addressed by existing indices: an out-of-range index yields a detached
    /// view and a diagnostic instead of growing the sequence.
    #[instrument(level = "debug", skip(self, key))]
    pub fn get_or_create(&mut self, key: impl Into<Key>) -> Node {
        const OPERATION: &str = "get_or_create";
        let Some(container) = self.writable(OPERATION) else {
            return self.detached();
        };
        let target = Target::from_key(&key.into());

        let found = self.tree.borrow().node_type(container);
        let result = match found {
            NodeType::Sequence => self.sequence_child(container, &target),
            NodeType::Scalar => Err(StructuralError::InvalidKey {
                operation: OPERATION,
                found,
            }),
            NodeType::Undefined | NodeType::Null => match &target {
                Target::Index(index) => Err(StructuralError::IndexOutOfRange {
                    index: *index,
                    len: 0,
                }),
                _ => self.map_child(container, &target),
            },
            NodeType::Map => self.map_child(container, &target),
        };

        match result {
            Ok(child) => self.alias(child),
            Err(error) => {
                self.fail(OPERATION, error);
                self.detached()
            }
        }
    }

    fn sequence_child(&self, container: Index, target: &Target) -> Result<Index, StructuralError> {
        let arena = self.tree.borrow();
        let Some(Content::Sequence(items)) = arena.content(container) else {
            return Err(StructuralError::Detached {
                operation: "get_or_create",
            });
        };
        let Some(index) = target.sequence_index() else {
            return Err(StructuralError::InvalidKey {
                operation: "get_or_create",
                found: NodeType::Sequence,
            });
        };
        items
            .get(index)
            .copied()
            .ok_or(StructuralError::IndexOutOfRange {
                index,
                len: items.len(),
            })
    }

    /// Existing value location for `target`, or a new placeholder entry.
    fn map_child(&self, container: Index, target: &Target) -> Result<Index, StructuralError> {
        let mut arena = self.tree.borrow_mut();
        // Undefined/Null become an empty map; a map is left as is.
        arena
            .coerce(container, NodeType::Map)
            .map_err(|found| StructuralError::InvalidKey {
                operation: "get_or_create",
                found,
            })?;

        if let Some(Content::Map(entries)) = arena.content(container) {
            if let Some(pos) = find_entry(&arena, entries, target) {
                return Ok(entries[pos].1);
            }
        }

        let key = arena.materialize(&target.to_snapshot());
        let value = arena.insert(Content::Undefined);
        if let Some(Content::Map(entries)) = arena.get_mut(container).map(|s| &mut s.content) {
            entries.push((key, value));
        }
        Ok(value)
    }

    /// Remove the entry at `key`. `false` when nothing was removed.
    ///
    /// Removed locations stay valid for handles that still point at them and
    /// are freed with the last such handle.
    #[instrument(level = "debug", skip(self, key))]
    pub fn remove(&mut self, key: impl Into<Key>) -> bool {
        let Some(container) = self.writable("remove") else {
            return false;
        };
        let target = Target::from_key(&key.into());

        let mut arena = self.tree.borrow_mut();
        let position = match arena.content(container) {
            Some(Content::Sequence(items)) => target
                .sequence_index()
                .filter(|&index| index < items.len()),
            Some(Content::Map(entries)) => find_entry(&arena, entries, &target)
                .filter(|&pos| arena.is_visible(entries[pos].1)),
            _ => None,
        };
        let Some(position) = position else {
            return false;
        };

        let removed = match arena.get_mut(container).map(|slot| &mut slot.content) {
            Some(Content::Sequence(items)) => vec![items.remove(position)],
            Some(Content::Map(entries)) => {
                let (key, value) = entries.remove(position);
                vec![key, value]
            }
            _ => return false,
        };
        for idx in removed {
            arena.detach(idx);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_negative_i32_when_converted_then_becomes_name() {
        assert!(matches!(Key::from(-1), Key::Name(ref n) if n == "-1"));
        assert!(matches!(Key::from(3), Key::Index(3)));
    }

    #[test]
    fn given_scalar_key_node_when_addressing_sequence_then_used_as_index() {
        let mut seq = Node::new();
        seq.push(&"a");
        seq.push(&"b");
        let key = Node::from_value(&1usize);
        assert_eq!(seq.get(&key).as_optional::<String>(), Some("b".to_string()));
    }

    #[test]
    fn given_map_when_addressed_by_index_then_uses_numeric_text_key() {
        let mut map = Node::new();
        map.force_insert(&7, "seven");
        assert_eq!(map.get(7usize).scalar(), "seven");
    }

    #[test]
    fn given_scalar_container_when_adding_map_child_then_error_and_no_entry() {
        let scalar = Node::scalar_node("x");
        let container = scalar.index.expect("root index");

        let result = scalar.map_child(container, &Target::Text("k".to_string()));

        assert!(matches!(
            result,
            Err(StructuralError::InvalidKey { operation: "get_or_create", found: NodeType::Scalar })
        ));
        assert_eq!(scalar.scalar(), "x");
        assert_eq!(scalar.tree.borrow().len(), 1);
    }
}
