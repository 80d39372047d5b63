use generational_arena::Index;
use tracing::instrument;

use crate::arena::{Content, NodeArena};
use crate::convert::Encode;
use crate::errors::StructuralError;
use crate::node::Node;
use crate::types::NodeType;

impl Node {
    /// Append a value copy of `element`, turning an `Undefined`/`Null` node
    /// into a sequence first.
    ///
    /// Scalars and maps are left untouched and `false` is returned.
    pub fn push<T: Encode + ?Sized>(&mut self, element: &T) -> bool {
        let snapshot = element.encode().snapshot();
        self.append("push", NodeType::Sequence, |arena, idx| {
            let item = arena.materialize(&snapshot);
            if let Some(Content::Sequence(items)) = arena.get_mut(idx).map(|s| &mut s.content) {
                items.push(item);
            }
        })
    }

    /// Append `key: value` to a map, turning an `Undefined`/`Null` node into
    /// a map first.
    ///
    /// Unlike `get_or_create`, an existing equal key is not reused: both
    /// entries are kept.
    pub fn force_insert<K, V>(&mut self, key: &K, value: &V) -> bool
    where
        K: Encode + ?Sized,
        V: Encode + ?Sized,
    {
        let key = key.encode().snapshot();
        let value = value.encode().snapshot();
        self.append("force_insert", NodeType::Map, |arena, idx| {
            let entry = (arena.materialize(&key), arena.materialize(&value));
            if let Some(Content::Map(entries)) = arena.get_mut(idx).map(|s| &mut s.content) {
                entries.push(entry);
            }
        })
    }

    #[instrument(level = "debug", skip(self, link))]
    fn append(
        &mut self,
        operation: &'static str,
        container: NodeType,
        link: impl FnOnce(&mut NodeArena, Index),
    ) -> bool {
        let Some(idx) = self.writable(operation) else {
            return false;
        };

        let coerced = self.tree.borrow_mut().coerce(idx, container);
        if let Err(found) = coerced {
            self.fail(operation, StructuralError::TypeMismatch { operation, found });
            return false;
        }

        link(&mut self.tree.borrow_mut(), idx);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Style;

    #[test]
    fn given_undefined_node_when_pushing_then_becomes_sequence() {
        let mut node = Node::new();
        assert!(node.push(&1));
        assert!(node.push("two"));
        assert!(node.is_sequence());
        assert_eq!(node.size(), 2);
        assert_eq!(node.get(1usize).scalar(), "two");
    }

    #[test]
    fn given_scalar_when_pushing_then_unchanged() {
        let mut node = Node::scalar_node("x");
        assert!(!node.push(&1));
        assert_eq!(node.scalar(), "x");
    }

    #[test]
    fn given_sequence_when_force_inserting_then_rejected() {
        let mut node = Node::from_value(&vec![1]);
        assert!(!node.force_insert("a", &1));
        assert_eq!(node.size(), 1);
        assert!(node.is_sequence());
    }

    #[test]
    fn given_pushed_node_when_source_changes_then_copy_is_unaffected() {
        let mut source = Node::from_value(&5);
        let mut seq = Node::new();
        seq.push(&source);
        source.set(&6);
        assert_eq!(seq.get(0usize).as_optional::<i32>(), Some(5));
    }

    #[test]
    fn given_node_pushed_into_itself_when_done_then_copy_is_previous_content() {
        let mut seq = Node::new();
        seq.push(&1);
        let alias = seq.clone();
        seq.push(&alias);
        assert_eq!(seq.size(), 2);
        assert_eq!(seq.get(1usize).as_optional::<Vec<i32>>(), Some(vec![1]));
    }

    #[test]
    fn given_styled_source_when_pushed_then_style_is_copied() {
        let mut inner = Node::from_value(&vec![1, 2]);
        inner.set_style(Style::Flow);
        let mut outer = Node::new();
        outer.push(&inner);
        assert_eq!(outer.get(0usize).style(), Style::Flow);
    }
}
