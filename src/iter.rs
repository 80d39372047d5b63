//! One iteration protocol for sequences and maps
//!
//! Every step yields an [`Entry`] with a key and a value. For maps the key is
//! the entry's key node; for sequences it is a fresh scalar holding the
//! zero-based position, so both container kinds read the same way:
//!
//! ```ignore
//! for entry in &node {
//!     println!("{} = {}", entry.key(), entry.value());
//! }
//! ```

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::arena::Content;
use crate::node::{Node, TreeRef};

/// Key/value pair produced by [`Iter`].
///
/// Dereferences to the value, so `entry.as_optional::<i32>()` reads the value
/// directly. The entry owns both handles; nothing outlives it.
#[derive(Debug, Clone)]
pub struct Entry {
    key: Node,
    value: Node,
}

impl Entry {
    pub fn key(&self) -> &Node {
        &self.key
    }

    pub fn value(&self) -> &Node {
        &self.value
    }

    pub fn into_pair(self) -> (Node, Node) {
        (self.key, self.value)
    }
}

impl Deref for Entry {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.value
    }
}

impl DerefMut for Entry {
    fn deref_mut(&mut self) -> &mut Node {
        &mut self.value
    }
}

impl From<Entry> for Node {
    fn from(entry: Entry) -> Self {
        entry.value
    }
}

/// Forward, single-pass cursor over the children of a sequence or map.
///
/// Children are read from the tree at every step. Changing the shape of the
/// container while iterating is not detected; the cursor never reads past
/// the current end. The cursor holds a handle, so the container outlives it.
pub struct Iter {
    container: Node,
    /// Raw offset into the child list, placeholders included
    offset: usize,
    /// Running count of yielded entries, used as the sequence key
    position: usize,
}

impl Iter {
    pub(crate) fn new(node: &Node) -> Self {
        Self {
            container: node.clone(),
            offset: 0,
            position: 0,
        }
    }

    /// Number of entries yielded so far.
    pub fn position(&self) -> usize {
        self.position
    }

    fn tree(&self) -> &TreeRef {
        &self.container.tree
    }
}

impl Iterator for Iter {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        let container = self.container.index?;
        loop {
            let arena = self.container.tree.borrow();
            match arena.content(container)? {
                Content::Sequence(items) => {
                    let item = *items.get(self.offset)?;
                    drop(arena);
                    self.offset += 1;
                    let key = Node::from_value(&self.position);
                    self.position += 1;
                    return Some(Entry {
                        key,
                        value: self.container.alias(item),
                    });
                }
                Content::Map(entries) => {
                    let (key, value) = *entries.get(self.offset)?;
                    let visible = arena.is_visible(value);
                    drop(arena);
                    self.offset += 1;
                    if !visible {
                        continue;
                    }
                    self.position += 1;
                    return Some(Entry {
                        key: self.container.alias(key),
                        value: self.container.alias(value),
                    });
                }
                _ => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let Some(idx) = self.container.index else {
            return (0, Some(0));
        };
        let remaining = match self.tree().borrow().content(idx) {
            Some(Content::Sequence(items)) => items.len().saturating_sub(self.offset),
            Some(Content::Map(entries)) => entries.len().saturating_sub(self.offset),
            _ => 0,
        };
        (0, Some(remaining))
    }
}

/// Cursors are equal when they point at the same place in the same
/// container, whatever the content there is now.
impl PartialEq for Iter {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self.tree(), other.tree())
            && self.container.index == other.container.index
            && self.offset == other.offset
    }
}

impl Node {
    /// Iterate over the children. Non-containers yield nothing.
    pub fn iter(&self) -> Iter {
        Iter::new(self)
    }
}

impl IntoIterator for &Node {
    type Item = Entry;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        self.iter()
    }
}
