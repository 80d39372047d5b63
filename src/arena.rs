use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::config::Settings;
use crate::diagnostics::Observer;
use crate::types::{NodeType, Style};

/// Payload of one tree location. Children are indices into the same arena.
#[derive(Debug, Clone, Default)]
pub(crate) enum Content {
    #[default]
    Undefined,
    Null,
    Scalar(String),
    Sequence(Vec<Index>),
    /// Keys are not unique once `force_insert` has been used
    Map(Vec<(Index, Index)>),
}

impl Content {
    pub(crate) fn empty(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Undefined => Content::Undefined,
            NodeType::Null => Content::Null,
            NodeType::Scalar => Content::Scalar(String::new()),
            NodeType::Sequence => Content::Sequence(Vec::new()),
            NodeType::Map => Content::Map(Vec::new()),
        }
    }

    pub(crate) fn node_type(&self) -> NodeType {
        match self {
            Content::Undefined => NodeType::Undefined,
            Content::Null => NodeType::Null,
            Content::Scalar(_) => NodeType::Scalar,
            Content::Sequence(_) => NodeType::Sequence,
            Content::Map(_) => NodeType::Map,
        }
    }

    /// Direct children, map keys included.
    fn children(&self) -> Vec<Index> {
        match self {
            Content::Sequence(items) => items.clone(),
            Content::Map(entries) => entries.iter().flat_map(|&(k, v)| [k, v]).collect(),
            _ => Vec::new(),
        }
    }
}

/// Tree location in the arena.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) content: Content,
    pub(crate) style: Style,
    /// Live `Node` handles naming this slot
    handles: usize,
    /// Linked under a parent, or the root of the tree
    attached: bool,
}

/// Owned copy of a subtree, detached from any arena.
///
/// Copies between locations go through a snapshot so the source borrow is
/// released before the destination is written, which also makes copying a
/// node into its own descendant safe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Snapshot {
    pub(crate) content: SnapshotContent,
    pub(crate) style: Style,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum SnapshotContent {
    #[default]
    Undefined,
    Null,
    Scalar(String),
    Sequence(Vec<Snapshot>),
    Map(Vec<(Snapshot, Snapshot)>),
}

/// Arena-backed storage for one document tree.
///
/// A slot is freed once it is neither attached to the tree nor named by a
/// handle. A location removed from its parent stays valid while handles
/// still point at it and goes away with the last of them.
pub(crate) struct NodeArena {
    slots: Arena<Slot>,
    pub(crate) settings: Settings,
    pub(crate) observer: Option<Observer>,
}

impl NodeArena {
    pub(crate) fn new(settings: Settings) -> Self {
        Self {
            slots: Arena::new(),
            settings,
            observer: None,
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub(crate) fn insert(&mut self, content: Content) -> Index {
        self.slots.insert(Slot {
            content,
            style: Style::Default,
            handles: 0,
            attached: true,
        })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Count a new handle naming `idx`.
    pub(crate) fn acquire(&mut self, idx: Index) {
        if let Some(slot) = self.slots.get_mut(idx) {
            slot.handles += 1;
        }
    }

    /// Forget a handle naming `idx`; frees the slot if it was the last one
    /// into a detached subtree.
    pub(crate) fn release(&mut self, idx: Index) {
        let Some(slot) = self.slots.get_mut(idx) else {
            return;
        };
        slot.handles = slot.handles.saturating_sub(1);
        if slot.handles == 0 && !slot.attached {
            self.free(idx);
        }
    }

    /// Unlink `idx` from its parent. Without handles it is freed at once.
    pub(crate) fn detach(&mut self, idx: Index) {
        let Some(slot) = self.slots.get_mut(idx) else {
            return;
        };
        slot.attached = false;
        if slot.handles == 0 {
            self.free(idx);
        }
    }

    #[instrument(level = "trace", skip(self))]
    fn free(&mut self, idx: Index) {
        if let Some(slot) = self.slots.remove(idx) {
            for child in slot.content.children() {
                self.detach(child);
            }
        }
    }

    pub(crate) fn get(&self, idx: Index) -> Option<&Slot> {
        self.slots.get(idx)
    }

    pub(crate) fn get_mut(&mut self, idx: Index) -> Option<&mut Slot> {
        self.slots.get_mut(idx)
    }

    pub(crate) fn content(&self, idx: Index) -> Option<&Content> {
        self.get(idx).map(|slot| &slot.content)
    }

    pub(crate) fn node_type(&self, idx: Index) -> NodeType {
        self.content(idx)
            .map(Content::node_type)
            .unwrap_or(NodeType::Undefined)
    }

    /// Map entries whose value was never assigned are placeholders and do
    /// not count as content.
    pub(crate) fn is_visible(&self, value: Index) -> bool {
        self.node_type(value) != NodeType::Undefined
    }

    pub(crate) fn scalar(&self, idx: Index) -> Option<&str> {
        match self.content(idx) {
            Some(Content::Scalar(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Number of visible children.
    pub(crate) fn size(&self, idx: Index) -> usize {
        match self.content(idx) {
            Some(Content::Sequence(items)) => items.len(),
            Some(Content::Map(entries)) => entries
                .iter()
                .filter(|(_, value)| self.is_visible(*value))
                .count(),
            _ => 0,
        }
    }

    /// Turn an Undefined/Null slot into an empty container of `node_type`.
    ///
    /// Returns the type found when the slot already holds something else.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn coerce(&mut self, idx: Index, node_type: NodeType) -> Result<(), NodeType> {
        let default_style = self.settings.default_style;
        let slot = self.slots.get_mut(idx).ok_or(NodeType::Undefined)?;
        let found = slot.content.node_type();
        if found == node_type {
            return Ok(());
        }
        match found {
            NodeType::Undefined | NodeType::Null => {
                slot.content = Content::empty(node_type);
                if slot.style == Style::Default {
                    slot.style = default_style;
                }
                Ok(())
            }
            other => Err(other),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub(crate) fn snapshot(&self, idx: Index) -> Snapshot {
        let Some(slot) = self.get(idx) else {
            return Snapshot::default();
        };
        let content = match &slot.content {
            Content::Undefined => SnapshotContent::Undefined,
            Content::Null => SnapshotContent::Null,
            Content::Scalar(text) => SnapshotContent::Scalar(text.clone()),
            Content::Sequence(items) => {
                SnapshotContent::Sequence(items.iter().map(|&item| self.snapshot(item)).collect())
            }
            Content::Map(entries) => SnapshotContent::Map(
                entries
                    .iter()
                    .filter(|(_, value)| self.is_visible(*value))
                    .map(|&(key, value)| (self.snapshot(key), self.snapshot(value)))
                    .collect(),
            ),
        };
        Snapshot {
            content,
            style: slot.style,
        }
    }

    /// Allocate fresh slots for a snapshot and return the new subtree root.
    #[instrument(level = "trace", skip(self, snapshot))]
    pub(crate) fn materialize(&mut self, snapshot: &Snapshot) -> Index {
        let content = self.materialize_content(&snapshot.content);
        let idx = self.insert(content);
        if let Some(slot) = self.get_mut(idx) {
            slot.style = snapshot.style;
        }
        idx
    }

    fn materialize_content(&mut self, content: &SnapshotContent) -> Content {
        match content {
            SnapshotContent::Undefined => Content::Undefined,
            SnapshotContent::Null => Content::Null,
            SnapshotContent::Scalar(text) => Content::Scalar(text.clone()),
            SnapshotContent::Sequence(items) => {
                Content::Sequence(items.iter().map(|item| self.materialize(item)).collect())
            }
            SnapshotContent::Map(entries) => Content::Map(
                entries
                    .iter()
                    .map(|(key, value)| (self.materialize(key), self.materialize(value)))
                    .collect(),
            ),
        }
    }

    /// Replace the content and style of `idx` in place, keeping its identity.
    #[instrument(level = "debug", skip(self, snapshot))]
    pub(crate) fn overwrite(&mut self, idx: Index, snapshot: &Snapshot) -> bool {
        if self.get(idx).is_none() {
            return false;
        }
        let content = self.materialize_content(&snapshot.content);
        let Some(slot) = self.get_mut(idx) else {
            return false;
        };
        let displaced = std::mem::replace(&mut slot.content, content);
        slot.style = snapshot.style;
        for child in displaced.children() {
            self.detach(child);
        }
        true
    }

    /// Structural comparison of a slot against a snapshot (style ignored).
    pub(crate) fn matches(&self, idx: Index, snapshot: &Snapshot) -> bool {
        match (self.content(idx), &snapshot.content) {
            (None | Some(Content::Undefined), SnapshotContent::Undefined) => true,
            (Some(Content::Null), SnapshotContent::Null) => true,
            (Some(Content::Scalar(a)), SnapshotContent::Scalar(b)) => a == b,
            (Some(Content::Sequence(items)), SnapshotContent::Sequence(others)) => {
                items.len() == others.len()
                    && items
                        .iter()
                        .zip(others)
                        .all(|(&item, other)| self.matches(item, other))
            }
            (Some(Content::Map(entries)), SnapshotContent::Map(others)) => {
                let mut visible = entries.iter().filter(|(_, value)| self.is_visible(*value));
                let mut others = others.iter();
                loop {
                    match (visible.next(), others.next()) {
                        (None, None) => return true,
                        (Some(&(key, value)), Some((other_key, other_value))) => {
                            if !self.matches(key, other_key) || !self.matches(value, other_value) {
                                return false;
                            }
                        }
                        _ => return false,
                    }
                }
            }
            _ => false,
        }
    }
}

/// Structural equality of two locations, possibly in different arenas.
pub(crate) fn structurally_equal(
    left: &NodeArena,
    left_idx: Option<Index>,
    right: &NodeArena,
    right_idx: Option<Index>,
) -> bool {
    let lhs = left_idx.and_then(|idx| left.content(idx));
    let rhs = right_idx.and_then(|idx| right.content(idx));
    match (lhs, rhs) {
        (None | Some(Content::Undefined), None | Some(Content::Undefined)) => true,
        (Some(Content::Null), Some(Content::Null)) => true,
        (Some(Content::Scalar(a)), Some(Content::Scalar(b))) => a == b,
        (Some(Content::Sequence(a)), Some(Content::Sequence(b))) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(&x, &y)| structurally_equal(left, Some(x), right, Some(y)))
        }
        (Some(Content::Map(a)), Some(Content::Map(b))) => {
            let a: Vec<_> = a.iter().filter(|(_, v)| left.is_visible(*v)).collect();
            let b: Vec<_> = b.iter().filter(|(_, v)| right.is_visible(*v)).collect();
            a.len() == b.len()
                && a.iter().zip(&b).all(|(&&(ka, va), &&(kb, vb))| {
                    structurally_equal(left, Some(ka), right, Some(kb))
                        && structurally_equal(left, Some(va), right, Some(vb))
                })
        }
        _ => false,
    }
}
