//! The `Node` handle
//!
//! A `Node` names one location in a shared tree. Cloning a `Node` clones the
//! handle: both handles alias the same location and see each other's writes.
//! Use [`Node::deep_clone`] for an independent copy.

use std::cell::RefCell;
use std::fmt;
use std::ops::Not;
use std::rc::Rc;

use generational_arena::Index;
use tracing::instrument;

use crate::arena::{structurally_equal, Content, NodeArena, Snapshot};
use crate::config::Settings;
use crate::convert::Encode;
use crate::diagnostics::{self, Diagnostic, Observer};
use crate::errors::StructuralError;
use crate::types::{NodeType, Style};

pub(crate) type TreeRef = Rc<RefCell<NodeArena>>;

/// Handle to a location in a document tree.
///
/// Holding any handle keeps the whole tree alive, and keeps its own location
/// alive after it is removed from the tree. A handle without an index is a
/// detached read-only view: it reads as `Undefined` and every mutation
/// through it is ignored.
pub struct Node {
    pub(crate) tree: TreeRef,
    pub(crate) index: Option<Index>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    /// Empty (`Undefined`) root of a new tree.
    pub fn new() -> Self {
        Self::with_type(NodeType::Undefined)
    }

    /// Empty root of a new tree with the given type.
    pub fn with_type(node_type: NodeType) -> Self {
        Self::root(Settings::default(), Content::empty(node_type))
    }

    /// Empty root of a new tree configured by `settings`.
    pub fn with_settings(settings: Settings) -> Self {
        Self::root(settings, Content::Undefined)
    }

    /// Root of a new tree holding the encoded `value`.
    pub fn from_value<T: Encode + ?Sized>(value: &T) -> Self {
        value.encode()
    }

    /// Root of a new tree holding a single scalar.
    pub fn scalar_node(text: impl Into<String>) -> Self {
        Self::root(Settings::default(), Content::Scalar(text.into()))
    }

    fn root(settings: Settings, content: Content) -> Self {
        let mut arena = NodeArena::new(settings);
        let index = arena.insert(content);
        Self::adopt(arena, index)
    }

    /// First handle into a freshly built arena.
    fn adopt(mut arena: NodeArena, index: Index) -> Self {
        arena.acquire(index);
        Self {
            tree: Rc::new(RefCell::new(arena)),
            index: Some(index),
        }
    }

    pub(crate) fn alias(&self, index: Index) -> Self {
        self.tree.borrow_mut().acquire(index);
        Self {
            tree: Rc::clone(&self.tree),
            index: Some(index),
        }
    }

    /// Read-only view that is not linked into this tree.
    pub(crate) fn detached(&self) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
            index: None,
        }
    }

    // Types ----------------------------------------------------------------------

    pub fn node_type(&self) -> NodeType {
        match self.index {
            Some(idx) => self.tree.borrow().node_type(idx),
            None => NodeType::Undefined,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.node_type() != NodeType::Undefined
    }

    pub fn is_null(&self) -> bool {
        self.node_type() == NodeType::Null
    }

    pub fn is_scalar(&self) -> bool {
        self.node_type() == NodeType::Scalar
    }

    pub fn is_sequence(&self) -> bool {
        self.node_type() == NodeType::Sequence
    }

    pub fn is_map(&self) -> bool {
        self.node_type() == NodeType::Map
    }

    /// `true` iff the node is defined and not null.
    pub fn is_truthy(&self) -> bool {
        !matches!(self.node_type(), NodeType::Undefined | NodeType::Null)
    }

    /// `false` for detached read-only views.
    pub fn is_linked(&self) -> bool {
        self.index.is_some()
    }

    /// Visible children of a sequence or map, 0 otherwise.
    pub fn size(&self) -> usize {
        match self.index {
            Some(idx) => self.tree.borrow().size(idx),
            None => 0,
        }
    }

    // Style ----------------------------------------------------------------------

    pub fn style(&self) -> Style {
        self.index
            .and_then(|idx| self.tree.borrow().get(idx).map(|slot| slot.style))
            .unwrap_or_default()
    }

    pub fn set_style(&mut self, style: Style) -> bool {
        let Some(idx) = self.writable("set_style") else {
            return false;
        };
        if let Some(slot) = self.tree.borrow_mut().get_mut(idx) {
            slot.style = style;
        }
        true
    }

    // Identity -------------------------------------------------------------------

    /// `true` when both handles name the same tree location.
    ///
    /// Detached views are not locations and are never identical to anything.
    pub fn is(&self, other: &Node) -> bool {
        match (self.index, other.index) {
            (Some(a), Some(b)) => a == b && Rc::ptr_eq(&self.tree, &other.tree),
            _ => false,
        }
    }

    // Assignment -----------------------------------------------------------------

    /// Overwrite this location with the encoded `value`. Aliases see the change.
    pub fn set<T: Encode + ?Sized>(&mut self, value: &T) -> bool {
        let snapshot = value.encode().snapshot();
        self.overwrite("set", &snapshot)
    }

    /// Overwrite this location with a value copy of `other`'s content.
    pub fn assign(&mut self, other: &Node) -> bool {
        let snapshot = other.snapshot();
        self.overwrite("assign", &snapshot)
    }

    /// Clear this location to `Undefined`.
    pub fn reset(&mut self) -> bool {
        self.overwrite("reset", &Snapshot::default())
    }

    /// Overwrite this location with `other`'s content, keeping this identity.
    pub fn reset_to(&mut self, other: &Node) -> bool {
        let snapshot = other.snapshot();
        self.overwrite("reset", &snapshot)
    }

    /// Independent copy of this subtree in a new tree with the same settings.
    pub fn deep_clone(&self) -> Node {
        let snapshot = self.snapshot();
        let mut arena = NodeArena::new(self.settings());
        let index = arena.materialize(&snapshot);
        Self::adopt(arena, index)
    }

    #[instrument(level = "debug", skip(self, snapshot))]
    fn overwrite(&mut self, operation: &'static str, snapshot: &Snapshot) -> bool {
        let Some(idx) = self.writable(operation) else {
            return false;
        };
        self.tree.borrow_mut().overwrite(idx, snapshot)
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        match self.index {
            Some(idx) => self.tree.borrow().snapshot(idx),
            None => Snapshot::default(),
        }
    }

    // Tree-wide state ------------------------------------------------------------

    pub fn settings(&self) -> Settings {
        self.tree.borrow().settings.clone()
    }

    /// Install a callback receiving every ignored mutation in this tree.
    pub fn set_observer(&self, observer: impl Fn(&Diagnostic) + 'static) {
        let previous = self.tree.borrow_mut().observer.replace(Rc::new(observer));
        // dropped after the borrow: a captured handle releases itself on drop
        drop(previous);
    }

    pub fn clear_observer(&self) {
        let previous = self.tree.borrow_mut().observer.take();
        drop(previous);
    }

    /// Index of a location that may be mutated, or a recorded failure.
    pub(crate) fn writable(&self, operation: &'static str) -> Option<Index> {
        match self.index {
            Some(idx) if self.tree.borrow().get(idx).is_some() => Some(idx),
            _ => {
                self.fail(operation, StructuralError::Detached { operation });
                None
            }
        }
    }

    /// Report an ignored mutation. No tree borrow is held while the observer runs.
    pub(crate) fn fail(&self, operation: &'static str, error: StructuralError) {
        let (level, observer): (_, Option<Observer>) = {
            let arena = self.tree.borrow();
            (arena.settings.diagnostics, arena.observer.clone())
        };
        diagnostics::record(level, observer.as_ref(), Diagnostic { operation, error });
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        match self.index {
            Some(idx) => self.alias(idx),
            None => self.detached(),
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if let Some(idx) = self.index {
            if let Ok(mut arena) = self.tree.try_borrow_mut() {
                arena.release(idx);
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let left = self.tree.borrow();
        let right = other.tree.borrow();
        structurally_equal(&left, self.index, &right, other.index)
    }
}

impl Not for &Node {
    type Output = bool;

    fn not(self) -> bool {
        !self.is_truthy()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("index", &self.index)
            .field("type", &self.node_type())
            .field("content", &format_args!("{}", self))
            .finish()
    }
}
