//! Collaborator boundary traits
//!
//! Text parsing and emission live outside this crate. These traits describe
//! what the node model expects from them, so hosts can plug in any YAML
//! front/back end and tests can use small fakes.

use crate::errors::{EmitResult, ParseResult};
use crate::node::Node;

/// Turns source text into a fully formed tree.
pub trait DocumentParser {
    /// Parse one document. Failures carry a source location.
    fn parse(&self, source: &str) -> ParseResult<Node>;
}

/// Turns a tree into text.
///
/// Implementations walk the tree with [`Node::iter`], read leaves with
/// [`Node::scalar`] and honor [`Node::style`] for layout. Unlike mutations on
/// the tree, emission failures are hard errors for the caller.
pub trait DocumentEmitter {
    fn emit(&self, root: &Node) -> EmitResult<String>;
}

impl<T: DocumentParser + ?Sized> DocumentParser for &T {
    fn parse(&self, source: &str) -> ParseResult<Node> {
        (**self).parse(source)
    }
}

impl<T: DocumentEmitter + ?Sized> DocumentEmitter for &T {
    fn emit(&self, root: &Node) -> EmitResult<String> {
        (**self).emit(root)
    }
}
