//! In-memory node tree for YAML-like documents.
//!
//! A [`Node`] is a handle to a location in a shared tree holding one of
//! Undefined, Null, a Scalar, a Sequence or a Map. Handles alias: cloning
//! one gives a second name for the same location. Values move in and out of
//! nodes through the [`Encode`]/[`Decode`] conversion registry, and failed
//! conversions or mutations are reported as `None`/`false`, never as panics.
//!
//! ```ignore
//! let mut doc = Node::new();
//! doc.get_or_create("server").get_or_create("port").set(&8080);
//! assert!(doc.is_map());
//! assert_eq!(doc.get("server").get("port").as_optional::<u16>(), Some(8080));
//! ```

pub mod access;
mod arena;
pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod errors;
pub mod iter;
mod mutation;
pub mod node;
pub mod traits;
pub mod tree_traits;
pub mod types;
pub mod util;

pub use access::Key;
pub use config::Settings;
pub use convert::{Decode, Encode};
pub use diagnostics::{Diagnostic, DiagnosticLevel};
pub use errors::{ConversionError, EmitError, Mark, ParseError, StructuralError};
pub use iter::{Entry, Iter};
pub use node::Node;
pub use traits::{DocumentEmitter, DocumentParser};
pub use tree_traits::TreeNodeConvert;
pub use types::{NodeType, Style};
