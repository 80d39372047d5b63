//! Public vocabulary shared with parsers and emitters

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of content held by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Nothing assigned yet (distinct from an explicit null)
    Undefined,
    /// Explicit empty value
    Null,
    /// Single textual payload
    Scalar,
    /// Ordered list of nodes
    Sequence,
    /// Ordered list of key/value node pairs
    Map,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Undefined => "undefined",
            NodeType::Null => "null",
            NodeType::Scalar => "scalar",
            NodeType::Sequence => "sequence",
            NodeType::Map => "map",
        };
        f.write_str(name)
    }
}

/// Layout hint for emitters. Has no effect on content, type or conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Let the emitter decide
    #[default]
    Default,
    /// Expanded, one entry per line
    Block,
    /// Compact, `[a, b]` / `{a: b}`
    Flow,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Style::Default => "default",
            Style::Block => "block",
            Style::Flow => "flow",
        };
        f.write_str(name)
    }
}
