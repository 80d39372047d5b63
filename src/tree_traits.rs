//! Human-readable renderings of a node: `Display` gives a compact flow-style
//! line, `get_content` a `termtree` outline. Neither is a serialization
//! format; emitters own that.

use std::fmt;

use itertools::Itertools;
use termtree::Tree;

use crate::config::DumpSettings;
use crate::node::Node;
use crate::types::{NodeType, Style};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for Node {
    fn to_tree_string(&self) -> Tree<String> {
        let settings = self.settings().dump;
        let mut tree = Tree::new(container_label(self, &settings));
        build_tree(self, &settings, 1, &mut tree);
        tree
    }
}

fn container_label(node: &Node, settings: &DumpSettings) -> String {
    let label = match node.node_type() {
        NodeType::Sequence => "<sequence>".to_string(),
        NodeType::Map => "<map>".to_string(),
        _ => return node.to_string(),
    };
    if settings.show_style && node.style() != Style::Default {
        format!("{} ({})", label, node.style())
    } else {
        label
    }
}

fn build_tree(node: &Node, settings: &DumpSettings, depth: usize, parent: &mut Tree<String>) {
    if !matches!(node.node_type(), NodeType::Sequence | NodeType::Map) {
        return;
    }
    if settings.max_depth.is_some_and(|max| depth > max) {
        parent.push(Tree::new("…".to_string()));
        return;
    }
    let is_map = node.is_map();
    for entry in node {
        let prefix = if is_map {
            format!("{}:", entry.key())
        } else {
            format!("[{}]", entry.key())
        };
        let value = entry.value();
        let mut child = Tree::new(format!("{} {}", prefix, container_label(value, settings)));
        build_tree(value, settings, depth + 1, &mut child);
        parent.push(child);
    }
}

impl Node {
    /// Outline of the whole subtree for diagnostics.
    pub fn get_content(&self) -> String {
        self.to_tree_string().to_string()
    }
}

fn write_scalar(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let needs_quotes = text.is_empty()
        || text.starts_with(' ')
        || text.ends_with(' ')
        || text
            .chars()
            .any(|c| matches!(c, ',' | '[' | ']' | '{' | '}' | ':' | '#' | '"' | '\n'));
    if needs_quotes {
        write!(f, "{:?}", text)
    } else {
        f.write_str(text)
    }
}

/// Flow-style one-liner: `{a: 1, b: [x, y]}`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node_type() {
            NodeType::Undefined => f.write_str("<undefined>"),
            NodeType::Null => f.write_str("~"),
            NodeType::Scalar => write_scalar(f, &self.scalar()),
            NodeType::Sequence => write!(
                f,
                "[{}]",
                self.iter().map(|e| e.value().to_string()).join(", ")
            ),
            NodeType::Map => write!(
                f,
                "{{{}}}",
                self.iter()
                    .map(|e| format!("{}: {}", e.key(), e.value()))
                    .join(", ")
            ),
        }
    }
}
