//! Parser and emitter collaborators exercised through small fakes.

use std::fmt::Write as _;

use yamlnode::errors::{EmitResult, ParseResult};
use yamlnode::util::testing;
use yamlnode::{
    DocumentEmitter, DocumentParser, EmitError, Mark, Node, NodeType, ParseError, Style,
};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

/// Reads `key: value` lines into a flat map. Values `~` become Null and
/// `[a, b]` becomes a flow sequence.
struct LineParser;

impl DocumentParser for LineParser {
    fn parse(&self, source: &str) -> ParseResult<Node> {
        let mut root = Node::with_type(NodeType::Map);
        for (line, text) in source.lines().enumerate() {
            if text.trim().is_empty() {
                continue;
            }
            let Some((key, value)) = text.split_once(':') else {
                return Err(ParseError::new(
                    Mark { line, column: text.len() },
                    "expected ':'",
                ));
            };
            let value = value.trim();
            let mut child = Node::new();
            if value == "~" {
                child = Node::with_type(NodeType::Null);
            } else if let Some(items) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                for item in items.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    child.push(item);
                }
                child.set_style(Style::Flow);
            } else {
                child.set(value);
            }
            root.force_insert(key.trim(), &child);
        }
        Ok(root)
    }
}

/// Emits block maps and honors flow style on sequences.
struct BlockEmitter;

impl BlockEmitter {
    fn emit_value(&self, node: &Node, out: &mut String) -> EmitResult<()> {
        match node.node_type() {
            NodeType::Undefined => return Err(EmitError::Unrepresentable(NodeType::Undefined)),
            NodeType::Null => out.push('~'),
            NodeType::Scalar => out.push_str(&node.scalar()),
            NodeType::Sequence if node.style() == Style::Flow => {
                let items: Vec<String> = node.iter().map(|e| e.scalar()).collect();
                write!(out, "[{}]", items.join(", "))?;
            }
            NodeType::Sequence => {
                for entry in node {
                    write!(out, "\n  - {}", entry.scalar())?;
                }
            }
            NodeType::Map => {
                return Err(EmitError::Failed {
                    message: "nested maps are not supported".to_string(),
                })
            }
        }
        Ok(())
    }
}

impl DocumentEmitter for BlockEmitter {
    fn emit(&self, root: &Node) -> EmitResult<String> {
        let mut out = String::new();
        for entry in root {
            write!(out, "{}: ", entry.key().scalar())?;
            self.emit_value(entry.value(), &mut out)?;
            out.push('\n');
        }
        Ok(out)
    }
}

#[test]
fn given_document_when_parsed_then_tree_matches_source() {
    let root = LineParser
        .parse("name: demo\nempty: ~\ntags: [a, b]\n")
        .expect("parse");

    assert_eq!(root.get("name").scalar(), "demo");
    assert!(root.get("empty").is_null());
    assert_eq!(
        root.get("tags").as_optional::<Vec<String>>(),
        Some(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(root.get("tags").style(), Style::Flow);
}

#[test]
fn given_malformed_line_when_parsed_then_error_carries_mark() {
    let err = LineParser.parse("ok: 1\nbroken\n").expect_err("must fail");

    assert_eq!(err.mark, Mark { line: 1, column: 6 });
    assert_eq!(err.to_string(), "line 2, column 7: expected ':'");
}

#[test]
fn given_parsed_tree_when_emitted_then_style_decides_layout() {
    let mut root = LineParser.parse("tags: [a, b]\n").expect("parse");
    let emitter = BlockEmitter;

    assert_eq!(emitter.emit(&root).expect("emit"), "tags: [a, b]\n");

    root.get_or_create("tags").set_style(Style::Block);
    assert_eq!(emitter.emit(&root).expect("emit"), "tags: \n  - a\n  - b\n");
}

#[test]
fn given_unrepresentable_tree_when_emitted_then_error() {
    let mut root = Node::new();
    root.get_or_create("inner").get_or_create("x").set(&1);

    let err = (&BlockEmitter).emit(&root).expect_err("must fail");

    assert!(matches!(err, EmitError::Failed { .. }));
}
