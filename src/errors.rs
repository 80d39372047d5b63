use std::fmt;

use thiserror::Error;

use crate::types::NodeType;

/// Why a node could not be read as a native value.
///
/// Never surfaces through `Node::as_optional` and friends; only `Decode`
/// implementations see it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: NodeType, found: NodeType },

    #[error("cannot read {text:?} as {target}")]
    InvalidScalar { target: &'static str, text: String },

    #[error("{text:?} is out of range for {target}")]
    OutOfRange { target: &'static str, text: String },

    #[error("expected {expected} elements, found {found}")]
    LengthMismatch { expected: usize, found: usize },
}

impl ConversionError {
    pub(crate) fn invalid(target: &'static str, text: &str) -> Self {
        Self::InvalidScalar {
            target,
            text: text.to_string(),
        }
    }

    pub(crate) fn out_of_range(target: &'static str, text: &str) -> Self {
        Self::OutOfRange {
            target,
            text: text.to_string(),
        }
    }
}

pub type ConversionResult<T> = Result<T, ConversionError>;

/// A mutation that could not be applied. The node is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("{operation}: handle is a detached read-only view")]
    Detached { operation: &'static str },

    #[error("{operation}: not applicable to a {found} node")]
    TypeMismatch {
        operation: &'static str,
        found: NodeType,
    },

    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{operation}: key cannot address a {found} node")]
    InvalidKey {
        operation: &'static str,
        found: NodeType,
    },
}

/// Position in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mark {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line + 1, self.column + 1)
    }
}

/// Failure reported by a `DocumentParser`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{mark}: {message}")]
pub struct ParseError {
    pub mark: Mark,
    pub message: String,
}

impl ParseError {
    pub fn new(mark: Mark, message: impl Into<String>) -> Self {
        Self {
            mark,
            message: message.into(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Failure reported by a `DocumentEmitter`.
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("cannot emit a {0} node")]
    Unrepresentable(NodeType),

    #[error("emitter failed: {message}")]
    Failed { message: String },

    #[error("write failed: {0}")]
    Fmt(#[from] fmt::Error),
}

pub type EmitResult<T> = Result<T, EmitError>;
