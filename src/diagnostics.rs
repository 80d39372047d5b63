//! Diagnostic events for absorbed structural failures
//!
//! Mutations never return `Err`. When one cannot be applied the node stays
//! unchanged, the call reports `false`, and a [`Diagnostic`] is handed to the
//! observer installed on the tree (if any) and recorded through `tracing`.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::errors::StructuralError;

/// A structural failure absorbed by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Public operation that failed, e.g. `"push"`
    pub operation: &'static str,
    pub error: StructuralError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ignored: {}", self.operation, self.error)
    }
}

/// Per-tree callback receiving diagnostics.
pub type Observer = Rc<dyn Fn(&Diagnostic)>;

/// `tracing` level used when recording absorbed failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Off,
    Debug,
    #[default]
    Warn,
}

pub(crate) fn record(level: DiagnosticLevel, observer: Option<&Observer>, diagnostic: Diagnostic) {
    match level {
        DiagnosticLevel::Off => {}
        DiagnosticLevel::Debug => {
            tracing::debug!(operation = diagnostic.operation, "{}", diagnostic.error)
        }
        DiagnosticLevel::Warn => {
            tracing::warn!(operation = diagnostic.operation, "{}", diagnostic.error)
        }
    }
    if let Some(observer) = observer {
        observer(&diagnostic);
    }
}
