//! Presentation of store failures.
//!
//! The store returns [`DomainError`] values and stays silent. This module
//! decides how loud each failure is and emits it as a tracing event.

use std::fmt;

use serde::Serialize;
use tracing::{error, warn};

use crate::domain::{DomainError, ErrorKind, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A rendered failure, ready for logs or terminal output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub ids: Vec<NodeId>,
    pub message: String,
}

/// Missing and duplicate ids are routine; a rejected cycle is an error.
pub fn severity(err: &DomainError) -> Severity {
    match err.kind() {
        ErrorKind::CycleDetected => Severity::Error,
        ErrorKind::DuplicateId | ErrorKind::NotFound => Severity::Warning,
    }
}

pub fn describe(err: &DomainError) -> Diagnostic {
    Diagnostic {
        severity: severity(err),
        kind: err.kind(),
        ids: err.ids().into_iter().cloned().collect(),
        message: err.to_string(),
    }
}

/// Log the failure at its severity and hand back the rendered diagnostic.
pub fn report(err: &DomainError) -> Diagnostic {
    let diagnostic = describe(err);
    match diagnostic.severity {
        Severity::Warning => warn!(kind = ?diagnostic.kind, "{}", diagnostic.message),
        Severity::Error => error!(kind = ?diagnostic.kind, "{}", diagnostic.message),
    }
    diagnostic
}
