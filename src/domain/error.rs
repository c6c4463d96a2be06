//! Domain-level errors (no external dependencies)

use serde::Serialize;
use thiserror::Error;

use crate::domain::node::NodeId;

/// Recoverable outcomes of store mutations.
///
/// A failed call leaves the store exactly as it was before.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node with id={0} already exists")]
    DuplicateId(NodeId),

    #[error("assigning parent {parent} to node {id} would create a cyclic dependency")]
    CycleDetected { id: NodeId, parent: NodeId },

    #[error("node with id={0} not found")]
    NotFound(NodeId),
}

/// Failure kind without payload, for matching and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DuplicateId,
    CycleDetected,
    NotFound,
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::DuplicateId(_) => ErrorKind::DuplicateId,
            DomainError::CycleDetected { .. } => ErrorKind::CycleDetected,
            DomainError::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// The offending ids: the node, plus the rejected parent for cycles.
    pub fn ids(&self) -> Vec<&NodeId> {
        match self {
            DomainError::DuplicateId(id) | DomainError::NotFound(id) => vec![id],
            DomainError::CycleDetected { id, parent } => vec![id, parent],
        }
    }
}

/// Result type for store operations.
pub type DomainResult<T> = Result<T, DomainError>;
