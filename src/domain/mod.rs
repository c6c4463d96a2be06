//! Domain layer: the node store and its queries
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).
//! Failures are returned as [`DomainError`] values and never logged here.

pub mod error;
pub mod node;
pub mod render;
pub mod store;
mod traversal;

pub use error::{DomainError, DomainResult, ErrorKind};
pub use node::{Node, NodeId, NodePatch};
pub use render::{node_title, ToTermTree};
pub use store::TreeStore;
