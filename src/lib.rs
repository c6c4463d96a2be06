//! treegrid: an in-memory tree of labeled nodes for tree-backed data grids.
//!
//! The [`domain::TreeStore`] keeps an identity index and a children index,
//! rejects parent assignments that would create cycles, removes subtrees in
//! one step, and flattens the forest into path-annotated rows.
//!
//! Layers, inner to outer: `domain` (store, no I/O), `application`
//! (services, diagnostics, grid view), `infrastructure` (filesystem seam),
//! `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{DomainError, Node, NodeId, NodePatch, TreeStore};
