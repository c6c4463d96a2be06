//! Tree service
//!
//! Loads seed nodes and operation batches from JSON files, applies them to a
//! [`TreeStore`], and reports failures through diagnostics.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::diagnostics::{self, Diagnostic};
use crate::application::error_ext::{IoResultExt, JsonResultExt};
use crate::application::grid::{ColumnDef, DefaultColumnDef, GridView};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainResult, Node, NodeId, NodePatch, TreeStore};
use crate::infrastructure::traits::FileSystem;

/// One mutation in a batch file, tagged by `"op"`.
///
/// ```json
/// [{"op": "add", "id": 4, "parent": 1, "label": "D"},
///  {"op": "update", "id": 4, "label": "renamed"},
///  {"op": "remove", "id": 2}]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Add(Node),
    Remove { id: NodeId },
    Update(NodePatch),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Remove,
    Update,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Add => f.write_str("add"),
            OperationKind::Remove => f.write_str("remove"),
            OperationKind::Update => f.write_str("update"),
        }
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Add(_) => OperationKind::Add,
            Operation::Remove { .. } => OperationKind::Remove,
            Operation::Update(_) => OperationKind::Update,
        }
    }

    pub fn id(&self) -> &NodeId {
        match self {
            Operation::Add(node) => &node.id,
            Operation::Remove { id } => id,
            Operation::Update(patch) => &patch.id,
        }
    }
}

/// Result of one operation. `Ok` carries the affected ids
/// (for `remove`: the node and every descendant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub kind: OperationKind,
    pub id: NodeId,
    pub result: DomainResult<Vec<NodeId>>,
}

impl OperationOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Rendered failure, `None` for a successful operation.
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        self.result.as_ref().err().map(diagnostics::describe)
    }
}

/// Service owning one tree instance.
pub struct TreeService {
    fs: Arc<dyn FileSystem>,
    store: TreeStore,
}

impl TreeService {
    /// Create a service over an empty store.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            store: TreeStore::default(),
        }
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    /// Replace the store with the nodes from a JSON seed file.
    ///
    /// Returns the number of loaded nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&mut self, path: &Path) -> ApplicationResult<usize> {
        let nodes = self.read_nodes(path)?;
        self.store = TreeStore::new(nodes)?;
        debug!("load: {} nodes from {}", self.store.len(), path.display());
        Ok(self.store.len())
    }

    /// Read a JSON array of nodes.
    pub fn read_nodes(&self, path: &Path) -> ApplicationResult<Vec<Node>> {
        self.read_json(path, "parse nodes")
    }

    /// Read a JSON array of operations.
    pub fn read_operations(&self, path: &Path) -> ApplicationResult<Vec<Operation>> {
        self.read_json(path, "parse operations")
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path, action: &str) -> ApplicationResult<T> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::InputNotFound(path.to_path_buf()));
        }
        let content = self.fs.read_to_string(path).with_path_context("read", path)?;
        serde_json::from_str(&content).with_path_context(action, path)
    }

    /// Apply one operation; a failure leaves the store unchanged.
    ///
    /// Failures are only traced at debug level. Presenting them is up to the
    /// caller, via [`OperationOutcome::diagnostic`] or [`diagnostics::report`].
    #[instrument(level = "debug", skip(self))]
    pub fn apply(&mut self, operation: Operation) -> OperationOutcome {
        let kind = operation.kind();
        let id = operation.id().clone();

        let result = match operation {
            Operation::Add(node) => self.store.add_item(node).map(|()| vec![id.clone()]),
            Operation::Remove { id } => self.store.remove_item(&id),
            Operation::Update(patch) => self.store.update_item(patch).map(|()| vec![id.clone()]),
        };

        match &result {
            Ok(affected) => debug!("{kind} {id}: {} node(s) affected", affected.len()),
            Err(e) => debug!("{kind} {id}: rejected: {e}"),
        }

        OperationOutcome { kind, id, result }
    }

    /// Apply operations in order. Failed operations do not stop the batch.
    pub fn apply_all(
        &mut self,
        operations: impl IntoIterator<Item = Operation>,
    ) -> Vec<OperationOutcome> {
        operations.into_iter().map(|op| self.apply(op)).collect()
    }

    pub fn grid_view(&self, columns: &[ColumnDef], default_column: DefaultColumnDef) -> GridView {
        GridView::new(&self.store, columns, default_column)
    }
}
