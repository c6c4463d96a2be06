//! Read-only queries over a [`TreeStore`]: ancestor and descendant walks,
//! and the pre-order flatten used by grid front ends.

use tracing::instrument;

use crate::domain::node::{Node, NodeId};
use crate::domain::store::TreeStore;

impl TreeStore {
    /// Every transitive descendant of `id`.
    ///
    /// Order is unspecified; only membership is guaranteed.
    #[instrument(level = "trace", skip(self))]
    pub fn get_all_children(&self, id: &NodeId) -> Vec<Node> {
        self.descendants(id).into_iter().cloned().collect()
    }

    /// The node itself followed by its ancestors, child to root.
    ///
    /// Stops at a root or at a parent id that is not in the store.
    /// Empty when `id` is unknown.
    #[instrument(level = "trace", skip(self))]
    pub fn get_all_parents(&self, id: &NodeId) -> Vec<Node> {
        self.ancestors(id).into_iter().cloned().collect()
    }

    /// Root-first ids from the top of the chain down to `id`.
    pub fn get_path(&self, id: &NodeId) -> Vec<NodeId> {
        self.ancestors(id)
            .into_iter()
            .rev()
            .map(|node| node.id.clone())
            .collect()
    }

    /// Nodes without an existing parent, in insertion order.
    ///
    /// A node whose parent id is not in the store counts as a root here.
    pub fn get_roots(&self) -> Vec<Node> {
        self.roots().cloned().collect()
    }

    /// Flatten the forest in pre-order, attaching the root-to-node path.
    ///
    /// Roots come in insertion order, children in children-index order.
    #[instrument(level = "trace", skip(self))]
    pub fn get_tree_data_for_grid(&self) -> Vec<Node> {
        let mut rows = Vec::with_capacity(self.len());
        let mut trail: Vec<NodeId> = Vec::new();

        let roots: Vec<&Node> = self.roots().collect();
        let mut stack: Vec<(&Node, usize)> = roots.into_iter().rev().map(|n| (n, 0)).collect();

        while let Some((node, depth)) = stack.pop() {
            trail.truncate(depth);
            trail.push(node.id.clone());

            rows.push(Node {
                path: Some(trail.clone()),
                ..node.clone()
            });

            // Push children in reverse order for left-to-right traversal
            let children: Vec<&Node> = self.children_of(&node.id).collect();
            for child in children.into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        rows
    }

    pub(super) fn roots(&self) -> impl Iterator<Item = &Node> + '_ {
        self.get_all().filter(move |node| match &node.parent {
            Some(parent) => !self.contains(parent),
            None => true,
        })
    }

    pub(super) fn descendants(&self, id: &NodeId) -> Vec<&Node> {
        let mut result = Vec::new();
        let mut stack: Vec<&Node> = self.children_of(id).collect();

        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children_of(&current.id));
        }

        result
    }

    fn ancestors(&self, id: &NodeId) -> Vec<&Node> {
        let mut result = Vec::new();
        let mut current = self.get_item(id);

        while let Some(node) = current {
            result.push(node);
            current = node.parent.as_ref().and_then(|parent| self.get_item(parent));
        }

        result
    }
}
