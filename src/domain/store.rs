//! Arena-backed node store with identity and children indices.

use std::collections::{HashMap, HashSet};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{Node, NodeId, NodePatch};

/// In-memory tree of labeled nodes.
///
/// Nodes live in a generational arena. The identity index maps each
/// [`NodeId`] to its arena slot, `order` keeps insertion order for
/// deterministic iteration, and the children index caches the direct
/// children of every parent id. The children index is derived state: it is
/// rebuilt from the identity index after every structural change.
///
/// Invariants after every successful call:
/// - ids are unique
/// - the parent relation is acyclic
/// - `children[p]` holds exactly the nodes whose `parent == p`, in insertion order
#[derive(Debug, Clone, Default)]
pub struct TreeStore {
    arena: Arena<Node>,
    index: HashMap<NodeId, Index>,
    order: Vec<Index>,
    children: HashMap<NodeId, Vec<Index>>,
}

impl TreeStore {
    /// Build a store from an initial node list.
    ///
    /// Parents may appear after their children in the list. Duplicate ids and
    /// cyclic parent chains are rejected.
    #[instrument(level = "trace", skip(nodes))]
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> DomainResult<Self> {
        let mut store = Self::default();
        for node in nodes {
            if store.index.contains_key(&node.id) {
                return Err(DomainError::DuplicateId(node.id));
            }
            store.insert(node);
        }
        store.ensure_acyclic()?;
        store.rebuild_children();
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Borrowed view of every stored node, in insertion order.
    pub fn get_all(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().filter_map(move |&idx| self.arena.get(idx))
    }

    pub fn get_item(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).and_then(|&idx| self.arena.get(idx))
    }

    /// Direct children of `id`, cloned out of the store.
    pub fn get_children(&self, id: &NodeId) -> Vec<Node> {
        self.children_of(id).cloned().collect()
    }

    pub(super) fn children_of<'a>(&'a self, id: &NodeId) -> impl Iterator<Item = &'a Node> + 'a {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(move |&idx| self.arena.get(idx))
    }

    /// Whether assigning `new_parent` to `id` would make `id` its own ancestor.
    ///
    /// Walks up from `new_parent` until a root or a missing link.
    #[instrument(level = "trace", skip(self))]
    pub fn would_create_cycle(&self, id: &NodeId, new_parent: Option<&NodeId>) -> bool {
        let Some(mut current) = new_parent else {
            return false;
        };
        loop {
            if current == id {
                return true;
            }
            match self.get_item(current).and_then(|node| node.parent.as_ref()) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    #[instrument(level = "trace", skip(self), fields(id = %node.id))]
    pub fn add_item(&mut self, node: Node) -> DomainResult<()> {
        if self.index.contains_key(&node.id) {
            return Err(DomainError::DuplicateId(node.id));
        }
        if let Some(parent) = &node.parent {
            if self.would_create_cycle(&node.id, Some(parent)) {
                return Err(DomainError::CycleDetected {
                    id: node.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        self.insert(node);
        self.rebuild_children();
        Ok(())
    }

    /// Remove `id` together with all of its descendants.
    ///
    /// Returns the removed ids, `id` first.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_item(&mut self, id: &NodeId) -> DomainResult<Vec<NodeId>> {
        if !self.contains(id) {
            return Err(DomainError::NotFound(id.clone()));
        }

        let mut removed = vec![id.clone()];
        removed.extend(self.descendants(id).into_iter().map(|node| node.id.clone()));

        for doomed in &removed {
            if let Some(idx) = self.index.remove(doomed) {
                self.arena.remove(idx);
            }
        }
        let arena = &self.arena;
        self.order.retain(|&idx| arena.contains(idx));
        self.rebuild_children();

        Ok(removed)
    }

    /// Merge the supplied fields onto an existing node.
    ///
    /// The children index is only rebuilt when the parent actually changes.
    #[instrument(level = "trace", skip(self), fields(id = %patch.id))]
    pub fn update_item(&mut self, patch: NodePatch) -> DomainResult<()> {
        let Some(&idx) = self.index.get(&patch.id) else {
            return Err(DomainError::NotFound(patch.id));
        };
        if let Some(Some(parent)) = &patch.parent {
            if self.would_create_cycle(&patch.id, Some(parent)) {
                return Err(DomainError::CycleDetected {
                    id: patch.id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        let parent_changed = match self.arena.get_mut(idx) {
            Some(node) => node.merge(patch),
            None => return Err(DomainError::NotFound(patch.id)),
        };
        if parent_changed {
            self.rebuild_children();
        }
        Ok(())
    }

    fn insert(&mut self, mut node: Node) {
        node.path = None;
        let id = node.id.clone();
        let idx = self.arena.insert(node);
        self.index.insert(id, idx);
        self.order.push(idx);
    }

    fn rebuild_children(&mut self) {
        self.children.clear();
        for &idx in &self.order {
            if let Some(parent) = self.arena.get(idx).and_then(|node| node.parent.as_ref()) {
                self.children.entry(parent.clone()).or_default().push(idx);
            }
        }
    }

    /// Reject parent chains that revisit a node.
    fn ensure_acyclic(&self) -> DomainResult<()> {
        let mut cleared: HashSet<&NodeId> = HashSet::new();
        for node in self.get_all() {
            let mut trail: HashSet<&NodeId> = HashSet::new();
            let mut current = node;
            loop {
                if cleared.contains(&current.id) {
                    break;
                }
                if !trail.insert(&current.id) {
                    return Err(DomainError::CycleDetected {
                        id: current.id.clone(),
                        parent: current.parent.clone().unwrap_or_else(|| current.id.clone()),
                    });
                }
                match current.parent.as_ref().and_then(|parent| self.get_item(parent)) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
            cleared.extend(trail);
        }
        Ok(())
    }
}
