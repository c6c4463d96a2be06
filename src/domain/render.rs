/*
termtree rendering for the store.

One termtree per root, children in the same order the grid export uses.
 */
use termtree::Tree;

use crate::domain::node::Node;
use crate::domain::store::TreeStore;

pub trait ToTermTree {
    fn to_term_trees(&self) -> Vec<Tree<String>>;
}

impl ToTermTree for TreeStore {
    fn to_term_trees(&self) -> Vec<Tree<String>> {
        fn build(store: &TreeStore, node: &Node) -> Tree<String> {
            let leaves: Vec<_> = store
                .children_of(&node.id)
                .map(|child| build(store, child))
                .collect();
            Tree::new(node_title(node)).with_leaves(leaves)
        }

        self.roots().map(|root| build(self, root)).collect()
    }
}

pub fn node_title(node: &Node) -> String {
    format!("{} [{}]", node.label, node.id)
}
