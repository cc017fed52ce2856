/*
Renders the implicit node layout for inspection. Kept outside the domain so the
tree itself stays free of display dependencies.
 */
use std::fmt::Display;

use termtree::Tree;
use tracing::instrument;

use crate::domain::{NodeView, RangeAggregateTree};

pub trait TreeRender {
    fn to_tree_string(&self) -> Tree<String>;
}

fn label<T: Display>(node: &NodeView<'_, T>) -> String {
    let marker = if node.has_pending { " *" } else { "" };
    if node.start == node.end {
        format!("[{}] = {}{}", node.start, node.aggregate, marker)
    } else {
        format!("[{}..={}] = {}{}", node.start, node.end, node.aggregate, marker)
    }
}

impl<T: Display, J> TreeRender for RangeAggregateTree<T, J> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        fn build<T: Display, J>(tree: &RangeAggregateTree<T, J>, node: NodeView<'_, T>) -> Tree<String> {
            let mut out = Tree::new(label(&node));
            if let Some((lhs, rhs)) = node.children {
                for child in [lhs, rhs].into_iter().filter_map(|id| tree.node(id)) {
                    out.push(build(tree, child));
                }
            }
            out
        }

        build(self, self.root())
    }
}
