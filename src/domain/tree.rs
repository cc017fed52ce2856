//! Segment tree over a fixed, power-of-two padded index domain.
//!
//! Nodes live in two parallel flat arrays indexed by node id: node `i` has its
//! children at `2i + 1` and `2i + 2`, the root is node `0` and covers
//! `[0, padded_len - 1]`. `aggregates[i]` always reflects the pending operator
//! of node `i` (if any); that operator has not reached the children yet.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, instrument, trace};

use crate::domain::ops::{compose, UpdateFn, UpdateMode};
use crate::domain::{DomainError, DomainResult};

/// Range query / range update tree with an arbitrary associative join.
///
/// Caller contracts (not checked):
/// - `join` is associative,
/// - `default` is a two-sided identity of `join`,
/// - operators passed under [`UpdateMode::Lazy`] lift correctly to range aggregates.
///
/// Breaking one of these yields wrong aggregates, never an error.
pub struct RangeAggregateTree<T, J> {
    len: usize,
    padded_len: usize,
    aggregates: Vec<T>,
    pending: Vec<Option<UpdateFn<T>>>,
    default: T,
    join: J,
}

/// Read-only view of a single node. Obtaining a view never flushes.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a, T> {
    pub id: usize,
    pub start: i64,
    pub end: i64,
    pub aggregate: &'a T,
    pub has_pending: bool,
    /// Left and right child ids, `None` for leaves
    pub children: Option<(usize, usize)>,
}

impl<T> NodeView<'_, T> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

#[inline]
fn left(node: usize) -> usize {
    2 * node + 1
}

#[inline]
fn right(node: usize) -> usize {
    2 * node + 2
}

#[inline]
fn midpoint(start: i64, end: i64) -> i64 {
    start + (end - start) / 2
}

impl<T, J> RangeAggregateTree<T, J>
where
    T: Clone + 'static,
    J: Fn(&T, &T) -> T,
{
    /// Build a tree from `source`, padded with `default` up to the next power of two.
    ///
    /// # Errors
    /// [`DomainError::EmptyDomain`] if `source` is empty.
    pub fn new(source: &[T], default: T, join: J) -> DomainResult<Self> {
        if source.is_empty() {
            return Err(DomainError::EmptyDomain);
        }
        let len = source.len();
        let padded_len = len.next_power_of_two();
        let node_count = 2 * padded_len - 1;
        debug!("new: len={len} padded_len={padded_len} nodes={node_count}");

        let mut tree = Self {
            len,
            padded_len,
            aggregates: vec![default.clone(); node_count],
            pending: vec![None; node_count],
            default,
            join,
        };
        tree.build(0, 0, tree.last_index(), source);
        Ok(tree)
    }

    fn build(&mut self, node: usize, start: i64, end: i64, source: &[T]) {
        if start == end {
            // Padding leaves keep the default they were initialised with.
            if let Some(value) = source.get(start as usize) {
                self.aggregates[node] = value.clone();
            }
            return;
        }
        let mid = midpoint(start, end);
        self.build(left(node), start, mid, source);
        self.build(right(node), mid + 1, end, source);
        self.pull(node);
    }

    /// Logical number of elements, padding excluded.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: an empty domain is rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of leaves including padding (smallest power of two >= `len`).
    pub fn padded_len(&self) -> usize {
        self.padded_len
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    fn last_index(&self) -> i64 {
        self.padded_len as i64 - 1
    }

    /// Join of every element whose index lies in `[left, right] ∩ [0, padded_len - 1]`.
    ///
    /// Windows reaching below zero or past the padding are accepted; the part
    /// outside the domain contributes the default element.
    #[instrument(level = "trace", skip(self))]
    pub fn query_range(&mut self, left: i64, right: i64) -> T {
        self.query_node(0, 0, self.last_index(), left, right)
    }

    fn query_node(&mut self, node: usize, start: i64, end: i64, l: i64, r: i64) -> T {
        self.flush(node, start, end);

        if start > r || end < l {
            return self.default.clone();
        }
        if l <= start && end <= r {
            return self.aggregates[node].clone();
        }

        let mid = midpoint(start, end);
        let lhs = self.query_node(left(node), start, mid, l, r);
        let rhs = self.query_node(right(node), mid + 1, end, l, r);
        (self.join)(&lhs, &rhs)
    }

    pub fn query_point(&mut self, index: i64) -> T {
        self.query_range(index, index)
    }

    /// Current value of every logical element, in index order.
    pub fn values(&mut self) -> Vec<T> {
        (0..self.len as i64).map(|i| self.query_point(i)).collect()
    }

    /// Lazily apply `update` to every element in `[left, right]`.
    pub fn update_range<F>(&mut self, left: i64, right: i64, update: F)
    where
        F: Fn(&T, i64, i64) -> T + 'static,
    {
        self.update_range_with(left, right, update, UpdateMode::Lazy);
    }

    /// Apply `update` to every element in `[left, right]`.
    ///
    /// The window is clamped to the logical domain `[0, len - 1]`, so padding
    /// leaves always keep the default element. An empty intersection is a no-op.
    #[instrument(level = "trace", skip(self, update))]
    pub fn update_range_with<F>(&mut self, left: i64, right: i64, update: F, mode: UpdateMode)
    where
        F: Fn(&T, i64, i64) -> T + 'static,
    {
        let l = left.max(0);
        let r = right.min(self.len as i64 - 1);
        if l > r {
            trace!("update_range_with: [{left}, {right}] misses the domain");
            return;
        }
        let update: UpdateFn<T> = Rc::new(update);
        self.update_node(0, 0, self.last_index(), l, r, &update, mode);
    }

    #[allow(clippy::too_many_arguments)]
    fn update_node(
        &mut self,
        node: usize,
        start: i64,
        end: i64,
        l: i64,
        r: i64,
        update: &UpdateFn<T>,
        mode: UpdateMode,
    ) {
        self.flush(node, start, end);

        if start > r || end < l {
            return;
        }
        if l <= start && end <= r {
            if start == end {
                self.aggregates[node] = update(&self.aggregates[node], start, end);
                return;
            }
            if mode.is_lazy() {
                self.pending[node] = Some(Rc::clone(update));
                self.flush(node, start, end);
                return;
            }
        }

        let mid = midpoint(start, end);
        self.update_node(left(node), start, mid, l, r, update, mode);
        self.update_node(right(node), mid + 1, end, l, r, update, mode);
        self.pull(node);
    }

    /// Apply the pending operator of `node` to its own aggregate and hand it on
    /// to the children, behind whatever they already hold.
    fn flush(&mut self, node: usize, start: i64, end: i64) {
        let Some(op) = self.pending[node].take() else {
            return;
        };
        self.aggregates[node] = op(&self.aggregates[node], start, end);
        if start != end {
            for child in [left(node), right(node)] {
                let queued = match self.pending[child].take() {
                    Some(earlier) => compose(earlier, Rc::clone(&op)),
                    None => Rc::clone(&op),
                };
                self.pending[child] = Some(queued);
            }
        }
    }

    fn pull(&mut self, node: usize) {
        self.aggregates[node] = (self.join)(&self.aggregates[left(node)], &self.aggregates[right(node)]);
    }
}

impl<T, J> RangeAggregateTree<T, J> {
    /// View of node `id`, or `None` past the last node.
    pub fn node(&self, id: usize) -> Option<NodeView<'_, T>> {
        let aggregate = self.aggregates.get(id)?;
        // Depth of node `id` is floor(log2(id + 1)); each level halves the span.
        let depth = usize::BITS - 1 - (id + 1).leading_zeros();
        let span = self.padded_len >> depth;
        let offset = id + 1 - (1usize << depth);
        let start = (offset * span) as i64;
        let end = start + span as i64 - 1;
        let children = (span > 1).then(|| (left(id), right(id)));
        Some(NodeView {
            id,
            start,
            end,
            aggregate,
            has_pending: self.pending[id].is_some(),
            children,
        })
    }

    pub fn root(&self) -> NodeView<'_, T> {
        // The aggregate array always holds at least the root.
        NodeView {
            id: 0,
            start: 0,
            end: self.padded_len as i64 - 1,
            aggregate: &self.aggregates[0],
            has_pending: self.pending[0].is_some(),
            children: (self.padded_len > 1).then_some((left(0), right(0))),
        }
    }
}

impl<T: fmt::Debug, J> fmt::Debug for RangeAggregateTree<T, J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.pending.iter().filter(|p| p.is_some()).count();
        f.debug_struct("RangeAggregateTree")
            .field("len", &self.len)
            .field("padded_len", &self.padded_len)
            .field("aggregates", &self.aggregates)
            .field("pending", &pending)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_tree(values: &[i64]) -> RangeAggregateTree<i64, fn(&i64, &i64) -> i64> {
        let join: fn(&i64, &i64) -> i64 = |a, b| a + b;
        RangeAggregateTree::new(values, 0, join).unwrap()
    }

    #[test]
    fn given_empty_source_when_constructing_then_rejects() {
        let result = RangeAggregateTree::new(&[] as &[i64], 0, |a: &i64, b: &i64| a + b);
        assert!(matches!(result, Err(DomainError::EmptyDomain)));
    }

    #[test]
    fn given_nine_elements_when_constructing_then_pads_to_sixteen() {
        let tree = sum_tree(&[1; 9]);
        assert_eq!(tree.len(), 9);
        assert_eq!(tree.padded_len(), 16);
        assert_eq!(tree.aggregates.len(), 31);
        assert_eq!(tree.aggregates[0], 9);
        // Leaves start at id padded_len - 1; the padding ones hold the default.
        assert!(tree.aggregates[15 + 9..].iter().all(|&v| v == 0));
    }

    #[test]
    fn given_single_element_when_constructing_then_root_is_leaf() {
        let mut tree = sum_tree(&[7]);
        assert_eq!(tree.padded_len(), 1);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.query_range(0, 0), 7);
        assert_eq!(tree.query_range(-3, 3), 7);
    }

    #[test]
    fn given_lazy_update_when_flushing_root_then_children_receive_operator() {
        let mut tree = sum_tree(&[1, 2, 3, 4]);

        tree.update_range(0, 3, |x, _, _| x * 10);

        // Root applied immediately, children still pending.
        assert_eq!(tree.aggregates[0], 100);
        assert!(tree.pending[0].is_none());
        assert!(tree.pending[1].is_some());
        assert!(tree.pending[2].is_some());
        assert_eq!(tree.aggregates[1], 3);
    }

    #[test]
    fn given_two_pending_operators_when_flushing_then_earlier_applies_first() {
        let mut tree = sum_tree(&[1, 1, 1, 1]);

        // Both land on the root and queue up behind each other at the children.
        tree.update_range(0, 3, |x, s, e| x + (e - s + 1));
        tree.update_range(0, 3, |x, _, _| x * 3);

        // (1 + 1) * 3, the reverse order would give 4.
        assert_eq!(tree.values(), vec![6, 6, 6, 6]);
        assert_eq!(tree.query_range(0, 3), 24);
    }

    #[test]
    fn given_pending_leaf_operator_when_visited_then_leaf_is_cleared() {
        let mut tree = sum_tree(&[1, 1, 1, 1]);
        tree.update_range(0, 3, |x, _, _| x + 5);

        let _ = tree.query_point(2);

        // Leaves are node ids 3..=6.
        assert!(tree.pending[5].is_none());
        assert_eq!(tree.aggregates[5], 6);
    }

    #[test]
    fn given_update_past_domain_when_applied_then_padding_keeps_default() {
        let mut tree = sum_tree(&[1; 5]);

        tree.update_range(-10, 100, |x, s, e| x + (e - s + 1));

        assert_eq!(tree.values(), vec![2; 5]);
        assert_eq!(tree.query_range(5, 7), 0);
        assert_eq!(tree.query_range(0, 1000), 10);
    }

    #[test]
    fn given_update_outside_domain_when_applied_then_nothing_changes() {
        let mut tree = sum_tree(&[1, 2, 3]);

        tree.update_range(-5, -1, |x, _, _| x + 100);
        tree.update_range(3, 9, |x, _, _| x + 100);

        assert_eq!(tree.values(), vec![1, 2, 3]);
    }

    #[test]
    fn given_node_ids_when_viewed_then_ranges_match_layout() {
        let tree = sum_tree(&[1, 2, 3, 4, 5]);

        let root = tree.node(0).unwrap();
        assert_eq!((root.start, root.end), (0, 7));
        let right_child = tree.node(2).unwrap();
        assert_eq!((right_child.start, right_child.end), (4, 7));
        assert_eq!(right_child.children, Some((5, 6)));
        let leaf = tree.node(11).unwrap();
        assert_eq!((leaf.start, leaf.end), (4, 4));
        assert_eq!(*leaf.aggregate, 5);
        assert!(leaf.is_leaf());
        assert!(tree.node(15).is_none());
    }
}
