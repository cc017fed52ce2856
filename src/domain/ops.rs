//! Update operators and their chronological composition.

use std::fmt;
use std::rc::Rc;

/// A range update operator.
///
/// Receives the current aggregate of a node and the inclusive domain range
/// `[start, end]` that node covers, and returns the aggregate as if the
/// per-element update had been applied to every element of that range.
/// Shared via `Rc` so one operator can wait in several pending slots.
pub type UpdateFn<T> = Rc<dyn Fn(&T, i64, i64) -> T>;

/// How `update_range_with` descends into fully covered subtrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UpdateMode {
    /// Stop at the highest fully covered node and defer the operator to its
    /// children. Only correct for operators that lift to whole-range aggregates.
    #[default]
    Lazy,
    /// Always descend to the leaves and rebuild parents with the join function.
    /// Required for operators that cannot be lifted (e.g. raising to a power
    /// under sum aggregation).
    Eager,
}

impl UpdateMode {
    pub fn is_lazy(self) -> bool {
        matches!(self, UpdateMode::Lazy)
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateMode::Lazy => write!(f, "lazy"),
            UpdateMode::Eager => write!(f, "eager"),
        }
    }
}

/// Compose two operators in issue order: `first` takes effect, then `then`
/// is applied to its result. Both see the same `[start, end]`.
pub fn compose<T: 'static>(first: UpdateFn<T>, then: UpdateFn<T>) -> UpdateFn<T> {
    Rc::new(move |value: &T, start: i64, end: i64| then(&first(value, start, end), start, end))
}
