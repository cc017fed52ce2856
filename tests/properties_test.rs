//! Property tests: the tree agrees with a plain per-element model

use proptest::prelude::*;

use rangetree::application::{Aggregation, Operation};
use rangetree::UpdateMode;

/// Reference model: a vector updated one element at a time.
struct Model {
    aggregation: Aggregation,
    values: Vec<i64>,
}

impl Model {
    fn update(&mut self, left: i64, right: i64, op: Operation) {
        let f = op.lifted(self.aggregation);
        let lo = left.max(0);
        let hi = right.min(self.values.len() as i64 - 1);
        for i in lo..=hi {
            let idx = i as usize;
            self.values[idx] = f(&self.values[idx], i, i);
        }
    }

    fn query(&self, left: i64, right: i64) -> i64 {
        let join = self.aggregation.join();
        let lo = left.max(0);
        let hi = right.min(self.values.len() as i64 - 1);
        (lo..=hi).fold(self.aggregation.identity(), |acc, i| {
            join(&acc, &self.values[i as usize])
        })
    }
}

fn aggregation() -> impl Strategy<Value = Aggregation> {
    prop_oneof![
        Just(Aggregation::Sum),
        Just(Aggregation::Min),
        Just(Aggregation::Max)
    ]
}

/// Wrapping arithmetic keeps sums liftable, so anything goes.
fn sum_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (-5i64..=5).prop_map(Operation::Add),
        (-3i64..=3).prop_map(Operation::Mul),
        (-9i64..=9).prop_map(Operation::Assign),
        (0u32..=3).prop_map(Operation::Pow),
    ]
}

/// Min/max saturate, so factors and offsets may push values past the `i64`
/// bounds; negative factors and powers take the forced-eager path.
fn ordered_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (-5i64..=5).prop_map(Operation::Add),
        prop_oneof![Just(i64::MAX), Just(i64::MIN), Just(i64::MAX / 2)].prop_map(Operation::Add),
        (-3i64..=3).prop_map(Operation::Mul),
        (i64::MAX / 4..=i64::MAX).prop_map(Operation::Mul),
        (-9i64..=9).prop_map(Operation::Assign),
        (0u32..=4).prop_map(Operation::Pow),
    ]
}

/// Mostly small values with some close to the `i64` bounds.
fn element() -> impl Strategy<Value = i64> {
    prop_oneof![
        4 => -20i64..20,
        1 => (i64::MAX - 8)..=i64::MAX,
        1 => i64::MIN..=(i64::MIN + 8),
    ]
}

fn operation_for(aggregation: Aggregation) -> BoxedStrategy<Operation> {
    match aggregation {
        Aggregation::Sum => sum_operation().boxed(),
        _ => ordered_operation().boxed(),
    }
}

/// (update left, update right, operation, lazy requested, query left, query right)
type Step = (i64, i64, Operation, bool, i64, i64);

fn scenario() -> impl Strategy<Value = (Aggregation, Vec<i64>, Vec<Step>)> {
    aggregation().prop_flat_map(|aggregation| {
        let step = (
            -4i64..40,
            -4i64..40,
            operation_for(aggregation),
            any::<bool>(),
            -4i64..40,
            -4i64..40,
        );
        (
            Just(aggregation),
            prop::collection::vec(element(), 1..33),
            prop::collection::vec(step, 0..25),
        )
    })
}

proptest! {
    #[test]
    fn fresh_tree_folds_source_and_returns_points(values in prop::collection::vec(-1000i64..1000, 1..64)) {
        let mut tree = Aggregation::Sum.build(&values).unwrap();

        prop_assert_eq!(tree.query_range(0, values.len() as i64 - 1), values.iter().sum::<i64>());
        for (i, v) in values.iter().enumerate() {
            prop_assert_eq!(tree.query_point(i as i64), *v);
        }
    }

    #[test]
    fn window_outside_padded_domain_returns_default(
        values in prop::collection::vec(-1000i64..1000, 1..64),
        agg in aggregation(),
        width in 0i64..50,
        beyond in 0i64..1000,
    ) {
        let mut tree = agg.build(&values).unwrap();
        let padded = tree.padded_len() as i64;

        prop_assert_eq!(tree.query_range(-1 - width - beyond, -1 - beyond), agg.identity());
        prop_assert_eq!(tree.query_range(padded + beyond, padded + beyond + width), agg.identity());
    }

    #[test]
    fn lazy_and_eager_agree_for_liftable_updates(
        (agg, values, steps) in scenario(),
    ) {
        let mut lazy = agg.build(&values).unwrap();
        let mut eager = agg.build(&values).unwrap();

        for (l, r, op, _, _, _) in steps {
            let mode = op.effective_mode(agg, UpdateMode::Lazy);
            lazy.update_range_with(l, r, op.lifted(agg), mode);
            eager.update_range_with(l, r, op.lifted(agg), UpdateMode::Eager);
        }

        prop_assert_eq!(lazy.values(), eager.values());
    }

    #[test]
    fn tree_matches_per_element_model(
        (agg, values, steps) in scenario(),
    ) {
        let mut tree = agg.build(&values).unwrap();
        let mut model = Model { aggregation: agg, values: values.clone() };

        for (l, r, op, lazy, ql, qr) in steps {
            let requested = if lazy { UpdateMode::Lazy } else { UpdateMode::Eager };
            tree.update_range_with(l, r, op.lifted(agg), op.effective_mode(agg, requested));
            model.update(l, r, op);

            prop_assert_eq!(tree.query_range(ql, qr), model.query(ql, qr));
        }

        prop_assert_eq!(tree.values(), model.values);
    }

    #[test]
    fn repeated_reads_are_idempotent(
        (agg, values, steps) in scenario(),
        ql in -4i64..40,
        qr in -4i64..40,
    ) {
        let mut tree = agg.build(&values).unwrap();
        for (l, r, op, _, _, _) in steps {
            tree.update_range_with(l, r, op.lifted(agg), op.effective_mode(agg, UpdateMode::Lazy));
        }

        let first = tree.query_range(ql, qr);
        let whole = tree.query_range(i64::MIN, i64::MAX);
        prop_assert_eq!(tree.query_range(ql, qr), first);
        prop_assert_eq!(tree.query_range(i64::MIN, i64::MAX), whole);
    }

    #[test]
    fn concat_join_preserves_order(words in prop::collection::vec("[a-z]{0,3}", 1..20), l in -2i64..25, r in -2i64..25) {
        let mut tree = rangetree::RangeAggregateTree::new(&words, String::new(), |a: &String, b: &String| format!("{a}{b}")).unwrap();

        let lo = l.max(0) as usize;
        let hi = (r.min(words.len() as i64 - 1)).max(-1);
        let expected: String = if (lo as i64) > hi {
            String::new()
        } else {
            words[lo..=hi as usize].concat()
        };
        prop_assert_eq!(tree.query_range(l, r), expected);
    }
}
