//! Ready-made integer aggregations and their lifted update formulas.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainResult, RangeAggregateTree, UpdateMode};

/// Join function of the integer presets.
pub type IntJoin = fn(&i64, &i64) -> i64;

/// Integer tree as built by the presets.
pub type IntTree = RangeAggregateTree<i64, IntJoin>;

/// How sibling aggregates combine.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Min,
    Max,
}

impl Aggregation {
    /// Two-sided identity of [`Aggregation::join`], also used as padding.
    pub fn identity(self) -> i64 {
        match self {
            Aggregation::Sum => 0,
            Aggregation::Min => i64::MAX,
            Aggregation::Max => i64::MIN,
        }
    }

    pub fn join(self) -> IntJoin {
        match self {
            Aggregation::Sum => |a, b| a.wrapping_add(*b),
            Aggregation::Min => |a, b| *a.min(b),
            Aggregation::Max => |a, b| *a.max(b),
        }
    }

    pub fn build(self, values: &[i64]) -> DomainResult<IntTree> {
        RangeAggregateTree::new(values, self.identity(), self.join())
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Sum => write!(f, "sum"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
        }
    }
}

/// Per-element update applied to every index of a range.
///
/// Under [`Aggregation::Sum`] arithmetic wraps on overflow, which keeps range
/// sums consistent modulo 2^64. Under [`Aggregation::Min`] and
/// [`Aggregation::Max`] it saturates at the `i64` bounds: wrapping would break
/// the ordering the aggregates rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add(i64),
    Mul(i64),
    Assign(i64),
    Pow(u32),
}

impl Operation {
    /// Whether the operation can be expressed on a whole-range aggregate
    /// under `aggregation`, i.e. whether it may run lazily.
    pub fn is_liftable(self, aggregation: Aggregation) -> bool {
        match (self, aggregation) {
            (Operation::Pow(_), _) => false,
            // A negative factor swaps the minimum and the maximum.
            (Operation::Mul(k), Aggregation::Min | Aggregation::Max) => k >= 0,
            _ => true,
        }
    }

    /// Pick the mode actually used: lazy requests for non-liftable operations
    /// run eagerly.
    pub fn effective_mode(self, aggregation: Aggregation, requested: UpdateMode) -> UpdateMode {
        if requested.is_lazy() && !self.is_liftable(aggregation) {
            UpdateMode::Eager
        } else {
            requested
        }
    }

    /// Update formula over a node covering `[start, end]`.
    ///
    /// On a leaf this is the plain per-element operation; on larger ranges it
    /// is only meaningful when [`Operation::is_liftable`] holds.
    pub fn lifted(self, aggregation: Aggregation) -> impl Fn(&i64, i64, i64) -> i64 + 'static {
        move |value: &i64, start: i64, end: i64| match aggregation {
            Aggregation::Sum => {
                let width = end - start + 1;
                match self {
                    Operation::Add(k) => value.wrapping_add(k.wrapping_mul(width)),
                    Operation::Mul(k) => value.wrapping_mul(k),
                    Operation::Assign(k) => k.wrapping_mul(width),
                    Operation::Pow(p) => value.wrapping_pow(p),
                }
            }
            // Saturation is monotone, so it commutes with min and max.
            Aggregation::Min | Aggregation::Max => match self {
                Operation::Add(k) => value.saturating_add(k),
                Operation::Mul(k) => value.saturating_mul(k),
                Operation::Assign(k) => k,
                Operation::Pow(p) => value.saturating_pow(p),
            },
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add(k) => write!(f, "add {k}"),
            Operation::Mul(k) => write!(f, "mul {k}"),
            Operation::Assign(k) => write!(f, "set {k}"),
            Operation::Pow(p) => write!(f, "pow {p}"),
        }
    }
}
