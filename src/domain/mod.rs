//! Domain layer: the range aggregate tree and its operator types
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod ops;
pub mod tree;

pub use error::{DomainError, DomainResult};
pub use ops::{compose, UpdateFn, UpdateMode};
pub use tree::{NodeView, RangeAggregateTree};
