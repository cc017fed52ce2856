//! Generic segment tree with lazy range updates.
//!
//! The [`domain`] layer holds [`RangeAggregateTree`], a range query / range
//! update structure over an arbitrary associative join. The [`application`]
//! layer adds integer presets, a small script language and a session service
//! on top of it; [`cli`] exposes those as the `rangetree` binary.
//!
//! ```
//! use rangetree::RangeAggregateTree;
//!
//! let mut tree = RangeAggregateTree::new(&[1i64; 9], 0, |a: &i64, b: &i64| a + b)?;
//! tree.update_range(0, 2, |x, start, end| x + (end - start + 1));
//! assert_eq!(tree.query_range(0, 9), 12);
//! # Ok::<(), rangetree::DomainError>(())
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

pub use domain::{DomainError, DomainResult, RangeAggregateTree, UpdateMode};
