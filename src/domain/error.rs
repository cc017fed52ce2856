//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violated construction preconditions.
///
/// Out-of-range query and update windows are not errors: they degrade to the
/// default element or to a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("cannot build a range tree over an empty sequence")]
    EmptyDomain,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
