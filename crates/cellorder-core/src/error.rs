//! Error types for the fractional-index algebra and rebalance planner.

use thiserror::Error;

/// Result type for index-algebra operations.
pub type Result<T> = std::result::Result<T, AlgebraError>;

/// Errors raised by [`crate::index`] and [`crate::rebalance`].
///
/// Per the propagation policy: `EmptyInterval` is a value callers with
/// rebalancing context must catch; `InvalidRange` is a programming error
/// that should be surfaced, not caught; `InvalidCharacter` is surfaced
/// unchanged; `OrderingViolationPostOp` indicates a planner bug.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlgebraError {
    /// No string exists strictly between `a` and `b` in the alphabet.
    #[error("no index exists strictly between {0:?} and {1:?}")]
    EmptyInterval(String, String),

    /// `a >= b` with both finite.
    #[error("invalid range: {0:?} is not less than {1:?}")]
    InvalidRange(String, String),

    /// A character outside the base-36 alphabet was supplied.
    #[error("invalid base-36 character: {0:?}")]
    InvalidCharacter(char),

    /// `validateOrder` failed on a rebalance result; indicates a planner bug.
    #[error("rebalance produced a sequence that is not strictly increasing")]
    OrderingViolationPostOp,
}
