//! Errors reported by the derived operations of `PhpArray`.

use thiserror::Error;

/// Failure of a rebuilding operation. Lookups and removals never fail; they
/// report a miss as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    /// Two stored values have no defined order (mixed kinds, NaN).
    #[error("stored values have no total order")]
    NotComparable,
    /// A value cannot be turned into a key by `array_flip`.
    #[error("value stored under key {key:?} cannot be used as a key")]
    TypeMismatch { key: String },
}
