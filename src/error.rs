//! Crate-wide error type.
//!
//! Missing data is never an error in this engine: it's a [`Cell`](crate::Cell)
//! variant that flows through every combinator. `Error` only covers the
//! handful of conditions that are recoverable at a collaborator boundary
//! (a reducer built with bad parameters, a builder whose inputs don't line
//! up). Out-of-range row access, and other violations of a contract a
//! caller controls directly, panic instead. See the reducer and index
//! modules for where those asserts live.

use thiserror::Error as ThisError;

/// Convenient alias, defaulting to [`Error`] as the `Err` variant.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error variants returned by this crate.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("quantile reducer requires at least one probability")]
    EmptyQuantiles,

    #[error("quantile probability must be within [0, 1], got {0}")]
    InvalidQuantile(f64),

    #[error("builder inputs have mismatched lengths: left={left} right={right}")]
    MismatchedLengths { left: usize, right: usize },
}
