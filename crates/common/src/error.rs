//! Parse errors for textual tag representations.

use thiserror::Error;

/// Errors that occur while parsing a tag from its bit-string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagParseError {
    /// The string does not hold exactly one digit per tag bit.
    #[error("invalid tag length: {got} (expected {expected} bits)")]
    InvalidLength { expected: usize, got: usize },

    /// A character other than `0` or `1`.
    #[error("invalid tag digit {digit:?} at position {at}")]
    InvalidDigit { digit: char, at: usize },
}
