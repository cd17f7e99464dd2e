//! Error types for query compilation

use thiserror::Error;

use super::pattern::Alphabet;

/// Result type alias for query compilation
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors raised while turning a query string into a search tree.
///
/// Searching never fails; only compilation does.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Malformed query text
    #[error("invalid query at offset {offset}: {msg}")]
    Syntax {
        /// Byte offset into the query where parsing stopped
        offset: usize,
        /// What was expected
        msg: &'static str,
    },

    /// Literal exceeds the capacity of its alphabet
    #[error("{alphabet} pattern of {len} bases exceeds the maximum of {max}")]
    PatternTooLong {
        /// Literal length in bases
        len: usize,
        /// Maximum for the alphabet
        max: usize,
        /// Alphabet the literal was compiled under
        alphabet: Alphabet,
    },

    /// Character outside the requested alphabet
    #[error("'{base}' at offset {offset} is not a {alphabet} base")]
    InvalidBase {
        /// Offending character
        base: char,
        /// Offset within the literal
        offset: usize,
        /// Alphabet the literal was compiled under
        alphabet: Alphabet,
    },

    /// Query nests deeper than the parser is willing to recurse
    #[error("query nesting exceeds {max} levels")]
    NestingTooDeep {
        /// Recursion limit
        max: usize,
    },
}
