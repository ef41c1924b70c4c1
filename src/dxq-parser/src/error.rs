//! Error types for the dxq lexer and parser

use thiserror::Error;

/// The lexer could not recognise any token at `position`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unexpected input at position {position}: '{remaining}'")]
pub struct LexError {
    /// The unmatched remainder of the input
    pub remaining: String,
    /// Byte offset of the remainder in the input
    pub position: usize,
}

/// Errors that can occur during parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Tokenization failed
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Nothing but whitespace was supplied
    #[error("Empty input")]
    EmptyInput,

    /// Input ended where a value or expression was required
    #[error("Unexpected end of input")]
    UnexpectedEnd,

    /// A token appeared where it cannot be used
    #[error("Unexpected token '{found}' at position {position}")]
    UnexpectedToken {
        /// The unexpected token text
        found: String,
        /// Position in the input
        position: usize,
    },

    /// An opening parenthesis was never closed
    #[error("Missing closing parenthesis for '(' at position {position}")]
    MissingParen {
        /// Position of the unmatched opening parenthesis
        position: usize,
    },

    /// `BETWEEN low` was not followed by `AND high`
    #[error("Expected AND after BETWEEN at position {position}")]
    MissingBetweenAnd {
        /// Position where `AND` was expected
        position: usize,
    },

    /// `IN`, `NOT IN` or a function name was not followed by `(`
    #[error("Expected ( after {after} at position {position}")]
    ExpectedOpenParen {
        /// The construct that requires a parenthesized list
        after: String,
        /// Position where `(` was expected
        position: usize,
    },

    /// Two bare field references were compared with each other
    #[error("Invalid comparison: {left} {operator} {right}")]
    InvalidComparison {
        /// Left field name
        left: String,
        /// Comparison operator symbol
        operator: String,
        /// Right field name
        right: String,
    },

    /// A function other than `ISNULL` was called
    #[error("Unsupported function '{name}' at position {position}")]
    UnsupportedFunction {
        /// The function name as written
        name: String,
        /// Position in the input
        position: usize,
    },

    /// A function was called with too few arguments
    #[error("{name} expects at least {expected} arguments, found {found}")]
    TooFewArguments {
        /// Function name
        name: String,
        /// Minimum number of arguments
        expected: usize,
        /// Number of arguments supplied
        found: usize,
    },

    /// Nesting exceeded the configured maximum depth
    #[error("Expression nesting exceeds the maximum depth of {max_depth}")]
    TooDeep {
        /// The configured limit
        max_depth: usize,
    },
}

/// Result type for parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;
