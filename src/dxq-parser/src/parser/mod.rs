//! Parser implementation for filter strings
//!
//! The parser works on the token stream produced by [`crate::lexer`] and
//! builds the AST by precedence climbing. Placeholder names are collected
//! on the way.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::ast::Node;
use crate::error::{ParseError, Result};
use crate::lexer::{tokenize, Token};

mod cursor;
mod expressions;

use cursor::TokenCursor;

/// Query shapes that are not filters and are passed through untouched
static UNSUPPORTED_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\bSELECT\b.*\bFROM\b|\bJOIN\b").expect("unsupported-shape pattern is valid")
});

/// Single-quoted literals, with `''` escapes
static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'(?:[^']|'')*'?").expect("string literal pattern is valid"));

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting depth of expressions, parentheses and function calls
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: dxq_shared::constants::DEFAULT_MAX_DEPTH,
        }
    }
}

/// The result of parsing a filter string
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedFilter {
    /// Root of the expression tree
    pub ast: Node,
    /// Placeholder names, de-duplicated, in first-occurrence order
    pub variables: Vec<String>,
}

/// Main parser for filter expressions
#[derive(Debug, Clone, Default)]
pub struct FilterParser {
    options: ParseOptions,
}

impl FilterParser {
    /// Create a new parser with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with explicit options
    #[must_use]
    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    /// The options this parser was built with
    #[must_use]
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Parse a filter string.
    ///
    /// Returns `Ok(None)` when the input looks like a whole query rather than
    /// a filter (see [`is_unsupported_shape`]).
    pub fn parse(&self, input: &str) -> Result<Option<ParsedFilter>> {
        self.parse_with_variables(input, &[])
    }

    /// Parse a filter string, seeding the variable list with names that are
    /// already known (for example from the canonicalizer).
    pub fn parse_with_variables(
        &self,
        input: &str,
        known_variables: &[String],
    ) -> Result<Option<ParsedFilter>> {
        if is_unsupported_shape(input) {
            log::debug!("input is a query, not a filter; passing through");
            return Ok(None);
        }

        let tokens = tokenize(input)?;
        self.parse_tokens(&tokens, known_variables).map(Some)
    }

    /// Parse an already tokenized filter
    pub fn parse_tokens(&self, tokens: &[Token], known_variables: &[String]) -> Result<ParsedFilter> {
        if tokens.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let mut cursor = TokenCursor::new(tokens, self.options.max_depth, known_variables);
        let ast = cursor.parse_expression(0)?;

        if let Some(token) = cursor.peek() {
            return Err(ParseError::UnexpectedToken {
                found: token.text.clone(),
                position: token.position,
            });
        }

        let variables = cursor.into_variables();
        log::debug!("parsed filter with variables {:?}", variables);
        Ok(ParsedFilter { ast, variables })
    }
}

/// Does the input look like a full query (`SELECT ... FROM`, `JOIN`)?
#[must_use]
pub fn is_unsupported_shape(input: &str) -> bool {
    // keywords inside string literals are data
    let outside_literals = STRING_LITERAL.replace_all(input, "''");
    UNSUPPORTED_SHAPE.is_match(&outside_literals)
}
