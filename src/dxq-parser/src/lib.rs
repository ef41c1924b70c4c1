//! dxq-parser: Parser for SQL WHERE-style filter strings
//!
//! This crate turns a restricted SQL `WHERE` dialect into an abstract syntax
//! tree. Filter strings may carry deferred placeholders (`{Entity.Attribute}`)
//! which are collected while parsing and resolved later by `dxq-filter`.
//!
//! # Features
//!
//! - **Canonicalizer**: rewrites positional `{0} | [Entity.Attr]` bindings into inline placeholders
//! - **Lexer**: a nom-based tokenizer with case-insensitive, whole-word keywords
//! - **Precedence Climbing**: `OR` < `AND` < comparisons, left-associative
//! - **Variable Collection**: placeholder names in first-occurrence order, de-duplicated
//! - **Bounded Recursion**: nesting depth is limited by [`ParseOptions::max_depth`]
//!
//! # Quick Start
//!
//! ```rust
//! use dxq_parser::{FilterParser, Node};
//!
//! let parser = FilterParser::new();
//! let parsed = parser
//!     .parse("CompanyID = {Company.ID} AND Amount > 100")?
//!     .expect("plain filters are supported");
//!
//! assert_eq!(parsed.variables, vec!["Company.ID".to_string()]);
//! assert!(matches!(parsed.ast, Node::Logical { .. }));
//! # Ok::<(), dxq_parser::ParseError>(())
//! ```
//!
//! # Supported Syntax
//!
//! - **Comparisons**: `=`, `<>`, `!=`, `>`, `>=`, `<`, `<=`
//! - **Null checks**: `IS NULL`, `IS NOT NULL`
//! - **Sets and ranges**: `IN (...)`, `NOT IN (...)`, `BETWEEN low AND high`
//! - **Pattern matching**: `LIKE`, `NOT LIKE`
//! - **Null coalescing**: `ISNULL(expr, default)`
//! - **Grouping**: parentheses, `AND`, `OR`
//!
//! Inputs shaped like a full query (`SELECT ... FROM`, `JOIN`) are not
//! filters; [`FilterParser::parse`] returns `Ok(None)` for them.
//!
//! # Error Handling
//!
//! ```rust
//! use dxq_parser::{FilterParser, ParseError};
//!
//! let parser = FilterParser::new();
//! match parser.parse("(A = 1") {
//!     Err(ParseError::MissingParen { position }) => assert_eq!(position, 0),
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_lines
)]

pub mod ast;
pub mod canonicalize;
pub mod error;
pub mod lexer;
mod parser;

// Re-export main types
pub use ast::*;
pub use canonicalize::{canonicalize, replace_placeholders, Canonicalized};
pub use error::*;
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::*;

// Re-export shared types
pub use dxq_shared::{Value, VERSION};
