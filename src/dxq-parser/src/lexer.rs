//! Tokenizer for filter strings
//!
//! Each token is recognised by a small nom parser; [`tokenize`] drives them
//! over the input, skipping whitespace between tokens.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_while1},
    character::complete::{char, digit1, multispace1, one_of, satisfy},
    combinator::{map, not, opt, recognize, value},
    multi::fold_many0,
    sequence::{delimited, terminated},
    IResult, Parser,
};
use serde::Serialize;

use crate::error::LexError;

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Numeric literal
    Number,
    /// Single-quoted string literal (text holds the unescaped content)
    String,
    /// `NULL`
    Null,
    /// `{Entity.Attribute}` (text holds the dotted name)
    Placeholder,
    /// Comparison or logical operator (text holds the canonical spelling)
    Operator,
    /// Bare field name
    Identifier,
    /// Function marker (`ISNULL`)
    Function,
    /// `(` or `)`
    Paren,
    /// `,`
    Comma,
}

/// A single lexical token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Token category
    pub kind: TokenKind,
    /// Normalized token text
    pub text: String,
    /// Byte offset of the token in the input
    pub position: usize,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Is this the operator spelled `op` (canonical spelling)?
    #[must_use]
    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    /// Is this the given parenthesis?
    #[must_use]
    pub fn is_paren(&self, paren: char) -> bool {
        self.kind == TokenKind::Paren && self.text.starts_with(paren)
    }
}

/// Split a filter string into tokens.
///
/// Keywords are matched case-insensitively and only as whole words, so
/// `ORDER_ID` is an identifier rather than `OR` followed by `DER_ID`.
/// `IS` and `IS NOT` come out as `=` and `!=`, `<>` as `!=`.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let position = input.len() - rest.len();
        match token(rest) {
            Ok((next, (kind, text))) => {
                tokens.push(Token::new(kind, text, position));
                rest = next.trim_start();
            }
            Err(_) => {
                return Err(LexError {
                    remaining: rest.to_string(),
                    position,
                })
            }
        }
    }

    log::trace!("tokenized {} tokens from {:?}", tokens.len(), input);
    Ok(tokens)
}

fn token(input: &str) -> IResult<&str, (TokenKind, String)> {
    alt((
        map(keyword("ISNULL"), |_| (TokenKind::Function, "ISNULL".to_string())),
        map(keyword("NULL"), |_| (TokenKind::Null, "NULL".to_string())),
        placeholder,
        string_literal,
        number,
        operator,
        map(take_while1(is_ident_char), |name: &str| {
            (TokenKind::Identifier, name.to_string())
        }),
        map(one_of("()"), |paren| (TokenKind::Paren, paren.to_string())),
        map(char(','), |_| (TokenKind::Comma, ",".to_string())),
    ))
    .parse(input)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn keyword<'a>(
    word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(tag_no_case(word), not(satisfy(is_ident_char)))
}

fn placeholder_body(input: &str) -> IResult<&str, &str> {
    delimited(char('{'), is_not("}"), char('}')).parse(input)
}

fn placeholder(input: &str) -> IResult<&str, (TokenKind, String)> {
    map(
        alt((
            delimited(char('\''), placeholder_body, char('\'')),
            placeholder_body,
        )),
        |name: &str| (TokenKind::Placeholder, name.trim().to_string()),
    )
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, (TokenKind, String)> {
    map(
        delimited(
            char('\''),
            fold_many0(
                alt((terminated(tag("'"), tag("'")), is_not("'"))),
                String::new,
                |mut acc, part: &str| {
                    acc.push_str(part);
                    acc
                },
            ),
            char('\''),
        ),
        |text| (TokenKind::String, text),
    )
    .parse(input)
}

fn number(input: &str) -> IResult<&str, (TokenKind, String)> {
    map(
        terminated(
            recognize((opt(char('-')), digit1, opt((char('.'), digit1)))),
            not(satisfy(is_ident_char)),
        ),
        |text: &str| (TokenKind::Number, text.to_string()),
    )
    .parse(input)
}

fn operator(input: &str) -> IResult<&str, (TokenKind, String)> {
    map(alt((symbolic_operator, word_operator)), |op| {
        (TokenKind::Operator, op.to_string())
    })
    .parse(input)
}

fn symbolic_operator(input: &str) -> IResult<&str, &'static str> {
    alt((
        value(">=", tag(">=")),
        value("<=", tag("<=")),
        value("!=", tag("<>")),
        value("!=", tag("!=")),
        value("=", tag("=")),
        value(">", tag(">")),
        value("<", tag("<")),
    ))
    .parse(input)
}

fn word_operator(input: &str) -> IResult<&str, &'static str> {
    alt((
        value("!=", (tag_no_case("IS"), multispace1, keyword("NOT"))),
        value("=", keyword("IS")),
        value("NOT IN", (tag_no_case("NOT"), multispace1, keyword("IN"))),
        value("NOT LIKE", (tag_no_case("NOT"), multispace1, keyword("LIKE"))),
        value("AND", keyword("AND")),
        value("OR", keyword("OR")),
        value("IN", keyword("IN")),
        value("BETWEEN", keyword("BETWEEN")),
        value("LIKE", keyword("LIKE")),
    ))
    .parse(input)
}
