//! Token cursor shared by the expression parsers

use crate::error::{ParseError, Result};
use crate::lexer::{Token, TokenKind};

pub(crate) struct TokenCursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
    variables: Vec<String>,
}

impl<'t> TokenCursor<'t> {
    pub(crate) fn new(tokens: &'t [Token], max_depth: usize, known_variables: &[String]) -> Self {
        let mut cursor = Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
            variables: Vec::with_capacity(known_variables.len()),
        };
        for name in known_variables {
            cursor.record_variable(name);
        }
        cursor
    }

    pub(crate) fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the next token, failing at end of input
    pub(crate) fn next_token(&mut self) -> Result<&'t Token> {
        self.advance().ok_or(ParseError::UnexpectedEnd)
    }

    pub(crate) fn check_paren(&self, paren: char) -> bool {
        self.peek().is_some_and(|t| t.is_paren(paren))
    }

    pub(crate) fn check_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    /// Byte offset of the next token, or of the end of input
    pub(crate) fn position(&self) -> usize {
        match self.peek() {
            Some(token) => token.position,
            None => self
                .tokens
                .last()
                .map_or(0, |t| t.position + t.text.len()),
        }
    }

    /// Consume `)` or fail with `MissingParen` for the `(` at `open_position`
    pub(crate) fn expect_close(&mut self, open_position: usize) -> Result<()> {
        if self.check_paren(')') {
            self.pos += 1;
            Ok(())
        } else {
            Err(ParseError::MissingParen {
                position: open_position,
            })
        }
    }

    pub(crate) fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::TooDeep {
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn record_variable(&mut self, name: &str) {
        if !self.variables.iter().any(|known| known == name) {
            self.variables.push(name.to_string());
        }
    }

    pub(crate) fn into_variables(self) -> Vec<String> {
        self.variables
    }
}
