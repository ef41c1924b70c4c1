//! Expression parsing
//!
//! Precedence climbing over the token stream: `OR` (1) < `AND` (2) <
//! comparisons (3). Connectives associate to the left.

use dxq_shared::Value;

use super::cursor::TokenCursor;
use crate::ast::{ComparisonOperator, ComparisonValue, Function, LogicalOperator, Node};
use crate::error::{ParseError, Result};
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Copy)]
enum BinaryOperator {
    Logical(LogicalOperator),
    Comparison(ComparisonOperator),
}

impl BinaryOperator {
    fn from_token(token: &Token) -> Option<Self> {
        if token.kind != TokenKind::Operator {
            return None;
        }
        LogicalOperator::from_token(&token.text)
            .map(BinaryOperator::Logical)
            .or_else(|| ComparisonOperator::from_token(&token.text).map(BinaryOperator::Comparison))
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Logical(op) => op.precedence(),
            BinaryOperator::Comparison(_) => ComparisonOperator::PRECEDENCE,
        }
    }
}

impl<'t> TokenCursor<'t> {
    /// Parse operators binding at least as tightly as `min_precedence`
    pub(crate) fn parse_expression(&mut self, min_precedence: u8) -> Result<Node> {
        self.enter()?;
        let mut left = self.parse_term()?;

        while let Some(token) = self.peek() {
            let Some(op) = BinaryOperator::from_token(token) else {
                break;
            };
            if op.precedence() < min_precedence {
                break;
            }
            self.advance();

            left = match op {
                BinaryOperator::Logical(operator) => {
                    let right = self.parse_expression(op.precedence() + 1)?;
                    Node::logical(operator, left, right)
                }
                BinaryOperator::Comparison(operator) => {
                    self.parse_comparison(left, operator, token)?
                }
            };
        }

        self.leave();
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Node> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Paren if token.is_paren('(') => {
                let inner = self.parse_expression(0)?;
                self.expect_close(token.position)?;
                Ok(inner)
            }
            TokenKind::Function => self.parse_function_call(token),
            TokenKind::Identifier if self.check_paren('(') => Err(ParseError::UnsupportedFunction {
                name: token.text.clone(),
                position: token.position,
            }),
            _ => self.simple_operand(token),
        }
    }

    /// Right-hand side of a comparison, an `IN` list item or a `BETWEEN` bound
    fn parse_operand(&mut self) -> Result<Node> {
        let token = self.next_token()?;
        match token.kind {
            // `({Entity.Attr})` is the placeholder itself
            TokenKind::Paren if token.is_paren('(') => {
                self.enter()?;
                let inner = self.parse_operand()?;
                self.expect_close(token.position)?;
                self.leave();
                Ok(inner)
            }
            TokenKind::Function => self.parse_function_call(token),
            TokenKind::Identifier if self.check_paren('(') => Err(ParseError::UnsupportedFunction {
                name: token.text.clone(),
                position: token.position,
            }),
            _ => self.simple_operand(token),
        }
    }

    fn simple_operand(&mut self, token: &'t Token) -> Result<Node> {
        match token.kind {
            TokenKind::Number => parse_number(token).map(|value| Node::Literal { value }),
            TokenKind::String => Ok(Node::literal(token.text.clone())),
            TokenKind::Null => Ok(Node::null()),
            TokenKind::Placeholder => {
                self.record_variable(&token.text);
                Ok(Node::placeholder(token.text.clone()))
            }
            TokenKind::Identifier => Ok(Node::field(token.text.clone())),
            TokenKind::Operator | TokenKind::Paren | TokenKind::Comma | TokenKind::Function => {
                Err(ParseError::UnexpectedToken {
                    found: token.text.clone(),
                    position: token.position,
                })
            }
        }
    }

    fn parse_function_call(&mut self, name: &'t Token) -> Result<Node> {
        let function =
            Function::from_name(&name.text).ok_or_else(|| ParseError::UnsupportedFunction {
                name: name.text.clone(),
                position: name.position,
            })?;

        let open = self.expect_open(function.name())?;
        self.enter()?;
        let mut args = vec![self.parse_expression(0)?];
        while self.check_kind(TokenKind::Comma) {
            self.advance();
            args.push(self.parse_expression(0)?);
        }
        self.expect_close(open.position)?;
        self.leave();

        if args.len() < function.min_args() {
            return Err(ParseError::TooFewArguments {
                name: function.name().to_string(),
                expected: function.min_args(),
                found: args.len(),
            });
        }

        Ok(Node::FunctionCall { function, args })
    }

    fn parse_comparison(
        &mut self,
        field: Node,
        operator: ComparisonOperator,
        op_token: &'t Token,
    ) -> Result<Node> {
        if matches!(field, Node::Comparison { .. } | Node::Logical { .. }) {
            return Err(ParseError::UnexpectedToken {
                found: op_token.text.clone(),
                position: op_token.position,
            });
        }

        match operator {
            ComparisonOperator::In | ComparisonOperator::NotIn => {
                let items = self.parse_list(operator)?;
                Ok(Node::Comparison {
                    field: Box::new(field),
                    operator,
                    value: ComparisonValue::List(items),
                })
            }
            ComparisonOperator::Between => {
                let low = self.parse_operand()?;
                match self.peek() {
                    Some(token) if token.is_operator("AND") => {
                        self.advance();
                    }
                    _ => {
                        return Err(ParseError::MissingBetweenAnd {
                            position: self.position(),
                        })
                    }
                }
                let high = self.parse_operand()?;
                Ok(Node::Comparison {
                    field: Box::new(field),
                    operator,
                    value: ComparisonValue::Range {
                        low: Box::new(low),
                        high: Box::new(high),
                    },
                })
            }
            _ => {
                let value = self.parse_operand()?;
                order_operands(field, operator, value)
            }
        }
    }

    fn parse_list(&mut self, operator: ComparisonOperator) -> Result<Vec<Node>> {
        let open = self.expect_open(operator.symbol())?;
        self.enter()?;
        let mut items = vec![self.parse_operand()?];
        while self.check_kind(TokenKind::Comma) {
            self.advance();
            items.push(self.parse_operand()?);
        }
        self.expect_close(open.position)?;
        self.leave();
        Ok(items)
    }

    fn expect_open(&mut self, after: &str) -> Result<&'t Token> {
        match self.peek() {
            Some(token) if token.is_paren('(') => {
                self.advance();
                Ok(token)
            }
            _ => Err(ParseError::ExpectedOpenParen {
                after: after.to_string(),
                position: self.position(),
            }),
        }
    }
}

/// Keep field references on the left-hand side.
///
/// `{X.Y} > Amount` becomes `Amount < {X.Y}`. Two bare fields cannot be
/// compared.
fn order_operands(field: Node, operator: ComparisonOperator, value: Node) -> Result<Node> {
    match (&field, &value) {
        (Node::FieldRef { name: left }, Node::FieldRef { name: right }) => {
            Err(ParseError::InvalidComparison {
                left: left.clone(),
                operator: operator.symbol().to_string(),
                right: right.clone(),
            })
        }
        (Node::Placeholder { .. } | Node::Literal { .. }, Node::FieldRef { .. })
            if operator.is_relational() =>
        {
            Ok(Node::compare(value, operator.inverse(), field))
        }
        _ => Ok(Node::compare(field, operator, value)),
    }
}

fn parse_number(token: &Token) -> Result<Value> {
    let text = token.text.as_str();
    if !text.contains('.') {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Int(i));
        }
    }
    text.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| ParseError::UnexpectedToken {
            found: text.to_string(),
            position: token.position,
        })
}
