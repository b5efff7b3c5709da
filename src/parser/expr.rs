use crate::errors::SyntaxError;
use crate::lexer::token::{Keyword, Operator, Punctuation, TokenKind};

use super::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use super::Parser;

impl Parser {
    pub(crate) fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.logical_or()
    }

    fn logical_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.logical_and()?;

        while self.matches_operator(Operator::OrOr) {
            let rhs = self.logical_and()?;
            expr = binary(expr, BinaryOp::Or, rhs);
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.equality()?;

        while self.matches_operator(Operator::AndAnd) {
            let rhs = self.equality()?;
            expr = binary(expr, BinaryOp::And, rhs);
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.comparison()?;

        loop {
            let op = if self.matches_operator(Operator::EqualEqual) {
                Some(BinaryOp::Equal)
            } else if self.matches_operator(Operator::BangEqual) {
                Some(BinaryOp::NotEqual)
            } else {
                None
            };

            let Some(op) = op else { break };
            let rhs = self.comparison()?;
            expr = binary(expr, op, rhs);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.term()?;

        loop {
            let op = if self.matches_operator(Operator::Greater) {
                Some(BinaryOp::Greater)
            } else if self.matches_operator(Operator::GreaterEqual) {
                Some(BinaryOp::GreaterEqual)
            } else if self.matches_operator(Operator::Less) {
                Some(BinaryOp::Less)
            } else if self.matches_operator(Operator::LessEqual) {
                Some(BinaryOp::LessEqual)
            } else {
                None
            };

            let Some(op) = op else { break };
            let rhs = self.term()?;
            expr = binary(expr, op, rhs);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.factor()?;

        loop {
            let op = if self.matches_operator(Operator::Plus) {
                Some(BinaryOp::Add)
            } else if self.matches_operator(Operator::Minus) {
                Some(BinaryOp::Subtract)
            } else {
                None
            };

            let Some(op) = op else { break };
            let rhs = self.factor()?;
            expr = binary(expr, op, rhs);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.unary()?;

        loop {
            let op = if self.matches_operator(Operator::Star) {
                Some(BinaryOp::Multiply)
            } else if self.matches_operator(Operator::Slash) {
                Some(BinaryOp::Divide)
            } else if self.matches_operator(Operator::Percent) {
                Some(BinaryOp::Modulo)
            } else {
                None
            };

            let Some(op) = op else { break };
            let rhs = self.unary()?;
            expr = binary(expr, op, rhs);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = if self.matches_operator(Operator::Minus) {
            Some(UnaryOp::Negate)
        } else if self.matches_operator(Operator::Bang) {
            Some(UnaryOp::Not)
        } else {
            None
        };

        if let Some(op) = op {
            let (line, column) = (self.previous().line, self.previous().column);
            let operand = self.unary()?;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                line,
                column,
            });
        }

        self.power()
    }

    // `^` binds tighter than unary minus on its left and is right-associative,
    // so `-2 ^ 2` is `-(2 ^ 2)` and `2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`.
    fn power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.primary()?;

        if self.matches_operator(Operator::Caret) {
            let exponent = self.unary()?;
            return Ok(binary(base, BinaryOp::Power, exponent));
        }

        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.peek().clone();
        let kind = match &token.kind {
            TokenKind::Integer(value) => ExprKind::Int(*value),
            TokenKind::Real(value) => ExprKind::Float(*value),
            TokenKind::Str(value) => ExprKind::Str(value.clone()),
            TokenKind::Reserved(Keyword::True) => ExprKind::Bool(true),
            TokenKind::Reserved(Keyword::False) => ExprKind::Bool(false),
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                if self.matches_punct(Punctuation::LeftParen) {
                    let args = self.arguments()?;
                    return Ok(Expr {
                        kind: ExprKind::Call { name, args },
                        line: token.line,
                        column: token.column,
                    });
                }
                return Ok(Expr {
                    kind: ExprKind::Identifier(name),
                    line: token.line,
                    column: token.column,
                });
            }
            TokenKind::Punctuation(Punctuation::LeftParen) => {
                self.advance();
                let expr = self.expression()?;
                self.consume_punct(Punctuation::RightParen, "expected ')' after expression")?;
                return Ok(expr);
            }
            _ => return Err(self.error_at_current("expected expression")),
        };

        self.advance();
        Ok(Expr {
            kind,
            line: token.line,
            column: token.column,
        })
    }
}

fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
    let (line, column) = (lhs.line, lhs.column);
    Expr {
        kind: ExprKind::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        },
        line,
        column,
    }
}
