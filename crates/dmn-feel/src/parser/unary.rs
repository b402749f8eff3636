//! Simple-unary-tests grammar (decision-table cells).
//!
//! A comma-separated list of tests, optionally wrapped in `not(...)`. Each
//! test is a dash, `null`, a bracketed interval, a bare closed range `a..b`,
//! a leading comparison whose implicit left operand is the input value, or a
//! simple expression compared for equality with the input.

use super::Parser;
use crate::ast::{CmpOp, Expr};
use crate::error::ParseError;
use crate::token::TokenKind;

impl Parser {
    pub(crate) fn unary_tests(&mut self) -> Result<Expr, ParseError> {
        // `-` alone matches anything.
        if self.kind() == TokenKind::Minus && self.peek_at(1).kind == TokenKind::Eof {
            self.advance();
            return Ok(Expr::UnaryTests {
                tests: vec![Expr::Dash],
                negated: false,
            });
        }
        // `not( tests )` negates the whole list.
        if self.kind() == TokenKind::Not && self.peek_at(1).kind == TokenKind::LParen {
            self.advance();
            self.advance();
            let tests = self.test_list()?;
            self.expect(TokenKind::RParen, "')' closing not(...)")?;
            return Ok(Expr::UnaryTests {
                tests,
                negated: true,
            });
        }
        let tests = self.test_list()?;
        Ok(Expr::UnaryTests {
            tests,
            negated: false,
        })
    }

    fn test_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut tests = vec![self.unary_test()?];
        while self.eat(TokenKind::Comma) {
            tests.push(self.unary_test()?);
        }
        Ok(tests)
    }

    pub(crate) fn unary_test(&mut self) -> Result<Expr, ParseError> {
        match self.kind() {
            // A dash cell inside a list position.
            TokenKind::Minus if is_test_end(self.peek_at(1).kind) => {
                self.advance();
                Ok(Expr::Dash)
            }
            TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge | TokenKind::Ne => {
                let op = match self.advance().kind {
                    TokenKind::Lt => CmpOp::Lt,
                    TokenKind::Le => CmpOp::Le,
                    TokenKind::Gt => CmpOp::Gt,
                    TokenKind::Ge => CmpOp::Ge,
                    _ => CmpOp::Ne,
                };
                let endpoint = self.simple_value()?;
                Ok(Expr::Comparison {
                    op,
                    left: None,
                    right: Box::new(endpoint),
                })
            }
            TokenKind::Eq => {
                self.advance();
                let endpoint = self.simple_value()?;
                Ok(Expr::Comparison {
                    op: CmpOp::Eq,
                    left: None,
                    right: Box::new(endpoint),
                })
            }
            TokenKind::LBracket | TokenKind::LParen | TokenKind::RBracket => self.interval(),
            _ => {
                let value = self.simple_value()?;
                if self.eat(TokenKind::DotDot) {
                    let high = self.simple_value()?;
                    return Ok(Expr::RangeLit {
                        low: Some(Box::new(value)),
                        high: Some(Box::new(high)),
                        low_inclusive: true,
                        high_inclusive: true,
                    });
                }
                Ok(value)
            }
        }
    }

    /// Bracketed interval: `[a..b]`, `(a..b)`, `[a..b)`, `(a..b]`, and the
    /// European reversed form `]a..b[` (exclusive on that side).
    fn interval(&mut self) -> Result<Expr, ParseError> {
        let low_inclusive = match self.kind() {
            TokenKind::LBracket => true,
            TokenKind::LParen | TokenKind::RBracket => false,
            _ => unreachable!("caller checked an opening bracket"),
        };
        self.advance();
        let low = self.simple_value()?;
        self.expect(TokenKind::DotDot, "'..' in interval")?;
        let high = self.simple_value()?;
        let high_inclusive = self.close_range_bracket()?;
        Ok(Expr::RangeLit {
            low: Some(Box::new(low)),
            high: Some(Box::new(high)),
            low_inclusive,
            high_inclusive,
        })
    }

    /// Simple-expression level for test values and interval endpoints:
    /// arithmetic, names, literals, invocations — no disjunction,
    /// conjunction, or control constructs. Cells needing those fail here and
    /// are retried with the full expression grammar by the orchestrator.
    fn simple_value(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.simple_product()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => crate::ast::BinaryOp::Add,
                TokenKind::Minus => crate::ast::BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.simple_product()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn simple_product(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.simple_factor()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => crate::ast::BinaryOp::Mul,
                TokenKind::Slash => crate::ast::BinaryOp::Div,
                TokenKind::Percent => crate::ast::BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.simple_factor()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn simple_factor(&mut self) -> Result<Expr, ParseError> {
        if self.eat(TokenKind::Minus) {
            let inner = self.simple_factor()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        let base = self.postfix()?;
        if self.eat(TokenKind::StarStar) {
            let power = self.simple_factor()?;
            return Ok(Expr::Binary {
                op: crate::ast::BinaryOp::Exp,
                left: Box::new(base),
                right: Box::new(power),
            });
        }
        Ok(base)
    }
}

fn is_test_end(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Comma | TokenKind::RParen | TokenKind::Eof)
}
