//! Expression grammar, one method per precedence level.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::{Parser, unescape_string};
use crate::ast::{BinaryOp, CmpOp, Expr, Iteration, IterationDomain, Quantifier};
use crate::error::ParseError;
use crate::token::TokenKind;

impl Parser {
    pub(crate) fn expression(&mut self) -> Result<Expr, ParseError> {
        let condition = self.disjunction()?;
        // C#-compatible ternary, desugared to if-then-else.
        if self.eat(TokenKind::Question) {
            let then_branch = self.expression()?;
            self.expect(TokenKind::Colon, "':' in conditional expression")?;
            let else_branch = self.expression()?;
            return Ok(Expr::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }
        Ok(condition)
    }

    fn disjunction(&mut self) -> Result<Expr, ParseError> {
        let first = self.conjunction()?;
        if self.kind() != TokenKind::Or {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.eat(TokenKind::Or) {
            operands.push(self.conjunction()?);
        }
        Ok(Expr::Disjunction(operands))
    }

    fn conjunction(&mut self) -> Result<Expr, ParseError> {
        let first = self.comparison()?;
        if self.kind() != TokenKind::And {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.eat(TokenKind::And) {
            operands.push(self.comparison()?);
        }
        Ok(Expr::Conjunction(operands))
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.additive()?;
        match self.kind() {
            TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::Le
            | TokenKind::Ge
            | TokenKind::Eq
            | TokenKind::Ne => {
                let op = cmp_op_for(self.advance().kind);
                let right = self.additive()?;
                Ok(Expr::Comparison {
                    op,
                    left: Some(Box::new(left)),
                    right: Box::new(right),
                })
            }
            TokenKind::Between => {
                self.advance();
                let low = self.additive()?;
                self.expect(TokenKind::And, "'and' in between expression")?;
                let high = self.additive()?;
                Ok(Expr::Between {
                    value: Box::new(left),
                    low: Box::new(low),
                    high: Box::new(high),
                })
            }
            TokenKind::In => {
                self.advance();
                let target = self.in_target()?;
                Ok(Expr::In {
                    value: Box::new(left),
                    target: Box::new(target),
                })
            }
            TokenKind::Instance => {
                self.advance();
                self.expect(TokenKind::Of, "'of' after 'instance'")?;
                let type_name = self.type_name()?;
                Ok(Expr::InstanceOf {
                    value: Box::new(left),
                    type_name,
                })
            }
            _ => Ok(left),
        }
    }

    /// Target of `x in ...`: a parenthesised test list, or a single
    /// expression (value, range, or list).
    fn in_target(&mut self) -> Result<Expr, ParseError> {
        if self.kind() != TokenKind::LParen {
            return self.additive();
        }
        self.advance();
        let first = self.unary_test()?;
        if self.eat(TokenKind::Comma) {
            let mut tests = vec![first];
            loop {
                tests.push(self.unary_test()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "')' closing test list")?;
            return Ok(Expr::ListLit(tests));
        }
        if self.eat(TokenKind::DotDot) {
            let high = self.additive()?;
            let high_inclusive = self.close_range_bracket()?;
            return Ok(Expr::RangeLit {
                low: Some(Box::new(first)),
                high: Some(Box::new(high)),
                low_inclusive: false,
                high_inclusive,
            });
        }
        self.expect(TokenKind::RParen, "')' closing parenthesised target")?;
        Ok(first)
    }

    /// FEEL type name: greedily joins name-like tokens so unmerged forms
    /// like `days and time duration` still parse.
    fn type_name(&mut self) -> Result<String, ParseError> {
        if !self.kind().is_name_like() {
            return Err(self.error_here(format!(
                "expected type name, found '{}'",
                self.describe_current()
            )));
        }
        let mut words = vec![self.advance().text];
        while self.kind().is_name_like() {
            words.push(self.advance().text);
        }
        Ok(words.join(" "))
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.exponent()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.exponent()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `**` is right-associative.
    fn exponent(&mut self) -> Result<Expr, ParseError> {
        let base = self.unary()?;
        if self.eat(TokenKind::StarStar) {
            let power = self.exponent()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Exp,
                left: Box::new(base),
                right: Box::new(power),
            });
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(TokenKind::Minus) {
            let inner = self.unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        if self.kind() == TokenKind::Not && self.peek_at(1).kind == TokenKind::LParen {
            self.advance();
            self.advance();
            let inner = self.expression()?;
            self.expect(TokenKind::RParen, "')' closing not(...)")?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.postfix()
    }

    pub(crate) fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            match self.kind() {
                TokenKind::Dot => {
                    self.advance();
                    let member = self
                        .expect(TokenKind::Name, "member name after '.'")?
                        .text;
                    expr = Expr::Path {
                        source: Box::new(expr),
                        member,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let predicate = self.expression()?;
                    self.expect(TokenKind::RBracket, "']' closing filter")?;
                    expr = Expr::Filter {
                        source: Box::new(expr),
                        predicate: Box::new(predicate),
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    expr = self.invocation_args(expr)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn invocation_args(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        if self.eat(TokenKind::RParen) {
            return Ok(Expr::Invocation {
                callee: Box::new(callee),
                args: Vec::new(),
            });
        }
        // `name :` introduces named-argument form; the name may span several
        // name-like tokens.
        let named = self.kind() == TokenKind::Name && {
            let mut i = 1;
            while self.peek_at(i).kind.is_name_like() {
                i += 1;
            }
            self.peek_at(i).kind == TokenKind::Colon
        };
        if named {
            let mut args = Vec::new();
            loop {
                // Parameter names may be multi-word ("start position") even
                // when not registered in the scope; join name-like tokens up
                // to the ':'.
                let mut words = vec![self.expect(TokenKind::Name, "argument name")?.text];
                while self.kind().is_name_like() {
                    words.push(self.advance().text);
                }
                let name = words.join(" ");
                self.expect(TokenKind::Colon, "':' after argument name")?;
                let value = self.expression()?;
                args.push((name, value));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "')' closing invocation")?;
            return Ok(Expr::NamedInvocation {
                callee: Box::new(callee),
                args,
            });
        }
        let mut args = Vec::new();
        loop {
            args.push(self.expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')' closing invocation")?;
        Ok(Expr::Invocation {
            callee: Box::new(callee),
            args,
        })
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.kind() {
            TokenKind::Number => {
                let token = self.advance();
                let text = if token.text.starts_with('.') {
                    format!("0{}", token.text)
                } else {
                    token.text.clone()
                };
                let value = Decimal::from_str(&text).map_err(|_| {
                    ParseError::new(
                        token.line,
                        token.column,
                        format!("invalid number literal '{}'", token.text),
                    )
                })?;
                Ok(Expr::NumberLit(value))
            }
            TokenKind::String => {
                let token = self.advance();
                Ok(Expr::StringLit(unescape_string(&token.text)))
            }
            TokenKind::AtString => {
                let token = self.advance();
                Ok(Expr::TemporalLit(unescape_string(&token.text)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BoolLit(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BoolLit(false))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::NullLit)
            }
            TokenKind::Question => {
                self.advance();
                Ok(Expr::InputValue)
            }
            TokenKind::If => self.if_expr(),
            TokenKind::For => self.for_expr(),
            TokenKind::Some | TokenKind::Every => self.quantified_expr(),
            TokenKind::Function => self.function_def(),
            TokenKind::LBracket => self.list_or_range(),
            TokenKind::LBrace => self.context_literal(),
            TokenKind::LParen => self.paren_or_range(),
            TokenKind::Name => {
                let token = self.advance();
                Ok(Expr::Name(token.text))
            }
            _ => Err(self.error_here(format!(
                "expected expression, found '{}'",
                self.describe_current()
            ))),
        }
    }

    fn if_expr(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::If, "'if'")?;
        let condition = self.expression()?;
        self.expect(TokenKind::Then, "'then'")?;
        let then_branch = self.expression()?;
        self.expect(TokenKind::Else, "'else'")?;
        let else_branch = self.expression()?;
        Ok(Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn iterations(&mut self) -> Result<Vec<Iteration>, ParseError> {
        let mut iterations = Vec::new();
        loop {
            let name = self.expect(TokenKind::Name, "iteration variable name")?.text;
            self.expect(TokenKind::In, "'in' after iteration variable")?;
            let start = self.additive()?;
            let domain = if self.eat(TokenKind::DotDot) {
                let end = self.additive()?;
                IterationDomain::Range(Box::new(start), Box::new(end))
            } else {
                IterationDomain::List(Box::new(start))
            };
            iterations.push(Iteration { name, domain });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(iterations)
    }

    fn for_expr(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::For, "'for'")?;
        let iterations = self.iterations()?;
        self.expect(TokenKind::Return, "'return' in for expression")?;
        let body = self.expression()?;
        Ok(Expr::For {
            iterations,
            body: Box::new(body),
        })
    }

    fn quantified_expr(&mut self) -> Result<Expr, ParseError> {
        let quantifier = if self.eat(TokenKind::Some) {
            Quantifier::Some
        } else {
            self.expect(TokenKind::Every, "'some' or 'every'")?;
            Quantifier::Every
        };
        let iterations = self.iterations()?;
        self.expect(TokenKind::Satisfies, "'satisfies'")?;
        let condition = self.expression()?;
        Ok(Expr::Quantified {
            quantifier,
            iterations,
            condition: Box::new(condition),
        })
    }

    fn function_def(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::Function, "'function'")?;
        self.expect(TokenKind::LParen, "'(' after 'function'")?;
        let mut params = Vec::new();
        if self.kind() != TokenKind::RParen {
            loop {
                let name = self.expect(TokenKind::Name, "parameter name")?.text;
                // Optional `: type` annotation; the type is not enforced.
                if self.eat(TokenKind::Colon) {
                    self.type_name()?;
                }
                params.push(name);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' closing parameter list")?;
        let external = self.eat(TokenKind::External);
        let body = self.expression()?;
        Ok(Expr::FunctionDef {
            params,
            body: Box::new(body),
            external,
        })
    }

    fn list_or_range(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LBracket, "'['")?;
        if self.eat(TokenKind::RBracket) {
            return Ok(Expr::ListLit(Vec::new()));
        }
        let first = self.expression()?;
        if self.eat(TokenKind::DotDot) {
            let high = self.additive()?;
            let high_inclusive = self.close_range_bracket()?;
            return Ok(Expr::RangeLit {
                low: Some(Box::new(first)),
                high: Some(Box::new(high)),
                low_inclusive: true,
                high_inclusive,
            });
        }
        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            items.push(self.expression()?);
        }
        self.expect(TokenKind::RBracket, "']' closing list literal")?;
        Ok(Expr::ListLit(items))
    }

    fn context_literal(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        if self.eat(TokenKind::RBrace) {
            return Ok(Expr::ContextLit(Vec::new()));
        }
        let mut entries = Vec::new();
        loop {
            let key = match self.kind() {
                TokenKind::Name => self.advance().text,
                TokenKind::String => unescape_string(&self.advance().text),
                _ => {
                    return Err(self.error_here(format!(
                        "expected context key, found '{}'",
                        self.describe_current()
                    )));
                }
            };
            self.expect(TokenKind::Colon, "':' after context key")?;
            let value = self.expression()?;
            entries.push((key, value));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}' closing context literal")?;
        Ok(Expr::ContextLit(entries))
    }

    fn paren_or_range(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let first = self.expression()?;
        if self.eat(TokenKind::DotDot) {
            let high = self.additive()?;
            let high_inclusive = self.close_range_bracket()?;
            return Ok(Expr::RangeLit {
                low: Some(Box::new(first)),
                high: Some(Box::new(high)),
                low_inclusive: false,
                high_inclusive,
            });
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(first)
    }

    /// Closing bracket of a range literal: `]` inclusive, `)` exclusive,
    /// `[` European-style exclusive.
    pub(crate) fn close_range_bracket(&mut self) -> Result<bool, ParseError> {
        match self.kind() {
            TokenKind::RBracket => {
                self.advance();
                Ok(true)
            }
            TokenKind::RParen | TokenKind::LBracket => {
                self.advance();
                Ok(false)
            }
            _ => Err(self.error_here(format!(
                "expected closing range bracket, found '{}'",
                self.describe_current()
            ))),
        }
    }
}

fn cmp_op_for(kind: TokenKind) -> CmpOp {
    match kind {
        TokenKind::Lt => CmpOp::Lt,
        TokenKind::Gt => CmpOp::Gt,
        TokenKind::Le => CmpOp::Le,
        TokenKind::Ge => CmpOp::Ge,
        TokenKind::Eq => CmpOp::Eq,
        TokenKind::Ne => CmpOp::Ne,
        other => unreachable!("not a comparison token: {other:?}"),
    }
}
