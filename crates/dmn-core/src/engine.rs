//! Public FEEL engine facade.

use dmn_feel::{Expr, ParseScope, parse_expression, parse_unary_tests};
use orion_error::prelude::*;
use tracing::trace;

use crate::error::{CoreReason, CoreResult};
use crate::eval::{EvalContext, evaluate};
use crate::value::Value;

/// Parse/evaluate entry points used by callers and by the decision
/// orchestrator (which does its own AST caching and then calls
/// [`FeelEngine::evaluate`]).
pub struct FeelEngine;

impl FeelEngine {
    pub fn parse_expression(text: &str, scope: Option<&ParseScope>) -> CoreResult<Expr> {
        Self::checked(text)?;
        trace!(chars = text.len(), "parsing feel expression");
        let default_scope;
        let scope = match scope {
            Some(s) => s,
            None => {
                default_scope = ParseScope::new();
                &default_scope
            }
        };
        parse_expression(text, scope).map_err(|e| StructError::from(CoreReason::Parse(e)))
    }

    pub fn parse_unary_tests(text: &str, scope: Option<&ParseScope>) -> CoreResult<Expr> {
        Self::checked(text)?;
        let default_scope;
        let scope = match scope {
            Some(s) => s,
            None => {
                default_scope = ParseScope::new();
                &default_scope
            }
        };
        parse_unary_tests(text, scope).map_err(|e| StructError::from(CoreReason::Parse(e)))
    }

    pub fn evaluate_expression(
        text: &str,
        context: &EvalContext,
        scope: Option<&ParseScope>,
    ) -> CoreResult<Value> {
        let expr = Self::parse_expression(text, scope)?;
        Ok(evaluate(&expr, context))
    }

    /// Evaluate simple unary tests against an input value; the input becomes
    /// the context's implicit input.
    pub fn evaluate_unary_tests(
        text: &str,
        input: Value,
        context: &EvalContext,
        scope: Option<&ParseScope>,
    ) -> CoreResult<bool> {
        let expr = Self::parse_unary_tests(text, scope)?;
        let env = context.with_input(input);
        Ok(evaluate(&expr, &env) == Value::Boolean(true))
    }

    /// Evaluate an already-parsed AST.
    pub fn evaluate(expr: &Expr, context: &EvalContext) -> Value {
        evaluate(expr, context)
    }

    fn checked(text: &str) -> CoreResult<()> {
        if text.trim().is_empty() {
            return StructError::from(CoreReason::InvalidArgument)
                .with_detail("expression text must not be empty")
                .err();
        }
        Ok(())
    }
}
