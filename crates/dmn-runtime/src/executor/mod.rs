//! Decision orchestrator.
//!
//! Walks the decision dependency graph depth-first (declared order, each
//! decision at most once per run), evaluates expression decisions and
//! decision tables through the FEEL engine, writes outputs into the
//! variable store, and records post-decision snapshots.

mod hit_policy;
mod table;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use dmn_core::{CoreError, FeelEngine, FeelType, Value, temporal};
use dmn_feel::{Expr, rewrite_constructor_shorthand};
use dmn_model::{Decision, DecisionBody, Definition, ExpressionDecision};
use orion_error::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::cache::{CacheKeys, EntryKind};
use crate::context::DmnExecutionContext;
use crate::error::{RuntimeError, RuntimeReason, RuntimeResult};
use crate::result::{DecisionResult, OutputValue, SingleResult};

pub struct DecisionExecutor {
    definition: Arc<Definition>,
}

impl DecisionExecutor {
    pub fn new(definition: Arc<Definition>) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &Arc<Definition> {
        &self.definition
    }

    /// Execute one decision (and, depth-first, everything it requires).
    pub fn execute(
        &self,
        ctx: &mut DmnExecutionContext,
        decision_name: &str,
    ) -> RuntimeResult<DecisionResult> {
        if self.definition.decision(decision_name).is_none() {
            return StructError::from(RuntimeReason::DecisionNotFound)
                .with_detail(format!("no decision named '{decision_name}'"))
                .err();
        }
        let correlation = Uuid::new_v4();
        debug!(decision = decision_name, %correlation, "executing decision");
        if ctx.options().record_snapshots {
            ctx.reset_snapshots();
            ctx.take_snapshot(None, None);
        }
        let mut completed = HashMap::new();
        let outcome = self.run_decision(ctx, decision_name, correlation, &mut completed);
        ctx.cache().purge_execution(&correlation);
        outcome
    }

    fn run_decision(
        &self,
        ctx: &mut DmnExecutionContext,
        name: &str,
        correlation: Uuid,
        completed: &mut HashMap<String, DecisionResult>,
    ) -> RuntimeResult<DecisionResult> {
        if let Some(previous) = completed.get(name) {
            return Ok(previous.clone());
        }
        let decision: Decision = self
            .definition
            .decision(name)
            .ok_or_else(|| {
                StructError::from(RuntimeReason::DecisionNotFound)
                    .with_detail(format!("no decision named '{name}'"))
            })?
            .clone();

        for required in &decision.required_decisions {
            self.run_decision(ctx, required, correlation, completed)?;
        }

        let result = match &decision.body {
            DecisionBody::Expression(expression) => {
                self.evaluate_expression_decision(ctx, expression, correlation)?
            }
            DecisionBody::Table(decision_table) => {
                self.evaluate_table(ctx, &decision.name, decision_table, correlation)?
            }
        };
        debug!(
            decision = name,
            results = result.results.len(),
            "decision completed"
        );
        if ctx.options().record_snapshots {
            ctx.take_snapshot(Some(name.to_string()), Some(result.clone()));
        }
        completed.insert(name.to_string(), result.clone());
        Ok(result)
    }

    fn evaluate_expression_decision(
        &self,
        ctx: &mut DmnExecutionContext,
        expression: &ExpressionDecision,
        correlation: Uuid,
    ) -> RuntimeResult<DecisionResult> {
        let ast = self.parse_cached(ctx, correlation, &expression.expression, EntryKind::Expression)?;
        let env = ctx.eval_context();
        let value = coerce_to_declared(
            FeelEngine::evaluate(&ast, &env),
            expression.type_ref.as_deref(),
        );
        ctx.write_variable(&expression.output_variable, value.clone());
        Ok(DecisionResult::single(SingleResult {
            outputs: vec![OutputValue {
                name: expression.output_variable.clone(),
                value,
                type_ref: expression.type_ref.clone(),
            }],
            ..Default::default()
        }))
    }

    /// Parse through the scoped AST cache. Unary-test entries retry with the
    /// full expression grammar when the simple-unary-tests grammar rejects
    /// the cell (Camunda-style cells); the retry result is later interpreted
    /// as a boolean.
    pub(crate) fn parse_cached(
        &self,
        ctx: &DmnExecutionContext,
        correlation: Uuid,
        text: &str,
        kind: EntryKind,
    ) -> RuntimeResult<Arc<Expr>> {
        let keys = self.cache_keys(ctx, correlation);
        if let Some(hit) = ctx.cache().fetch(&keys, text, kind) {
            return Ok(hit);
        }
        let parsed = parse_text(ctx.parse_scope(), text, kind).map_err(expression_error)?;
        let ast = Arc::new(parsed);
        ctx.cache().store(&keys, text, kind, ast.clone());
        Ok(ast)
    }

    pub(crate) fn cache_keys(&self, ctx: &DmnExecutionContext, correlation: Uuid) -> CacheKeys {
        CacheKeys {
            context_id: ctx.id(),
            definition_id: self.definition.id(),
            correlation_id: correlation,
            scope: ctx.options().cache_scope,
        }
    }
}

/// Uncached parse of one expression or table cell, pre-processing applied.
/// Takes the parse scope alone so batch parsing can run off-thread (the
/// execution context itself holds thread-local FEEL values).
pub(crate) fn parse_text(
    scope: &dmn_feel::ParseScope,
    text: &str,
    kind: EntryKind,
) -> Result<Expr, CoreError> {
    let processed = rewrite_constructor_shorthand(text);
    match kind {
        EntryKind::Expression => FeelEngine::parse_expression(&processed, Some(scope)),
        EntryKind::UnaryTests => FeelEngine::parse_unary_tests(&processed, Some(scope))
            .or_else(|_| FeelEngine::parse_expression(&processed, Some(scope))),
    }
}

pub(crate) fn expression_error(err: CoreError) -> RuntimeError {
    StructError::from(RuntimeReason::Expression).with_detail(err.to_string())
}

/// Best-effort coercion of an output value to its declared type. Values of
/// the right kind pass through; strings parse into the declared kind;
/// anything else is left as evaluated.
pub(crate) fn coerce_to_declared(value: Value, type_ref: Option<&str>) -> Value {
    let Some(type_ref) = type_ref else {
        return value;
    };
    let Some(target) = FeelType::from_name(type_ref) else {
        return value;
    };
    if target == FeelType::Any || value.feel_type() == target {
        return value;
    }
    match (&value, target) {
        (Value::String(s), FeelType::Number) => Decimal::from_str(s.trim())
            .map(Value::Number)
            .unwrap_or(Value::Null),
        (Value::String(s), FeelType::Boolean) => match s.trim() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => Value::Null,
        },
        (Value::String(s), FeelType::Date) => temporal::parse_date(s)
            .map(Value::Date)
            .unwrap_or(Value::Null),
        (Value::String(s), FeelType::Time) => temporal::parse_time(s)
            .map(Value::Time)
            .unwrap_or(Value::Null),
        (Value::String(s), FeelType::DateAndTime) => temporal::parse_date_time(s)
            .map(Value::DateTime)
            .unwrap_or(Value::Null),
        (Value::String(s), FeelType::YearsMonthsDuration) => temporal::parse_ym_duration(s)
            .map(Value::YearsMonthsDuration)
            .unwrap_or(Value::Null),
        (Value::String(s), FeelType::DaysTimeDuration) => temporal::parse_dt_duration(s)
            .map(Value::DaysTimeDuration)
            .unwrap_or(Value::Null),
        _ => value,
    }
}
