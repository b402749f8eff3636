//! Decision-table evaluation: input values, rule matching, output
//! evaluation, hit-policy application.

use std::collections::HashSet;
use std::sync::Arc;

use dmn_core::{FeelEngine, Value};
use dmn_feel::Expr;
use dmn_model::{DecisionTable, TableRule, normalise_variable_name};
use rayon::prelude::*;
use tracing::{debug, trace};
use uuid::Uuid;

use super::{DecisionExecutor, coerce_to_declared, parse_text};
use crate::cache::EntryKind;
use crate::context::DmnExecutionContext;
use crate::error::RuntimeResult;
use crate::executor::hit_policy::{RuleOutcome, apply_hit_policy};
use crate::result::{DecisionResult, HitRule, InputEvaluation, OutputValue};

impl DecisionExecutor {
    pub(super) fn evaluate_table(
        &self,
        ctx: &mut DmnExecutionContext,
        decision_name: &str,
        table: &DecisionTable,
        correlation: Uuid,
    ) -> RuntimeResult<DecisionResult> {
        let input_values = self.table_input_values(ctx, table, correlation)?;

        if ctx.options().parallel_rules {
            let texts: Vec<String> = table
                .rules
                .iter()
                .flat_map(|r| r.input_entries.iter())
                .map(|e| e.trim().to_string())
                .filter(|t| !is_irrelevant_cell(t))
                .collect();
            self.warm_cache(ctx, correlation, texts, EntryKind::UnaryTests);
        }

        // Match pass: conceptually in declared order; stays sequential so
        // order-sensitive hit policies observe declared order regardless of
        // the parallel options.
        let mut matched: Vec<(&TableRule, Vec<InputEvaluation>)> = Vec::new();
        for rule in &table.rules {
            let mut traces = Vec::new();
            let mut hit = true;
            for (column, entry) in rule.input_entries.iter().enumerate() {
                let text = entry.trim();
                let cell_hit = if is_irrelevant_cell(text) {
                    true
                } else {
                    let ast =
                        self.parse_cached(ctx, correlation, text, EntryKind::UnaryTests)?;
                    evaluate_cell(ctx, &ast, &input_values[column])
                };
                traces.push(InputEvaluation {
                    rule_index: rule.index,
                    variable: table.inputs[column].variable.clone(),
                    entry: text.to_string(),
                    matched: cell_hit,
                });
                if !cell_hit {
                    hit = false;
                    break;
                }
            }
            trace!(decision = decision_name, rule = rule.index, hit, "rule evaluated");
            if hit {
                matched.push((rule, traces));
            }
        }
        debug!(
            decision = decision_name,
            rules = table.rules.len(),
            matched = matched.len(),
            "table match pass done"
        );

        if ctx.options().parallel_outputs {
            let texts: Vec<String> = matched
                .iter()
                .flat_map(|(r, _)| r.output_entries.iter())
                .map(|e| e.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            self.warm_cache(ctx, correlation, texts, EntryKind::Expression);
        }

        // Output pass over the positive rules.
        let mut outcomes = Vec::with_capacity(matched.len());
        for (rule, traces) in matched {
            let mut outputs = Vec::new();
            for (column, entry) in rule.output_entries.iter().enumerate() {
                let text = entry.trim();
                if text.is_empty() {
                    continue;
                }
                let ast = self.parse_cached(ctx, correlation, text, EntryKind::Expression)?;
                let env = ctx.eval_context();
                let output = &table.outputs[column];
                let value =
                    coerce_to_declared(FeelEngine::evaluate(&ast, &env), output.type_ref.as_deref());
                outputs.push(OutputValue {
                    name: output.variable.clone(),
                    value,
                    type_ref: output.type_ref.clone(),
                });
            }
            outcomes.push(RuleOutcome {
                hit: HitRule {
                    index: rule.index,
                    name: rule.name.clone(),
                },
                outputs,
                traces,
            });
        }

        let result = apply_hit_policy(decision_name, table, outcomes)?;
        write_outputs(ctx, table, &result);
        Ok(result)
    }

    fn table_input_values(
        &self,
        ctx: &mut DmnExecutionContext,
        table: &DecisionTable,
        correlation: Uuid,
    ) -> RuntimeResult<Vec<Value>> {
        let mut values = Vec::with_capacity(table.inputs.len());
        for input in &table.inputs {
            // Trivial bare names read the variable store directly.
            let trivial = normalise_variable_name(&input.expression)
                .and_then(|name| ctx.get_variable(&name).cloned());
            let value = match trivial {
                Some(v) => v,
                None => {
                    let ast =
                        self.parse_cached(ctx, correlation, &input.expression, EntryKind::Expression)?;
                    let env = ctx.eval_context();
                    FeelEngine::evaluate(&ast, &env)
                }
            };
            ctx.write_variable(&input.variable, value.clone());
            values.push(value);
        }
        Ok(values)
    }

    /// Parse a batch of cell texts concurrently and prime the cache. The
    /// later sequential pass then hits the cache; texts that fail to parse
    /// are skipped here so the sequential pass reports the error in rule
    /// order.
    fn warm_cache(
        &self,
        ctx: &DmnExecutionContext,
        correlation: Uuid,
        texts: Vec<String>,
        kind: EntryKind,
    ) {
        let keys = self.cache_keys(ctx, correlation);
        let distinct: HashSet<String> = texts.into_iter().collect();
        let pending: Vec<String> = distinct
            .into_iter()
            .filter(|t| ctx.cache().fetch(&keys, t, kind).is_none())
            .collect();
        let scope = ctx.parse_scope();
        let parsed: Vec<(String, Expr)> = pending
            .into_par_iter()
            .filter_map(|text| {
                parse_text(scope, &text, kind)
                    .ok()
                    .map(|ast| (text, ast))
            })
            .collect();
        for (text, ast) in parsed {
            ctx.cache().store(&keys, &text, kind, Arc::new(ast));
        }
    }
}

fn is_irrelevant_cell(text: &str) -> bool {
    text.is_empty() || text == "-"
}

/// Evaluate one parsed input cell against the column's input value. Unary
/// tests use unary-test semantics; a full-expression fallback is
/// interpreted as a boolean (not re-checked for unary-test shape).
fn evaluate_cell(ctx: &DmnExecutionContext, ast: &Expr, input_value: &Value) -> bool {
    let env = ctx.eval_context().with_input(input_value.clone());
    FeelEngine::evaluate(ast, &env) == Value::Boolean(true)
}

/// Write result values back to the output variables: a single result writes
/// the values themselves, a multi-result writes each output as a list.
fn write_outputs(ctx: &mut DmnExecutionContext, table: &DecisionTable, result: &DecisionResult) {
    if result.results.is_empty() {
        return;
    }
    if let [single] = result.results.as_slice() {
        for output in &single.outputs {
            ctx.write_variable(&output.name, output.value.clone());
        }
        return;
    }
    for output in &table.outputs {
        let collected: Vec<Value> = result
            .results
            .iter()
            .filter_map(|r| r.output(&output.variable).cloned())
            .collect();
        ctx.write_variable(&output.variable, Value::List(collected));
    }
}
