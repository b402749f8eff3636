//! Hit-policy application over the positive rules of a table.

use std::cmp::Ordering;

use dmn_core::value::{canonical_string, compare_values, feel_equal};
use dmn_core::Value;
use dmn_model::{CollectAggregation, DecisionTable, HitPolicy};
use orion_error::prelude::*;
use rust_decimal::Decimal;

use crate::error::{RuntimeReason, RuntimeResult};
use crate::result::{DecisionResult, HitRule, InputEvaluation, OutputValue, SingleResult};

/// One positive rule with its evaluated outputs and input traces.
pub(super) struct RuleOutcome {
    pub hit: HitRule,
    pub outputs: Vec<OutputValue>,
    pub traces: Vec<InputEvaluation>,
}

impl RuleOutcome {
    fn into_single(self) -> SingleResult {
        SingleResult {
            outputs: self.outputs,
            hit_rules: vec![self.hit],
            input_evaluations: self.traces,
        }
    }
}

pub(super) fn apply_hit_policy(
    decision_name: &str,
    table: &DecisionTable,
    matched: Vec<RuleOutcome>,
) -> RuntimeResult<DecisionResult> {
    if matched.is_empty() {
        return Ok(DecisionResult::empty());
    }
    match table.hit_policy {
        HitPolicy::Unique => {
            if matched.len() > 1 {
                let rules: Vec<usize> = matched.iter().map(|m| m.hit.index).collect();
                return StructError::from(RuntimeReason::HitPolicyViolation)
                    .with_detail(format!(
                        "unique table '{decision_name}' matched rules {rules:?}"
                    ))
                    .err();
            }
            Ok(take_first(matched))
        }
        HitPolicy::First => Ok(take_first(matched)),
        HitPolicy::Any => {
            let first_outputs = matched[0].outputs.clone();
            for other in &matched[1..] {
                if !outputs_agree(&first_outputs, &other.outputs) {
                    return StructError::from(RuntimeReason::HitPolicyViolation)
                        .with_detail(format!(
                            "any table '{decision_name}' matched rules with conflicting outputs"
                        ))
                        .err();
                }
            }
            Ok(take_first(matched))
        }
        HitPolicy::Priority => {
            // Ties keep the earlier rule.
            let best = matched
                .into_iter()
                .reduce(|best, candidate| {
                    if priority_rank(table, &candidate) < priority_rank(table, &best) {
                        candidate
                    } else {
                        best
                    }
                })
                .expect("matched is non-empty");
            Ok(DecisionResult::single(best.into_single()))
        }
        HitPolicy::RuleOrder => Ok(DecisionResult {
            results: matched.into_iter().map(RuleOutcome::into_single).collect(),
        }),
        HitPolicy::OutputOrder => {
            let mut sorted = matched;
            sorted.sort_by(|a, b| priority_rank(table, a).cmp(&priority_rank(table, b)));
            Ok(DecisionResult {
                results: sorted.into_iter().map(RuleOutcome::into_single).collect(),
            })
        }
        HitPolicy::Collect => {
            match table.aggregation.unwrap_or(CollectAggregation::List) {
                CollectAggregation::List => Ok(DecisionResult {
                    results: matched.into_iter().map(RuleOutcome::into_single).collect(),
                }),
                aggregation => Ok(aggregate(table, matched, aggregation)),
            }
        }
    }
}

fn take_first(matched: Vec<RuleOutcome>) -> DecisionResult {
    let first = matched
        .into_iter()
        .next()
        .expect("caller checked non-empty");
    DecisionResult::single(first.into_single())
}

fn outputs_agree(a: &[OutputValue], b: &[OutputValue]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.name == y.name && feel_equal(&x.value, &y.value)
        })
}

/// Rank vector for Priority / OutputOrder: per output, the position of the
/// value in the output's allowed-values list (first entry = highest
/// priority); values not listed sort last.
fn priority_rank(table: &DecisionTable, outcome: &RuleOutcome) -> Vec<usize> {
    table
        .outputs
        .iter()
        .map(|output| {
            let Some(value) = outcome
                .outputs
                .iter()
                .find(|o| o.name == output.variable)
                .map(|o| &o.value)
            else {
                return output.allowed_values.len();
            };
            let text = canonical_string(value);
            output
                .allowed_values
                .iter()
                .position(|allowed| strip_quotes(allowed) == text)
                .unwrap_or(output.allowed_values.len())
        })
        .collect()
}

fn strip_quotes(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Collect with aggregation reduces all matches to one synthetic result.
fn aggregate(
    table: &DecisionTable,
    matched: Vec<RuleOutcome>,
    aggregation: CollectAggregation,
) -> DecisionResult {
    let hit_rules: Vec<HitRule> = matched.iter().map(|m| m.hit.clone()).collect();
    let traces: Vec<InputEvaluation> = matched
        .iter()
        .flat_map(|m| m.traces.iter().cloned())
        .collect();
    let outputs = table
        .outputs
        .iter()
        .map(|output| {
            let values: Vec<&Value> = matched
                .iter()
                .filter_map(|m| {
                    m.outputs
                        .iter()
                        .find(|o| o.name == output.variable)
                        .map(|o| &o.value)
                })
                .collect();
            OutputValue {
                name: output.variable.clone(),
                value: aggregate_values(&values, aggregation),
                type_ref: output.type_ref.clone(),
            }
        })
        .collect();
    DecisionResult::single(SingleResult {
        outputs,
        hit_rules,
        input_evaluations: traces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmn_model::{DecisionTable, HitPolicy, TableOutput};

    fn outcome(index: usize, value: Value) -> RuleOutcome {
        RuleOutcome {
            hit: HitRule { index, name: None },
            outputs: vec![OutputValue {
                name: "out".to_string(),
                value,
                type_ref: None,
            }],
            traces: Vec::new(),
        }
    }

    fn table(hit_policy: HitPolicy, allowed: &[&str]) -> DecisionTable {
        DecisionTable {
            hit_policy,
            aggregation: None,
            inputs: Vec::new(),
            outputs: vec![TableOutput {
                label: None,
                variable: "out".to_string(),
                type_ref: None,
                allowed_values: allowed.iter().map(|s| s.to_string()).collect(),
            }],
            rules: Vec::new(),
        }
    }

    fn num(n: i64) -> Value {
        Value::Number(Decimal::from(n))
    }

    #[test]
    fn empty_matches_yield_empty_result() {
        let t = table(HitPolicy::Unique, &[]);
        let result = apply_hit_policy("t", &t, Vec::new()).unwrap();
        assert!(!result.has_result());
    }

    #[test]
    fn unique_rejects_two_matches() {
        let t = table(HitPolicy::Unique, &[]);
        let matched = vec![outcome(1, num(1)), outcome(2, num(2))];
        assert!(apply_hit_policy("t", &t, matched).is_err());
    }

    #[test]
    fn priority_uses_allowed_value_positions() {
        let t = table(HitPolicy::Priority, &[r#""gold""#, r#""silver""#]);
        let matched = vec![
            outcome(1, Value::string("silver")),
            outcome(2, Value::string("gold")),
        ];
        let result = apply_hit_policy("t", &t, matched).unwrap();
        assert_eq!(result.output("out"), Some(&Value::string("gold")));
        assert_eq!(result.first().unwrap().hit_rules[0].index, 2);
    }

    #[test]
    fn priority_tie_keeps_earlier_rule() {
        let t = table(HitPolicy::Priority, &[r#""gold""#]);
        let matched = vec![
            outcome(1, Value::string("gold")),
            outcome(2, Value::string("gold")),
        ];
        let result = apply_hit_policy("t", &t, matched).unwrap();
        assert_eq!(result.first().unwrap().hit_rules[0].index, 1);
    }

    #[test]
    fn collect_aggregations() {
        let mut t = table(HitPolicy::Collect, &[]);
        for (aggregation, expected) in [
            (CollectAggregation::Sum, num(30)),
            (CollectAggregation::Min, num(10)),
            (CollectAggregation::Max, num(20)),
            (CollectAggregation::Count, num(2)),
        ] {
            t.aggregation = Some(aggregation);
            let matched = vec![outcome(1, num(10)), outcome(2, num(20))];
            let result = apply_hit_policy("t", &t, matched).unwrap();
            assert_eq!(result.output("out"), Some(&expected), "{aggregation:?}");
        }
    }

    #[test]
    fn sum_of_non_numeric_is_null() {
        let mut t = table(HitPolicy::Collect, &[]);
        t.aggregation = Some(CollectAggregation::Sum);
        let matched = vec![outcome(1, Value::string("a"))];
        let result = apply_hit_policy("t", &t, matched).unwrap();
        assert_eq!(result.output("out"), Some(&Value::Null));
    }
}

fn aggregate_values(values: &[&Value], aggregation: CollectAggregation) -> Value {
    match aggregation {
        CollectAggregation::Count => Value::Number(Decimal::from(values.len() as u64)),
        CollectAggregation::Sum => {
            let mut total = Decimal::ZERO;
            for v in values {
                match v.as_number().and_then(|n| total.checked_add(n)) {
                    Some(t) => total = t,
                    None => return Value::Null,
                }
            }
            Value::Number(total)
        }
        CollectAggregation::Min | CollectAggregation::Max => {
            let keep = if aggregation == CollectAggregation::Min {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let Some(mut best) = values.first().map(|v| (*v).clone()) else {
                return Value::Null;
            };
            for v in &values[1..] {
                match compare_values(v, &best) {
                    Some(ord) if ord == keep => best = (*v).clone(),
                    Some(_) => {}
                    None => return Value::Null,
                }
            }
            best
        }
        CollectAggregation::List => Value::List(values.iter().map(|v| (*v).clone()).collect()),
    }
}
