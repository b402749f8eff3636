//! Definition factory: parsed model → immutable, validated definition.

use std::collections::{HashMap, HashSet};

use dmn_feel::{Channel, tokenize};
use tracing::{debug, info};

use crate::definition::{
    CollectAggregation, Decision, DecisionBody, DecisionTable, Definition, ExpressionDecision,
    HitPolicy, InputVariable, TableInput, TableOutput, TableRule,
};
use crate::dto::{ParsedDecisionBody, ParsedDecisionTable, ParsedModel};
use crate::error::{ModelError, ModelResult};
use crate::names::normalise_variable_name;

pub struct DefinitionFactory;

impl DefinitionFactory {
    /// Build and validate a definition. Requirement ids are resolved to
    /// names, variable names normalised, aliases collected, and dependency
    /// cycles rejected here rather than at evaluation time.
    pub fn build(model: &ParsedModel) -> ModelResult<Definition> {
        let mut inputs = Vec::new();
        let mut input_name_by_id = HashMap::new();
        for parsed in &model.inputs {
            let name = normalise_variable_name(&parsed.name)
                .ok_or_else(|| ModelError::UnusableName(parsed.name.clone()))?;
            input_name_by_id.insert(parsed.id.clone(), name.clone());
            inputs.push(InputVariable {
                name,
                feel_name: parsed.name.trim().to_string(),
                label: parsed.label.clone(),
                type_ref: parsed.type_ref.clone(),
                is_input_parameter: true,
            });
        }

        let decision_name_by_id: HashMap<String, String> = model
            .decisions
            .iter()
            .map(|d| (d.id.clone(), d.name.clone()))
            .collect();

        let mut aliases: HashMap<String, HashSet<String>> = HashMap::new();
        let mut decisions = Vec::new();
        let mut seen = HashSet::new();
        for parsed in &model.decisions {
            if !seen.insert(parsed.name.clone()) {
                return Err(ModelError::DuplicateDecision(parsed.name.clone()));
            }
            let required_inputs = parsed
                .required_inputs
                .iter()
                .map(|id| {
                    input_name_by_id
                        .get(id)
                        .cloned()
                        .ok_or_else(|| ModelError::UnknownRequirement {
                            decision: parsed.name.clone(),
                            id: id.clone(),
                        })
                })
                .collect::<ModelResult<Vec<_>>>()?;
            let required_decisions = parsed
                .required_decisions
                .iter()
                .map(|id| {
                    decision_name_by_id.get(id).cloned().ok_or_else(|| {
                        ModelError::UnknownRequirement {
                            decision: parsed.name.clone(),
                            id: id.clone(),
                        }
                    })
                })
                .collect::<ModelResult<Vec<_>>>()?;

            let body = match &parsed.body {
                ParsedDecisionBody::Expression {
                    expression,
                    output_variable,
                    type_ref,
                } => {
                    let output_variable = normalise_variable_name(output_variable)
                        .ok_or_else(|| ModelError::UnusableName(output_variable.clone()))?;
                    DecisionBody::Expression(ExpressionDecision {
                        expression: expression.clone(),
                        output_variable,
                        type_ref: type_ref.clone(),
                    })
                }
                ParsedDecisionBody::Table(table) => DecisionBody::Table(build_table(
                    &parsed.name,
                    table,
                    &inputs,
                    &mut aliases,
                )?),
            };

            decisions.push(Decision {
                name: parsed.name.clone(),
                required_inputs,
                required_decisions,
                body,
            });
        }

        detect_cycles(&decisions)?;

        let definition = Definition::new(
            model.dmn_version.clone(),
            inputs,
            decisions,
            aliases,
        );
        info!(
            decisions = definition.decisions().len(),
            inputs = definition.inputs().len(),
            "definition built"
        );
        Ok(definition)
    }
}

fn build_table(
    decision_name: &str,
    table: &ParsedDecisionTable,
    inputs: &[InputVariable],
    aliases: &mut HashMap<String, HashSet<String>>,
) -> ModelResult<DecisionTable> {
    let hit_policy = HitPolicy::parse(&table.hit_policy)
        .ok_or_else(|| ModelError::UnknownHitPolicy(table.hit_policy.clone()))?;
    let aggregation = match (&hit_policy, &table.aggregation) {
        (HitPolicy::Collect, Some(text)) => Some(
            CollectAggregation::parse(text)
                .ok_or_else(|| ModelError::UnknownAggregation(text.clone()))?,
        ),
        (HitPolicy::Collect, None) => Some(CollectAggregation::List),
        _ => None,
    };

    let mut table_inputs = Vec::new();
    for (i, input) in table.inputs.iter().enumerate() {
        let bare = bare_name(&input.expression);
        let variable = bare
            .as_deref()
            .and_then(normalise_variable_name)
            .or_else(|| {
                input
                    .label
                    .as_deref()
                    .and_then(normalise_variable_name)
            })
            .unwrap_or_else(|| format!("{}_input_{}", sanitised(decision_name), i + 1));
        collect_alias(input.label.as_deref(), &variable, inputs, aliases);
        table_inputs.push(TableInput {
            label: input.label.clone(),
            expression: input.expression.trim().to_string(),
            variable,
            type_ref: input.type_ref.clone(),
            allowed_values: input.allowed_values.clone(),
        });
    }

    let outputs = table
        .outputs
        .iter()
        .map(|o| {
            let variable = normalise_variable_name(&o.name)
                .ok_or_else(|| ModelError::UnusableName(o.name.clone()))?;
            Ok(TableOutput {
                label: o.label.clone(),
                variable,
                type_ref: o.type_ref.clone(),
                allowed_values: o.allowed_values.clone(),
            })
        })
        .collect::<ModelResult<Vec<_>>>()?;

    let mut rules = Vec::new();
    for (i, rule) in table.rules.iter().enumerate() {
        if rule.input_entries.len() != table.inputs.len() {
            return Err(ModelError::RuleArityMismatch {
                decision: decision_name.to_string(),
                rule: i + 1,
                kind: "input",
                expected: table.inputs.len(),
                found: rule.input_entries.len(),
            });
        }
        if rule.output_entries.len() != table.outputs.len() {
            return Err(ModelError::RuleArityMismatch {
                decision: decision_name.to_string(),
                rule: i + 1,
                kind: "output",
                expected: table.outputs.len(),
                found: rule.output_entries.len(),
            });
        }
        rules.push(TableRule {
            index: i + 1,
            name: rule.name.clone(),
            input_entries: rule.input_entries.clone(),
            output_entries: rule.output_entries.clone(),
        });
    }

    Ok(DecisionTable {
        hit_policy,
        aggregation,
        inputs: table_inputs,
        outputs,
        rules,
    })
}

/// When a table column's label names a declared input but its expression
/// binds a different variable, that variable is an alias of the input:
/// setting the input parameter must reach it.
fn collect_alias(
    label: Option<&str>,
    variable: &str,
    inputs: &[InputVariable],
    aliases: &mut HashMap<String, HashSet<String>>,
) {
    let Some(label_name) = label.and_then(normalise_variable_name) else {
        return;
    };
    let Some(input) = inputs.iter().find(|i| i.name == label_name) else {
        return;
    };
    if input.name != variable {
        debug!(input = %input.name, alias = %variable, "table input aliases model input");
        aliases
            .entry(input.name.clone())
            .or_default()
            .insert(variable.to_string());
    }
}

/// The trimmed expression when it is a single (possibly multi-word) name.
fn bare_name(expression: &str) -> Option<String> {
    let tokens = tokenize(expression).ok()?;
    let words: Vec<&str> = tokens
        .iter()
        .filter(|t| t.channel == Channel::Default)
        .take_while(|t| t.kind != dmn_feel::TokenKind::Eof)
        .map(|t| {
            if t.kind.is_name_like() {
                Some(t.text.as_str())
            } else {
                None
            }
        })
        .collect::<Option<Vec<_>>>()?;
    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}

fn sanitised(name: &str) -> String {
    normalise_variable_name(name).unwrap_or_else(|| "decision".to_string())
}

/// Standard three-colour DFS over the required-decision edges.
fn detect_cycles(decisions: &[Decision]) -> ModelResult<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Colour {
        White,
        Grey,
        Black,
    }
    let index: HashMap<&str, usize> = decisions
        .iter()
        .enumerate()
        .map(|(i, d)| (d.name.as_str(), i))
        .collect();
    let mut colours = vec![Colour::White; decisions.len()];

    fn visit(
        at: usize,
        decisions: &[Decision],
        index: &HashMap<&str, usize>,
        colours: &mut [Colour],
    ) -> ModelResult<()> {
        colours[at] = Colour::Grey;
        for required in &decisions[at].required_decisions {
            let Some(&next) = index.get(required.as_str()) else {
                continue;
            };
            match colours[next] {
                Colour::Grey => {
                    return Err(ModelError::CyclicDependency(required.clone()));
                }
                Colour::White => visit(next, decisions, index, colours)?,
                Colour::Black => {}
            }
        }
        colours[at] = Colour::Black;
        Ok(())
    }

    for i in 0..decisions.len() {
        if colours[i] == Colour::White {
            visit(i, decisions, &index, &mut colours)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::*;

    fn input(id: &str, name: &str) -> ParsedInputData {
        ParsedInputData {
            id: id.to_string(),
            name: name.to_string(),
            label: None,
            type_ref: None,
        }
    }

    fn expression_decision(id: &str, name: &str, expr: &str, requires: &[&str]) -> ParsedDecision {
        ParsedDecision {
            id: id.to_string(),
            name: name.to_string(),
            required_inputs: Vec::new(),
            required_decisions: requires.iter().map(|s| s.to_string()).collect(),
            body: ParsedDecisionBody::Expression {
                expression: expr.to_string(),
                output_variable: format!("{name}_out"),
                type_ref: None,
            },
        }
    }

    #[test]
    fn builds_simple_definition() {
        let model = ParsedModel {
            dmn_version: Some("1.3".to_string()),
            inputs: vec![input("i1", "CS Score")],
            decisions: vec![ParsedDecision {
                id: "d1".to_string(),
                name: "Scoring".to_string(),
                required_inputs: vec!["i1".to_string()],
                required_decisions: Vec::new(),
                body: ParsedDecisionBody::Expression {
                    expression: "CS_Score * 2".to_string(),
                    output_variable: "score".to_string(),
                    type_ref: None,
                },
            }],
        };
        let definition = DefinitionFactory::build(&model).unwrap();
        assert_eq!(definition.inputs()[0].name, "CS_Score");
        assert_eq!(definition.inputs()[0].feel_name, "CS Score");
        let decision = definition.decision("Scoring").unwrap();
        assert_eq!(decision.required_inputs, vec!["CS_Score".to_string()]);
    }

    #[test]
    fn rejects_cycles_at_build_time() {
        let model = ParsedModel {
            dmn_version: None,
            inputs: Vec::new(),
            decisions: vec![
                expression_decision("d1", "A", "1", &["d2"]),
                expression_decision("d2", "B", "2", &["d1"]),
            ],
        };
        assert!(matches!(
            DefinitionFactory::build(&model),
            Err(ModelError::CyclicDependency(_))
        ));
    }

    #[test]
    fn rejects_unknown_requirement() {
        let model = ParsedModel {
            dmn_version: None,
            inputs: Vec::new(),
            decisions: vec![expression_decision("d1", "A", "1", &["ghost"])],
        };
        assert!(matches!(
            DefinitionFactory::build(&model),
            Err(ModelError::UnknownRequirement { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_decisions() {
        let model = ParsedModel {
            dmn_version: None,
            inputs: Vec::new(),
            decisions: vec![
                expression_decision("d1", "A", "1", &[]),
                expression_decision("d2", "A", "2", &[]),
            ],
        };
        assert!(matches!(
            DefinitionFactory::build(&model),
            Err(ModelError::DuplicateDecision(_))
        ));
    }

    #[test]
    fn table_input_with_divergent_expression_registers_alias() {
        let model = ParsedModel {
            dmn_version: None,
            inputs: vec![input("i1", "Credit Score")],
            decisions: vec![ParsedDecision {
                id: "d1".to_string(),
                name: "Rate".to_string(),
                required_inputs: vec!["i1".to_string()],
                required_decisions: Vec::new(),
                body: ParsedDecisionBody::Table(ParsedDecisionTable {
                    hit_policy: "UNIQUE".to_string(),
                    aggregation: None,
                    inputs: vec![ParsedTableInput {
                        label: Some("Credit Score".to_string()),
                        expression: "score_value".to_string(),
                        type_ref: None,
                        allowed_values: Vec::new(),
                    }],
                    outputs: vec![ParsedTableOutput {
                        name: "rate".to_string(),
                        label: None,
                        type_ref: None,
                        allowed_values: Vec::new(),
                    }],
                    rules: vec![ParsedRule {
                        name: None,
                        input_entries: vec!["-".to_string()],
                        output_entries: vec!["1".to_string()],
                    }],
                }),
            }],
        };
        let definition = DefinitionFactory::build(&model).unwrap();
        let aliases: Vec<&str> = definition.aliases_of("Credit_Score").collect();
        assert_eq!(aliases, vec!["score_value"]);
    }

    #[test]
    fn rule_arity_is_validated() {
        let model = ParsedModel {
            dmn_version: None,
            inputs: Vec::new(),
            decisions: vec![ParsedDecision {
                id: "d1".to_string(),
                name: "T".to_string(),
                required_inputs: Vec::new(),
                required_decisions: Vec::new(),
                body: ParsedDecisionBody::Table(ParsedDecisionTable {
                    hit_policy: "FIRST".to_string(),
                    aggregation: None,
                    inputs: vec![ParsedTableInput {
                        label: None,
                        expression: "x".to_string(),
                        type_ref: None,
                        allowed_values: Vec::new(),
                    }],
                    outputs: vec![ParsedTableOutput {
                        name: "y".to_string(),
                        label: None,
                        type_ref: None,
                        allowed_values: Vec::new(),
                    }],
                    rules: vec![ParsedRule {
                        name: None,
                        input_entries: Vec::new(),
                        output_entries: vec!["1".to_string()],
                    }],
                }),
            }],
        };
        assert!(matches!(
            DefinitionFactory::build(&model),
            Err(ModelError::RuleArityMismatch { .. })
        ));
    }
}
