//! End-to-end decision evaluation over built definitions.

use std::sync::Arc;

use dmn_core::Value;
use dmn_model::{
    DefinitionFactory, ParsedDecision, ParsedDecisionBody, ParsedDecisionTable, ParsedInputData,
    ParsedModel, ParsedRule, ParsedTableInput, ParsedTableOutput,
};
use dmn_runtime::{DecisionExecutor, DmnExecutionContext, EvaluationOptions};
use rust_decimal::Decimal;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn num(n: i64) -> Value {
    Value::Number(Decimal::from(n))
}

fn input(id: &str, name: &str) -> ParsedInputData {
    ParsedInputData {
        id: id.to_string(),
        name: name.to_string(),
        label: None,
        type_ref: None,
    }
}

fn table_input(expression: &str) -> ParsedTableInput {
    ParsedTableInput {
        label: None,
        expression: expression.to_string(),
        type_ref: None,
        allowed_values: Vec::new(),
    }
}

fn table_output(name: &str, allowed: &[&str]) -> ParsedTableOutput {
    ParsedTableOutput {
        name: name.to_string(),
        label: None,
        type_ref: None,
        allowed_values: allowed.iter().map(|s| s.to_string()).collect(),
    }
}

fn rule(inputs: &[&str], outputs: &[&str]) -> ParsedRule {
    ParsedRule {
        name: None,
        input_entries: inputs.iter().map(|s| s.to_string()).collect(),
        output_entries: outputs.iter().map(|s| s.to_string()).collect(),
    }
}

/// The loan-decision model: Location, Sole_Trader, CS_Score → Loan_Result.
fn loan_model(hit_policy: &str, aggregation: Option<&str>, rules: Vec<ParsedRule>) -> ParsedModel {
    ParsedModel {
        dmn_version: Some("1.3".to_string()),
        inputs: vec![
            input("i1", "Location"),
            input("i2", "Sole_Trader"),
            input("i3", "CS_Score"),
        ],
        decisions: vec![ParsedDecision {
            id: "d1".to_string(),
            name: "Loan".to_string(),
            required_inputs: vec!["i1".to_string(), "i2".to_string(), "i3".to_string()],
            required_decisions: Vec::new(),
            body: ParsedDecisionBody::Table(ParsedDecisionTable {
                hit_policy: hit_policy.to_string(),
                aggregation: aggregation.map(str::to_string),
                inputs: vec![
                    table_input("Location"),
                    table_input("Sole_Trader"),
                    table_input("CS_Score"),
                ],
                outputs: vec![table_output(
                    "Loan_Result",
                    &[r#""Decline""#, r#""Refer""#, r#""Accept""#],
                )],
                rules,
            }),
        }],
    }
}

fn loan_rules() -> Vec<ParsedRule> {
    vec![
        rule(&[r#""UK""#, "false", "< 50"], &[r#""Decline""#]),
        rule(&[r#""UK""#, "true", ">= 50"], &[r#""Accept""#]),
        rule(&[r#""US""#, "false", "[40..60]"], &[r#""Refer""#]),
    ]
}

fn executor_for(model: &ParsedModel) -> (DecisionExecutor, DmnExecutionContext) {
    init_tracing();
    let definition = Arc::new(DefinitionFactory::build(model).unwrap());
    let ctx = DmnExecutionContext::with_defaults(definition.clone());
    (DecisionExecutor::new(definition), ctx)
}

fn set_loan_inputs(ctx: &mut DmnExecutionContext, location: &str, sole_trader: bool, score: i64) {
    ctx.set_input_parameter("Location", Value::string(location)).unwrap();
    ctx.set_input_parameter("Sole_Trader", Value::Boolean(sole_trader)).unwrap();
    ctx.set_input_parameter("CS_Score", num(score)).unwrap();
}

// ---------------------------------------------------------------------------
// Unique tables
// ---------------------------------------------------------------------------

#[test]
fn unique_table_selects_the_single_matching_rule() {
    let model = loan_model("UNIQUE", None, loan_rules());
    let (executor, mut ctx) = executor_for(&model);

    for (location, sole_trader, score, expected) in [
        ("UK", false, 35, "Decline"),
        ("UK", true, 80, "Accept"),
        ("US", false, 50, "Refer"),
    ] {
        set_loan_inputs(&mut ctx, location, sole_trader, score);
        let result = executor.execute(&mut ctx, "Loan").unwrap();
        assert!(result.has_result());
        assert!(result.is_single_result());
        assert_eq!(result.output("Loan_Result"), Some(&Value::string(expected)));
    }
}

#[test]
fn unique_violation_is_an_error() {
    let mut rules = loan_rules();
    // Overlaps rule 1 for UK/false/low scores.
    rules.push(rule(&[r#""UK""#, "-", "< 40"], &[r#""Refer""#]));
    let model = loan_model("UNIQUE", None, rules);
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "UK", false, 35);
    assert!(executor.execute(&mut ctx, "Loan").is_err());
}

#[test]
fn no_match_yields_an_empty_result() {
    let model = loan_model("UNIQUE", None, loan_rules());
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "FR", false, 35);
    let result = executor.execute(&mut ctx, "Loan").unwrap();
    assert!(!result.has_result());
}

// ---------------------------------------------------------------------------
// Other hit policies
// ---------------------------------------------------------------------------

#[test]
fn first_takes_declaration_order() {
    let rules = vec![
        rule(&["-", "-", "> 0"], &[r#""Decline""#]),
        rule(&["-", "-", "> 0"], &[r#""Accept""#]),
    ];
    let model = loan_model("FIRST", None, rules);
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "UK", false, 10);
    let result = executor.execute(&mut ctx, "Loan").unwrap();
    assert_eq!(result.output("Loan_Result"), Some(&Value::string("Decline")));
    assert_eq!(result.first().unwrap().hit_rules[0].index, 1);
}

#[test]
fn any_requires_agreeing_outputs() {
    let agreeing = vec![
        rule(&["-", "-", "> 0"], &[r#""Accept""#]),
        rule(&["-", "-", "> 5"], &[r#""Accept""#]),
    ];
    let model = loan_model("ANY", None, agreeing);
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "UK", false, 10);
    let result = executor.execute(&mut ctx, "Loan").unwrap();
    assert_eq!(result.output("Loan_Result"), Some(&Value::string("Accept")));

    let conflicting = vec![
        rule(&["-", "-", "> 0"], &[r#""Accept""#]),
        rule(&["-", "-", "> 5"], &[r#""Decline""#]),
    ];
    let model = loan_model("ANY", None, conflicting);
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "UK", false, 10);
    assert!(executor.execute(&mut ctx, "Loan").is_err());
}

#[test]
fn priority_follows_allowed_value_order() {
    // Allowed values: Decline, Refer, Accept — Decline has highest priority.
    let rules = vec![
        rule(&["-", "-", "> 0"], &[r#""Accept""#]),
        rule(&["-", "-", "> 5"], &[r#""Decline""#]),
    ];
    let model = loan_model("PRIORITY", None, rules);
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "UK", false, 10);
    let result = executor.execute(&mut ctx, "Loan").unwrap();
    assert_eq!(result.output("Loan_Result"), Some(&Value::string("Decline")));
}

#[test]
fn rule_order_returns_all_matches_in_declared_order() {
    let rules = vec![
        rule(&["-", "-", "> 0"], &[r#""Decline""#]),
        rule(&["-", "-", "> 5"], &[r#""Refer""#]),
        rule(&["-", "-", "> 50"], &[r#""Accept""#]),
    ];
    let model = loan_model("RULE ORDER", None, rules);
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "UK", false, 10);
    let result = executor.execute(&mut ctx, "Loan").unwrap();
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.results[0].output("Loan_Result"), Some(&Value::string("Decline")));
    assert_eq!(result.results[1].output("Loan_Result"), Some(&Value::string("Refer")));
    // Multi-results land in the variable store as a list.
    assert_eq!(
        ctx.get_variable("Loan_Result"),
        Some(&Value::List(vec![
            Value::string("Decline"),
            Value::string("Refer"),
        ]))
    );
}

#[test]
fn output_order_sorts_by_priority() {
    let rules = vec![
        rule(&["-", "-", "> 0"], &[r#""Accept""#]),
        rule(&["-", "-", "> 5"], &[r#""Decline""#]),
    ];
    let model = loan_model("OUTPUT ORDER", None, rules);
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "UK", false, 10);
    let result = executor.execute(&mut ctx, "Loan").unwrap();
    assert_eq!(result.results[0].output("Loan_Result"), Some(&Value::string("Decline")));
    assert_eq!(result.results[1].output("Loan_Result"), Some(&Value::string("Accept")));
}

#[test]
fn collect_sum_aggregates_numeric_outputs() {
    let rules = vec![
        rule(&["-", "-", "> 0"], &["10"]),
        rule(&["-", "-", "> 5"], &["32"]),
    ];
    let mut model = loan_model("COLLECT", Some("SUM"), rules);
    // Numeric output, no allowed values.
    if let ParsedDecisionBody::Table(table) = &mut model.decisions[0].body {
        table.outputs = vec![table_output("Loan_Score", &[])];
    }
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "UK", false, 10);
    let result = executor.execute(&mut ctx, "Loan").unwrap();
    assert_eq!(result.output("Loan_Score"), Some(&num(42)));
    assert_eq!(result.first().unwrap().hit_rules.len(), 2);
}

#[test]
fn collect_without_aggregation_lists_results() {
    let rules = vec![
        rule(&["-", "-", "> 0"], &[r#""Decline""#]),
        rule(&["-", "-", "> 5"], &[r#""Refer""#]),
    ];
    let model = loan_model("COLLECT", None, rules);
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "UK", false, 10);
    let result = executor.execute(&mut ctx, "Loan").unwrap();
    assert_eq!(result.results.len(), 2);
}

// ---------------------------------------------------------------------------
// Parallel invariance
// ---------------------------------------------------------------------------

#[test]
fn parallel_options_do_not_change_results() {
    let model = loan_model("UNIQUE", None, loan_rules());
    let definition = Arc::new(DefinitionFactory::build(&model).unwrap());
    let executor = DecisionExecutor::new(definition.clone());

    let outputs: Vec<Option<Value>> = [false, true]
        .into_iter()
        .map(|parallel| {
            let options = EvaluationOptions {
                parallel_rules: parallel,
                parallel_outputs: parallel,
                ..EvaluationOptions::default()
            };
            let mut ctx = DmnExecutionContext::new(definition.clone(), options);
            set_loan_inputs(&mut ctx, "US", false, 50);
            let result = executor.execute(&mut ctx, "Loan").unwrap();
            result.output("Loan_Result").cloned()
        })
        .collect();
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[0], Some(Value::string("Refer")));
}

// ---------------------------------------------------------------------------
// Decision graphs
// ---------------------------------------------------------------------------

fn graph_model() -> ParsedModel {
    ParsedModel {
        dmn_version: None,
        inputs: vec![input("i1", "amount")],
        decisions: vec![
            ParsedDecision {
                id: "d1".to_string(),
                name: "Risk".to_string(),
                required_inputs: vec!["i1".to_string()],
                required_decisions: Vec::new(),
                body: ParsedDecisionBody::Expression {
                    expression: "amount * 2".to_string(),
                    output_variable: "risk_score".to_string(),
                    type_ref: Some("number".to_string()),
                },
            },
            ParsedDecision {
                id: "d2".to_string(),
                name: "Assessment".to_string(),
                required_inputs: Vec::new(),
                required_decisions: vec!["d1".to_string()],
                body: ParsedDecisionBody::Expression {
                    expression: r#"if risk_score > 100 then "high" else "low""#.to_string(),
                    output_variable: "assessment".to_string(),
                    type_ref: Some("string".to_string()),
                },
            },
        ],
    }
}

#[test]
fn upstream_decisions_run_first_and_appear_in_the_trace() {
    let model = graph_model();
    let (executor, mut ctx) = executor_for(&model);
    ctx.set_input_parameter("amount", num(60)).unwrap();

    let result = executor.execute(&mut ctx, "Assessment").unwrap();
    assert_eq!(result.output("assessment"), Some(&Value::string("high")));

    // Upstream outputs are visible in the store and in the snapshots.
    assert_eq!(ctx.get_variable("risk_score"), Some(&num(120)));
    let snapshots = ctx.snapshots();
    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].decision, None);
    assert_eq!(snapshots[1].decision.as_deref(), Some("Risk"));
    assert_eq!(snapshots[1].value("risk_score"), Some(&num(120)));
    assert_eq!(snapshots[2].decision.as_deref(), Some("Assessment"));
    assert_eq!(
        snapshots[2].value("assessment"),
        Some(&Value::string("high"))
    );
    let upstream = snapshots[1].result.as_ref().unwrap();
    assert_eq!(upstream.output("risk_score"), Some(&num(120)));
}

#[test]
fn table_consumes_upstream_decision_output() {
    let model = ParsedModel {
        dmn_version: None,
        inputs: vec![input("i1", "amount")],
        decisions: vec![
            ParsedDecision {
                id: "d1".to_string(),
                name: "Risk".to_string(),
                required_inputs: vec!["i1".to_string()],
                required_decisions: Vec::new(),
                body: ParsedDecisionBody::Expression {
                    expression: "amount * 2".to_string(),
                    output_variable: "risk_score".to_string(),
                    type_ref: None,
                },
            },
            ParsedDecision {
                id: "d2".to_string(),
                name: "Band".to_string(),
                required_inputs: Vec::new(),
                required_decisions: vec!["d1".to_string()],
                body: ParsedDecisionBody::Table(ParsedDecisionTable {
                    hit_policy: "UNIQUE".to_string(),
                    aggregation: None,
                    inputs: vec![table_input("risk_score")],
                    outputs: vec![table_output("band", &[])],
                    rules: vec![
                        rule(&["< 100"], &[r#""low""#]),
                        rule(&[">= 100"], &[r#""high""#]),
                    ],
                }),
            },
        ],
    };
    let (executor, mut ctx) = executor_for(&model);
    ctx.set_input_parameter("amount", num(60)).unwrap();
    let result = executor.execute(&mut ctx, "Band").unwrap();
    assert_eq!(result.output("band"), Some(&Value::string("high")));
    // Both the final and the upstream outputs are assertable.
    assert_eq!(ctx.get_variable("risk_score"), Some(&num(120)));
    let trace = ctx.snapshots();
    assert!(trace.iter().any(|s| s.decision.as_deref() == Some("Risk")));
    let band_hit = &result.first().unwrap().hit_rules[0];
    assert_eq!(band_hit.index, 2);
    assert!(
        result.first().unwrap().input_evaluations.iter().all(|e| e.matched),
        "matched rule carries its input traces"
    );
}

#[test]
fn unknown_decision_is_an_error() {
    let model = graph_model();
    let (executor, mut ctx) = executor_for(&model);
    assert!(executor.execute(&mut ctx, "Nope").is_err());
}

// ---------------------------------------------------------------------------
// Context behaviour
// ---------------------------------------------------------------------------

#[test]
fn reset_clears_non_inputs_and_snapshots() {
    let model = graph_model();
    let (executor, mut ctx) = executor_for(&model);
    ctx.set_input_parameter("amount", num(60)).unwrap();
    executor.execute(&mut ctx, "Assessment").unwrap();
    assert!(ctx.get_variable("risk_score").is_some_and(|v| !v.is_null()));

    ctx.reset();
    assert_eq!(ctx.get_variable("risk_score"), Some(&Value::Null));
    assert_eq!(ctx.get_variable("assessment"), Some(&Value::Null));
    assert!(ctx.snapshots().is_empty());
    // Inputs survive a reset.
    assert_eq!(ctx.get_variable("amount"), Some(&num(60)));
    // The session is reusable.
    let result = executor.execute(&mut ctx, "Assessment").unwrap();
    assert_eq!(result.output("assessment"), Some(&Value::string("high")));
}

#[test]
fn input_parameters_are_write_protected() {
    let model = graph_model();
    let (_, mut ctx) = executor_for(&model);
    assert!(ctx.set_variable("amount", num(1)).is_err());
    assert!(ctx.set_variable("risk_score", num(1)).is_ok());
    assert!(ctx.set_input_parameter("amount", num(1)).is_ok());
    assert!(ctx.set_input_parameter("ghost", num(1)).is_err());
}

#[test]
fn multi_word_input_names_resolve_in_expressions() {
    let model = ParsedModel {
        dmn_version: None,
        inputs: vec![input("i1", "Monthly Salary")],
        decisions: vec![ParsedDecision {
            id: "d1".to_string(),
            name: "Yearly".to_string(),
            required_inputs: vec!["i1".to_string()],
            required_decisions: Vec::new(),
            body: ParsedDecisionBody::Expression {
                expression: "Monthly Salary * 12".to_string(),
                output_variable: "yearly_salary".to_string(),
                type_ref: None,
            },
        }],
    };
    let (executor, mut ctx) = executor_for(&model);
    ctx.set_input_parameter("Monthly Salary", num(1000)).unwrap();
    let result = executor.execute(&mut ctx, "Yearly").unwrap();
    assert_eq!(result.output("yearly_salary"), Some(&num(12_000)));
}

#[test]
fn constructor_shorthand_cells_parse() {
    let model = ParsedModel {
        dmn_version: None,
        inputs: vec![input("i1", "start")],
        decisions: vec![ParsedDecision {
            id: "d1".to_string(),
            name: "Deadline".to_string(),
            required_inputs: vec!["i1".to_string()],
            required_decisions: Vec::new(),
            body: ParsedDecisionBody::Expression {
                expression: "start + duration(P3Y)".to_string(),
                output_variable: "deadline".to_string(),
                type_ref: None,
            },
        }],
    };
    let (executor, mut ctx) = executor_for(&model);
    let start = dmn_core::temporal::parse_date("2018-01-23").unwrap();
    ctx.set_input_parameter("start", Value::Date(start)).unwrap();
    let result = executor.execute(&mut ctx, "Deadline").unwrap();
    let expected = dmn_core::temporal::parse_date("2021-01-23").unwrap();
    assert_eq!(result.output("deadline"), Some(&Value::Date(expected)));
}

#[test]
fn full_expression_fallback_for_table_cells() {
    // `contains(...) or contains(...)` fails the simple-unary-tests grammar
    // and comes back through the full expression grammar as a boolean.
    let rules = vec![rule(
        &[r#"contains(?, "K") or contains(?, "S")"#, "-", "-"],
        &[r#""Accept""#],
    )];
    let model = loan_model("FIRST", None, rules);
    let (executor, mut ctx) = executor_for(&model);
    set_loan_inputs(&mut ctx, "UK", false, 10);
    let result = executor.execute(&mut ctx, "Loan").unwrap();
    assert_eq!(result.output("Loan_Result"), Some(&Value::string("Accept")));

    set_loan_inputs(&mut ctx, "FR", false, 10);
    let result = executor.execute(&mut ctx, "Loan").unwrap();
    assert!(!result.has_result());
}
