use rust_decimal::Decimal;

use super::{parse_expression, parse_unary_tests};
use crate::ast::{BinaryOp, CmpOp, Expr, IterationDomain, Quantifier};
use crate::scope::ParseScope;

fn parse(source: &str) -> Expr {
    parse_expression(source, &ParseScope::new()).unwrap()
}

fn num(n: i64) -> Expr {
    Expr::NumberLit(Decimal::from(n))
}

// -----------------------------------------------------------------------
// Literals and names
// -----------------------------------------------------------------------

#[test]
fn parse_number_literals() {
    assert_eq!(parse("42"), num(42));
    assert_eq!(parse("3.14"), Expr::NumberLit("3.14".parse().unwrap()));
    assert_eq!(parse(".5"), Expr::NumberLit("0.5".parse().unwrap()));
}

#[test]
fn parse_string_with_escapes() {
    assert_eq!(
        parse(r#""line\nbreak""#),
        Expr::StringLit("line\nbreak".to_string())
    );
    assert_eq!(parse(r#""say \"hi\"""#), Expr::StringLit("say \"hi\"".into()));
}

#[test]
fn parse_at_literal() {
    assert_eq!(
        parse(r#"@"2024-01-15""#),
        Expr::TemporalLit("2024-01-15".to_string())
    );
}

#[test]
fn parse_multi_word_name() {
    let scope = ParseScope::with_names(["Monthly Salary"]);
    let expr = parse_expression("Monthly Salary * 12", &scope).unwrap();
    assert_eq!(
        expr,
        Expr::Binary {
            op: BinaryOp::Mul,
            left: Box::new(Expr::Name("Monthly Salary".into())),
            right: Box::new(num(12)),
        }
    );
}

// -----------------------------------------------------------------------
// Operators and precedence
// -----------------------------------------------------------------------

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
        parse("1 + 2 * 3"),
        Expr::Binary {
            op: BinaryOp::Add,
            left: Box::new(num(1)),
            right: Box::new(Expr::Binary {
                op: BinaryOp::Mul,
                left: Box::new(num(2)),
                right: Box::new(num(3)),
            }),
        }
    );
}

#[test]
fn exponentiation_is_right_associative() {
    assert_eq!(
        parse("2 ** 3 ** 2"),
        Expr::Binary {
            op: BinaryOp::Exp,
            left: Box::new(num(2)),
            right: Box::new(Expr::Binary {
                op: BinaryOp::Exp,
                left: Box::new(num(3)),
                right: Box::new(num(2)),
            }),
        }
    );
}

#[test]
fn conjunction_collects_n_ary() {
    match parse("a and b and c") {
        Expr::Conjunction(items) => assert_eq!(items.len(), 3),
        other => panic!("expected conjunction, got {other:?}"),
    }
}

#[test]
fn or_binds_looser_than_and() {
    match parse("a or b and c") {
        Expr::Disjunction(items) => {
            assert_eq!(items.len(), 2);
            assert!(matches!(items[1], Expr::Conjunction(_)));
        }
        other => panic!("expected disjunction, got {other:?}"),
    }
}

#[test]
fn comparison_with_both_sides() {
    assert_eq!(
        parse("age >= 18"),
        Expr::Comparison {
            op: CmpOp::Ge,
            left: Some(Box::new(Expr::Name("age".into()))),
            right: Box::new(num(18)),
        }
    );
}

#[test]
fn between_expression() {
    match parse("x between 1 and 10") {
        Expr::Between { .. } => {}
        other => panic!("expected between, got {other:?}"),
    }
}

#[test]
fn instance_of_with_multi_word_type() {
    match parse("x instance of days and time duration") {
        Expr::InstanceOf { type_name, .. } => {
            assert_eq!(type_name, "days and time duration");
        }
        other => panic!("expected instance of, got {other:?}"),
    }
}

#[test]
fn in_with_test_list() {
    match parse("x in (1, 2, 3)") {
        Expr::In { target, .. } => assert!(matches!(*target, Expr::ListLit(_))),
        other => panic!("expected in, got {other:?}"),
    }
}

#[test]
fn in_with_range() {
    match parse("x in [1..10]") {
        Expr::In { target, .. } => match *target {
            Expr::RangeLit {
                low_inclusive,
                high_inclusive,
                ..
            } => {
                assert!(low_inclusive);
                assert!(high_inclusive);
            }
            other => panic!("expected range, got {other:?}"),
        },
        other => panic!("expected in, got {other:?}"),
    }
}

// -----------------------------------------------------------------------
// Control constructs
// -----------------------------------------------------------------------

#[test]
fn if_then_else() {
    match parse(r#"if age >= 18 then "adult" else "minor""#) {
        Expr::If { .. } => {}
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn ternary_desugars_to_if() {
    let ternary = parse(r#"a ? "yes" : "no""#);
    match ternary {
        Expr::If {
            condition,
            then_branch,
            ..
        } => {
            assert_eq!(*condition, Expr::Name("a".into()));
            assert_eq!(*then_branch, Expr::StringLit("yes".into()));
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn for_with_two_iterations() {
    match parse("for x in [1,2], y in [3,4] return x * y") {
        Expr::For { iterations, .. } => {
            assert_eq!(iterations.len(), 2);
            assert_eq!(iterations[0].name, "x");
        }
        other => panic!("expected for, got {other:?}"),
    }
}

#[test]
fn for_with_range_domain() {
    match parse("for i in 1..5 return i") {
        Expr::For { iterations, .. } => {
            assert!(matches!(iterations[0].domain, IterationDomain::Range(..)));
        }
        other => panic!("expected for, got {other:?}"),
    }
}

#[test]
fn quantified_some() {
    match parse("some x in [1,2,3] satisfies x > 2") {
        Expr::Quantified { quantifier, .. } => assert_eq!(quantifier, Quantifier::Some),
        other => panic!("expected quantified, got {other:?}"),
    }
}

#[test]
fn function_definition_with_external_flag() {
    match parse("function(a, b) external a + b") {
        Expr::FunctionDef {
            params, external, ..
        } => {
            assert_eq!(params, vec!["a".to_string(), "b".to_string()]);
            assert!(external);
        }
        other => panic!("expected function, got {other:?}"),
    }
}

// -----------------------------------------------------------------------
// Boxed expressions and postfix
// -----------------------------------------------------------------------

#[test]
fn context_literal_keeps_order() {
    match parse(r#"{ a: 1, "b c": 2 }"#) {
        Expr::ContextLit(entries) => {
            assert_eq!(entries[0].0, "a");
            assert_eq!(entries[1].0, "b c");
        }
        other => panic!("expected context, got {other:?}"),
    }
}

#[test]
fn filter_and_path_chain() {
    match parse("people[age > 30].name") {
        Expr::Path { source, member } => {
            assert_eq!(member, "name");
            assert!(matches!(*source, Expr::Filter { .. }));
        }
        other => panic!("expected path, got {other:?}"),
    }
}

#[test]
fn invocation_of_multi_word_builtin() {
    match parse(r#"string length("hello")"#) {
        Expr::Invocation { callee, args } => {
            assert_eq!(*callee, Expr::Name("string length".into()));
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected invocation, got {other:?}"),
    }
}

#[test]
fn named_invocation() {
    match parse("substring(string: \"abc\", start position: 2)") {
        Expr::NamedInvocation { args, .. } => {
            assert_eq!(args[0].0, "string");
            assert_eq!(args[1].0, "start position");
        }
        other => panic!("expected named invocation, got {other:?}"),
    }
}

#[test]
fn range_literal_half_open() {
    match parse("[1..10)") {
        Expr::RangeLit {
            low_inclusive,
            high_inclusive,
            ..
        } => {
            assert!(low_inclusive);
            assert!(!high_inclusive);
        }
        other => panic!("expected range, got {other:?}"),
    }
}

// -----------------------------------------------------------------------
// Errors
// -----------------------------------------------------------------------

#[test]
fn error_carries_position() {
    let err = parse_expression("1 +", &ParseScope::new()).unwrap_err();
    assert_eq!(err.line, 1);
    assert!(err.column >= 3);
}

#[test]
fn trailing_input_is_rejected() {
    assert!(parse_expression("1 2", &ParseScope::new()).is_err());
}

// -----------------------------------------------------------------------
// Unary tests grammar
// -----------------------------------------------------------------------

fn parse_tests(source: &str) -> Expr {
    parse_unary_tests(source, &ParseScope::new()).unwrap()
}

#[test]
fn dash_matches_anything() {
    assert_eq!(
        parse_tests("-"),
        Expr::UnaryTests {
            tests: vec![Expr::Dash],
            negated: false,
        }
    );
}

#[test]
fn comparison_test_has_implicit_left() {
    match parse_tests("> 5") {
        Expr::UnaryTests { tests, .. } => match &tests[0] {
            Expr::Comparison { op, left, .. } => {
                assert_eq!(*op, CmpOp::Gt);
                assert!(left.is_none());
            }
            other => panic!("expected comparison, got {other:?}"),
        },
        other => panic!("expected unary tests, got {other:?}"),
    }
}

#[test]
fn comma_separated_alternatives() {
    match parse_tests("1, 2, 3") {
        Expr::UnaryTests { tests, negated } => {
            assert_eq!(tests.len(), 3);
            assert!(!negated);
        }
        other => panic!("expected unary tests, got {other:?}"),
    }
}

#[test]
fn negated_tests() {
    match parse_tests("not(1, 2)") {
        Expr::UnaryTests { tests, negated } => {
            assert_eq!(tests.len(), 2);
            assert!(negated);
        }
        other => panic!("expected unary tests, got {other:?}"),
    }
}

#[test]
fn bare_range_is_closed() {
    match parse_tests("1..10") {
        Expr::UnaryTests { tests, .. } => match &tests[0] {
            Expr::RangeLit {
                low_inclusive,
                high_inclusive,
                ..
            } => {
                assert!(low_inclusive);
                assert!(high_inclusive);
            }
            other => panic!("expected range, got {other:?}"),
        },
        other => panic!("expected unary tests, got {other:?}"),
    }
}

#[test]
fn european_interval_is_exclusive() {
    match parse_tests("]1..10[") {
        Expr::UnaryTests { tests, .. } => match &tests[0] {
            Expr::RangeLit {
                low_inclusive,
                high_inclusive,
                ..
            } => {
                assert!(!low_inclusive);
                assert!(!high_inclusive);
            }
            other => panic!("expected range, got {other:?}"),
        },
        other => panic!("expected unary tests, got {other:?}"),
    }
}

#[test]
fn disjunction_cell_fails_simple_grammar() {
    // Camunda-style cells need the full-expression retry at the orchestrator.
    assert!(parse_unary_tests(r#"contains(?, "a") or contains(?, "b")"#, &ParseScope::new()).is_err());
}

#[test]
fn string_test_parses() {
    match parse_tests(r#""UK", "US""#) {
        Expr::UnaryTests { tests, .. } => assert_eq!(tests.len(), 2),
        other => panic!("expected unary tests, got {other:?}"),
    }
}
