//! Tree-walking FEEL evaluator.
//!
//! Stateless apart from the [`EvalContext`] passed in: a chain of scopes, a
//! slot for the implicit input value (unary tests, the filter loop variable
//! `item`, and the distinguished name `?`), and a pluggable function
//! resolver for built-ins. Ill-typed operations yield `Null`; the evaluator
//! never panics on well-formed ASTs.

pub(crate) mod ops;


use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{Datelike, Timelike};
use dmn_feel::{BinaryOp, CmpOp, Expr, Iteration, IterationDomain, Quantifier};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::builtins::{self, BuiltinFunction};
use crate::temporal;
use crate::value::{
    ContextMap, FeelType, FunctionValue, RangeValue, Value, compare_values, feel_equal,
};

// ---------------------------------------------------------------------------
// Scope chain
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<ScopeHandle>,
}

pub type ScopeHandle = Rc<RefCell<Scope>>;

impl Scope {
    pub fn root() -> ScopeHandle {
        Rc::new(RefCell::new(Scope::default()))
    }

    pub fn child_of(parent: &ScopeHandle) -> ScopeHandle {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent: Some(parent.clone()),
        }))
    }

    pub fn set(handle: &ScopeHandle, name: impl Into<String>, value: Value) {
        handle.borrow_mut().vars.insert(name.into(), value);
    }

    /// Walk the parent chain; `None` when the name is unbound anywhere.
    pub fn lookup(handle: &ScopeHandle, name: &str) -> Option<Value> {
        let scope = handle.borrow();
        if let Some(v) = scope.vars.get(name) {
            return Some(v.clone());
        }
        scope.parent.as_ref().and_then(|p| Scope::lookup(p, name))
    }
}

// ---------------------------------------------------------------------------
// Evaluation context
// ---------------------------------------------------------------------------

pub type FunctionResolver = Rc<dyn Fn(&str) -> Option<&'static BuiltinFunction>>;

#[derive(Clone)]
pub struct EvalContext {
    pub scope: ScopeHandle,
    pub input_value: Option<Value>,
    pub resolver: FunctionResolver,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    pub fn new() -> Self {
        Self::with_scope(Scope::root())
    }

    pub fn with_scope(scope: ScopeHandle) -> Self {
        Self {
            scope,
            input_value: None,
            resolver: Rc::new(builtins::lookup),
        }
    }

    /// A child context with a fresh nested scope.
    pub fn child(&self) -> Self {
        Self {
            scope: Scope::child_of(&self.scope),
            input_value: self.input_value.clone(),
            resolver: self.resolver.clone(),
        }
    }

    pub fn with_input(&self, input: Value) -> Self {
        Self {
            scope: self.scope.clone(),
            input_value: Some(input),
            resolver: self.resolver.clone(),
        }
    }

    pub fn set_variable(&self, name: impl Into<String>, value: Value) {
        Scope::set(&self.scope, name, value);
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        Scope::lookup(&self.scope, name)
    }

    fn input(&self) -> Value {
        self.input_value.clone().unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

pub fn evaluate(expr: &Expr, env: &EvalContext) -> Value {
    match expr {
        Expr::NumberLit(n) => Value::Number(*n),
        Expr::StringLit(s) => Value::String(s.clone()),
        Expr::BoolLit(b) => Value::Boolean(*b),
        Expr::NullLit => Value::Null,
        Expr::TemporalLit(raw) => temporal::parse_temporal_literal(raw),
        Expr::Dash => Value::Boolean(true),
        Expr::InputValue => env.input(),

        Expr::Name(name) => env.get_variable(name).unwrap_or(Value::Null),

        Expr::Binary { op, left, right } => {
            let lv = evaluate(left, env);
            let rv = evaluate(right, env);
            match op {
                BinaryOp::Add => ops::add(&lv, &rv),
                BinaryOp::Sub => ops::subtract(&lv, &rv),
                BinaryOp::Mul => ops::multiply(&lv, &rv),
                BinaryOp::Div => ops::divide(&lv, &rv),
                BinaryOp::Mod => ops::modulo(&lv, &rv),
                BinaryOp::Exp => ops::exponent(&lv, &rv),
            }
        }
        Expr::Neg(inner) => ops::negate(&evaluate(inner, env)),
        Expr::Not(inner) => match truth(&evaluate(inner, env)) {
            Some(b) => Value::Boolean(!b),
            None => Value::Null,
        },

        Expr::Comparison { op, left, right } => {
            let lv = match left {
                Some(e) => evaluate(e, env),
                None => env.input(),
            };
            let rv = evaluate(right, env);
            compare(*op, &lv, &rv)
        }
        Expr::Between { value, low, high } => {
            let v = evaluate(value, env);
            let lo = evaluate(low, env);
            let hi = evaluate(high, env);
            if v.is_null() || lo.is_null() || hi.is_null() {
                return Value::Null;
            }
            match (compare_values(&v, &lo), compare_values(&v, &hi)) {
                (Some(a), Some(b)) => Value::Boolean(
                    a != std::cmp::Ordering::Less && b != std::cmp::Ordering::Greater,
                ),
                _ => Value::Null,
            }
        }
        Expr::In { value, target } => {
            let v = evaluate(value, env);
            let test_env = env.with_input(v.clone());
            // `x in (t1, t2, ...)` checks each test; any other target is a
            // single test (value equality, range containment, or list
            // membership).
            let hit = match target.as_ref() {
                Expr::ListLit(tests) => tests.iter().any(|t| test_matches(t, &v, &test_env)),
                single => test_matches(single, &v, &test_env),
            };
            Value::Boolean(hit)
        }
        Expr::InstanceOf { value, type_name } => {
            let v = evaluate(value, env);
            match FeelType::from_name(type_name) {
                Some(FeelType::Any) => Value::Boolean(!v.is_null()),
                Some(t) => Value::Boolean(v.feel_type() == t),
                None => Value::Null,
            }
        }

        Expr::Conjunction(operands) => {
            let mut saw_null = false;
            for operand in operands {
                match truth(&evaluate(operand, env)) {
                    Some(false) => return Value::Boolean(false),
                    Some(true) => {}
                    None => saw_null = true,
                }
            }
            if saw_null {
                Value::Null
            } else {
                Value::Boolean(true)
            }
        }
        Expr::Disjunction(operands) => {
            let mut saw_null = false;
            for operand in operands {
                match truth(&evaluate(operand, env)) {
                    Some(true) => return Value::Boolean(true),
                    Some(false) => {}
                    None => saw_null = true,
                }
            }
            if saw_null {
                Value::Null
            } else {
                Value::Boolean(false)
            }
        }

        Expr::If {
            condition,
            then_branch,
            else_branch,
        } => {
            if truth(&evaluate(condition, env)) == Some(true) {
                evaluate(then_branch, env)
            } else {
                evaluate(else_branch, env)
            }
        }

        Expr::For { iterations, body } => {
            let mut out = Vec::new();
            iterate(iterations, 0, env, &mut |env| {
                out.push(evaluate(body, env));
                true
            });
            Value::List(out)
        }
        Expr::Quantified {
            quantifier,
            iterations,
            condition,
        } => {
            let mut result = *quantifier == Quantifier::Every;
            iterate(iterations, 0, env, &mut |env| {
                let holds = truth(&evaluate(condition, env)) == Some(true);
                match quantifier {
                    Quantifier::Some if holds => {
                        result = true;
                        false
                    }
                    Quantifier::Every if !holds => {
                        result = false;
                        false
                    }
                    _ => true,
                }
            });
            Value::Boolean(result)
        }

        Expr::ListLit(items) => Value::List(items.iter().map(|e| evaluate(e, env)).collect()),
        Expr::ContextLit(entries) => {
            // Each entry is visible to the ones after it.
            let child = env.child();
            let mut map = ContextMap::new();
            for (key, value_expr) in entries {
                let value = evaluate(value_expr, &child);
                child.set_variable(key.clone(), value.clone());
                map.insert(key.clone(), value);
            }
            Value::Context(map)
        }
        Expr::RangeLit {
            low,
            high,
            low_inclusive,
            high_inclusive,
        } => {
            let low = low.as_ref().map(|e| evaluate(e, env)).unwrap_or(Value::Null);
            let high = high
                .as_ref()
                .map(|e| evaluate(e, env))
                .unwrap_or(Value::Null);
            Value::Range(Box::new(RangeValue {
                low,
                high,
                low_inclusive: *low_inclusive,
                high_inclusive: *high_inclusive,
            }))
        }

        Expr::Filter { source, predicate } => eval_filter(source, predicate, env),
        Expr::Path { source, member } => member_access(&evaluate(source, env), member),

        Expr::FunctionDef {
            params,
            body,
            external,
        } => Value::Function(Rc::new(FunctionValue {
            params: params.clone(),
            body: Rc::new(body.as_ref().clone()),
            closure: env.scope.clone(),
            resolver: env.resolver.clone(),
            external: *external,
        })),

        Expr::Invocation { callee, args } => {
            let arg_values: Vec<Value> = args.iter().map(|a| evaluate(a, env)).collect();
            invoke(callee, arg_values, env)
        }
        Expr::NamedInvocation { callee, args } => invoke_named(callee, args, env),

        Expr::UnaryTests { tests, negated } => {
            let input = env.input();
            let test_env = env.with_input(input.clone());
            let hit = tests.iter().any(|t| test_matches(t, &input, &test_env));
            Value::Boolean(hit != *negated)
        }
    }
}

/// Three-valued coercion: booleans are themselves, everything else is null.
fn truth(v: &Value) -> Option<bool> {
    v.as_bool()
}

fn compare(op: CmpOp, a: &Value, b: &Value) -> Value {
    use std::cmp::Ordering::*;
    match op {
        CmpOp::Eq => Value::Boolean(feel_equal(a, b)),
        CmpOp::Ne => Value::Boolean(!feel_equal(a, b)),
        _ => match compare_values(a, b) {
            Some(ord) => Value::Boolean(match op {
                CmpOp::Lt => ord == Less,
                CmpOp::Gt => ord == Greater,
                CmpOp::Le => ord != Greater,
                CmpOp::Ge => ord != Less,
                CmpOp::Eq | CmpOp::Ne => unreachable!("handled above"),
            }),
            None => Value::Null,
        },
    }
}

// ---------------------------------------------------------------------------
// Unary tests
// ---------------------------------------------------------------------------

/// Does a single unary test accept `input`? `env` carries `input` as the
/// implicit input value for comparisons with an absent left operand.
pub fn test_matches(test: &Expr, input: &Value, env: &EvalContext) -> bool {
    match test {
        Expr::Dash => true,
        Expr::Comparison { left: None, .. } => {
            truth(&evaluate(test, env)) == Some(true)
        }
        _ => match evaluate(test, env) {
            Value::Range(range) => range.contains(input) == Some(true),
            Value::List(items) => items.iter().any(|item| feel_equal(item, input)),
            other => feel_equal(&other, input),
        },
    }
}

// ---------------------------------------------------------------------------
// Iteration (for / some / every)
// ---------------------------------------------------------------------------

/// Drive the Cartesian product of the iteration contexts, outermost first.
/// The callback returns `false` to stop early (quantifier short-circuit).
fn iterate(
    iterations: &[Iteration],
    index: usize,
    env: &EvalContext,
    body: &mut dyn FnMut(&EvalContext) -> bool,
) -> bool {
    if index == iterations.len() {
        return body(env);
    }
    let iteration = &iterations[index];
    let values = iteration_values(&iteration.domain, env);
    for value in values {
        let child = env.child();
        child.set_variable(iteration.name.clone(), value);
        if !iterate(iterations, index + 1, &child, body) {
            return false;
        }
    }
    true
}

fn iteration_values(domain: &IterationDomain, env: &EvalContext) -> Vec<Value> {
    match domain {
        IterationDomain::List(expr) => match evaluate(expr, env) {
            Value::List(items) => items,
            Value::Null => Vec::new(),
            scalar => vec![scalar],
        },
        IterationDomain::Range(start, end) => {
            let (sv, ev) = (evaluate(start, env), evaluate(end, env));
            let (Some(s), Some(e)) = (
                sv.as_number().and_then(|d| d.to_i64()),
                ev.as_number().and_then(|d| d.to_i64()),
            ) else {
                return Vec::new();
            };
            // Inclusive both ends; direction follows the ordering.
            if s <= e {
                (s..=e).map(|n| Value::Number(Decimal::from(n))).collect()
            } else {
                (e..=s)
                    .rev()
                    .map(|n| Value::Number(Decimal::from(n)))
                    .collect()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Filter semantics: a numeric predicate selects by 1-based index (`-1` is
/// the last element); a boolean predicate keeps matching items. A numeric
/// predicate *result* during iteration selects that index and stops — a
/// compatibility behaviour carried over from the source engine, not
/// standard FEEL.
fn eval_filter(source: &Expr, predicate: &Expr, env: &EvalContext) -> Value {
    let source_value = evaluate(source, env);
    if source_value.is_null() {
        return Value::Null;
    }
    let items = match source_value {
        Value::List(items) => items,
        scalar => vec![scalar],
    };

    if let Some(n) = literal_index(predicate) {
        return index_list(&items, n);
    }

    let mut kept = Vec::new();
    for item in &items {
        let child = env.child();
        child.set_variable("item", item.clone());
        if let Value::Context(entries) = item {
            for (k, v) in entries {
                child.set_variable(k.clone(), v.clone());
            }
        }
        let child = child.with_input(item.clone());
        match evaluate(predicate, &child) {
            Value::Number(n) => return index_list(&items, n),
            Value::Boolean(true) => kept.push(item.clone()),
            _ => {}
        }
    }
    Value::List(kept)
}

fn literal_index(predicate: &Expr) -> Option<Decimal> {
    match predicate {
        Expr::NumberLit(n) => Some(*n),
        Expr::Neg(inner) => match inner.as_ref() {
            Expr::NumberLit(n) => Some(-*n),
            _ => None,
        },
        _ => None,
    }
}

/// 1-based indexing; negative indices count from the end; `0` and
/// out-of-range yield `Null`.
pub fn index_list(items: &[Value], index: Decimal) -> Value {
    if !index.fract().is_zero() {
        return Value::Null;
    }
    let Some(i) = index.to_i64() else {
        return Value::Null;
    };
    let len = items.len() as i64;
    let pos = if i > 0 {
        i - 1
    } else if i < 0 {
        len + i
    } else {
        return Value::Null;
    };
    if pos < 0 || pos >= len {
        return Value::Null;
    }
    items[pos as usize].clone()
}

// ---------------------------------------------------------------------------
// Member access
// ---------------------------------------------------------------------------

pub fn member_access(value: &Value, member: &str) -> Value {
    match value {
        Value::Context(entries) => entries.get(member).cloned().unwrap_or(Value::Null),
        // Member access over a list projects onto each element.
        Value::List(items) => {
            Value::List(items.iter().map(|v| member_access(v, member)).collect())
        }
        Value::Date(d) => match member {
            "year" => Value::number(Decimal::from(d.year())),
            "month" => Value::number(Decimal::from(d.month())),
            "day" => Value::number(Decimal::from(d.day())),
            _ => Value::Null,
        },
        Value::Time(t) => match member {
            "hour" => Value::number(Decimal::from(t.time.hour())),
            "minute" => Value::number(Decimal::from(t.time.minute())),
            "second" => Value::number(Decimal::from(t.time.second())),
            "offset" => t
                .offset
                .map(|o| {
                    Value::DaysTimeDuration(chrono::TimeDelta::seconds(o.local_minus_utc() as i64))
                })
                .unwrap_or(Value::Null),
            "timezone" => Value::Null,
            _ => Value::Null,
        },
        Value::DateTime(dt) => match member {
            "year" => Value::number(Decimal::from(dt.year())),
            "month" => Value::number(Decimal::from(dt.month())),
            "day" => Value::number(Decimal::from(dt.day())),
            "hour" => Value::number(Decimal::from(dt.hour())),
            "minute" => Value::number(Decimal::from(dt.minute())),
            "second" => Value::number(Decimal::from(dt.second())),
            "offset" => Value::DaysTimeDuration(chrono::TimeDelta::seconds(
                dt.offset().local_minus_utc() as i64,
            )),
            "timezone" => Value::Null,
            _ => Value::Null,
        },
        Value::YearsMonthsDuration(months) => match member {
            "years" => Value::number(Decimal::from(months / 12)),
            "months" => Value::number(Decimal::from(months % 12)),
            _ => Value::Null,
        },
        Value::DaysTimeDuration(delta) => {
            let secs = delta.num_seconds();
            match member {
                "days" => Value::number(Decimal::from(secs / 86_400)),
                "hours" => Value::number(Decimal::from((secs % 86_400) / 3600)),
                "minutes" => Value::number(Decimal::from((secs % 3600) / 60)),
                "seconds" => Value::number(Decimal::from(secs % 60)),
                _ => Value::Null,
            }
        }
        _ => Value::Null,
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

fn invoke(callee: &Expr, args: Vec<Value>, env: &EvalContext) -> Value {
    let callee_value = evaluate(callee, env);
    if let Value::Function(function) = callee_value {
        return invoke_function(&function, args);
    }
    // Bare-name callees fall back to the function resolver (built-ins).
    if let Expr::Name(name) = callee {
        if let Some(builtin) = (env.resolver)(name) {
            return (builtin.invoke)(&args, env);
        }
    }
    Value::Null
}

fn invoke_named(callee: &Expr, args: &[(String, Expr)], env: &EvalContext) -> Value {
    let values: Vec<(&str, Value)> = args
        .iter()
        .map(|(name, e)| (name.as_str(), evaluate(e, env)))
        .collect();

    let callee_value = evaluate(callee, env);
    if let Value::Function(function) = callee_value {
        let positional = order_by_params(&function.params, &values);
        return invoke_function(&function, positional);
    }
    if let Expr::Name(name) = callee {
        if let Some(builtin) = (env.resolver)(name) {
            let params: Vec<String> = builtin.params.iter().map(|p| p.to_string()).collect();
            let positional = order_by_params(&params, &values);
            return (builtin.invoke)(&positional, env);
        }
    }
    Value::Null
}

/// Reorder named arguments into declared parameter positions; missing
/// positions become `Null`.
fn order_by_params(params: &[String], named: &[(&str, Value)]) -> Vec<Value> {
    params
        .iter()
        .map(|p| {
            named
                .iter()
                .find(|(n, _)| *n == p.as_str())
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null)
        })
        .collect()
}

/// Call a user-defined function: parameters bind positionally in a child of
/// the captured closure scope; missing arguments are `Null`.
pub fn invoke_function(function: &FunctionValue, args: Vec<Value>) -> Value {
    if function.external {
        // Host interop is not supported in this implementation.
        return Value::Null;
    }
    let scope = Scope::child_of(&function.closure);
    for (i, param) in function.params.iter().enumerate() {
        let value = args.get(i).cloned().unwrap_or(Value::Null);
        Scope::set(&scope, param.clone(), value);
    }
    let env = EvalContext {
        scope,
        input_value: None,
        resolver: function.resolver.clone(),
    };
    evaluate(&function.body, &env)
}
