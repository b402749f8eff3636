//! Registry of FEEL built-in functions.
//!
//! Keyed by canonical (multi-word) name. Each entry declares its parameter
//! names so named invocation can reorder arguments. Built-ins never throw:
//! missing or ill-typed arguments yield `Null`.

mod boolean;
mod context;
mod conversion;
mod list;
mod numeric;
mod range;
mod string;
mod temporal_fns;


use std::collections::HashMap;
use std::sync::LazyLock;

use rust_decimal::Decimal;

use crate::eval::EvalContext;
use crate::value::Value;

pub struct BuiltinFunction {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub invoke: fn(&[Value], &EvalContext) -> Value,
}

type Registry = HashMap<&'static str, BuiltinFunction>;

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let mut map = Registry::new();
    string::register(&mut map);
    numeric::register(&mut map);
    list::register(&mut map);
    boolean::register(&mut map);
    temporal_fns::register(&mut map);
    conversion::register(&mut map);
    context::register(&mut map);
    range::register(&mut map);
    map
});

pub fn lookup(name: &str) -> Option<&'static BuiltinFunction> {
    REGISTRY.get(name)
}

/// All registered canonical names (used to seed parse scopes).
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

pub(crate) fn add(
    map: &mut Registry,
    name: &'static str,
    params: &'static [&'static str],
    invoke: fn(&[Value], &EvalContext) -> Value,
) {
    map.insert(
        name,
        BuiltinFunction {
            name,
            params,
            invoke,
        },
    );
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Null)
}

pub(crate) fn str_arg(args: &[Value], index: usize) -> Option<String> {
    match args.get(index) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

pub(crate) fn num_arg(args: &[Value], index: usize) -> Option<Decimal> {
    match args.get(index) {
        Some(Value::Number(n)) => Some(*n),
        _ => None,
    }
}

pub(crate) fn int_arg(args: &[Value], index: usize) -> Option<i64> {
    use rust_decimal::prelude::ToPrimitive;
    let n = num_arg(args, index)?;
    if !n.fract().is_zero() {
        return None;
    }
    n.to_i64()
}

pub(crate) fn list_arg(args: &[Value], index: usize) -> Option<Vec<Value>> {
    match args.get(index) {
        Some(Value::List(items)) => Some(items.clone()),
        _ => None,
    }
}

/// List aggregators accept either a single list argument or the scalars
/// themselves.
pub(crate) fn list_or_varargs(args: &[Value]) -> Vec<Value> {
    if args.len() == 1 {
        if let Value::List(items) = &args[0] {
            return items.clone();
        }
    }
    args.to_vec()
}
