//! Boolean built-ins.

use super::{Registry, add, arg};
use crate::eval::EvalContext;
use crate::value::{Value, feel_equal};

pub(super) fn register(map: &mut Registry) {
    add(map, "not", &["negand"], not);
    add(map, "is", &["value1", "value2"], is);
}

/// Three-valued negation: `not(null) = null`.
fn not(args: &[Value], _env: &EvalContext) -> Value {
    match arg(args, 0) {
        Value::Boolean(b) => Value::Boolean(!b),
        _ => Value::Null,
    }
}

/// Same FEEL type and equal value; `is(null, null)` is true.
fn is(args: &[Value], _env: &EvalContext) -> Value {
    let (a, b) = (arg(args, 0), arg(args, 1));
    Value::Boolean(a.feel_type() == b.feel_type() && feel_equal(&a, &b))
}
