//! Conversion built-ins.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::{Registry, add, arg, str_arg};
use crate::eval::EvalContext;
use crate::value::{Value, canonical_string};

pub(super) fn register(map: &mut Registry) {
    add(map, "number", &["from", "grouping separator", "decimal separator"], number);
    add(map, "string", &["from"], string);
}

/// `number(from, grouping?, decimal?)` — strips the grouping separator,
/// normalises the decimal separator to `.`, then parses.
fn number(args: &[Value], _env: &EvalContext) -> Value {
    match arg(args, 0) {
        Value::Number(n) => Value::Number(n),
        Value::String(text) => {
            let mut text = text.trim().to_string();
            if let Some(grouping) = str_arg(args, 1) {
                if !grouping.is_empty() {
                    text = text.replace(&grouping, "");
                }
            }
            if let Some(decimal) = str_arg(args, 2) {
                if !decimal.is_empty() && decimal != "." {
                    text = text.replace(&decimal, ".");
                }
            }
            Decimal::from_str(&text)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

/// Canonical textual form; `string(null)` is `null`.
fn string(args: &[Value], _env: &EvalContext) -> Value {
    match arg(args, 0) {
        Value::Null => Value::Null,
        other => Value::string(canonical_string(&other)),
    }
}
