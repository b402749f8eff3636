//! List built-ins.
//!
//! Aggregators (`min`, `max`, `sum`, `mean`, ...) accept either a single
//! list argument or the scalars themselves.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use super::{Registry, add, arg, int_arg, list_arg, list_or_varargs};
use crate::eval::{EvalContext, index_list, invoke_function};
use crate::value::{Value, compare_values, feel_equal};

pub(super) fn register(map: &mut Registry) {
    add(map, "list contains", &["list", "element"], list_contains);
    add(map, "count", &["list"], count);
    add(map, "min", &["list"], min);
    add(map, "max", &["list"], max);
    add(map, "sum", &["list"], sum);
    add(map, "mean", &["list"], mean);
    add(map, "all", &["list"], all);
    add(map, "any", &["list"], any);
    add(map, "sublist", &["list", "start position", "length"], sublist);
    add(map, "append", &["list", "item"], append);
    add(map, "concatenate", &["list"], concatenate);
    add(map, "insert before", &["list", "position", "newItem"], insert_before);
    add(map, "remove", &["list", "position"], remove);
    add(map, "reverse", &["list"], reverse);
    add(map, "index of", &["list", "match"], index_of);
    add(map, "union", &["list"], union);
    add(map, "distinct values", &["list"], distinct_values);
    add(map, "flatten", &["list"], flatten);
    add(map, "product", &["list"], product);
    add(map, "median", &["list"], median);
    add(map, "stddev", &["list"], stddev);
    add(map, "mode", &["list"], mode);
    add(map, "sort", &["list", "precedes"], sort);
    add(map, "list replace", &["list", "position", "newItem"], list_replace);
}

fn list_contains(args: &[Value], _env: &EvalContext) -> Value {
    let Some(items) = list_arg(args, 0) else {
        return Value::Null;
    };
    let needle = arg(args, 1);
    Value::Boolean(items.iter().any(|item| feel_equal(item, &needle)))
}

fn count(args: &[Value], _env: &EvalContext) -> Value {
    match list_arg(args, 0) {
        Some(items) => Value::number(Decimal::from(items.len() as u64)),
        None => Value::Null,
    }
}

fn extreme(args: &[Value], keep: Ordering) -> Value {
    let items = list_or_varargs(args);
    if items.is_empty() {
        return Value::Null;
    }
    let mut best = items[0].clone();
    for item in &items[1..] {
        match compare_values(item, &best) {
            Some(ord) if ord == keep => best = item.clone(),
            Some(_) => {}
            None => return Value::Null,
        }
    }
    best
}

fn min(args: &[Value], _env: &EvalContext) -> Value {
    extreme(args, Ordering::Less)
}

fn max(args: &[Value], _env: &EvalContext) -> Value {
    extreme(args, Ordering::Greater)
}

fn numbers_of(args: &[Value]) -> Option<Vec<Decimal>> {
    list_or_varargs(args)
        .iter()
        .map(|v| v.as_number())
        .collect()
}

fn sum(args: &[Value], _env: &EvalContext) -> Value {
    let Some(numbers) = numbers_of(args) else {
        return Value::Null;
    };
    if numbers.is_empty() {
        return Value::Null;
    }
    let mut total = Decimal::ZERO;
    for n in numbers {
        match total.checked_add(n) {
            Some(t) => total = t,
            None => return Value::Null,
        }
    }
    Value::Number(total)
}

fn mean(args: &[Value], env: &EvalContext) -> Value {
    let Some(numbers) = numbers_of(args) else {
        return Value::Null;
    };
    if numbers.is_empty() {
        return Value::Null;
    }
    let count = Decimal::from(numbers.len() as u64);
    match sum(args, env) {
        Value::Number(total) => total
            .checked_div(count)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// `all([]) = true`; any false short-circuits; a non-boolean otherwise
/// poisons the result.
fn all(args: &[Value], _env: &EvalContext) -> Value {
    let items = list_or_varargs(args);
    let mut saw_non_boolean = false;
    for item in &items {
        match item {
            Value::Boolean(false) => return Value::Boolean(false),
            Value::Boolean(true) => {}
            _ => saw_non_boolean = true,
        }
    }
    if saw_non_boolean {
        Value::Null
    } else {
        Value::Boolean(true)
    }
}

fn any(args: &[Value], _env: &EvalContext) -> Value {
    let items = list_or_varargs(args);
    let mut saw_non_boolean = false;
    for item in &items {
        match item {
            Value::Boolean(true) => return Value::Boolean(true),
            Value::Boolean(false) => {}
            _ => saw_non_boolean = true,
        }
    }
    if saw_non_boolean {
        Value::Null
    } else {
        Value::Boolean(false)
    }
}

fn sublist(args: &[Value], _env: &EvalContext) -> Value {
    let (Some(items), Some(start)) = (list_arg(args, 0), int_arg(args, 1)) else {
        return Value::Null;
    };
    let len = items.len() as i64;
    let begin = if start > 0 {
        start - 1
    } else if start < 0 {
        len + start
    } else {
        return Value::Null;
    };
    if begin < 0 || begin >= len {
        return Value::Null;
    }
    let end = match args.get(2) {
        None | Some(Value::Null) => len,
        Some(Value::Number(_)) => {
            let Some(length) = int_arg(args, 2) else {
                return Value::Null;
            };
            if length < 0 {
                return Value::Null;
            }
            (begin + length).min(len)
        }
        Some(_) => return Value::Null,
    };
    Value::List(items[begin as usize..end as usize].to_vec())
}

fn append(args: &[Value], _env: &EvalContext) -> Value {
    let Some(mut items) = list_arg(args, 0) else {
        return Value::Null;
    };
    items.extend(args[1..].iter().cloned());
    Value::List(items)
}

fn concatenate(args: &[Value], _env: &EvalContext) -> Value {
    let mut out = Vec::new();
    for a in args {
        match a {
            Value::List(items) => out.extend(items.iter().cloned()),
            _ => return Value::Null,
        }
    }
    Value::List(out)
}

fn insert_before(args: &[Value], _env: &EvalContext) -> Value {
    let (Some(mut items), Some(position)) = (list_arg(args, 0), int_arg(args, 1)) else {
        return Value::Null;
    };
    if position < 1 || position > items.len() as i64 + 1 {
        return Value::Null;
    }
    items.insert(position as usize - 1, arg(args, 2));
    Value::List(items)
}

fn remove(args: &[Value], _env: &EvalContext) -> Value {
    let (Some(mut items), Some(position)) = (list_arg(args, 0), int_arg(args, 1)) else {
        return Value::Null;
    };
    if position < 1 || position > items.len() as i64 {
        return Value::Null;
    }
    items.remove(position as usize - 1);
    Value::List(items)
}

fn reverse(args: &[Value], _env: &EvalContext) -> Value {
    match list_arg(args, 0) {
        Some(mut items) => {
            items.reverse();
            Value::List(items)
        }
        None => Value::Null,
    }
}

/// All 1-based positions at which `match` occurs.
fn index_of(args: &[Value], _env: &EvalContext) -> Value {
    let Some(items) = list_arg(args, 0) else {
        return Value::Null;
    };
    let needle = arg(args, 1);
    let positions = items
        .iter()
        .enumerate()
        .filter(|(_, item)| feel_equal(item, &needle))
        .map(|(i, _)| Value::number(Decimal::from(i as u64 + 1)))
        .collect();
    Value::List(positions)
}

fn union(args: &[Value], env: &EvalContext) -> Value {
    match concatenate(args, env) {
        Value::List(items) => Value::List(dedup(items)),
        other => other,
    }
}

fn distinct_values(args: &[Value], _env: &EvalContext) -> Value {
    match list_arg(args, 0) {
        Some(items) => Value::List(dedup(items)),
        None => Value::Null,
    }
}

fn dedup(items: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for item in items {
        if !out.iter().any(|seen| feel_equal(seen, &item)) {
            out.push(item);
        }
    }
    out
}

fn flatten(args: &[Value], _env: &EvalContext) -> Value {
    let Some(items) = list_arg(args, 0) else {
        return Value::Null;
    };
    let mut out = Vec::new();
    flatten_into(&items, &mut out);
    Value::List(out)
}

fn flatten_into(items: &[Value], out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::List(nested) => flatten_into(nested, out),
            other => out.push(other.clone()),
        }
    }
}

fn product(args: &[Value], _env: &EvalContext) -> Value {
    let Some(numbers) = numbers_of(args) else {
        return Value::Null;
    };
    if numbers.is_empty() {
        return Value::Null;
    }
    let mut total = Decimal::ONE;
    for n in numbers {
        match total.checked_mul(n) {
            Some(t) => total = t,
            None => return Value::Null,
        }
    }
    Value::Number(total)
}

fn sorted_numbers(args: &[Value]) -> Option<Vec<Decimal>> {
    let mut numbers = numbers_of(args)?;
    numbers.sort();
    Some(numbers)
}

fn median(args: &[Value], _env: &EvalContext) -> Value {
    let Some(numbers) = sorted_numbers(args) else {
        return Value::Null;
    };
    if numbers.is_empty() {
        return Value::Null;
    }
    let mid = numbers.len() / 2;
    if numbers.len() % 2 == 1 {
        Value::Number(numbers[mid])
    } else {
        let two = Decimal::from(2);
        (numbers[mid - 1] + numbers[mid])
            .checked_div(two)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Sample standard deviation; fewer than two elements yield `null`.
fn stddev(args: &[Value], _env: &EvalContext) -> Value {
    let Some(numbers) = numbers_of(args) else {
        return Value::Null;
    };
    if numbers.len() < 2 {
        return Value::Null;
    }
    let floats: Option<Vec<f64>> = numbers.iter().map(|n| n.to_f64()).collect();
    let Some(floats) = floats else {
        return Value::Null;
    };
    let n = floats.len() as f64;
    let mean = floats.iter().sum::<f64>() / n;
    let variance = floats.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let out = variance.sqrt();
    if !out.is_finite() {
        return Value::Null;
    }
    Decimal::from_f64(out).map(Value::Number).unwrap_or(Value::Null)
}

/// All most-frequent values, ascending where comparable.
fn mode(args: &[Value], _env: &EvalContext) -> Value {
    let items = list_or_varargs(args);
    if items.is_empty() {
        return Value::List(Vec::new());
    }
    let distinct = dedup(items.clone());
    let counts: Vec<usize> = distinct
        .iter()
        .map(|v| items.iter().filter(|item| feel_equal(item, v)).count())
        .collect();
    let best = *counts.iter().max().expect("non-empty");
    let mut modes: Vec<Value> = distinct
        .into_iter()
        .zip(&counts)
        .filter(|(_, c)| **c == best)
        .map(|(v, _)| v)
        .collect();
    modes.sort_by(|a, b| compare_values(a, b).unwrap_or(Ordering::Equal));
    Value::List(modes)
}

/// `sort(list)` uses natural FEEL ordering; `sort(list, precedes)` consults
/// the two-argument precedes function.
fn sort(args: &[Value], _env: &EvalContext) -> Value {
    let Some(items) = list_arg(args, 0) else {
        return Value::Null;
    };
    match args.get(1) {
        None | Some(Value::Null) => {
            let mut incomparable = false;
            let mut sorted = items;
            sorted.sort_by(|a, b| match compare_values(a, b) {
                Some(ord) => ord,
                None => {
                    incomparable = true;
                    Ordering::Equal
                }
            });
            if incomparable {
                Value::Null
            } else {
                Value::List(sorted)
            }
        }
        Some(Value::Function(precedes)) => {
            // Insertion sort driven by the user function keeps the
            // comparison count predictable and the sort stable.
            let mut sorted: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                let mut at = sorted.len();
                for (i, existing) in sorted.iter().enumerate() {
                    let verdict =
                        invoke_function(precedes, vec![item.clone(), existing.clone()]);
                    if verdict == Value::Boolean(true) {
                        at = i;
                        break;
                    }
                }
                sorted.insert(at, item);
            }
            Value::List(sorted)
        }
        Some(_) => Value::Null,
    }
}

/// Replace by 1-based position, or by a two-argument match function.
fn list_replace(args: &[Value], _env: &EvalContext) -> Value {
    let Some(mut items) = list_arg(args, 0) else {
        return Value::Null;
    };
    let replacement = arg(args, 2);
    match args.get(1) {
        Some(Value::Number(position)) => {
            let replaced = index_list(&items, *position);
            if replaced.is_null() {
                return Value::Null;
            }
            let len = items.len() as i64;
            let Some(p) = position.to_i64() else {
                return Value::Null;
            };
            let idx = if p > 0 { p - 1 } else { len + p };
            items[idx as usize] = replacement;
            Value::List(items)
        }
        Some(Value::Function(matcher)) => {
            for item in items.iter_mut() {
                let verdict = invoke_function(matcher, vec![item.clone(), replacement.clone()]);
                if verdict == Value::Boolean(true) {
                    *item = replacement.clone();
                }
            }
            Value::List(items)
        }
        _ => Value::Null,
    }
}
