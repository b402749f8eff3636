//! String built-ins.

use regex::Regex;

use super::{Registry, add, int_arg, list_arg, str_arg};
use crate::eval::EvalContext;
use crate::value::Value;
use rust_decimal::Decimal;

pub(super) fn register(map: &mut Registry) {
    add(map, "substring", &["string", "start position", "length"], substring);
    add(map, "string length", &["string"], string_length);
    add(map, "upper case", &["string"], upper_case);
    add(map, "lower case", &["string"], lower_case);
    add(map, "substring before", &["string", "match"], substring_before);
    add(map, "substring after", &["string", "match"], substring_after);
    add(map, "contains", &["string", "match"], contains);
    add(map, "starts with", &["string", "match"], starts_with);
    add(map, "ends with", &["string", "match"], ends_with);
    add(map, "matches", &["input", "pattern", "flags"], matches);
    add(map, "replace", &["input", "pattern", "replacement", "flags"], replace);
    add(map, "split", &["string", "delimiter"], split);
    add(map, "string join", &["list", "delimiter"], string_join);
}

/// 1-based start; a negative start counts back from the end.
fn substring(args: &[Value], _env: &EvalContext) -> Value {
    let Some(s) = str_arg(args, 0) else {
        return Value::Null;
    };
    let Some(start) = int_arg(args, 1) else {
        return Value::Null;
    };
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let begin = if start > 0 {
        start - 1
    } else if start < 0 {
        len + start
    } else {
        return Value::Null;
    };
    if begin < 0 || begin >= len {
        return Value::string("");
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
    Value::string(chars[begin as usize..end as usize].iter().collect::<String>())
}

fn string_length(args: &[Value], _env: &EvalContext) -> Value {
    match str_arg(args, 0) {
        Some(s) => Value::number(Decimal::from(s.chars().count() as u64)),
        None => Value::Null,
    }
}

fn upper_case(args: &[Value], _env: &EvalContext) -> Value {
    match str_arg(args, 0) {
        Some(s) => Value::string(s.to_uppercase()),
        None => Value::Null,
    }
}

fn lower_case(args: &[Value], _env: &EvalContext) -> Value {
    match str_arg(args, 0) {
        Some(s) => Value::string(s.to_lowercase()),
        None => Value::Null,
    }
}

fn substring_before(args: &[Value], _env: &EvalContext) -> Value {
    match (str_arg(args, 0), str_arg(args, 1)) {
        (Some(s), Some(m)) => match s.find(&m) {
            Some(pos) => Value::string(&s[..pos]),
            None => Value::string(""),
        },
        _ => Value::Null,
    }
}

fn substring_after(args: &[Value], _env: &EvalContext) -> Value {
    match (str_arg(args, 0), str_arg(args, 1)) {
        (Some(s), Some(m)) => match s.find(&m) {
            Some(pos) => Value::string(&s[pos + m.len()..]),
            None => Value::string(""),
        },
        _ => Value::Null,
    }
}

fn contains(args: &[Value], _env: &EvalContext) -> Value {
    match (str_arg(args, 0), str_arg(args, 1)) {
        (Some(s), Some(m)) => Value::Boolean(s.contains(&m)),
        _ => Value::Null,
    }
}

fn starts_with(args: &[Value], _env: &EvalContext) -> Value {
    match (str_arg(args, 0), str_arg(args, 1)) {
        (Some(s), Some(m)) => Value::Boolean(s.starts_with(&m)),
        _ => Value::Null,
    }
}

fn ends_with(args: &[Value], _env: &EvalContext) -> Value {
    match (str_arg(args, 0), str_arg(args, 1)) {
        (Some(s), Some(m)) => Value::Boolean(s.ends_with(&m)),
        _ => Value::Null,
    }
}

/// Supported flags: `i` (case-insensitive), `m` (multi-line), `s`
/// (dot-matches-newline).
fn compile_pattern(pattern: &str, flags: Option<String>) -> Option<Regex> {
    let flags = flags.unwrap_or_default();
    if !flags.chars().all(|c| matches!(c, 'i' | 'm' | 's')) {
        return None;
    }
    let prefixed = if flags.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{flags}){pattern}")
    };
    Regex::new(&prefixed).ok()
}

fn matches(args: &[Value], _env: &EvalContext) -> Value {
    let (Some(input), Some(pattern)) = (str_arg(args, 0), str_arg(args, 1)) else {
        return Value::Null;
    };
    match compile_pattern(&pattern, str_arg(args, 2)) {
        Some(re) => Value::Boolean(re.is_match(&input)),
        None => Value::Null,
    }
}

fn replace(args: &[Value], _env: &EvalContext) -> Value {
    let (Some(input), Some(pattern), Some(replacement)) =
        (str_arg(args, 0), str_arg(args, 1), str_arg(args, 2))
    else {
        return Value::Null;
    };
    match compile_pattern(&pattern, str_arg(args, 3)) {
        Some(re) => Value::string(re.replace_all(&input, replacement.as_str()).into_owned()),
        None => Value::Null,
    }
}

/// The delimiter is a regular expression.
fn split(args: &[Value], _env: &EvalContext) -> Value {
    let (Some(input), Some(delimiter)) = (str_arg(args, 0), str_arg(args, 1)) else {
        return Value::Null;
    };
    match Regex::new(&delimiter) {
        Ok(re) => Value::List(re.split(&input).map(Value::string).collect()),
        Err(_) => Value::Null,
    }
}

/// Null elements are skipped; non-string elements poison the result.
fn string_join(args: &[Value], _env: &EvalContext) -> Value {
    let Some(items) = list_arg(args, 0) else {
        return Value::Null;
    };
    let delimiter = match args.get(1) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Value::Null,
    };
    let mut parts = Vec::new();
    for item in &items {
        match item {
            Value::String(s) => parts.push(s.clone()),
            Value::Null => {}
            _ => return Value::Null,
        }
    }
    Value::string(parts.join(&delimiter))
}
