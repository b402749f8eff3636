//! Context built-ins.

use super::{Registry, add, arg, list_arg, str_arg};
use crate::eval::EvalContext;
use crate::value::{ContextMap, Value};

pub(super) fn register(map: &mut Registry) {
    add(map, "get value", &["m", "key"], get_value);
    add(map, "get entries", &["m"], get_entries);
    add(map, "context", &["entries"], context);
    add(map, "context put", &["context", "key", "value"], context_put);
    add(map, "context merge", &["contexts"], context_merge);
}

fn get_value(args: &[Value], _env: &EvalContext) -> Value {
    let (Some(entries), Some(key)) = (arg(args, 0).as_context().cloned(), str_arg(args, 1)) else {
        return Value::Null;
    };
    entries.get(&key).cloned().unwrap_or(Value::Null)
}

/// A list of `{key, value}` contexts, in entry order.
fn get_entries(args: &[Value], _env: &EvalContext) -> Value {
    let Some(entries) = arg(args, 0).as_context().cloned() else {
        return Value::Null;
    };
    let out = entries
        .iter()
        .map(|(k, v)| {
            let mut pair = ContextMap::new();
            pair.insert("key".to_string(), Value::string(k.clone()));
            pair.insert("value".to_string(), v.clone());
            Value::Context(pair)
        })
        .collect();
    Value::List(out)
}

/// Build a context from a list of `{key, value}` pairs; later keys win.
fn context(args: &[Value], _env: &EvalContext) -> Value {
    let Some(pairs) = list_arg(args, 0) else {
        return Value::Null;
    };
    let mut out = ContextMap::new();
    for pair in pairs {
        let Some(entries) = pair.as_context() else {
            return Value::Null;
        };
        let Some(Value::String(key)) = entries.get("key") else {
            return Value::Null;
        };
        let value = entries.get("value").cloned().unwrap_or(Value::Null);
        out.insert(key.clone(), value);
    }
    Value::Context(out)
}

/// Three-argument form sets one key; the two-argument form merges a context
/// of additions.
fn context_put(args: &[Value], _env: &EvalContext) -> Value {
    let Some(mut entries) = arg(args, 0).as_context().cloned() else {
        return Value::Null;
    };
    if args.len() == 2 {
        let Some(additions) = arg(args, 1).as_context().cloned() else {
            return Value::Null;
        };
        for (k, v) in additions {
            entries.insert(k, v);
        }
        return Value::Context(entries);
    }
    let Some(key) = str_arg(args, 1) else {
        return Value::Null;
    };
    entries.insert(key, arg(args, 2));
    Value::Context(entries)
}

/// Merge a list of contexts; later entries overwrite earlier ones.
fn context_merge(args: &[Value], _env: &EvalContext) -> Value {
    let Some(contexts) = list_arg(args, 0) else {
        return Value::Null;
    };
    let mut out = ContextMap::new();
    for c in contexts {
        let Some(entries) = c.as_context() else {
            return Value::Null;
        };
        for (k, v) in entries {
            out.insert(k.clone(), v.clone());
        }
    }
    Value::Context(out)
}
