//! Canonical textual forms, as produced by the `string(...)` built-in and
//! by string-coercing addition.

use super::Value;
use crate::temporal;

pub fn canonical_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Number(n) => n.normalize().to_string(),
        Value::String(s) => s.clone(),
        Value::Boolean(b) => b.to_string(),
        Value::Date(d) => temporal::format_date(d),
        Value::Time(t) => temporal::format_time(t),
        Value::DateTime(dt) => temporal::format_date_time(dt),
        Value::YearsMonthsDuration(months) => temporal::format_ym_duration(*months),
        Value::DaysTimeDuration(delta) => temporal::format_dt_duration(delta),
        Value::List(items) => {
            let inner: Vec<String> = items.iter().map(element_string).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Context(entries) => {
            let inner: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{k}: {}", element_string(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        Value::Range(range) => {
            let open = if range.low_inclusive { '[' } else { '(' };
            let close = if range.high_inclusive { ']' } else { ')' };
            format!(
                "{open}{}..{}{close}",
                element_string(&range.low),
                element_string(&range.high)
            )
        }
        Value::Function(_) => "function".to_string(),
    }
}

/// Strings nested in lists and contexts keep their quotes.
fn element_string(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => canonical_string(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn numbers_drop_trailing_zeros() {
        assert_eq!(
            canonical_string(&Value::Number("1.500".parse::<Decimal>().unwrap())),
            "1.5"
        );
    }

    #[test]
    fn lists_quote_nested_strings() {
        let v = Value::List(vec![Value::string("a"), Value::number(Decimal::ONE)]);
        assert_eq!(canonical_string(&v), r#"["a", 1]"#);
    }

    #[test]
    fn durations_canonicalise() {
        assert_eq!(canonical_string(&Value::YearsMonthsDuration(14)), "P1Y2M");
        assert_eq!(
            canonical_string(&Value::DaysTimeDuration(chrono::TimeDelta::zero())),
            "PT0S"
        );
    }
}
