//! FEEL equality and ordering.

use std::cmp::Ordering;

use chrono::{FixedOffset, NaiveTime, TimeZone};

use super::Value;

/// FEEL equality: `null = null` is true, `null = x` is false for non-null
/// `x`, cross-kind comparisons are false except for the date / date-and-time
/// promotion.
pub fn feel_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| feel_equal(a, b))
        }
        (Value::Context(x), Value::Context(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| feel_equal(v, w)))
        }
        (Value::Range(x), Value::Range(y)) => {
            x.low_inclusive == y.low_inclusive
                && x.high_inclusive == y.high_inclusive
                && feel_equal(&x.low, &y.low)
                && feel_equal(&x.high, &y.high)
        }
        _ => compare_values(a, b) == Some(Ordering::Equal),
    }
}

/// Ordering for `<`, `>`, `<=`, `>=`. `None` when the operands are not
/// comparable (the caller yields `null`).
///
/// Cross-type promotions: a date compares with a date-and-time as midnight
/// with zero offset; a date-and-time compares with a time by its time of
/// day.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        (Value::Date(x), Value::Date(y)) => Some(x.cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
        (Value::Date(x), Value::DateTime(y)) => Some(date_as_instant(x).cmp(y)),
        (Value::DateTime(x), Value::Date(y)) => Some(x.cmp(&date_as_instant(y))),
        (Value::Time(x), Value::Time(y)) => Some(normalised_time(x).cmp(&normalised_time(y))),
        (Value::DateTime(x), Value::Time(y)) => Some(x.time().cmp(&normalised_time(y))),
        (Value::Time(x), Value::DateTime(y)) => Some(normalised_time(x).cmp(&y.time())),
        (Value::YearsMonthsDuration(x), Value::YearsMonthsDuration(y)) => Some(x.cmp(y)),
        (Value::DaysTimeDuration(x), Value::DaysTimeDuration(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn date_as_instant(date: &chrono::NaiveDate) -> chrono::DateTime<FixedOffset> {
    let utc = FixedOffset::east_opt(0).expect("zero offset is valid");
    utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Time comparison applies the UTC offset when present.
fn normalised_time(t: &super::FeelTime) -> NaiveTime {
    match t.offset {
        Some(offset) => t.time - chrono::TimeDelta::seconds(offset.local_minus_utc() as i64),
        None => t.time,
    }
}
