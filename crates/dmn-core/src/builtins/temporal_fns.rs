//! Date and time built-ins.

use chrono::{Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use rust_decimal::Decimal;

use super::{Registry, add, arg, int_arg, str_arg};
use crate::eval::EvalContext;
use crate::temporal;
use crate::value::{FeelTime, Value};

pub(super) fn register(map: &mut Registry) {
    add(map, "date", &["from", "month", "day"], date);
    add(map, "time", &["from", "minute", "second", "offset"], time);
    add(map, "date and time", &["date", "time"], date_and_time);
    add(map, "duration", &["from"], duration);
    add(
        map,
        "years and months duration",
        &["from", "to"],
        years_and_months_duration,
    );
    add(map, "now", &[], now);
    add(map, "today", &[], today);
    add(map, "day of year", &["date"], day_of_year);
    add(map, "day of week", &["date"], day_of_week);
    add(map, "month of year", &["date"], month_of_year);
    add(map, "week of year", &["date"], week_of_year);
}

/// `date(string)`, `date(year, month, day)`, or the date part of a
/// date-and-time. Arity is detected by argument kinds because named
/// invocation pads missing positions with nulls.
fn date(args: &[Value], _env: &EvalContext) -> Value {
    if let (Some(y), Some(m), Some(d)) = (int_arg(args, 0), int_arg(args, 1), int_arg(args, 2)) {
        let (Ok(y), Ok(m), Ok(d)) = (i32::try_from(y), u32::try_from(m), u32::try_from(d)) else {
            return Value::Null;
        };
        return NaiveDate::from_ymd_opt(y, m, d)
            .map(Value::Date)
            .unwrap_or(Value::Null);
    }
    match arg(args, 0) {
        Value::String(text) => temporal::parse_date(&text)
            .map(Value::Date)
            .unwrap_or(Value::Null),
        Value::Date(d) => Value::Date(d),
        Value::DateTime(dt) => Value::Date(dt.date_naive()),
        _ => Value::Null,
    }
}

/// `time(string)`, `time(hour, minute, second, offset?)`, or the time part
/// of a date-and-time. The optional offset is a days-and-time duration.
fn time(args: &[Value], _env: &EvalContext) -> Value {
    if let (Some(h), Some(m), Some(s)) = (int_arg(args, 0), int_arg(args, 1), int_arg(args, 2)) {
        let (Ok(h), Ok(m), Ok(s)) = (u32::try_from(h), u32::try_from(m), u32::try_from(s)) else {
            return Value::Null;
        };
        let offset = match args.get(3) {
            None | Some(Value::Null) => None,
            Some(Value::DaysTimeDuration(delta)) => {
                let Ok(secs) = i32::try_from(delta.num_seconds()) else {
                    return Value::Null;
                };
                match FixedOffset::east_opt(secs) {
                    Some(o) => Some(o),
                    None => return Value::Null,
                }
            }
            Some(_) => return Value::Null,
        };
        return NaiveTime::from_hms_opt(h, m, s)
            .map(|t| Value::Time(FeelTime { time: t, offset }))
            .unwrap_or(Value::Null);
    }
    match arg(args, 0) {
        Value::String(text) => temporal::parse_time(&text)
            .map(Value::Time)
            .unwrap_or(Value::Null),
        Value::Time(t) => Value::Time(t),
        Value::DateTime(dt) => Value::Time(FeelTime {
            time: dt.time(),
            offset: Some(*dt.offset()),
        }),
        _ => Value::Null,
    }
}

/// `date and time(string)`, `date and time(date, time)`, or a passthrough.
fn date_and_time(args: &[Value], _env: &EvalContext) -> Value {
    if args.len() >= 2 {
        let date = match arg(args, 0) {
            Value::Date(d) => d,
            Value::DateTime(dt) => dt.date_naive(),
            _ => return Value::Null,
        };
        let Value::Time(t) = arg(args, 1) else {
            return Value::Null;
        };
        let offset = t.offset.unwrap_or_else(temporal::utc_offset);
        return offset
            .from_local_datetime(&NaiveDateTime::new(date, t.time))
            .single()
            .map(Value::DateTime)
            .unwrap_or(Value::Null);
    }
    match arg(args, 0) {
        Value::String(text) => temporal::parse_date_time(&text)
            .map(Value::DateTime)
            .unwrap_or(Value::Null),
        Value::DateTime(dt) => Value::DateTime(dt),
        Value::Date(d) => temporal::utc_offset()
            .from_local_datetime(&d.and_time(NaiveTime::MIN))
            .single()
            .map(Value::DateTime)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn duration(args: &[Value], _env: &EvalContext) -> Value {
    let Some(text) = str_arg(args, 0) else {
        return match arg(args, 0) {
            v @ (Value::YearsMonthsDuration(_) | Value::DaysTimeDuration(_)) => v,
            _ => Value::Null,
        };
    };
    if let Some(months) = temporal::parse_ym_duration(&text) {
        return Value::YearsMonthsDuration(months);
    }
    temporal::parse_dt_duration(&text)
        .map(Value::DaysTimeDuration)
        .unwrap_or(Value::Null)
}

/// Whole calendar months between two dates (or date-and-times), truncated
/// toward zero.
fn years_and_months_duration(args: &[Value], _env: &EvalContext) -> Value {
    let (Some(from), Some(to)) = (date_of(&arg(args, 0)), date_of(&arg(args, 1))) else {
        return Value::Null;
    };
    let mut months =
        i64::from(to.year() - from.year()) * 12 + i64::from(to.month()) - i64::from(from.month());
    if months > 0 && to.day() < from.day() {
        months -= 1;
    } else if months < 0 && to.day() > from.day() {
        months += 1;
    }
    Value::YearsMonthsDuration(months)
}

fn date_of(v: &Value) -> Option<NaiveDate> {
    match v {
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date_naive()),
        _ => None,
    }
}

fn now(_args: &[Value], _env: &EvalContext) -> Value {
    let local = Local::now();
    Value::DateTime(local.with_timezone(local.offset()))
}

fn today(_args: &[Value], _env: &EvalContext) -> Value {
    Value::Date(Local::now().date_naive())
}

fn day_of_year(args: &[Value], _env: &EvalContext) -> Value {
    match date_of(&arg(args, 0)) {
        Some(d) => Value::number(Decimal::from(d.ordinal())),
        None => Value::Null,
    }
}

/// ISO numbering: Monday = 1 through Sunday = 7.
fn day_of_week(args: &[Value], _env: &EvalContext) -> Value {
    match date_of(&arg(args, 0)) {
        Some(d) => Value::number(Decimal::from(d.weekday().number_from_monday())),
        None => Value::Null,
    }
}

fn month_of_year(args: &[Value], _env: &EvalContext) -> Value {
    match date_of(&arg(args, 0)) {
        Some(d) => Value::number(Decimal::from(d.month())),
        None => Value::Null,
    }
}

/// ISO week number.
fn week_of_year(args: &[Value], _env: &EvalContext) -> Value {
    match date_of(&arg(args, 0)) {
        Some(d) => Value::number(Decimal::from(d.iso_week().week())),
        None => Value::Null,
    }
}
