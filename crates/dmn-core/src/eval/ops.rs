//! Binary arithmetic over FEEL values.
//!
//! Every ill-typed combination yields `Null`; so does division by zero and
//! numeric overflow. Calendar arithmetic goes through real month addition,
//! never a day-count approximation.

use chrono::{NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::temporal;
use crate::value::{FeelTime, Value, canonical_string};

pub fn add(a: &Value, b: &Value) -> Value {
    use Value::*;
    match (a, b) {
        (Null, _) | (_, Null) => Null,
        (Number(x), Number(y)) => x.checked_add(*y).map(Number).unwrap_or(Null),
        // String concatenation coerces the non-string operand to its
        // canonical textual form (C#-compatibility rule).
        (String(_), _) | (_, String(_)) => {
            String(format!("{}{}", canonical_string(a), canonical_string(b)))
        }
        (Date(d), YearsMonthsDuration(m)) | (YearsMonthsDuration(m), Date(d)) => {
            temporal::add_months_to_date(*d, *m).map(Date).unwrap_or(Null)
        }
        (Date(d), DaysTimeDuration(delta)) | (DaysTimeDuration(delta), Date(d)) => {
            match d.and_time(NaiveTime::MIN).checked_add_signed(*delta) {
                Some(dt) => Date(dt.date()),
                None => Null,
            }
        }
        (DateTime(dt), YearsMonthsDuration(m)) | (YearsMonthsDuration(m), DateTime(dt)) => {
            temporal::add_months_to_date_time(dt, *m)
                .map(DateTime)
                .unwrap_or(Null)
        }
        (DateTime(dt), DaysTimeDuration(delta)) | (DaysTimeDuration(delta), DateTime(dt)) => {
            dt.checked_add_signed(*delta).map(DateTime).unwrap_or(Null)
        }
        (Time(t), DaysTimeDuration(delta)) | (DaysTimeDuration(delta), Time(t)) => Time(FeelTime {
            time: t.time.overflowing_add_signed(*delta).0,
            offset: t.offset,
        }),
        (YearsMonthsDuration(x), YearsMonthsDuration(y)) => {
            x.checked_add(*y).map(YearsMonthsDuration).unwrap_or(Null)
        }
        (DaysTimeDuration(x), DaysTimeDuration(y)) => {
            x.checked_add(y).map(DaysTimeDuration).unwrap_or(Null)
        }
        _ => Null,
    }
}

pub fn subtract(a: &Value, b: &Value) -> Value {
    use Value::*;
    match (a, b) {
        (Null, _) | (_, Null) => Null,
        (Number(x), Number(y)) => x.checked_sub(*y).map(Number).unwrap_or(Null),
        (Date(x), Date(y)) => DaysTimeDuration(TimeDelta::days(
            x.signed_duration_since(*y).num_days(),
        )),
        (DateTime(x), DateTime(y)) => DaysTimeDuration(x.signed_duration_since(y)),
        (Date(x), DateTime(y)) => {
            DaysTimeDuration(date_midnight(x).signed_duration_since(y))
        }
        (DateTime(x), Date(y)) => {
            DaysTimeDuration(x.signed_duration_since(date_midnight(y)))
        }
        (Time(x), Time(y)) => {
            DaysTimeDuration(normalised(x).signed_duration_since(normalised(y)))
        }
        (Date(d), YearsMonthsDuration(m)) => temporal::add_months_to_date(*d, -m)
            .map(Date)
            .unwrap_or(Null),
        (Date(d), DaysTimeDuration(delta)) => {
            match d.and_time(NaiveTime::MIN).checked_sub_signed(*delta) {
                Some(dt) => Date(dt.date()),
                None => Null,
            }
        }
        (DateTime(dt), YearsMonthsDuration(m)) => temporal::add_months_to_date_time(dt, -m)
            .map(DateTime)
            .unwrap_or(Null),
        (DateTime(dt), DaysTimeDuration(delta)) => {
            dt.checked_sub_signed(*delta).map(DateTime).unwrap_or(Null)
        }
        (Time(t), DaysTimeDuration(delta)) => Time(FeelTime {
            time: t.time.overflowing_sub_signed(*delta).0,
            offset: t.offset,
        }),
        (YearsMonthsDuration(x), YearsMonthsDuration(y)) => {
            x.checked_sub(*y).map(YearsMonthsDuration).unwrap_or(Null)
        }
        (DaysTimeDuration(x), DaysTimeDuration(y)) => {
            x.checked_sub(y).map(DaysTimeDuration).unwrap_or(Null)
        }
        _ => Null,
    }
}

pub fn multiply(a: &Value, b: &Value) -> Value {
    use Value::*;
    match (a, b) {
        (Null, _) | (_, Null) => Null,
        (Number(x), Number(y)) => x.checked_mul(*y).map(Number).unwrap_or(Null),
        (DaysTimeDuration(delta), Number(n)) | (Number(n), DaysTimeDuration(delta)) => {
            scale_delta(delta, *n).map(DaysTimeDuration).unwrap_or(Null)
        }
        (YearsMonthsDuration(m), Number(n)) | (Number(n), YearsMonthsDuration(m)) => {
            match Decimal::from(*m).checked_mul(*n).map(|d| d.trunc()) {
                Some(months) => months.to_i64().map(YearsMonthsDuration).unwrap_or(Null),
                None => Null,
            }
        }
        _ => Null,
    }
}

pub fn divide(a: &Value, b: &Value) -> Value {
    use Value::*;
    match (a, b) {
        (Null, _) | (_, Null) => Null,
        (Number(x), Number(y)) => {
            if y.is_zero() {
                Null
            } else {
                x.checked_div(*y).map(Number).unwrap_or(Null)
            }
        }
        (DaysTimeDuration(delta), Number(n)) => {
            if n.is_zero() {
                return Null;
            }
            match Decimal::ONE.checked_div(*n) {
                Some(inverse) => scale_delta(delta, inverse)
                    .map(DaysTimeDuration)
                    .unwrap_or(Null),
                None => Null,
            }
        }
        (YearsMonthsDuration(m), Number(n)) => {
            if n.is_zero() {
                return Null;
            }
            match Decimal::from(*m).checked_div(*n).map(|d| d.trunc()) {
                Some(months) => months.to_i64().map(YearsMonthsDuration).unwrap_or(Null),
                None => Null,
            }
        }
        (DaysTimeDuration(x), DaysTimeDuration(y)) => {
            let xs = delta_seconds(x);
            let ys = delta_seconds(y);
            if ys.is_zero() {
                Null
            } else {
                xs.checked_div(ys).map(Number).unwrap_or(Null)
            }
        }
        (YearsMonthsDuration(x), YearsMonthsDuration(y)) => {
            if *y == 0 {
                Null
            } else {
                Decimal::from(*x)
                    .checked_div(Decimal::from(*y))
                    .map(Number)
                    .unwrap_or(Null)
            }
        }
        _ => Null,
    }
}

/// FEEL modulo: `a - b * floor(a / b)` — the result takes the divisor's sign.
pub fn modulo(a: &Value, b: &Value) -> Value {
    use Value::*;
    match (a, b) {
        (Number(x), Number(y)) => {
            if y.is_zero() {
                return Null;
            }
            match x.checked_div(*y) {
                Some(q) => match y.checked_mul(q.floor()).and_then(|p| x.checked_sub(p)) {
                    Some(r) => Number(r),
                    None => Null,
                },
                None => Null,
            }
        }
        _ => Null,
    }
}

pub fn exponent(a: &Value, b: &Value) -> Value {
    use Value::*;
    let (Number(base), Number(power)) = (a, b) else {
        return Null;
    };
    // Exact repeated multiplication for integral exponents; everything else
    // bounces through f64.
    if power.fract().is_zero() {
        if let Some(exp) = power.to_i64() {
            return int_pow(*base, exp).map(Number).unwrap_or(Null);
        }
    }
    let (Some(bf), Some(pf)) = (base.to_f64(), power.to_f64()) else {
        return Null;
    };
    let out = bf.powf(pf);
    if !out.is_finite() {
        return Null;
    }
    Decimal::from_f64(out).map(Number).unwrap_or(Null)
}

pub fn negate(v: &Value) -> Value {
    use Value::*;
    match v {
        Number(n) => Number(-n),
        YearsMonthsDuration(m) => m.checked_neg().map(YearsMonthsDuration).unwrap_or(Null),
        DaysTimeDuration(delta) => DaysTimeDuration(-*delta),
        _ => Null,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn int_pow(base: Decimal, exp: i64) -> Option<Decimal> {
    if exp < 0 {
        let positive = int_pow(base, -exp)?;
        if positive.is_zero() {
            return None;
        }
        return Decimal::ONE.checked_div(positive);
    }
    let mut out = Decimal::ONE;
    for _ in 0..exp {
        out = out.checked_mul(base)?;
    }
    Some(out)
}

pub(crate) fn delta_seconds(delta: &TimeDelta) -> Decimal {
    Decimal::from(delta.num_seconds())
        + Decimal::from(delta.subsec_nanos()) / Decimal::from(1_000_000_000)
}

pub(crate) fn seconds_to_delta(seconds: Decimal) -> Option<TimeDelta> {
    let whole = seconds.trunc().to_i64()?;
    let nanos = ((seconds - seconds.trunc()) * Decimal::from(1_000_000_000))
        .trunc()
        .to_i64()?;
    TimeDelta::try_seconds(whole)?.checked_add(&TimeDelta::nanoseconds(nanos))
}

fn scale_delta(delta: &TimeDelta, factor: Decimal) -> Option<TimeDelta> {
    seconds_to_delta(delta_seconds(delta).checked_mul(factor)?)
}

fn date_midnight(date: &chrono::NaiveDate) -> chrono::DateTime<chrono::FixedOffset> {
    use chrono::TimeZone;
    temporal::utc_offset().from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn normalised(t: &FeelTime) -> NaiveTime {
    match t.offset {
        Some(offset) => t.time - TimeDelta::seconds(offset.local_minus_utc() as i64),
        None => t.time,
    }
}
