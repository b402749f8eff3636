//! Numeric built-ins.
//!
//! All arithmetic stays in `Decimal`; only `sqrt`, `log`, and `exp` bounce
//! through `f64` and come back.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use super::{Registry, add, arg, int_arg, num_arg};
use crate::eval::{EvalContext, ops};
use crate::value::Value;

pub(super) fn register(map: &mut Registry) {
    add(map, "decimal", &["n", "scale"], decimal);
    add(map, "floor", &["n"], floor);
    add(map, "ceiling", &["n"], ceiling);
    add(map, "round up", &["n", "scale"], round_up);
    add(map, "round down", &["n", "scale"], round_down);
    add(map, "round half up", &["n", "scale"], round_half_up);
    add(map, "round half down", &["n", "scale"], round_half_down);
    add(map, "abs", &["n"], abs);
    add(map, "modulo", &["dividend", "divisor"], modulo);
    add(map, "sqrt", &["number"], sqrt);
    add(map, "log", &["number"], log);
    add(map, "exp", &["number"], exp);
    add(map, "odd", &["number"], odd);
    add(map, "even", &["number"], even);
}

fn rounded(args: &[Value], strategy: RoundingStrategy) -> Value {
    let (Some(n), Some(scale)) = (num_arg(args, 0), int_arg(args, 1)) else {
        return Value::Null;
    };
    round_with_scale(n, scale, strategy)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Negative scales round to tens/hundreds/... by shifting through a power
/// of ten.
fn round_with_scale(n: Decimal, scale: i64, strategy: RoundingStrategy) -> Option<Decimal> {
    if scale >= 0 {
        let dp = u32::try_from(scale).ok()?;
        return Some(n.round_dp_with_strategy(dp, strategy));
    }
    let shift = u32::try_from(-scale).ok()?;
    let factor = Decimal::from(10u64.checked_pow(shift)?);
    let scaled = n.checked_div(factor)?;
    scaled
        .round_dp_with_strategy(0, strategy)
        .checked_mul(factor)
}

/// FEEL `decimal` rounds half to even (banker's rounding).
fn decimal(args: &[Value], _env: &EvalContext) -> Value {
    rounded(args, RoundingStrategy::MidpointNearestEven)
}

fn round_up(args: &[Value], _env: &EvalContext) -> Value {
    rounded(args, RoundingStrategy::AwayFromZero)
}

fn round_down(args: &[Value], _env: &EvalContext) -> Value {
    rounded(args, RoundingStrategy::ToZero)
}

fn round_half_up(args: &[Value], _env: &EvalContext) -> Value {
    rounded(args, RoundingStrategy::MidpointAwayFromZero)
}

fn round_half_down(args: &[Value], _env: &EvalContext) -> Value {
    rounded(args, RoundingStrategy::MidpointTowardZero)
}

fn floor(args: &[Value], _env: &EvalContext) -> Value {
    match num_arg(args, 0) {
        Some(n) => Value::Number(n.floor()),
        None => Value::Null,
    }
}

fn ceiling(args: &[Value], _env: &EvalContext) -> Value {
    match num_arg(args, 0) {
        Some(n) => Value::Number(n.ceil()),
        None => Value::Null,
    }
}

/// `abs` also accepts durations.
fn abs(args: &[Value], _env: &EvalContext) -> Value {
    match arg(args, 0) {
        Value::Number(n) => Value::Number(n.abs()),
        Value::YearsMonthsDuration(m) => Value::YearsMonthsDuration(m.abs()),
        Value::DaysTimeDuration(delta) => Value::DaysTimeDuration(delta.abs()),
        _ => Value::Null,
    }
}

fn modulo(args: &[Value], _env: &EvalContext) -> Value {
    ops::modulo(&arg(args, 0), &arg(args, 1))
}

fn sqrt(args: &[Value], _env: &EvalContext) -> Value {
    let Some(n) = num_arg(args, 0) else {
        return Value::Null;
    };
    if n.is_sign_negative() && !n.is_zero() {
        return Value::Null;
    }
    from_float(n.to_f64().map(f64::sqrt))
}

/// Natural logarithm; non-positive input yields `null`.
fn log(args: &[Value], _env: &EvalContext) -> Value {
    let Some(n) = num_arg(args, 0) else {
        return Value::Null;
    };
    if n <= Decimal::ZERO {
        return Value::Null;
    }
    from_float(n.to_f64().map(f64::ln))
}

fn exp(args: &[Value], _env: &EvalContext) -> Value {
    let Some(n) = num_arg(args, 0) else {
        return Value::Null;
    };
    from_float(n.to_f64().map(f64::exp))
}

fn from_float(value: Option<f64>) -> Value {
    match value {
        Some(f) if f.is_finite() => Decimal::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn odd(args: &[Value], _env: &EvalContext) -> Value {
    parity(args, 1)
}

fn even(args: &[Value], _env: &EvalContext) -> Value {
    parity(args, 0)
}

fn parity(args: &[Value], expected_rem: i64) -> Value {
    match int_arg(args, 0) {
        Some(i) => Value::Boolean(i.rem_euclid(2) == expected_rem),
        None => Value::Null,
    }
}
