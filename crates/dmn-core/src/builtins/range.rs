//! Range built-ins (the DMN interval relations).
//!
//! All of them accept mixed point/range arguments; a point behaves as the
//! degenerate closed range `[p..p]`. Comparisons against an unbounded
//! (`null`) endpoint make the relation `null`.

use std::cmp::Ordering;

use super::{Registry, add, arg};
use crate::eval::EvalContext;
use crate::value::{Value, compare_values};

pub(super) fn register(map: &mut Registry) {
    add(map, "before", &["point1", "point2"], |a, e| relation(a, e, before));
    add(map, "after", &["point1", "point2"], |a, e| relation(a, e, |x, y| before(y, x)));
    add(map, "meets", &["range1", "range2"], |a, e| relation(a, e, meets));
    add(map, "met by", &["range1", "range2"], |a, e| relation(a, e, |x, y| meets(y, x)));
    add(map, "overlaps", &["range1", "range2"], |a, e| relation(a, e, overlaps));
    add(map, "overlaps before", &["range1", "range2"], |a, e| {
        relation(a, e, overlaps_before)
    });
    add(map, "overlaps after", &["range1", "range2"], |a, e| {
        relation(a, e, |x, y| overlaps_before(y, x))
    });
    add(map, "finishes", &["point", "range"], |a, e| relation(a, e, finishes));
    add(map, "finished by", &["range", "point"], |a, e| {
        relation(a, e, |x, y| finishes(y, x))
    });
    add(map, "includes", &["range", "point"], |a, e| {
        relation(a, e, |x, y| during(y, x))
    });
    add(map, "during", &["point", "range"], |a, e| relation(a, e, during));
    add(map, "starts", &["point", "range"], |a, e| relation(a, e, starts));
    add(map, "started by", &["range", "point"], |a, e| {
        relation(a, e, |x, y| starts(y, x))
    });
    add(map, "coincides", &["point1", "point2"], |a, e| relation(a, e, coincides));
}

/// Endpoint view of a point or range argument.
struct Interval {
    low: Value,
    high: Value,
    low_inclusive: bool,
    high_inclusive: bool,
}

fn interval_of(v: &Value) -> Option<Interval> {
    match v {
        Value::Null => None,
        Value::Range(r) => Some(Interval {
            low: r.low.clone(),
            high: r.high.clone(),
            low_inclusive: r.low_inclusive,
            high_inclusive: r.high_inclusive,
        }),
        point => Some(Interval {
            low: point.clone(),
            high: point.clone(),
            low_inclusive: true,
            high_inclusive: true,
        }),
    }
}

fn relation(
    args: &[Value],
    _env: &EvalContext,
    rel: fn(&Interval, &Interval) -> Option<bool>,
) -> Value {
    let (Some(a), Some(b)) = (interval_of(&arg(args, 0)), interval_of(&arg(args, 1))) else {
        return Value::Null;
    };
    rel(&a, &b).map(Value::Boolean).unwrap_or(Value::Null)
}

fn cmp(a: &Value, b: &Value) -> Option<Ordering> {
    compare_values(a, b)
}

fn before(a: &Interval, b: &Interval) -> Option<bool> {
    Some(match cmp(&a.high, &b.low)? {
        Ordering::Less => true,
        Ordering::Equal => !(a.high_inclusive && b.low_inclusive),
        Ordering::Greater => false,
    })
}

fn meets(a: &Interval, b: &Interval) -> Option<bool> {
    Some(a.high_inclusive && b.low_inclusive && cmp(&a.high, &b.low)? == Ordering::Equal)
}

fn overlaps(a: &Interval, b: &Interval) -> Option<bool> {
    let low_ok = match cmp(&a.low, &b.high)? {
        Ordering::Less => true,
        Ordering::Equal => a.low_inclusive && b.high_inclusive,
        Ordering::Greater => false,
    };
    let high_ok = match cmp(&a.high, &b.low)? {
        Ordering::Greater => true,
        Ordering::Equal => a.high_inclusive && b.low_inclusive,
        Ordering::Less => false,
    };
    Some(low_ok && high_ok)
}

fn overlaps_before(a: &Interval, b: &Interval) -> Option<bool> {
    let starts_before = match cmp(&a.low, &b.low)? {
        Ordering::Less => true,
        Ordering::Equal => a.low_inclusive && !b.low_inclusive,
        Ordering::Greater => false,
    };
    let reaches_into = match cmp(&a.high, &b.low)? {
        Ordering::Greater => true,
        Ordering::Equal => a.high_inclusive && b.low_inclusive,
        Ordering::Less => false,
    };
    let ends_before = match cmp(&a.high, &b.high)? {
        Ordering::Less => true,
        Ordering::Equal => !a.high_inclusive || b.high_inclusive,
        Ordering::Greater => false,
    };
    Some(starts_before && reaches_into && ends_before)
}

fn starts(a: &Interval, b: &Interval) -> Option<bool> {
    let same_start =
        cmp(&a.low, &b.low)? == Ordering::Equal && a.low_inclusive == b.low_inclusive;
    let within = match cmp(&a.high, &b.high)? {
        Ordering::Less => true,
        Ordering::Equal => !a.high_inclusive || b.high_inclusive,
        Ordering::Greater => false,
    };
    Some(same_start && within)
}

fn finishes(a: &Interval, b: &Interval) -> Option<bool> {
    let same_end =
        cmp(&a.high, &b.high)? == Ordering::Equal && a.high_inclusive == b.high_inclusive;
    let within = match cmp(&a.low, &b.low)? {
        Ordering::Greater => true,
        Ordering::Equal => !a.low_inclusive || b.low_inclusive,
        Ordering::Less => false,
    };
    Some(same_end && within)
}

fn during(a: &Interval, b: &Interval) -> Option<bool> {
    let above = match cmp(&a.low, &b.low)? {
        Ordering::Greater => true,
        Ordering::Equal => !a.low_inclusive || b.low_inclusive,
        Ordering::Less => false,
    };
    let below = match cmp(&a.high, &b.high)? {
        Ordering::Less => true,
        Ordering::Equal => !a.high_inclusive || b.high_inclusive,
        Ordering::Greater => false,
    };
    Some(above && below)
}

fn coincides(a: &Interval, b: &Interval) -> Option<bool> {
    Some(
        cmp(&a.low, &b.low)? == Ordering::Equal
            && cmp(&a.high, &b.high)? == Ordering::Equal
            && a.low_inclusive == b.low_inclusive
            && a.high_inclusive == b.high_inclusive,
    )
}
