//! The FEEL value universe.
//!
//! A closed tagged union; every operator dispatches on tags and yields
//! `Null` for ill-typed combinations instead of raising. The single
//! canonical number type is `rust_decimal::Decimal` (28–29 significant
//! digits); all incoming integers/floats are coerced on entry.

mod compare;
mod display;

pub use compare::{compare_values, feel_equal};
pub use display::canonical_string;

use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use dmn_feel::Expr;
use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::eval::{FunctionResolver, ScopeHandle};

pub type ContextMap = IndexMap<String, Value>;

/// A FEEL time of day: wall-clock time plus optional UTC offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeelTime {
    pub time: NaiveTime,
    pub offset: Option<FixedOffset>,
}

/// A FEEL range; endpoints are `Null` when unbounded on that side.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeValue {
    pub low: Value,
    pub high: Value,
    pub low_inclusive: bool,
    pub high_inclusive: bool,
}

impl RangeValue {
    /// Range membership honouring endpoint inclusivity; `Null` endpoints are
    /// unbounded. Returns `None` when the point is not comparable with an
    /// endpoint.
    pub fn contains(&self, point: &Value) -> Option<bool> {
        if matches!(point, Value::Null) {
            return Some(false);
        }
        if !matches!(self.low, Value::Null) {
            let ord = compare_values(point, &self.low)?;
            let above = if self.low_inclusive {
                ord != std::cmp::Ordering::Less
            } else {
                ord == std::cmp::Ordering::Greater
            };
            if !above {
                return Some(false);
            }
        }
        if !matches!(self.high, Value::Null) {
            let ord = compare_values(point, &self.high)?;
            let below = if self.high_inclusive {
                ord != std::cmp::Ordering::Greater
            } else {
                ord == std::cmp::Ordering::Less
            };
            if !below {
                return Some(false);
            }
        }
        Some(true)
    }
}

/// A user-defined function value. Closes over the *defining* scope and the
/// function resolver active at definition time.
pub struct FunctionValue {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    pub closure: ScopeHandle,
    pub resolver: FunctionResolver,
    pub external: bool,
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Number(Decimal),
    String(String),
    Boolean(bool),
    Date(NaiveDate),
    Time(FeelTime),
    DateTime(DateTime<FixedOffset>),
    /// Signed calendar months.
    YearsMonthsDuration(i64),
    /// Signed clock duration.
    DaysTimeDuration(TimeDelta),
    List(Vec<Value>),
    Context(ContextMap),
    Range(Box<RangeValue>),
    Function(Rc<FunctionValue>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn number(n: impl Into<Decimal>) -> Value {
        Value::Number(n.into())
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&ContextMap> {
        match self {
            Value::Context(entries) => Some(entries),
            _ => None,
        }
    }

    /// The FEEL type of this value.
    pub fn feel_type(&self) -> FeelType {
        match self {
            Value::Null => FeelType::Null,
            Value::Number(_) => FeelType::Number,
            Value::String(_) => FeelType::String,
            Value::Boolean(_) => FeelType::Boolean,
            Value::Date(_) => FeelType::Date,
            Value::Time(_) => FeelType::Time,
            Value::DateTime(_) => FeelType::DateAndTime,
            Value::YearsMonthsDuration(_) => FeelType::YearsMonthsDuration,
            Value::DaysTimeDuration(_) => FeelType::DaysTimeDuration,
            Value::List(_) => FeelType::List,
            Value::Context(_) => FeelType::Context,
            Value::Range(_) => FeelType::Range,
            Value::Function(_) => FeelType::Function,
        }
    }
}

/// FEEL type names, as used by `instance of` and declared variable types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeelType {
    Null,
    Number,
    String,
    Boolean,
    Date,
    Time,
    DateAndTime,
    YearsMonthsDuration,
    DaysTimeDuration,
    List,
    Context,
    Range,
    Function,
    Any,
}

impl FeelType {
    /// Recognise a FEEL type name (`instance of` operand, DMN typeRef).
    pub fn from_name(name: &str) -> Option<FeelType> {
        let t = match name {
            "null" => FeelType::Null,
            "number" | "integer" | "long" | "double" | "decimal" => FeelType::Number,
            "string" => FeelType::String,
            "boolean" => FeelType::Boolean,
            "date" => FeelType::Date,
            "time" => FeelType::Time,
            "date and time" | "dateTime" | "date time" => FeelType::DateAndTime,
            "years and months duration" | "yearMonthDuration" => FeelType::YearsMonthsDuration,
            "days and time duration" | "dayTimeDuration" | "duration" => FeelType::DaysTimeDuration,
            "list" => FeelType::List,
            "context" => FeelType::Context,
            "range" => FeelType::Range,
            "function" => FeelType::Function,
            "Any" | "any" => FeelType::Any,
            _ => return None,
        };
        Some(t)
    }
}


/// Structural equality for tests and collections; FEEL equality semantics
/// (`null = null` etc.) live in [`feel_equal`]. Functions compare by
/// identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::YearsMonthsDuration(a), Value::YearsMonthsDuration(b)) => a == b,
            (Value::DaysTimeDuration(a), Value::DaysTimeDuration(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Context(a), Value::Context(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
