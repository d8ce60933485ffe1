//! Builtin function table
//!
//! Every builtin declares its arity and operand type. Arguments are checked
//! against both before the function body runs, so bodies index their
//! arguments freely.

use crate::time;
use chrono::{DateTime, Datelike, Timelike, Utc};
use crumb_core::{Arity, Node, QueryError, Value};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::f64::consts::PI;
use Arity::{AtLeast, Exactly};

type AnyFn = fn(Vec<Node>) -> Node;
type NumberFn = fn(&[f64]) -> Node;
type StringFn = fn(&[&str]) -> Node;
type TimeFn = fn(&DateTime<Utc>) -> Node;

/// Operand type a builtin accepts, paired with its body
#[derive(Clone, Copy)]
enum Body {
    /// Any node, including objects
    Any(AnyFn),
    /// Number leaves
    Number(NumberFn),
    /// String leaves
    String(StringFn),
    /// A single millisecond timestamp
    Time(TimeFn),
}

/// A function callable from a condition
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    arity: Arity,
    body: Body,
}

impl Builtin {
    const fn any(name: &'static str, arity: Arity, f: AnyFn) -> Self {
        Builtin { name, arity, body: Body::Any(f) }
    }

    const fn number(name: &'static str, arity: Arity, f: NumberFn) -> Self {
        Builtin { name, arity, body: Body::Number(f) }
    }

    const fn string(name: &'static str, arity: Arity, f: StringFn) -> Self {
        Builtin { name, arity, body: Body::String(f) }
    }

    const fn time(name: &'static str, f: TimeFn) -> Self {
        Builtin { name, arity: Arity::Exactly(1), body: Body::Time(f) }
    }

    /// Function name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Accepted argument count
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Check arguments and apply the function
    pub fn call(&self, args: Vec<Node>) -> Result<Node, QueryError> {
        if !self.arity.accepts(args.len()) {
            return Err(QueryError::Arity {
                function: self.name.to_string(),
                expected: self.arity,
            });
        }

        match self.body {
            Body::Any(f) => Ok(f(args)),
            Body::Number(f) => Ok(f(&self.numbers(&args)?)),
            Body::String(f) => {
                let strings = args
                    .iter()
                    .map(|a| a.as_str().ok_or_else(|| self.operand_error("string")))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(f(&strings))
            }
            Body::Time(f) => {
                let millis = self.numbers(&args)?[0];
                Ok(f(&time::from_millis(self.name, millis)?))
            }
        }
    }

    fn numbers(&self, args: &[Node]) -> Result<Vec<f64>, QueryError> {
        args.iter()
            .map(|a| a.as_number().ok_or_else(|| self.operand_error("number")))
            .collect()
    }

    fn operand_error(&self, expected: &'static str) -> QueryError {
        QueryError::OperandType {
            function: self.name.to_string(),
            expected,
        }
    }
}

fn num(n: f64) -> Node {
    Node::Leaf(Value::Number(n))
}

fn boolean(b: bool) -> Node {
    Node::Leaf(Value::Bool(b))
}

fn string(s: String) -> Node {
    Node::Leaf(Value::String(s))
}

/// `1 / d`, or null when `d` is exactly zero
fn reciprocal(d: f64) -> Node {
    if d == 0.0 {
        Node::NULL
    } else {
        num(1.0 / d)
    }
}

/// Round half up, toward positive infinity
fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x == 0.0 {
        0.0
    } else {
        -1.0
    }
}

static BUILTINS: &[Builtin] = &[
    // Logical
    Builtin::any("and", AtLeast(0), |args| {
        args.into_iter()
            .fold(boolean(true), |prev, cur| if prev.is_truthy() { cur } else { prev })
    }),
    Builtin::any("or", AtLeast(0), |args| {
        args.into_iter()
            .fold(boolean(false), |prev, cur| if prev.is_truthy() { prev } else { cur })
    }),
    Builtin::any("not", Exactly(1), |args| boolean(!args[0].is_truthy())),
    Builtin::any("if_else", Exactly(3), |mut args| {
        let pick = if args[0].is_truthy() { 1 } else { 2 };
        args.swap_remove(pick)
    }),
    // Comparison
    Builtin::any("eq", Exactly(2), |args| boolean(args[0] == args[1])),
    Builtin::number("gt", Exactly(2), |x| boolean(x[0] > x[1])),
    Builtin::number("lt", Exactly(2), |x| boolean(x[0] < x[1])),
    Builtin::number("gt_or_eq", Exactly(2), |x| boolean(x[0] >= x[1])),
    Builtin::number("lt_or_eq", Exactly(2), |x| boolean(x[0] <= x[1])),
    Builtin::number("in_range", Exactly(3), |x| boolean(x[0] > x[1] && x[0] < x[2])),
    // String
    Builtin::string("starts_with", Exactly(2), |s| boolean(s[0].starts_with(s[1]))),
    Builtin::string("ends_with", Exactly(2), |s| boolean(s[0].ends_with(s[1]))),
    Builtin::string("to_lower", Exactly(1), |s| string(s[0].to_lowercase())),
    Builtin::string("to_upper", Exactly(1), |s| string(s[0].to_uppercase())),
    // Arithmetic
    Builtin::number("add", AtLeast(0), |x| num(x.iter().sum())),
    Builtin::number("multiply", AtLeast(0), |x| num(x.iter().product())),
    Builtin::number("subtract", Exactly(2), |x| num(x[0] - x[1])),
    Builtin::number("divide", Exactly(2), |x| {
        if x[1] == 0.0 {
            Node::NULL
        } else {
            num(x[0] / x[1])
        }
    }),
    Builtin::number("abs", Exactly(1), |x| num(x[0].abs())),
    Builtin::number("sign", Exactly(1), |x| num(sign(x[0]))),
    Builtin::number("sqrt", Exactly(1), |x| num(x[0].sqrt())),
    Builtin::number("power", Exactly(2), |x| num(x[0].powf(x[1]))),
    Builtin::number("log", Exactly(2), |x| num(x[0].ln() / x[1].ln())),
    Builtin::number("exp", Exactly(1), |x| num(x[0].exp())),
    Builtin::number("ceil", Exactly(1), |x| num(x[0].ceil())),
    Builtin::number("floor", Exactly(1), |x| num(x[0].floor())),
    Builtin::number("round", Exactly(1), |x| num(round_half_up(x[0]))),
    Builtin::number("min", AtLeast(0), |x| num(x.iter().fold(f64::MAX, |a, &b| a.min(b)))),
    Builtin::number("max", AtLeast(0), |x| num(x.iter().fold(f64::MIN, |a, &b| a.max(b)))),
    Builtin::number("average", AtLeast(1), |x| {
        num(x.iter().sum::<f64>() / x.len() as f64)
    }),
    // Trigonometry
    Builtin::number("sin", Exactly(1), |x| num(x[0].sin())),
    Builtin::number("cos", Exactly(1), |x| num(x[0].cos())),
    Builtin::number("tan", Exactly(1), |x| num(x[0].tan())),
    Builtin::number("asin", Exactly(1), |x| num(x[0].asin())),
    Builtin::number("acos", Exactly(1), |x| num(x[0].acos())),
    Builtin::number("atan", Exactly(1), |x| num(x[0].atan())),
    Builtin::number("atan2", Exactly(2), |x| num(x[0].atan2(x[1]))),
    Builtin::number("sec", Exactly(1), |x| reciprocal(x[0].cos())),
    Builtin::number("csc", Exactly(1), |x| reciprocal(x[0].sin())),
    Builtin::number("cot", Exactly(1), |x| reciprocal(x[0].tan())),
    Builtin::number("degrees", Exactly(1), |x| num(x[0] * (180.0 / PI))),
    Builtin::number("radians", Exactly(1), |x| num(x[0] * (PI / 180.0))),
    Builtin::number("pi", Exactly(0), |_| num(PI)),
    Builtin::number("random", Exactly(0), |_| num(rand::random::<f64>())),
    // Date and time, UTC
    Builtin::number("current_time", Exactly(0), |_| num(time::now_millis())),
    Builtin::time("to_date_string", |dt| string(time::to_utc_string(dt))),
    Builtin::time("year", |dt| num(dt.year() as f64)),
    Builtin::time("month", |dt| num(dt.month0() as f64)),
    Builtin::time("hour", |dt| num(dt.hour() as f64)),
    Builtin::time("minute", |dt| num(dt.minute() as f64)),
    Builtin::time("second", |dt| num(dt.second() as f64)),
    Builtin::time("day_of_week", |dt| num(dt.weekday().num_days_from_sunday() as f64)),
    Builtin::time("day_of_month", |dt| num(dt.day() as f64)),
    // Misc
    Builtin::any("coalesce", AtLeast(0), |args| {
        args.into_iter().find(|n| !n.is_null()).unwrap_or(Node::NULL)
    }),
];

static REGISTRY: Lazy<HashMap<&'static str, &'static Builtin>> =
    Lazy::new(|| BUILTINS.iter().map(|b| (b.name, b)).collect());

/// Look up a builtin by name
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    REGISTRY.get(name).copied()
}

/// Call a builtin by name with evaluated arguments
pub fn call(name: &str, args: Vec<Node>) -> Result<Node, QueryError> {
    lookup(name)
        .ok_or_else(|| QueryError::UnknownFunction {
            name: name.to_string(),
        })?
        .call(args)
}

/// Names of all builtins, in declaration order
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}
