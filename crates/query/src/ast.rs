//! Parsed form of a condition expression

use crumb_core::Value;
use std::fmt;

/// A `$`-prefixed reference, split on `.`
///
/// Against a document the segments walk nested fields. Against a list of
/// sub-query results the first segment is a position (`$0`, `$1`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    segments: Vec<String>,
}

impl Reference {
    /// Build a reference from the text after `$`
    pub fn new(body: &str) -> Self {
        Reference {
            segments: body.split('.').map(String::from).collect(),
        }
    }

    /// Path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.segments.join("."))
    }
}

/// Condition AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `null`, `true`, `false`, a number or a quoted string
    Literal(Value),
    /// `$field.sub` or `$0`
    Reference(Reference),
    /// `name(arg, ...)`
    Call {
        /// Function name as written
        name: String,
        /// Arguments, in order
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Shorthand for a literal
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Shorthand for a call
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    /// True when the expression contains no references
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Literal(_) => true,
            Expr::Reference(_) => false,
            Expr::Call { args, .. } => args.iter().all(Expr::is_constant),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::String(s)) if s.contains('\'') => write!(f, "\"{}\"", s),
            Expr::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Reference(r) => write!(f, "{}", r),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
