//! Condition parser
//!
//! An expression is one of:
//! - a quoted string literal, `'...'` or `"..."`
//! - `null`, `true` or `false`
//! - a number (anything `f64` parses, except NaN)
//! - a reference, `$field.sub` or `$0`
//! - a call, `name(arg, arg, ...)`
//!
//! Call arguments are split on commas at parenthesis depth zero and outside
//! quotes, then parsed recursively.

use crate::ast::{Expr, Reference};
use crumb_core::{QueryError, Value};
use std::str::FromStr;

/// Parse a condition expression
pub fn parse(input: &str) -> Result<Expr, QueryError> {
    let text = input.trim();

    // A complete quoted literal is a string even if it looks like a call.
    if let Some(literal) = quoted_literal(text) {
        return Ok(Expr::Literal(Value::String(literal.to_string())));
    }

    if let Some((name, inner)) = split_call(text) {
        let parts = split_arguments(inner).ok_or_else(|| QueryError::Unbalanced {
            input: text.to_string(),
        })?;
        let args = parts.into_iter().map(parse).collect::<Result<Vec<_>, _>>()?;
        return Ok(Expr::Call {
            name: name.to_string(),
            args,
        });
    }

    parse_atom(text)
}

impl FromStr for Expr {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

fn quoted_literal(text: &str) -> Option<&str> {
    let mut chars = text.chars();
    let first = chars.next()?;
    let last = chars.next_back()?;
    if (first == '\'' || first == '"') && first == last {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

/// Split `name(inner)` at the first `(` after the first character.
fn split_call(text: &str) -> Option<(&str, &str)> {
    if !text.ends_with(')') {
        return None;
    }
    let (open, _) = text.char_indices().skip(1).find(|&(_, c)| c == '(')?;
    Some((&text[..open], &text[open + 1..text.len() - 1]))
}

/// Split call arguments on top-level commas.
///
/// Returns `None` when parentheses outside quotes do not balance. An
/// unterminated quote runs to the end of the input and is left to the
/// argument parser.
fn split_arguments(inner: &str) -> Option<Vec<&str>> {
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth = depth.checked_sub(1)?,
                ',' if depth == 0 => {
                    parts.push(&inner[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }

    if depth != 0 {
        return None;
    }
    parts.push(&inner[start..]);
    Some(parts)
}

fn parse_atom(text: &str) -> Result<Expr, QueryError> {
    match text {
        "null" => return Ok(Expr::Literal(Value::Null)),
        "true" => return Ok(Expr::Literal(Value::Bool(true))),
        "false" => return Ok(Expr::Literal(Value::Bool(false))),
        _ => {}
    }

    if let Ok(n) = text.parse::<f64>() {
        if !n.is_nan() {
            return Ok(Expr::Literal(Value::Number(n)));
        }
    }

    if let Some(body) = text.strip_prefix('$') {
        return Ok(Expr::Reference(Reference::new(body)));
    }

    Err(QueryError::Parse {
        input: text.to_string(),
    })
}
