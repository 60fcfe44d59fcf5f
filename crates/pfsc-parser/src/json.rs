//! The pfsc JSON sublanguage: ordinary JSON extended with multi-line
//! strings, triple-quoted raw strings, bare identifiers as object keys,
//! trailing commas, and libpaths as a first-class value type (spec §4.2).
//!
//! Grounded on `examples/original_source/server/pfsc/lang/freestrings.py`'s
//! `json_grammar`: every string literal here is routed through
//! [`crate::vertex::vertex_and_escape`] exactly once, at the point the
//! string token is reduced to a `Value::Str`.

use crate::lexer::Cursor;
use crate::vertex::vertex_and_escape;
use pfsc_errors::PfscError;
use serde::{Deserialize, Serialize};

/// A parsed JSON sublanguage value. `Libpath` strings are kept distinct from
/// plain strings: the resolver (not this crate) later resolves them against
/// a module scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Libpath(String),
    Array(Vec<Value>),
    /// Preserves declaration order; pfsc object keys are not required to be
    /// unique-checked at parse time (the resolver may reject duplicates).
    Object(Vec<(String, Value)>),
}

pub fn parse_value(cur: &mut Cursor) -> Result<Value, PfscError> {
    cur.skip_ws();
    let start = cur.pos();
    match cur.peek() {
        Some('{') => parse_object(cur),
        Some('[') => parse_array(cur),
        Some('"') | Some('\'') => parse_string_or_libpath_literal(cur),
        Some(c) if c.is_ascii_digit() || c == '-' => parse_number(cur),
        Some(c) if c.is_alphabetic() || c == '_' => parse_keyword_or_libpath(cur),
        _ => Err(PfscError::MalformedJson(format!(
            "unexpected character at {}",
            cur.span_from(start)
        ))),
    }
}

fn parse_object(cur: &mut Cursor) -> Result<Value, PfscError> {
    cur.expect('{')?;
    let mut pairs = Vec::new();
    cur.skip_ws();
    if cur.peek() == Some('}') {
        cur.bump();
        return Ok(Value::Object(pairs));
    }
    loop {
        cur.skip_ws();
        let key = parse_key(cur)?;
        cur.skip_ws();
        cur.expect(':')?;
        let value = parse_value(cur)?;
        pairs.push((key, value));
        cur.skip_ws();
        match cur.peek() {
            Some(',') => {
                cur.bump();
                cur.skip_ws();
                if cur.peek() == Some('}') {
                    cur.bump();
                    break;
                }
            }
            Some('}') => {
                cur.bump();
                break;
            }
            _ => {
                return Err(PfscError::MalformedJson(format!(
                    "expected ',' or '}}' at {}",
                    cur.span_from(cur.pos())
                )))
            }
        }
    }
    Ok(Value::Object(pairs))
}

fn parse_key(cur: &mut Cursor) -> Result<String, PfscError> {
    match cur.peek() {
        Some('"') | Some('\'') => match parse_string_or_libpath_literal(cur)? {
            Value::Str(s) => Ok(s),
            Value::Libpath(s) => Ok(s),
            _ => unreachable!(),
        },
        Some(c) if c.is_alphabetic() || c == '_' => Ok(cur.take_ident()),
        _ => Err(PfscError::MalformedJson("expected object key".into())),
    }
}

fn parse_array(cur: &mut Cursor) -> Result<Value, PfscError> {
    cur.expect('[')?;
    let mut items = Vec::new();
    cur.skip_ws();
    if cur.peek() == Some(']') {
        cur.bump();
        return Ok(Value::Array(items));
    }
    loop {
        let v = parse_value(cur)?;
        items.push(v);
        cur.skip_ws();
        match cur.peek() {
            Some(',') => {
                cur.bump();
                cur.skip_ws();
                if cur.peek() == Some(']') {
                    cur.bump();
                    break;
                }
            }
            Some(']') => {
                cur.bump();
                break;
            }
            _ => {
                return Err(PfscError::MalformedJson(format!(
                    "expected ',' or ']' at {}",
                    cur.span_from(cur.pos())
                )))
            }
        }
    }
    Ok(Value::Array(items))
}

/// Reads a string literal in one of four forms (`"..."`, `'...'`,
/// `"""..."""`, `'''...'''`) and returns it V&E-sanitised, as `Value::Str`.
fn parse_string_or_libpath_literal(cur: &mut Cursor) -> Result<Value, PfscError> {
    let raw = cur.take_string_literal()?;
    Ok(Value::Str(vertex_and_escape(&raw)))
}

fn parse_number(cur: &mut Cursor) -> Result<Value, PfscError> {
    let start = cur.pos();
    if cur.peek() == Some('-') {
        cur.bump();
    }
    let mut is_float = false;
    while let Some(c) = cur.peek() {
        if c.is_ascii_digit() {
            cur.bump();
        } else if c == '.' && !is_float {
            is_float = true;
            cur.bump();
        } else {
            break;
        }
    }
    let text = cur.slice_from(start);
    if is_float {
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|e| PfscError::MalformedJson(e.to_string()))
    } else {
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|e| PfscError::MalformedJson(e.to_string()))
    }
}

/// Bare identifiers are either the constants `true`/`false`/`null` (also
/// accepting Python's capitalised `True`/`False`/`None`), or a bare libpath
/// (`CNAME ("." CNAME)*`) which is *not* run through V&E: libpaths are
/// structural references, not free strings.
fn parse_keyword_or_libpath(cur: &mut Cursor) -> Result<Value, PfscError> {
    let first = cur.take_ident();
    match first.as_str() {
        "true" | "True" => return Ok(Value::Bool(true)),
        "false" | "False" => return Ok(Value::Bool(false)),
        "null" | "None" => return Ok(Value::Null),
        _ => {}
    }
    let mut libpath = first;
    while cur.peek() == Some('.') {
        let save = cur.pos();
        cur.bump();
        if cur.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            libpath.push('.');
            libpath.push_str(&cur.take_ident());
        } else {
            cur.reset_to(save);
            break;
        }
    }
    Ok(Value::Libpath(libpath))
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Libpath(s) => Some(s),
            _ => None,
        }
    }
}

pub fn parse_value_from_str(input: &str) -> Result<Value, PfscError> {
    let mut cur = Cursor::new(input);
    let v = parse_value(&mut cur)?;
    cur.skip_ws();
    if !cur.at_end() {
        return Err(PfscError::MalformedJson(format!(
            "trailing input at {}",
            cur.span_from(cur.pos())
        )));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_with_bare_keys_and_trailing_comma() {
        let v = parse_value_from_str(r#"{ name: "alice", age: 30, }"#).unwrap();
        match v {
            Value::Object(pairs) => {
                assert_eq!(pairs.len(), 2);
                assert_eq!(pairs[0].0, "name");
                assert_eq!(pairs[0].1, Value::Str("alice".into()));
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn parses_triple_quoted_string_with_no_escapes() {
        let v = parse_value_from_str(r#""""a "quote" inside"""#).unwrap();
        assert_eq!(v, Value::Str(r#"a &quot;quote&quot; inside"#.to_string()));
    }

    #[test]
    fn parses_bare_libpath() {
        let v = parse_value_from_str("a.b.c").unwrap();
        assert_eq!(v, Value::Libpath("a.b.c".to_string()));
    }

    #[test]
    fn parses_array_with_trailing_comma() {
        let v = parse_value_from_str("[1, 2, 3,]").unwrap();
        assert_eq!(v, Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn vertex_translates_inside_strings() {
        let v = parse_value_from_str(r#""\al is alpha""#).unwrap();
        assert_eq!(v, Value::Str("\\alpha is alpha".to_string()));
    }
}
