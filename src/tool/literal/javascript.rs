use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{float_value, int_value, split_top_level, strip_quotes};
use crate::error::{GraderError, Result};

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());
static FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());
static BIGINT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+n$").unwrap());
static NEW_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^new\s+Array\s*\((.*)\)$").unwrap());

const JS_TYPES: &[&str] = &[
    "String", "integer", "float", "Bigint", "Boolean", "dict", "array", "any",
];

const QUOTES: &[char] = &['"', '\''];

/// Converts a JavaScript literal to the JSON value of `expected_type`.
pub fn js_type_converter(
    value: &str,
    expected_type: &str,
    nested_type: Option<&str>,
) -> Result<Value> {
    if !JS_TYPES.contains(&expected_type) {
        return Err(GraderError::UnsupportedType(expected_type.to_string()));
    }
    let value = value.trim();
    let fallback = || Ok(Value::String(value.to_string()));
    match expected_type {
        "String" => Ok(Value::String(
            strip_quotes(value, QUOTES).unwrap_or(value).to_string(),
        )),
        "integer" => {
            if !INTEGER.is_match(value) {
                return fallback();
            }
            int_value(value).map_or_else(fallback, Ok)
        }
        "float" => {
            if !FLOAT.is_match(value) {
                return fallback();
            }
            value
                .parse::<f64>()
                .map_or_else(|_| fallback(), |f| Ok(float_value(f, value)))
        }
        "Bigint" => {
            if !BIGINT.is_match(value) {
                return fallback();
            }
            int_value(&value[..value.len() - 1]).map_or_else(fallback, Ok)
        }
        "Boolean" => match value {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => fallback(),
        },
        "array" => parse_array(value, nested_type),
        "dict" => parse_dict(value),
        // any
        _ => fallback(),
    }
}

fn array_body(code: &str) -> Option<&str> {
    if let Some(body) = code.strip_prefix('[').and_then(|c| c.strip_suffix(']')) {
        return Some(body);
    }
    NEW_ARRAY
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Array literals and `new Array(...)`. Nested arrays recurse instead of flattening.
fn parse_array(code: &str, nested_type: Option<&str>) -> Result<Value> {
    let Some(body) = array_body(code) else {
        return Ok(Value::String(code.to_string()));
    };
    let mut elements = Vec::new();
    for element in split_top_level(body, ',') {
        let value = match nested_type {
            Some(nested) => js_type_converter(element, nested, None)?,
            None => parse_untyped(element)?,
        };
        elements.push(value);
    }
    Ok(Value::Array(elements))
}

fn parse_dict(code: &str) -> Result<Value> {
    let Some(body) = code.strip_prefix('{').and_then(|c| c.strip_suffix('}')) else {
        return Ok(Value::String(code.to_string()));
    };
    let mut dictionary = Map::new();
    for pair in split_top_level(body, ',') {
        let Some((key, value)) = split_key_value(pair) else {
            return Ok(Value::String(code.to_string()));
        };
        let key = strip_quotes(key, QUOTES).unwrap_or(key);
        dictionary.insert(key.to_string(), parse_untyped(value)?);
    }
    Ok(Value::Object(dictionary))
}

// first ':' outside quotes
fn split_key_value(pair: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (idx, ch) in pair.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if QUOTES.contains(&ch) => quote = Some(ch),
            None if ch == ':' => return Some((pair[..idx].trim(), pair[idx + 1..].trim())),
            None => {}
        }
    }
    None
}

fn parse_untyped(element: &str) -> Result<Value> {
    if element.starts_with('[') || element.starts_with("new Array") {
        parse_array(element, None)
    } else if element.starts_with('{') {
        parse_dict(element)
    } else {
        Ok(parse_js_value(element))
    }
}

/// Infers a value from its lexical shape alone, for elements without a declared type.
pub fn parse_js_value(value: &str) -> Value {
    let value = value.trim();
    match value {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Some(inner) = strip_quotes(value, QUOTES) {
        return Value::String(inner.to_string());
    }
    if let Some(v) = int_value(value) {
        return v;
    }
    if FLOAT.is_match(value) || value.contains(['e', 'E']) {
        if let Ok(f) = value.parse::<f64>() {
            return float_value(f, value);
        }
    }
    Value::String(value.to_string())
}
