//! Best-effort conversion of Java and JavaScript literal source text into JSON values.
//!
//! Only the documented idioms are recognized. Text that does not match an idiom for its declared
//! type is returned unchanged as a string, which then simply fails the value comparison.

pub mod java;
pub mod javascript;

use serde_json::{Number, Value};

use crate::{
    error::{GraderError, Result},
    tool::category::Language,
};

/// Converts `value` written in `language` to the native value of `expected_type`, using
/// `nested_type` for collection elements.
pub fn convert_literal(
    value: &str,
    expected_type: &str,
    nested_type: Option<&str>,
    language: Language,
) -> Result<Value> {
    match language {
        Language::Java => java::java_type_converter(value, expected_type, nested_type),
        Language::JavaScript => javascript::js_type_converter(value, expected_type, nested_type),
        Language::Python => Err(GraderError::UnsupportedType(format!(
            "{expected_type} (python values are already native)"
        ))),
    }
}

/// Splits `input` at `separator` characters that are outside quotes and brackets.
/// Empty pieces are dropped, so an empty body yields no elements.
pub(crate) fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                pieces.push(&input[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&input[start..]);
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Removes one pair of matching surrounding quotes from `quotes`, if present.
pub(crate) fn strip_quotes<'a>(value: &'a str, quotes: &[char]) -> Option<&'a str> {
    let mut chars = value.chars();
    let first = chars.next()?;
    let last = chars.next_back()?;
    if first == last && quotes.contains(&first) {
        Some(&value[first.len_utf8()..value.len() - last.len_utf8()])
    } else {
        None
    }
}

pub(crate) fn float_value(value: f64, raw: &str) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

pub(crate) fn int_value(raw: &str) -> Option<Value> {
    raw.parse::<i64>().ok().map(Value::from)
}
