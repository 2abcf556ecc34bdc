use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{float_value, int_value, split_top_level, strip_quotes};
use crate::error::{GraderError, Result};

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());
static LONG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+[lL]$").unwrap());
static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?([eE][+-]?\d+)?[fF]$").unwrap());
static DOUBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?([eE][+-]?\d+)?$").unwrap());

static ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^new\s+\w+((?:\s*\[\s*\])+)\s*\{(.*)\}$").unwrap());
static ARRAYLIST_AS_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^new\s+ArrayList\s*<[^()]*>\s*\(\s*Arrays\.asList\((.*)\)\s*\)$").unwrap()
});
static ARRAYLIST_DOUBLE_BRACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^new\s+ArrayList\s*<[^()]*>\s*\(\s*\)\s*\{\s*\{(.*)\}\s*\}$").unwrap()
});
static ARRAYLIST_EMPTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^new\s+ArrayList\s*<[^()]*>\s*\(\s*\)$").unwrap());
static HASHMAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^new\s+HashMap\s*<[^()]*>\s*\(\s*\)\s*(?:\{(.*)\})?$").unwrap()
});

const JAVA_TYPES: &[&str] = &[
    "byte", "short", "integer", "float", "double", "long", "boolean", "char", "Array",
    "ArrayList", "Set", "HashMap", "Hashtable", "Queue", "Stack", "String", "any",
];

/// Converts a Java literal to the JSON value of `expected_type`.
pub fn java_type_converter(
    value: &str,
    expected_type: &str,
    nested_type: Option<&str>,
) -> Result<Value> {
    if !JAVA_TYPES.contains(&expected_type) {
        return Err(GraderError::UnsupportedType(expected_type.to_string()));
    }
    let value = value.trim();
    let fallback = || Ok(Value::String(value.to_string()));
    match expected_type {
        "byte" | "short" | "integer" => {
            if !INTEGER.is_match(value) {
                return fallback();
            }
            int_value(value).map_or_else(fallback, Ok)
        }
        "long" => {
            if !LONG.is_match(value) {
                return fallback();
            }
            int_value(&value[..value.len() - 1]).map_or_else(fallback, Ok)
        }
        "float" => {
            if !FLOAT.is_match(value) {
                return fallback();
            }
            let digits = &value[..value.len() - 1];
            digits
                .parse::<f64>()
                .map_or_else(|_| fallback(), |f| Ok(float_value(f, value)))
        }
        "double" => {
            if !DOUBLE.is_match(value) {
                return fallback();
            }
            value
                .parse::<f64>()
                .map_or_else(|_| fallback(), |f| Ok(float_value(f, value)))
        }
        "boolean" => match value {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => fallback(),
        },
        "char" => Ok(Value::String(
            strip_quotes(value, &['\''])
                .filter(|inner| inner.chars().count() == 1)
                .unwrap_or(value)
                .to_string(),
        )),
        "String" => Ok(Value::String(
            strip_quotes(value, &['"']).unwrap_or(value).to_string(),
        )),
        "any" => fallback(),
        "Array" => parse_array(value, nested_type),
        "ArrayList" => parse_arraylist(value, nested_type),
        "HashMap" => parse_hashmap(value, nested_type),
        // Set, Hashtable, Queue and Stack
        other => Err(GraderError::NotImplemented(other.to_string())),
    }
}

fn convert_element(element: &str, nested_type: Option<&str>) -> Result<Value> {
    match nested_type {
        Some(nested) => java_type_converter(element, nested, None),
        None => Ok(parse_java_value(element)),
    }
}

fn parse_array(input: &str, nested_type: Option<&str>) -> Result<Value> {
    let Some(caps) = ARRAY.captures(input) else {
        return Ok(Value::String(input.to_string()));
    };
    let dims = caps[1].matches('[').count();
    parse_array_body(&caps[2], dims, nested_type)
}

// `{1, 2}` rows of a multi-dimensional array initializer become nested lists
fn parse_array_body(body: &str, dims: usize, nested_type: Option<&str>) -> Result<Value> {
    let mut elements = Vec::new();
    for element in split_top_level(body, ',') {
        let value = if dims > 1 {
            if let Some(inner) = element.strip_prefix('{').and_then(|e| e.strip_suffix('}')) {
                parse_array_body(inner, dims - 1, nested_type)?
            } else if element.starts_with("new ") {
                parse_array(element, nested_type)?
            } else {
                convert_element(element, nested_type)?
            }
        } else {
            convert_element(element, nested_type)?
        };
        elements.push(value);
    }
    Ok(Value::Array(elements))
}

fn parse_arraylist_element(element: &str, nested_type: Option<&str>) -> Result<Value> {
    match nested_type {
        Some("char") => Ok(Value::String(
            strip_quotes(element, &['\'']).unwrap_or(element).to_string(),
        )),
        Some("String") => Ok(Value::String(
            strip_quotes(element, &['"']).unwrap_or(element).to_string(),
        )),
        _ => convert_element(element, nested_type),
    }
}

fn parse_arraylist(input: &str, nested_type: Option<&str>) -> Result<Value> {
    if let Some(caps) = ARRAYLIST_AS_LIST.captures(input) {
        let elements = split_top_level(&caps[1], ',')
            .into_iter()
            .map(|element| parse_arraylist_element(element, nested_type))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Value::Array(elements));
    }
    if let Some(caps) = ARRAYLIST_DOUBLE_BRACE.captures(input) {
        let mut elements = Vec::new();
        for statement in split_top_level(&caps[1], ';') {
            let Some(argument) = statement
                .strip_prefix("add(")
                .and_then(|s| s.strip_suffix(')'))
            else {
                return Ok(Value::String(input.to_string()));
            };
            elements.push(parse_arraylist_element(argument.trim(), nested_type)?);
        }
        return Ok(Value::Array(elements));
    }
    if ARRAYLIST_EMPTY.is_match(input) {
        return Ok(Value::Array(Vec::new()));
    }
    Ok(Value::String(input.to_string()))
}

fn parse_hashmap(input: &str, nested_type: Option<&str>) -> Result<Value> {
    let Some(caps) = HASHMAP.captures(input) else {
        return Ok(Value::String(input.to_string()));
    };
    let mut body = caps.get(1).map_or("", |m| m.as_str()).trim();
    // double-brace initializer
    if let Some(inner) = body.strip_prefix('{').and_then(|b| b.strip_suffix('}')) {
        body = inner.trim();
    }
    let mut elements = Map::new();
    for statement in split_top_level(body, ';') {
        let Some(arguments) = statement
            .strip_prefix("put(")
            .and_then(|s| s.strip_suffix(')'))
        else {
            return Ok(Value::String(input.to_string()));
        };
        let [key, value] = split_top_level(arguments, ',')[..] else {
            return Ok(Value::String(input.to_string()));
        };
        let key = strip_quotes(key, &['"']).unwrap_or(key);
        elements.insert(key.to_string(), convert_element(value, nested_type)?);
    }
    Ok(Value::Object(elements))
}

/// Infers a value from its lexical shape alone, for elements without a declared type.
pub fn parse_java_value(value: &str) -> Value {
    let value = value.trim();
    match value {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Some(inner) = strip_quotes(value, &['"']) {
        return Value::String(inner.to_string());
    }
    if LONG.is_match(value) {
        if let Some(v) = int_value(&value[..value.len() - 1]) {
            return v;
        }
    }
    if FLOAT.is_match(value) {
        if let Ok(f) = value[..value.len() - 1].parse::<f64>() {
            return float_value(f, value);
        }
    }
    if let Some(v) = int_value(value) {
        return v;
    }
    if DOUBLE.is_match(value) {
        if let Ok(f) = value.parse::<f64>() {
            return float_value(f, value);
        }
    }
    Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn convert(value: &str, ty: &str) -> Value {
        java_type_converter(value, ty, None).unwrap()
    }

    fn convert_nested(value: &str, ty: &str, nested: &str) -> Value {
        java_type_converter(value, ty, Some(nested)).unwrap()
    }

    #[test]
    fn scalar_conversions() {
        assert_eq!(convert("true", "boolean"), json!(true));
        assert_eq!(convert("false", "boolean"), json!(false));
        assert_eq!(convert("123", "integer"), json!(123));
        assert_eq!(convert("-123", "integer"), json!(-123));
        assert_eq!(convert("3.14f", "float"), json!(3.14));
        assert_eq!(convert("-3.14f", "float"), json!(-3.14));
        assert_eq!(convert("3.14", "double"), json!(3.14));
        assert_eq!(convert("123L", "long"), json!(123));
        assert_eq!(convert("-123L", "long"), json!(-123));
        assert_eq!(convert("a", "char"), json!("a"));
        assert_eq!(convert("'a'", "char"), json!("a"));
        assert_eq!(convert("abc", "String"), json!("abc"));
        assert_eq!(convert("\"abc\"", "String"), json!("abc"));
        assert_eq!(convert("3f", "float"), json!(3.0));
        assert_eq!(convert("3e3F", "float"), json!(3e3));
        assert_eq!(convert("3e-3F", "float"), json!(3e-3));
        assert_eq!(convert("3.14e2", "double"), json!(3.14e2));
        assert_eq!(convert("3.14e-2", "double"), json!(3.14e-2));
        assert_eq!(convert("127", "byte"), json!(127));
        assert_eq!(convert("-32768", "short"), json!(-32768));
        assert_eq!(
            convert("9223372036854775807L", "long"),
            json!(i64::MAX)
        );
        assert_eq!(
            convert("-9223372036854775808L", "long"),
            json!(i64::MIN)
        );
        assert_eq!(convert("123", "any"), json!("123"));
    }

    #[test]
    fn mismatched_scalars_fall_back_to_string() {
        assert_eq!(convert("true", "integer"), json!("true"));
        assert_eq!(convert("abc", "long"), json!("abc"));
        assert_eq!(convert("3.14", "float"), json!("3.14"));
        assert_eq!(convert("3.14f", "double"), json!("3.14f"));
        assert_eq!(convert("invalid", "boolean"), json!("invalid"));
        assert_eq!(convert("abc", "char"), json!("abc"));
    }

    #[test]
    fn collections() {
        assert_eq!(convert("new int[]{1, 2, 3}", "Array"), json!([1, 2, 3]));
        assert_eq!(
            convert("new ArrayList<>(Arrays.asList(\"a\", \"b\"))", "ArrayList"),
            json!(["a", "b"])
        );
        assert_eq!(
            convert(
                "new HashMap<String, String>() {{ put(\"key\", \"value\"); }}",
                "HashMap"
            ),
            json!({"key": "value"})
        );
        assert_eq!(
            convert("new Object[]{1, \"abc\", true}", "Array"),
            json!([1, "abc", true])
        );
        assert_eq!(
            convert("new ArrayList<>(Arrays.asList(1, \"abc\", true))", "ArrayList"),
            json!([1, "abc", true])
        );
        assert_eq!(
            convert(
                "new HashMap<String, Object>() {{ put(\"key1\", 1); put(\"key2\", \"value\"); put(\"key3\", true); }}",
                "HashMap"
            ),
            json!({"key1": 1, "key2": "value", "key3": true})
        );
    }

    #[test]
    fn empty_collections_are_empty_not_strings() {
        for literal in ["new int[]{}", "new int[] {}", "new int[] { }"] {
            assert_eq!(convert(literal, "Array"), json!([]));
        }
        assert_eq!(convert("new ArrayList<>()", "ArrayList"), json!([]));
        for literal in [
            "new HashMap<>()",
            "new HashMap<>() {}",
            "new HashMap<>() {{}}",
            "new HashMap<>() {{ }}",
        ] {
            assert_eq!(convert(literal, "HashMap"), json!({}));
        }
    }

    #[test]
    fn spacing_variants() {
        for literal in [
            "new int[]{1,2,3}",
            "new int[] {1, 2, 3}",
            "new int[] { 1, 2, 3 }",
        ] {
            assert_eq!(convert(literal, "Array"), json!([1, 2, 3]));
        }
        for literal in [
            "new HashMap<String, String>() {{put(\"key\", \"value\");}}",
            "new HashMap<String, String>() { { put(\"key\", \"value\"); } }",
        ] {
            assert_eq!(convert(literal, "HashMap"), json!({"key": "value"}));
        }
        assert_eq!(
            convert(
                "new HashMap<String, Object>() {{ put(\"key1\", \"value 1\"); put(\"key2\", \"value 2\"); }}",
                "HashMap"
            ),
            json!({"key1": "value 1", "key2": "value 2"})
        );
    }

    #[test]
    fn typed_elements() {
        assert_eq!(
            convert_nested("new long[]{1L, 2L, 3L}", "Array", "long"),
            json!([1, 2, 3])
        );
        assert_eq!(
            convert_nested("new long[]{1L, 2, 3L}", "Array", "long"),
            json!([1, "2", 3])
        );
        assert_eq!(
            convert_nested("new long[]{1L, 2.0, 3L}", "Array", "long"),
            json!([1, "2.0", 3])
        );
        assert_eq!(
            convert_nested(
                "new ArrayList<Integer>(Arrays.asList(1, 2, 3))",
                "ArrayList",
                "integer"
            ),
            json!([1, 2, 3])
        );
        assert_eq!(
            convert_nested(
                "new ArrayList<Float>() {{ add(1.0f); add(2.0f); add(3.0f); }}",
                "ArrayList",
                "float"
            ),
            json!([1.0, 2.0, 3.0])
        );
        assert_eq!(
            convert_nested(
                "new ArrayList<Boolean>(Arrays.asList(true, false, true))",
                "ArrayList",
                "boolean"
            ),
            json!([true, false, true])
        );
        assert_eq!(
            convert_nested(
                "new ArrayList<Character>() {{ add('a'); add('b'); add('c'); }}",
                "ArrayList",
                "char"
            ),
            json!(["a", "b", "c"])
        );
        assert_eq!(
            convert(
                "new ArrayList<String>() {{ add(\"aasdasd\"); add(\"basdasd\"); }}",
                "ArrayList"
            ),
            json!(["aasdasd", "basdasd"])
        );
    }

    #[test]
    fn multi_dimensional_arrays_nest() {
        assert_eq!(
            convert("new int[][]{{1, 2}, {3, 4}}", "Array"),
            json!([[1, 2], [3, 4]])
        );
        assert_eq!(
            convert_nested("new double[][]{{1.5}, {}}", "Array", "double"),
            json!([[1.5], []])
        );
    }

    #[test]
    fn unmatched_collections_fall_back_to_string() {
        assert_eq!(convert("myList", "ArrayList"), json!("myList"));
        assert_eq!(convert("{1, 2}", "Array"), json!("{1, 2}"));
        assert_eq!(convert("existingMap", "HashMap"), json!("existingMap"));
    }

    #[test]
    fn unimplemented_and_unsupported_kinds_raise() {
        for ty in ["Set", "Hashtable", "Queue", "Stack"] {
            assert!(matches!(
                java_type_converter("abc", ty, None),
                Err(GraderError::NotImplemented(kind)) if kind == ty
            ));
        }
        assert!(matches!(
            java_type_converter("abc", "LinkedList", None),
            Err(GraderError::UnsupportedType(kind)) if kind == "LinkedList"
        ));
        assert!(matches!(
            java_type_converter("abc", "Integer", None),
            Err(GraderError::UnsupportedType(_))
        ));
    }

    #[test]
    fn untyped_values_are_inferred() {
        assert_eq!(parse_java_value("12L"), json!(12));
        assert_eq!(parse_java_value("1.5f"), json!(1.5));
        assert_eq!(parse_java_value("2.5"), json!(2.5));
        assert_eq!(parse_java_value("\"x\""), json!("x"));
        assert_eq!(parse_java_value("someVar"), json!("someVar"));
    }
}
