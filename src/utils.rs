use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use serde_json::Value;

use crate::error::Result;

/// Reads newline-delimited JSON records. Blank lines are skipped.
pub fn load_json_lines_from_reader(reader: impl Read) -> Result<Vec<Value>> {
    let reader = BufReader::new(reader);
    let mut results = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_json: Value = serde_json::from_str(&line)?;
        results.push(line_json);
    }
    Ok(results)
}

pub fn load_json_lines(file_path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let file = File::open(file_path)?;
    load_json_lines_from_reader(file)
}

/// Short, type-style name of a JSON value used in diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
