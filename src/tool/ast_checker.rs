use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    error::{GraderError, Result},
    tool::{
        bfcl_formats::{BfclFunctionDef, BfclGroundTruthFunctionCall, BfclParameter},
        category::{Language, TestCategory},
        error_analysis::{ErrorKind, ErrorRecord},
        literal::convert_literal,
        response::Response,
        tool_calls::{ToolCall, ToolCallList},
    },
    utils::json_type_name,
};

/// Informational notes of a call that passed, or the first fault of a call that did not.
type CallCheck = std::result::Result<Vec<ErrorRecord>, ErrorRecord>;

/// Grades decoded calls against the possible answers of an AST category.
///
/// `Err` means the question itself is inconsistent (a ground-truth function with no schema).
pub fn ast_checker(
    functions: &[BfclFunctionDef],
    tool_calls: &ToolCallList,
    ground_truth: &[BfclGroundTruthFunctionCall],
    language: Language,
    category: TestCategory,
) -> Result<Response> {
    if category.is_multi_call() {
        return multi_function_checker(functions, tool_calls, ground_truth, language, category);
    }

    if tool_calls.len() != 1 {
        return Ok(Response::failed(ErrorRecord::new(
            ErrorKind::SimpleWrongCount,
            format!(
                "Wrong number of functions. Expected 1, got {}.",
                tool_calls.len()
            ),
        )));
    }
    let Some(expected) = ground_truth.first() else {
        return Err(GraderError::MalformedRecord(
            "ground truth holds no function call".to_string(),
        ));
    };
    let call = &tool_calls[0];
    if call.function_name != expected.function_name {
        return Ok(Response::failed(wrong_func_name(call, expected)));
    }
    let func_def = find_function(functions, &expected.function_name)?;
    Ok(match simple_function_checker(func_def, call, expected, language) {
        Ok(notes) => passed_with(notes),
        Err(error) => Response::failed(error),
    })
}

fn passed_with(notes: Vec<ErrorRecord>) -> Response {
    let mut response = Response::passed();
    notes.into_iter().for_each(|note| response.push_error(note));
    response
}

fn find_function<'a>(functions: &'a [BfclFunctionDef], name: &str) -> Result<&'a BfclFunctionDef> {
    functions
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| GraderError::MalformedRecord(format!("no function description for {name}")))
}

fn wrong_func_name(call: &ToolCall, expected: &BfclGroundTruthFunctionCall) -> ErrorRecord {
    ErrorRecord::new(
        ErrorKind::WrongFuncName,
        format!(
            "Function name {:?} not found. Expected {:?}.",
            call.function_name, expected.function_name
        ),
    )
}

// Unordered greedy assignment: each expected call takes the first unmatched candidate that
// passes the single-call check.
fn multi_function_checker(
    functions: &[BfclFunctionDef],
    tool_calls: &ToolCallList,
    ground_truth: &[BfclGroundTruthFunctionCall],
    language: Language,
    category: TestCategory,
) -> Result<Response> {
    if tool_calls.len() != ground_truth.len() {
        let kind = if category.is_parallel() {
            ErrorKind::ParallelWrongCount
        } else {
            ErrorKind::MultipleWrongCount
        };
        return Ok(Response::failed(ErrorRecord::new(
            kind,
            format!(
                "Wrong number of functions. Expected {}, got {}.",
                ground_truth.len(),
                tool_calls.len()
            ),
        )));
    }

    let mut unmatched: Vec<usize> = (0..tool_calls.len()).collect();
    let mut notes = Vec::new();
    for (expected_idx, expected) in ground_truth.iter().enumerate() {
        let func_def = find_function(functions, &expected.function_name)?;
        let mut sub_errors = Vec::new();
        let mut matched = None;
        for (pool_idx, &candidate_idx) in unmatched.iter().enumerate() {
            let candidate = &tool_calls[candidate_idx];
            let outcome = if candidate.function_name == expected.function_name {
                simple_function_checker(func_def, candidate, expected, language)
            } else {
                Err(wrong_func_name(candidate, expected))
            };
            match outcome {
                Ok(call_notes) => {
                    notes.extend(call_notes);
                    matched = Some(pool_idx);
                    break;
                }
                Err(error) => sub_errors.push(error),
            }
        }
        let Some(pool_idx) = matched else {
            let mut response = Response::failed(ErrorRecord::new(
                ErrorKind::CannotFindMatch,
                format!(
                    "Could not find a matching function among index {unmatched:?} of model output for index {expected_idx} of possible answers."
                ),
            ));
            sub_errors.into_iter().for_each(|e| response.push_error(e));
            return Ok(response);
        };
        unmatched.remove(pool_idx);
    }
    Ok(passed_with(notes))
}

/// Checks one call whose name already matches `expected`.
fn simple_function_checker(
    func_def: &BfclFunctionDef,
    call: &ToolCall,
    expected: &BfclGroundTruthFunctionCall,
    language: Language,
) -> CallCheck {
    let empty = IndexMap::new();
    let properties = func_def.properties().unwrap_or(&empty);
    check_recursively_for_required_and_unexpected(&call.parameters, properties, func_def.required())?;

    for (param, value) in &call.parameters {
        let Some(options) = expected.parameters.get(param) else {
            return Err(ErrorRecord::new(
                ErrorKind::UnexpectedParam,
                format!(
                    "Unexpected parameter: {param:?}. Expected one of {:?}.",
                    expected.parameters.keys().collect::<Vec<_>>()
                ),
            ));
        };
        // present because the recursive check rejects undeclared parameters
        let Some(spec) = properties.get(param) else {
            continue;
        };
        check_parameter(param, value, spec, options, language)?;
    }

    let mut notes = Vec::new();
    for param in expected.parameters.keys() {
        if !call.parameters.contains_key(param) && !expected.is_optional(param) {
            notes.push(ErrorRecord::new(
                ErrorKind::MissingOptional,
                format!("Optional parameter {param:?} not provided."),
            ));
        }
    }
    Ok(notes)
}

fn check_recursively_for_required_and_unexpected(
    parameters: &IndexMap<String, Value>,
    properties_def: &IndexMap<String, BfclParameter>,
    required_params: &[String],
) -> std::result::Result<(), ErrorRecord> {
    for required_param in required_params {
        if !parameters.contains_key(required_param) {
            return Err(ErrorRecord::new(
                ErrorKind::MissingRequired,
                format!("Missing required parameter: {required_param:?}."),
            ));
        }
    }
    for (parameter_name, parameter_value) in parameters {
        let Some(parameter_def) = properties_def.get(parameter_name) else {
            return Err(ErrorRecord::new(
                ErrorKind::UnexpectedParam,
                format!(
                    "Unexpected parameter: {parameter_name:?}. Declared: {:?}.",
                    properties_def.keys().collect::<Vec<_>>()
                ),
            ));
        };
        let Some(sub_properties) = &parameter_def.properties else {
            continue;
        };
        // a non-object value is reported by the type check instead
        let Value::Object(sub_parameters) = parameter_value else {
            continue;
        };
        let sub_parameters: IndexMap<String, Value> = sub_parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        check_recursively_for_required_and_unexpected(
            &sub_parameters,
            sub_properties,
            parameter_def.required.as_deref().unwrap_or_default(),
        )?;
    }
    Ok(())
}

fn check_parameter(
    param: &str,
    value: &Value,
    spec: &BfclParameter,
    options: &[Value],
    language: Language,
) -> std::result::Result<(), ErrorRecord> {
    let (value, options) = match language {
        Language::Python => (
            coerce_python(value, spec),
            options.iter().map(|o| coerce_python(o, spec)).collect::<Vec<_>>(),
        ),
        Language::Java | Language::JavaScript => {
            let Value::String(source) = value else {
                return Err(ErrorRecord::new(
                    ErrorKind::IncorrectType,
                    format!(
                        "Parameter {param:?} must be given as {language} source text, got {}.",
                        json_type_name(value)
                    ),
                ));
            };
            let convert = |source: &str| {
                convert_literal(source, &spec.ty, spec.items_ty(), language).map_err(|e| {
                    ErrorRecord::new(
                        ErrorKind::LiteralConversion,
                        format!("Could not convert parameter {param:?}: {e}"),
                    )
                })
            };
            let converted = convert(source.as_str())?;
            let mut converted_options = Vec::with_capacity(options.len());
            for option in options {
                converted_options.push(match option {
                    Value::String(s) if !s.is_empty() => convert(s.as_str())?,
                    other => other.clone(),
                });
            }
            (converted, converted_options)
        }
    };

    // a string naming a variable stands in for a value of any type
    let is_variable = value.is_string() && options.iter().any(|o| o == &value);
    if !is_variable {
        check_type(param, &value, spec, &options, language)?;
    }

    if let Some(allowed) = &spec.r#enum {
        if !allowed.iter().any(|a| literal_eq(a, &value)) {
            return Err(ErrorRecord::new(
                ErrorKind::IncorrectValue,
                format!("Invalid value for parameter {param:?}: {value}. Expected one of {allowed:?}."),
            ));
        }
    }

    match &value {
        Value::Object(_) if options.iter().any(Value::is_object) => {
            dict_checker(param, &value, &options)
        }
        Value::Array(items)
            if !items.is_empty()
                && items.iter().all(Value::is_object)
                && options.iter().any(|o| matches!(o, Value::Array(a) if a.iter().all(Value::is_object))) =>
        {
            list_dict_checker(param, items, &options)
        }
        _ if options.iter().any(|o| literal_eq(o, &value)) => Ok(()),
        _ => Err(ErrorRecord::new(
            ErrorKind::IncorrectValue,
            format!("Invalid value for parameter {param:?}: {value}. Expected one of {options:?}."),
        )),
    }
}

/// Integers given for float parameters (or float arrays) are read as floats.
fn coerce_python(value: &Value, spec: &BfclParameter) -> Value {
    match (spec.ty.as_str(), value) {
        ("float", Value::Number(n)) if !n.is_f64() => n.as_f64().map_or(value.clone(), Value::from),
        ("array" | "tuple", Value::Array(items)) if spec.items_ty() == Some("float") => {
            Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Number(n) if !n.is_f64() => {
                            n.as_f64().map_or(item.clone(), Value::from)
                        }
                        other => other.clone(),
                    })
                    .collect(),
            )
        }
        _ => value.clone(),
    }
}

fn python_kind(ty: &str) -> Option<&'static str> {
    match ty {
        "string" => Some("str"),
        "integer" => Some("int"),
        "float" => Some("float"),
        "boolean" => Some("bool"),
        "array" | "tuple" => Some("list"),
        "dict" | "object" => Some("dict"),
        _ => None,
    }
}

fn check_type(
    param: &str,
    value: &Value,
    spec: &BfclParameter,
    options: &[Value],
    language: Language,
) -> std::result::Result<(), ErrorRecord> {
    let actual = json_type_name(value);
    let expected_kinds: Vec<&str> = match language {
        Language::Python => python_kind(&spec.ty).into_iter().collect(),
        // converted possible answers carry the kind the declared type maps to
        Language::Java | Language::JavaScript => options
            .iter()
            .filter(|o| o.as_str() != Some(""))
            .map(json_type_name)
            .collect(),
    };
    if expected_kinds.is_empty() || expected_kinds.contains(&actual) {
        return Ok(());
    }
    Err(ErrorRecord::new(
        ErrorKind::IncorrectType,
        format!(
            "Incorrect type for parameter {param:?}. Expected type {}, got {actual}.",
            expected_kinds[0]
        ),
    ))
}

// possible answer dicts map each key to its accepted values; "" marks an omittable key
fn dict_matches(value: &Value, option: &Value) -> std::result::Result<(), String> {
    let (Value::Object(actual), Value::Object(accepted)) = (value, option) else {
        return Err(format!("Expected a dict, got {}.", json_type_name(value)));
    };
    for key in actual.keys() {
        if !accepted.contains_key(key) {
            return Err(format!("Unexpected dict key: {key:?}."));
        }
    }
    for (key, accepted_values) in accepted {
        let accepted_values: Vec<&Value> = match accepted_values {
            Value::Array(values) => values.iter().collect(),
            single => vec![single],
        };
        match actual.get(key) {
            None if accepted_values.iter().any(|v| v.as_str() == Some("")) => {}
            None => return Err(format!("Missing dict key: {key:?}.")),
            Some(v) if accepted_values.iter().any(|a| literal_eq(a, v)) => {}
            Some(v) => {
                return Err(format!(
                    "Invalid value for {key:?}: {v}. Expected one of {accepted_values:?}."
                ))
            }
        }
    }
    Ok(())
}

fn dict_checker(param: &str, value: &Value, options: &[Value]) -> std::result::Result<(), ErrorRecord> {
    let mut last_error = String::new();
    for option in options.iter().filter(|o| o.is_object()) {
        match dict_matches(value, option) {
            Ok(()) => return Ok(()),
            Err(e) => last_error = e,
        }
    }
    Err(ErrorRecord::new(
        ErrorKind::DictIncorrectValue,
        format!("Parameter {param:?}: {last_error}"),
    ))
}

fn list_dict_checker(
    param: &str,
    items: &[Value],
    options: &[Value],
) -> std::result::Result<(), ErrorRecord> {
    let mut last_error = String::from("no possible answer has the same length");
    for option in options {
        let Value::Array(accepted) = option else {
            continue;
        };
        if accepted.len() != items.len() {
            continue;
        }
        match items
            .iter()
            .zip(accepted)
            .enumerate()
            .try_for_each(|(idx, (item, accepted))| {
                dict_matches(item, accepted).map_err(|e| format!("item {idx}: {e}"))
            }) {
            Ok(()) => return Ok(()),
            Err(e) => last_error = e,
        }
    }
    Err(ErrorRecord::new(
        ErrorKind::DictIncorrectValue,
        format!("Parameter {param:?}: {last_error}"),
    ))
}

/// Exact equality that keeps integers and floats apart.
fn literal_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() != y.is_f64() {
                return false;
            }
            match (x.as_i64(), y.as_i64()) {
                (Some(i), Some(j)) => i == j,
                _ => x.as_f64() == y.as_f64(),
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| literal_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| literal_eq(x, y)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn functions(value: Value) -> Vec<BfclFunctionDef> {
        serde_json::from_value(value).unwrap()
    }

    fn calls(value: Value) -> ToolCallList {
        ToolCallList::from_json_dict_list(&value).unwrap()
    }

    fn answers(value: Value) -> Vec<BfclGroundTruthFunctionCall> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| BfclGroundTruthFunctionCall::deserialize_from_json(v).unwrap())
            .collect()
    }

    fn point_functions() -> Vec<BfclFunctionDef> {
        functions(json!([{
            "name": "plot_point",
            "description": "Plots a point.",
            "parameters": {
                "type": "dict",
                "properties": {
                    "x": {"type": "integer"},
                    "y": {"type": "integer"},
                    "z": {"type": "integer"},
                    "scale": {"type": "float"},
                    "unit": {"type": "string", "enum": ["cm", "m"]}
                },
                "required": ["x", "y"]
            }
        }]))
    }

    fn point_answer() -> Vec<BfclGroundTruthFunctionCall> {
        answers(json!([{"plot_point": {
            "x": [4], "y": [5], "z": ["", 0], "scale": ["", 1.0], "unit": ["", "cm"]
        }}]))
    }

    fn check(completion: Value) -> Response {
        ast_checker(
            &point_functions(),
            &calls(completion),
            &point_answer(),
            Language::Python,
            TestCategory::Simple,
        )
        .unwrap()
    }

    #[test]
    fn required_only_call_passes() {
        let response = check(json!([{"plot_point": {"x": 4, "y": 5}}]));
        assert!(response.correct, "{:?}", response.errors);
    }

    #[test]
    fn undeclared_param_is_unexpected() {
        let response = check(json!([{"plot_point": {"x": 4, "y": 5, "w": 1}}]));
        assert!(!response.correct);
        assert!(response
            .leading_error_type()
            .unwrap()
            .ends_with("unexpected_param"));
    }

    #[test]
    fn missing_required_param() {
        let response = check(json!([{"plot_point": {"x": 4}}]));
        assert!(response.has_error(ErrorKind::MissingRequired));
    }

    #[test]
    fn wrong_name_short_circuits() {
        let response = check(json!([{"plot_line": {"w": 4}}]));
        assert_eq!(response.errors.len(), 1);
        assert!(response.has_error(ErrorKind::WrongFuncName));
    }

    #[test]
    fn type_and_value_errors() {
        let response = check(json!([{"plot_point": {"x": "4", "y": 5}}]));
        assert!(response.has_error(ErrorKind::IncorrectType));
        let response = check(json!([{"plot_point": {"x": 3, "y": 5}}]));
        assert!(response.has_error(ErrorKind::IncorrectValue));
        let response = check(json!([{"plot_point": {"x": 4, "y": 5, "unit": "km"}}]));
        assert!(response.has_error(ErrorKind::IncorrectValue));
    }

    #[test]
    fn int_for_float_param_is_coerced() {
        let response = check(json!([{"plot_point": {"x": 4, "y": 5, "scale": 1}}]));
        assert!(response.correct, "{:?}", response.errors);
        // integers stay integers
        let response = check(json!([{"plot_point": {"x": 4.0, "y": 5}}]));
        assert!(response.has_error(ErrorKind::IncorrectType));
    }

    #[test]
    fn omitted_answer_param_is_informational() {
        let functions = point_functions();
        let answer = answers(json!([{"plot_point": {"x": [4], "y": [5], "z": [7]}}]));
        let response = ast_checker(
            &functions,
            &calls(json!([{"plot_point": {"x": 4, "y": 5}}])),
            &answer,
            Language::Python,
            TestCategory::Simple,
        )
        .unwrap();
        assert!(response.correct);
        assert_eq!(
            response.leading_error_type(),
            Some("simple_function_checker:missing_optional")
        );
    }

    #[test]
    fn nested_dict_params_are_checked() {
        let functions = functions(json!([{
            "name": "book",
            "description": "",
            "parameters": {"type": "dict", "properties": {
                "room": {"type": "dict", "properties": {
                    "size": {"type": "string"},
                    "view": {"type": "string"}
                }, "required": ["size"]}
            }, "required": ["room"]}
        }]));
        let answer = answers(json!([{"book": {"room": [{"size": ["king"], "view": ["", "sea"]}]}}]));
        let run = |room: Value| {
            ast_checker(
                &functions,
                &calls(json!([{"book": {"room": room}}])),
                &answer,
                Language::Python,
                TestCategory::LiveSimple,
            )
            .unwrap()
        };
        assert!(run(json!({"size": "king"})).correct);
        assert!(run(json!({"size": "king", "view": "sea"})).correct);
        assert!(run(json!({"view": "sea"})).has_error(ErrorKind::MissingRequired));
        assert!(run(json!({"size": "king", "pool": true})).has_error(ErrorKind::UnexpectedParam));
        assert!(run(json!({"size": "queen"})).has_error(ErrorKind::DictIncorrectValue));
    }

    #[test]
    fn variable_names_pass_type_check() {
        let functions = functions(json!([{
            "name": "scale",
            "description": "",
            "parameters": {"type": "dict", "properties": {"factor": {"type": "integer"}}, "required": ["factor"]}
        }]));
        let answer = answers(json!([{"scale": {"factor": ["k", 2]}}]));
        let response = ast_checker(
            &functions,
            &calls(json!([{"scale": {"factor": "k"}}])),
            &answer,
            Language::Python,
            TestCategory::Simple,
        )
        .unwrap();
        assert!(response.correct);
    }

    #[test]
    fn java_values_go_through_the_literal_parser() {
        let functions = functions(json!([{
            "name": "Cache.put",
            "description": "",
            "parameters": {"type": "dict", "properties": {
                "key": {"type": "String"},
                "ttl": {"type": "long"},
                "tags": {"type": "ArrayList", "items": {"type": "String"}}
            }, "required": ["key", "ttl"]}
        }]));
        let answer = answers(json!([{"Cache.put": {
            "key": ["\"session\""], "ttl": ["3600L"], "tags": ["", "new ArrayList<>(Arrays.asList(\"a\", \"b\"))"]
        }}]));
        let run = |completion: Value| {
            ast_checker(&functions, &calls(completion), &answer, Language::Java, TestCategory::Java).unwrap()
        };
        assert!(run(json!([{"Cache.put": {"key": "\"session\"", "ttl": "3600L"}}])).correct);
        assert!(run(json!([{"Cache.put": {
            "key": "\"session\"", "ttl": "3600L", "tags": "new ArrayList<>(Arrays.asList(\"a\", \"b\"))"
        }}]))
        .correct);
        assert!(run(json!([{"Cache.put": {"key": "\"session\"", "ttl": 3600}}]))
            .has_error(ErrorKind::IncorrectType));
        assert!(run(json!([{"Cache.put": {"key": "\"session\"", "ttl": "forever"}}]))
            .has_error(ErrorKind::IncorrectType));
        assert!(run(json!([{"Cache.put": {"key": "\"session\"", "ttl": "60L"}}]))
            .has_error(ErrorKind::IncorrectValue));
    }

    fn weather_functions() -> Vec<BfclFunctionDef> {
        functions(json!([{
            "name": "get_weather",
            "description": "",
            "parameters": {"type": "dict", "properties": {"city": {"type": "string"}}, "required": ["city"]}
        }]))
    }

    fn weather_answer() -> Vec<BfclGroundTruthFunctionCall> {
        answers(json!([
            {"get_weather": {"city": ["Paris"]}},
            {"get_weather": {"city": ["Rome"]}},
            {"get_weather": {"city": ["Oslo"]}}
        ]))
    }

    #[test]
    fn parallel_count_mismatch() {
        let response = ast_checker(
            &weather_functions(),
            &calls(json!([{"get_weather": {"city": "Paris"}}, {"get_weather": {"city": "Rome"}}])),
            &weather_answer(),
            Language::Python,
            TestCategory::Parallel,
        )
        .unwrap();
        assert!(!response.correct);
        assert_eq!(
            response.leading_error_type(),
            Some("parallel_function_checker_no_order:wrong_count")
        );
    }

    #[test]
    fn parallel_order_does_not_matter() {
        let response = ast_checker(
            &weather_functions(),
            &calls(json!([
                {"get_weather": {"city": "Oslo"}},
                {"get_weather": {"city": "Paris"}},
                {"get_weather": {"city": "Rome"}}
            ])),
            &weather_answer(),
            Language::Python,
            TestCategory::LiveParallel,
        )
        .unwrap();
        assert!(response.correct, "{:?}", response.errors);
    }

    #[test]
    fn duplicate_call_cannot_find_match() {
        let response = ast_checker(
            &weather_functions(),
            &calls(json!([
                {"get_weather": {"city": "Paris"}},
                {"get_weather": {"city": "Paris"}},
                {"get_weather": {"city": "Rome"}}
            ])),
            &weather_answer(),
            Language::Python,
            TestCategory::Parallel,
        )
        .unwrap();
        assert!(!response.correct);
        assert!(response.errors[0].is(ErrorKind::CannotFindMatch));
        assert!(response.errors.len() > 1);
    }

    #[test]
    fn multiple_uses_its_own_count_key() {
        let response = ast_checker(
            &weather_functions(),
            &ToolCallList::default(),
            &weather_answer()[..1],
            Language::Python,
            TestCategory::Multiple,
        )
        .unwrap();
        assert!(response.has_error(ErrorKind::MultipleWrongCount));
    }

    #[test]
    fn unknown_answer_function_is_a_record_error() {
        let answer = answers(json!([{"get_time": {"zone": ["UTC"]}}]));
        let err = ast_checker(
            &weather_functions(),
            &calls(json!([{"get_time": {"zone": "UTC"}}])),
            &answer,
            Language::Python,
            TestCategory::Simple,
        )
        .unwrap_err();
        assert!(matches!(err, GraderError::MalformedRecord(_)));
    }

    #[test]
    fn literal_eq_keeps_numeric_kinds_apart() {
        assert!(literal_eq(&json!(5), &json!(5)));
        assert!(!literal_eq(&json!(5), &json!(5.0)));
        assert!(literal_eq(&json!([1.5, {"a": 1}]), &json!([1.5, {"a": 1}])));
    }
}
