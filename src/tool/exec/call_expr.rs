use indexmap::IndexMap;
use rustpython_parser::{
    ast::{self, Constant, Expr, UnaryOp},
    parse, Mode,
};
use serde_json::{Map, Number, Value};

use super::registry::ExecError;
use crate::tool::tool_calls::ToolCall;

/// A parsed call expression such as `calc_area(10, unit="cm")`. Only literal arguments are
/// accepted, so evaluating it never runs anything but the resolved registry function.
#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    pub function_name: String,
    pub args: Vec<Value>,
    pub kwargs: IndexMap<String, Value>,
}

impl CallExpr {
    pub fn parse(source: &str) -> Result<Self, ExecError> {
        let module = parse(source.trim(), Mode::Expression, "<call>")
            .map_err(|e| ExecError::Parse(format!("{source}: {e}")))?;
        let ast::Mod::Expression(expression) = module else {
            return Err(ExecError::Parse(format!("{source}: not an expression")));
        };
        let Expr::Call(call) = *expression.body else {
            return Err(ExecError::Parse(format!("{source}: not a function call")));
        };

        let function_name = dotted_name(&call.func)
            .ok_or_else(|| ExecError::Parse(format!("{source}: callee must be a name")))?;
        let args = call
            .args
            .iter()
            .map(literal_value)
            .collect::<Result<Vec<_>, _>>()?;
        let mut kwargs = IndexMap::new();
        for keyword in &call.keywords {
            let Some(name) = &keyword.arg else {
                return Err(ExecError::Parse(format!("{source}: **kwargs are not supported")));
            };
            kwargs.insert(name.as_str().to_string(), literal_value(&keyword.value)?);
        }
        Ok(CallExpr {
            function_name,
            args,
            kwargs,
        })
    }
}

fn dotted_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(name) => Some(name.id.as_str().to_string()),
        Expr::Attribute(attribute) => {
            let owner = dotted_name(&attribute.value)?;
            Some(format!("{owner}.{}", attribute.attr.as_str()))
        }
        _ => None,
    }
}

fn literal_value(expr: &Expr) -> Result<Value, ExecError> {
    match expr {
        Expr::Constant(constant) => constant_value(&constant.value),
        Expr::UnaryOp(unary) if matches!(unary.op, UnaryOp::USub) => {
            match literal_value(&unary.operand)? {
                Value::Number(n) => negate(&n),
                other => Err(ExecError::Parse(format!("cannot negate {other}"))),
            }
        }
        Expr::List(list) => literal_array(&list.elts),
        // tuples come back from JSON ground truth as lists
        Expr::Tuple(tuple) => literal_array(&tuple.elts),
        Expr::Dict(dict) => {
            let mut map = Map::new();
            for (key, value) in dict.keys.iter().zip(&dict.values) {
                let key = match key.as_ref().map(literal_value).transpose()? {
                    Some(Value::String(s)) => s,
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(true)) => "True".to_string(),
                    Some(Value::Bool(false)) => "False".to_string(),
                    _ => return Err(ExecError::Parse("unsupported dict key".to_string())),
                };
                map.insert(key, literal_value(value)?);
            }
            Ok(Value::Object(map))
        }
        _ => Err(ExecError::Parse(
            "arguments must be literals (str, number, bool, None, list, tuple, dict)".to_string(),
        )),
    }
}

fn literal_array(elements: &[Expr]) -> Result<Value, ExecError> {
    elements
        .iter()
        .map(literal_value)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn constant_value(constant: &Constant) -> Result<Value, ExecError> {
    match constant {
        Constant::None => Ok(Value::Null),
        Constant::Bool(b) => Ok(Value::Bool(*b)),
        Constant::Str(s) => Ok(Value::String(s.clone())),
        Constant::Int(i) => {
            let text = i.to_string();
            text.parse::<i64>()
                .map(Value::from)
                .map_err(|_| ExecError::Parse(format!("integer {text} does not fit in 64 bits")))
        }
        Constant::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| ExecError::Parse(format!("non-finite float {f}"))),
        Constant::Tuple(items) => items
            .iter()
            .map(constant_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        _ => Err(ExecError::Parse("unsupported constant".to_string())),
    }
}

fn negate(n: &Number) -> Result<Value, ExecError> {
    if let Some(i) = n.as_i64().and_then(i64::checked_neg) {
        return Ok(Value::from(i));
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
        .ok_or_else(|| ExecError::Parse(format!("cannot negate {n}")))
}

/// Renders a JSON value as a Python literal.
pub fn to_python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            let escaped = s.replace('\\', "\\\\").replace('\'', "\\'").replace('\n', "\\n");
            format!("'{escaped}'")
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(to_python_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    let key = to_python_literal(&Value::String(k.clone()));
                    format!("{key}: {}", to_python_literal(v))
                })
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Renders a decoded call as a keyword-argument call expression.
pub fn render_call(call: &ToolCall) -> String {
    let arguments: Vec<String> = call
        .parameters
        .iter()
        .map(|(name, value)| format!("{name}={}", to_python_literal(value)))
        .collect();
    format!("{}({})", call.function_name, arguments.join(", "))
}
