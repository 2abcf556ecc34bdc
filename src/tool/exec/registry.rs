use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Number, Value};
use thiserror::Error;

use super::call_expr::CallExpr;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecError {
    #[error("Cannot parse call expression {0}")]
    Parse(String),
    #[error("Function {0} is not available")]
    UnknownFunction(String),
    #[error("{0}")]
    Arguments(String),
    #[error("{0}")]
    Runtime(String),
    /// Grading stops on this one instead of recording an execution error.
    #[error("Missing API key: {0}")]
    MissingApiKey(String),
}

/// Named functions a call expression may resolve to. Names are matched exactly.
pub trait FunctionRegistry: Send + Sync {
    fn invoke(&self, call: &CallExpr) -> Result<Value, ExecError>;
}

/// Arguments bound to parameter names, defaults applied.
#[derive(Debug, Default)]
pub struct BoundArgs(IndexMap<&'static str, Value>);

impl BoundArgs {
    pub fn get(&self, name: &str) -> Result<&Value, ExecError> {
        self.0
            .get(name)
            .ok_or_else(|| ExecError::Arguments(format!("missing argument '{name}'")))
    }

    pub fn number(&self, name: &str) -> Result<Num, ExecError> {
        Num::from_value(self.get(name)?)
            .ok_or_else(|| ExecError::Arguments(format!("'{name}' must be a number")))
    }

    pub fn f64(&self, name: &str) -> Result<f64, ExecError> {
        self.number(name).map(Num::as_f64)
    }

    pub fn i64(&self, name: &str) -> Result<i64, ExecError> {
        match self.number(name)? {
            Num::Int(i) => Ok(i),
            Num::Float(_) => Err(ExecError::Arguments(format!("'{name}' must be an integer"))),
        }
    }

    pub fn str(&self, name: &str) -> Result<&str, ExecError> {
        self.get(name)?
            .as_str()
            .ok_or_else(|| ExecError::Arguments(format!("'{name}' must be a string")))
    }

    pub fn bool(&self, name: &str) -> Result<bool, ExecError> {
        self.get(name)?
            .as_bool()
            .ok_or_else(|| ExecError::Arguments(format!("'{name}' must be a bool")))
    }

    pub fn numbers(&self, name: &str) -> Result<Vec<Num>, ExecError> {
        let items = self
            .get(name)?
            .as_array()
            .ok_or_else(|| ExecError::Arguments(format!("'{name}' must be a list")))?;
        items
            .iter()
            .map(|item| {
                Num::from_value(item)
                    .ok_or_else(|| ExecError::Arguments(format!("'{name}' must hold numbers")))
            })
            .collect()
    }

    pub fn matrix(&self, name: &str) -> Result<Vec<Vec<Num>>, ExecError> {
        let rows = self
            .get(name)?
            .as_array()
            .ok_or_else(|| ExecError::Arguments(format!("'{name}' must be a matrix")))?;
        rows.iter()
            .map(|row| {
                row.as_array()
                    .ok_or_else(|| ExecError::Arguments(format!("'{name}' must be a matrix")))?
                    .iter()
                    .map(|item| {
                        Num::from_value(item).ok_or_else(|| {
                            ExecError::Arguments(format!("'{name}' must hold numbers"))
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Integer-preserving arithmetic: int op int stays int, anything with a float is a float.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub fn from_value(value: &Value) -> Option<Num> {
        let n = value.as_number()?;
        match n.as_i64() {
            Some(i) => Some(Num::Int(i)),
            None => n.as_f64().map(Num::Float),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    pub fn add(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_add(b)
                .map_or(Num::Float(a as f64 + b as f64), Num::Int),
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn mul(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_mul(b)
                .map_or(Num::Float(a as f64 * b as f64), Num::Int),
            (a, b) => Num::Float(a.as_f64() * b.as_f64()),
        }
    }

    pub fn into_value(self) -> Result<Value, ExecError> {
        match self {
            Num::Int(i) => Ok(Value::from(i)),
            Num::Float(f) => float(f),
        }
    }
}

fn float(f: f64) -> Result<Value, ExecError> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| ExecError::Runtime(format!("result {f} is not a finite number")))
}

/// Parameter name with an optional default.
pub type ParamSpec = (&'static str, Option<fn() -> Value>);

pub struct NativeFunction {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    pub call: fn(&BoundArgs) -> Result<Value, ExecError>,
}

impl NativeFunction {
    fn bind(&self, call: &CallExpr) -> Result<BoundArgs, ExecError> {
        if call.args.len() > self.params.len() {
            return Err(ExecError::Arguments(format!(
                "{}() takes {} positional arguments but {} were given",
                self.name,
                self.params.len(),
                call.args.len()
            )));
        }
        let mut bound = IndexMap::new();
        for ((name, _), value) in self.params.iter().zip(&call.args) {
            bound.insert(*name, value.clone());
        }
        for (key, value) in &call.kwargs {
            let Some((name, _)) = self.params.iter().find(|(name, _)| name == key) else {
                return Err(ExecError::Arguments(format!(
                    "{}() got an unexpected keyword argument '{key}'",
                    self.name
                )));
            };
            if bound.insert(*name, value.clone()).is_some() {
                return Err(ExecError::Arguments(format!(
                    "{}() got multiple values for argument '{key}'",
                    self.name
                )));
            }
        }
        for (name, default) in self.params {
            if bound.contains_key(name) {
                continue;
            }
            match default {
                Some(default) => {
                    bound.insert(*name, default());
                }
                None => {
                    return Err(ExecError::Arguments(format!(
                        "{}() missing required argument: '{name}'",
                        self.name
                    )))
                }
            }
        }
        Ok(BoundArgs(bound))
    }
}

/// Registry of functions implemented in Rust.
#[derive(Default)]
pub struct NativeRegistry {
    functions: HashMap<&'static str, NativeFunction>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        NativeRegistry::default()
    }

    pub fn register(&mut self, function: NativeFunction) {
        self.functions.insert(function.name, function);
    }

    /// The pure math and physics functions of the executable categories.
    pub fn builtin() -> Self {
        let mut registry = NativeRegistry::new();
        for function in builtin_functions() {
            registry.register(function);
        }
        registry
    }
}

impl FunctionRegistry for NativeRegistry {
    fn invoke(&self, call: &CallExpr) -> Result<Value, ExecError> {
        let function = self
            .functions
            .get(call.function_name.as_str())
            .ok_or_else(|| ExecError::UnknownFunction(call.function_name.clone()))?;
        let args = function.bind(call)?;
        (function.call)(&args)
    }
}

fn not_reversed() -> Value {
    Value::Bool(false)
}

const SORT_ARRAY_PARAMS: &[ParamSpec] = &[
    ("array", None),
    ("reverse", Some(not_reversed as fn() -> Value)),
];

fn builtin_functions() -> Vec<NativeFunction> {
    vec![
        NativeFunction {
            name: "calculate_triangle_area",
            params: &[("base", None), ("height", None)],
            call: |args| float(args.f64("base")? * args.f64("height")? / 2.0),
        },
        NativeFunction {
            name: "geometry_area_circle",
            params: &[("radius", None)],
            call: |args| float(std::f64::consts::PI * args.f64("radius")?.powi(2)),
        },
        NativeFunction {
            name: "calculate_cosine_similarity",
            params: &[("vectorA", None), ("vectorB", None)],
            call: |args| {
                let a = args.numbers("vectorA")?;
                let b = args.numbers("vectorB")?;
                if a.len() != b.len() {
                    return Err(ExecError::Runtime("vectors must have the same length".into()));
                }
                let dot: f64 = a.iter().zip(&b).map(|(x, y)| x.as_f64() * y.as_f64()).sum();
                let norm = |v: &[Num]| v.iter().map(|x| x.as_f64().powi(2)).sum::<f64>().sqrt();
                let denominator = norm(&a) * norm(&b);
                if denominator == 0.0 {
                    return Err(ExecError::Runtime("float division by zero".into()));
                }
                float(dot / denominator)
            },
        },
        NativeFunction {
            name: "calculate_mean",
            params: &[("numbers", None)],
            call: |args| {
                let numbers = args.numbers("numbers")?;
                if numbers.is_empty() {
                    return Err(ExecError::Runtime("division by zero".into()));
                }
                let sum: f64 = numbers.iter().map(|n| n.as_f64()).sum();
                float(sum / numbers.len() as f64)
            },
        },
        NativeFunction {
            name: "calculate_standard_deviation",
            params: &[("numbers", None)],
            call: |args| {
                let numbers = args.numbers("numbers")?;
                if numbers.is_empty() {
                    return Err(ExecError::Runtime("division by zero".into()));
                }
                let count = numbers.len() as f64;
                let mean = numbers.iter().map(|n| n.as_f64()).sum::<f64>() / count;
                let variance = numbers
                    .iter()
                    .map(|n| (n.as_f64() - mean).powi(2))
                    .sum::<f64>()
                    / count;
                float(variance.sqrt())
            },
        },
        NativeFunction {
            name: "calc_binomial_probability",
            params: &[("n", None), ("k", None), ("p", None)],
            call: |args| {
                let n = args.i64("n")?;
                let k = args.i64("k")?;
                let p = args.f64("p")?;
                if n < 0 || k < 0 {
                    return Err(ExecError::Runtime("n and k must be non-negative".into()));
                }
                if k > n {
                    return float(0.0);
                }
                float(binomial(n, k) * p.powi(k as i32) * (1.0 - p).powi((n - k) as i32))
            },
        },
        NativeFunction {
            name: "math_factorial",
            params: &[("n", None)],
            call: |args| {
                let n = args.i64("n")?;
                if n < 0 {
                    return Err(ExecError::Runtime(
                        "factorial() not defined for negative values".into(),
                    ));
                }
                (1..=n)
                    .try_fold(1i64, |acc, x| acc.checked_mul(x))
                    .map(Value::from)
                    .ok_or_else(|| ExecError::Runtime("factorial does not fit in 64 bits".into()))
            },
        },
        NativeFunction {
            name: "math_gcd",
            params: &[("a", None), ("b", None)],
            call: |args| gcd(args.i64("a")?, args.i64("b")?).map(Value::from),
        },
        NativeFunction {
            name: "math_lcm",
            params: &[("a", None), ("b", None)],
            call: |args| {
                let (a, b) = (args.i64("a")?, args.i64("b")?);
                if a == 0 || b == 0 {
                    return Ok(Value::from(0));
                }
                (a / gcd(a, b)?)
                    .checked_mul(b)
                    .and_then(i64::checked_abs)
                    .map(Value::from)
                    .ok_or_else(|| ExecError::Runtime("lcm does not fit in 64 bits".into()))
            },
        },
        NativeFunction {
            name: "mat_mul",
            params: &[("matA", None), ("matB", None)],
            call: |args| {
                let a = args.matrix("matA")?;
                let b = args.matrix("matB")?;
                let inner = b.len();
                if a.iter().any(|row| row.len() != inner) {
                    return Err(ExecError::Runtime("matrix dimensions do not match".into()));
                }
                let columns = b.first().map_or(0, Vec::len);
                let mut product = Vec::with_capacity(a.len());
                for row in &a {
                    let mut out = Vec::with_capacity(columns);
                    for column in 0..columns {
                        let mut cell = Num::Int(0);
                        for (x, b_row) in row.iter().zip(&b) {
                            let y = b_row.get(column).copied().ok_or_else(|| {
                                ExecError::Runtime("matrix dimensions do not match".into())
                            })?;
                            cell = cell.add(x.mul(y));
                        }
                        out.push(cell.into_value()?);
                    }
                    product.push(Value::Array(out));
                }
                Ok(Value::Array(product))
            },
        },
        NativeFunction {
            name: "sort_array",
            params: SORT_ARRAY_PARAMS,
            call: |args| {
                let mut numbers = args.numbers("array")?;
                numbers.sort_by(|a, b| a.as_f64().total_cmp(&b.as_f64()));
                if args.bool("reverse")? {
                    numbers.reverse();
                }
                numbers
                    .into_iter()
                    .map(Num::into_value)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            },
        },
        NativeFunction {
            name: "add_binary_numbers",
            params: &[("a", None), ("b", None)],
            call: |args| {
                let parse = |name: &str| -> Result<u128, ExecError> {
                    let text = args.str(name)?;
                    u128::from_str_radix(text, 2).map_err(|_| {
                        ExecError::Runtime(format!("invalid literal for int() with base 2: '{text}'"))
                    })
                };
                let sum = parse("a")?
                    .checked_add(parse("b")?)
                    .ok_or_else(|| ExecError::Runtime("binary sum overflows".into()))?;
                Ok(Value::String(format!("{sum:b}")))
            },
        },
        NativeFunction {
            name: "calculate_density",
            params: &[("mass", None), ("volume", None)],
            call: |args| {
                let volume = args.f64("volume")?;
                if volume == 0.0 {
                    return Err(ExecError::Runtime("division by zero".into()));
                }
                float(args.f64("mass")? / volume)
            },
        },
        NativeFunction {
            name: "calculate_final_velocity",
            params: &[("initial_velocity", None), ("acceleration", None), ("time", None)],
            call: |args| {
                let v0 = args.number("initial_velocity")?;
                let a = args.number("acceleration")?;
                let t = args.number("time")?;
                v0.add(a.mul(t)).into_value()
            },
        },
        NativeFunction {
            name: "calculate_displacement",
            params: &[("initial_velocity", None), ("acceleration", None), ("time", None)],
            call: |args| {
                let v0 = args.f64("initial_velocity")?;
                let a = args.f64("acceleration")?;
                let t = args.f64("time")?;
                float(v0 * t + 0.5 * a * t.powi(2))
            },
        },
        NativeFunction {
            name: "calculate_electrostatic_potential_energy",
            params: &[("charge", None), ("voltage", None)],
            call: |args| args.number("charge")?.mul(args.number("voltage")?).into_value(),
        },
    ]
}

fn gcd(a: i64, b: i64) -> Result<i64, ExecError> {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    i64::try_from(a).map_err(|_| ExecError::Runtime("gcd does not fit in 64 bits".into()))
}

fn binomial(n: i64, k: i64) -> f64 {
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(source: &str) -> Result<Value, ExecError> {
        NativeRegistry::builtin().invoke(&CallExpr::parse(source).unwrap())
    }

    #[test]
    fn integer_results_stay_integers() {
        assert_eq!(run("math_factorial(5)").unwrap(), json!(120));
        assert_eq!(run("math_gcd(12, b=18)").unwrap(), json!(6));
        assert_eq!(run("math_lcm(4, 6)").unwrap(), json!(12));
        assert_eq!(run("calculate_final_velocity(10, 2, 3)").unwrap(), json!(16));
        assert_eq!(
            run("mat_mul(matA=[[1, 2], [3, 4]], matB=[[5, 6], [7, 8]])").unwrap(),
            json!([[19, 22], [43, 50]])
        );
    }

    #[test]
    fn float_results() {
        assert_eq!(run("calculate_triangle_area(base=10, height=5)").unwrap(), json!(25.0));
        assert_eq!(run("calculate_mean([1, 2, 3, 4])").unwrap(), json!(2.5));
        assert_eq!(
            run("calculate_standard_deviation([2, 4, 4, 4, 5, 5, 7, 9])").unwrap(),
            json!(2.0)
        );
        assert_eq!(run("calculate_displacement(0, 2, 3)").unwrap(), json!(9.0));
        let p = run("calc_binomial_probability(n=2, k=1, p=0.5)").unwrap();
        assert_eq!(p, json!(0.5));
    }

    #[test]
    fn defaults_and_strings() {
        assert_eq!(run("sort_array([3, 1, 2])").unwrap(), json!([1, 2, 3]));
        assert_eq!(run("sort_array([3, 1, 2], reverse=True)").unwrap(), json!([3, 2, 1]));
        assert_eq!(run("add_binary_numbers('1010', '11')").unwrap(), json!("1101"));
    }

    #[test]
    fn binding_errors() {
        assert!(matches!(run("math_gcd(1)"), Err(ExecError::Arguments(_))));
        assert!(matches!(run("math_gcd(1, 2, 3)"), Err(ExecError::Arguments(_))));
        assert!(matches!(run("math_gcd(1, a=2)"), Err(ExecError::Arguments(_))));
        assert!(matches!(run("math_gcd(a=1, c=2)"), Err(ExecError::Arguments(_))));
        assert!(matches!(run("os_system('ls')"), Err(ExecError::UnknownFunction(_))));
        assert!(matches!(run("calculate_mean([])"), Err(ExecError::Runtime(_))));
    }

    #[test]
    fn integer_overflow_is_a_runtime_error() {
        assert!(matches!(
            run("math_lcm(a=4611686018427387903, b=4611686018427387902)"),
            Err(ExecError::Runtime(_))
        ));
        assert!(matches!(run("math_factorial(21)"), Err(ExecError::Runtime(_))));
        assert!(matches!(gcd(i64::MIN, 0), Err(ExecError::Runtime(_))));
        assert!(matches!(gcd(i64::MIN, i64::MIN), Err(ExecError::Runtime(_))));
        assert_eq!(gcd(i64::MIN, 6).unwrap(), 2);
        assert_eq!(run("math_lcm(a=-4, b=6)").unwrap(), json!(12));
    }
}
