use serde_json::Value;
use tracing::debug;

use super::{
    call_expr::CallExpr,
    registry::{ExecError, FunctionRegistry},
};
use crate::{
    error::{GraderError, Result},
    tool::{
        bfcl_formats::{ExecGroundTruth, ExecutionResultType},
        category::TestCategory,
        error_analysis::{ErrorKind, ErrorRecord},
        response::Response,
    },
    utils::json_type_name,
};

/// Where the expected result of one ground-truth call comes from.
#[derive(Clone, Copy, Debug)]
pub enum Expected<'a> {
    Call(&'a str),
    Recorded(&'a Value),
}

/// Runs call expressions against a registry and compares their results.
pub struct ExecutableChecker<'a> {
    registry: &'a dyn FunctionRegistry,
    real_time_tolerance: f64,
}

/// Outcome of one execution. The outer `Result` only carries the fatal credential error.
pub type Execution = std::result::Result<Value, ErrorRecord>;

impl<'a> ExecutableChecker<'a> {
    pub fn new(registry: &'a dyn FunctionRegistry, real_time_tolerance: f64) -> Self {
        ExecutableChecker {
            registry,
            real_time_tolerance,
        }
    }

    pub fn execute(&self, call: &str) -> Result<Execution> {
        let outcome = CallExpr::parse(call).and_then(|expr| self.registry.invoke(&expr));
        match outcome {
            Ok(value) => Ok(Ok(value)),
            Err(ExecError::MissingApiKey(key)) => Err(GraderError::MissingApiKey(key)),
            Err(e) => Ok(Err(ErrorRecord::new(
                ErrorKind::ExecutionError,
                format!("Error in execution: {call:?}. Error: {e}"),
            ))),
        }
    }

    fn expected_value(&self, expected: Expected<'_>) -> Result<Execution> {
        match expected {
            Expected::Call(call) => self.execute(call),
            Expected::Recorded(value) => Ok(Ok(value.clone())),
        }
    }

    /// Grades the calls of a non-REST executable question.
    pub fn check_non_rest(
        &self,
        calls: &[String],
        ground_truth: &ExecGroundTruth,
        category: TestCategory,
    ) -> Result<Response> {
        if category.is_multi_call() {
            return self.check_parallel_no_order(calls, ground_truth);
        }
        if calls.len() != 1 {
            return Ok(Response::failed(ErrorRecord::new(
                ErrorKind::ExecWrongCount,
                "Wrong number of functions.",
            )));
        }
        let Some(expected) = expected_at(ground_truth, 0) else {
            return Err(GraderError::MalformedRecord(
                "executable ground truth has no calls".to_string(),
            ));
        };
        self.check_simple(&calls[0], expected, ground_truth.result_type(0), false)
    }

    /// Executes both sides and compares them under `result_type`. `sanity_check` relaxes the
    /// dict comparison to a length check.
    pub fn check_simple(
        &self,
        call: &str,
        expected: Expected<'_>,
        result_type: ExecutionResultType,
        sanity_check: bool,
    ) -> Result<Response> {
        let expected = match self.expected_value(expected)? {
            Ok(value) => value,
            Err(error) => return Ok(Response::failed(error)),
        };
        let actual = match self.execute(call)? {
            Ok(value) => value,
            Err(error) => return Ok(Response::failed(error)),
        };
        Ok(
            match self.compare(&actual, &expected, result_type, call, sanity_check) {
                Some(error) => Response::failed(error),
                None => Response::passed().with_results(vec![actual]),
            },
        )
    }

    fn check_parallel_no_order(
        &self,
        calls: &[String],
        ground_truth: &ExecGroundTruth,
    ) -> Result<Response> {
        let expected_count = ground_truth.calls.len();
        if calls.len() != expected_count {
            return Ok(Response::failed(ErrorRecord::new(
                ErrorKind::ExecResultCount,
                format!(
                    "Wrong number of functions provided. Expected {expected_count}, but got {}.",
                    calls.len()
                ),
            )));
        }

        let mut expected_results = Vec::with_capacity(expected_count);
        for index in 0..expected_count {
            let expected = expected_at(ground_truth, index).ok_or_else(|| {
                GraderError::MalformedRecord(format!("no expected result at index {index}"))
            })?;
            match self.expected_value(expected)? {
                Ok(value) => expected_results.push(value),
                Err(error) => return Ok(Response::failed(error)),
            }
        }
        let candidate_results = calls
            .iter()
            .map(|call| self.execute(call))
            .collect::<Result<Vec<_>>>()?;

        let mut matched = vec![false; calls.len()];
        for (index, expected) in expected_results.iter().enumerate() {
            let result_type = ground_truth.result_type(index);
            let mut all_errors = Vec::new();
            let mut found = false;
            for (candidate, outcome) in candidate_results.iter().enumerate() {
                if matched[candidate] {
                    continue;
                }
                let error = match outcome {
                    Ok(actual) => {
                        self.compare(actual, expected, result_type, &calls[candidate], false)
                    }
                    Err(error) => Some(error.clone()),
                };
                match error {
                    None => {
                        matched[candidate] = true;
                        found = true;
                        break;
                    }
                    Some(error) => all_errors.push(error),
                }
            }
            if !found {
                let considered: Vec<usize> = (0..calls.len()).filter(|i| !matched[*i]).collect();
                debug!(index, ?considered, "no executable candidate matched");
                let mut response = Response::failed(ErrorRecord::new(
                    ErrorKind::ExecCannotFindMatch,
                    format!(
                        "Could not find a matching function among index {considered:?} of model output for index {index} of possible answers."
                    ),
                ));
                response.errors.extend(all_errors);
                return Ok(response);
            }
        }

        let results = candidate_results.into_iter().filter_map(|r| r.ok()).collect();
        Ok(Response::passed().with_results(results))
    }

    /// `None` when `actual` satisfies the policy.
    pub fn compare(
        &self,
        actual: &Value,
        expected: &Value,
        result_type: ExecutionResultType,
        call: &str,
        sanity_check: bool,
    ) -> Option<ErrorRecord> {
        match result_type {
            ExecutionResultType::ExactMatch => (!py_eq(actual, expected)).then(|| {
                ErrorRecord::new(
                    ErrorKind::WrongResult,
                    format!("Expected: {expected}, but got: {actual}."),
                )
            }),
            ExecutionResultType::RealTimeMatch => self.real_time_match(actual, expected, call),
            ExecutionResultType::StructuralMatch => {
                structural_match(actual, expected, call, sanity_check)
            }
        }
    }

    fn real_time_match(&self, actual: &Value, expected: &Value, call: &str) -> Option<ErrorRecord> {
        let (Some(actual_num), Some(expected_num)) = (actual.as_f64(), expected.as_f64()) else {
            return Some(ErrorRecord::new(
                ErrorKind::WrongResultRealTime,
                format!(
                    "Wrong execution result for {call:?}. Expected: {expected}, but got: {actual}. Type needs to be float or int for real time match criteria."
                ),
            ));
        };
        let a = expected_num * (1.0 - self.real_time_tolerance);
        let b = expected_num * (1.0 + self.real_time_tolerance);
        let (low, high) = (a.min(b), a.max(b));
        if low <= actual_num && actual_num <= high {
            return None;
        }
        Some(ErrorRecord::new(
            ErrorKind::WrongResultRealTime,
            format!(
                "Expected: {expected}, but got: {actual}. {}% difference allowed.",
                self.real_time_tolerance * 100.0
            ),
        ))
    }
}

fn expected_at(ground_truth: &ExecGroundTruth, index: usize) -> Option<Expected<'_>> {
    if let Some(results) = &ground_truth.execution_results {
        return results.get(index).map(Expected::Recorded);
    }
    ground_truth.calls.get(index).map(|call| Expected::Call(call))
}

fn structural_match(
    actual: &Value,
    expected: &Value,
    call: &str,
    sanity_check: bool,
) -> Option<ErrorRecord> {
    let (actual_type, expected_type) = (json_type_name(actual), json_type_name(expected));
    if actual_type != expected_type {
        return Some(ErrorRecord::new(
            ErrorKind::WrongResultType,
            format!(
                "Wrong execution result type for {call:?}. Expected type: {expected_type}, but got: {actual_type}."
            ),
        ));
    }
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => {
            // sanity data may be stale when keys are timestamps or random ids
            if sanity_check {
                return (actual.len() != expected.len()).then(|| {
                    ErrorRecord::new(
                        ErrorKind::DictLength,
                        format!(
                            "Wrong execution result pattern for {call:?}. Expected length: {}, but got: {}.",
                            expected.len(),
                            actual.len()
                        ),
                    )
                });
            }
            if let Some(key) = expected.keys().find(|k| !actual.contains_key(*k)) {
                return Some(ErrorRecord::new(
                    ErrorKind::DictKeyNotFound,
                    format!(
                        "Wrong execution result pattern for {call:?}. Key {key:?} not found in the model output."
                    ),
                ));
            }
            if let Some(key) = actual.keys().find(|k| !expected.contains_key(*k)) {
                return Some(ErrorRecord::new(
                    ErrorKind::DictExtraKey,
                    format!(
                        "Wrong execution result pattern for {call:?}. Key {key:?} not expected in the model output."
                    ),
                ));
            }
            None
        }
        (Value::Array(actual), Value::Array(expected)) if actual.len() != expected.len() => {
            Some(ErrorRecord::new(
                ErrorKind::ListLength,
                format!(
                    "Wrong execution result pattern for {call:?}. Expected length: {}, but got: {}.",
                    expected.len(),
                    actual.len()
                ),
            ))
        }
        _ => None,
    }
}

/// Equality where `1 == 1.0`, applied through lists and dicts.
pub fn py_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| py_eq(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| py_eq(v, w)))
        }
        _ => a == b,
    }
}
