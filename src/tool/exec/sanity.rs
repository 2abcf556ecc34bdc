//! Startup health checks of the live API surface. They replay recorded ground-truth calls and
//! fail with [`GraderError::BadApiStatus`] when any of them no longer behaves as recorded, so
//! executable scores can be read against the API's health.

use serde_json::Value;
use tracing::{info, warn};

use super::{
    checker::{ExecutableChecker, Expected},
    registry::FunctionRegistry,
    rest::{HttpTransport, RestChecker},
};
use crate::{
    config::EvalConfig,
    error::{GraderError, Result},
    tool::{
        bfcl_formats::{ExecutionResultType, GroundTruth},
        id_mapper::IdMapper,
        response::Response,
    },
    utils::load_json_lines,
};

fn first_string(value: Option<&Value>) -> Option<&str> {
    match value? {
        Value::String(s) => Some(s),
        Value::Array(items) => items.first().and_then(Value::as_str),
        _ => None,
    }
}

fn summarize(label: &str, total: usize, failures: Vec<(Value, String)>) -> Result<()> {
    if failures.is_empty() {
        info!(total, "{label} API status check passed");
        return Ok(());
    }
    let error_rate = format!("{} / {}", failures.len(), total);
    warn!(%error_rate, "{label} API status check failed");
    Err(GraderError::BadApiStatus {
        error_rate,
        failures,
    })
}

fn failure_type(response: &Response) -> String {
    response
        .leading_error_type()
        .unwrap_or("unknown")
        .to_string()
}

/// Replays each REST status record against the REST shape at the same position.
pub fn api_status_sanity_check_rest(
    config: &EvalConfig,
    id_mapper: &IdMapper,
    transport: &dyn HttpTransport,
) -> Result<()> {
    let records = load_json_lines(&config.rest_api_status_ground_truth_path)?;
    let checker = RestChecker::new(transport, config);
    let mut failures = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        let call = first_string(record.get("ground_truth")).ok_or_else(|| {
            GraderError::MalformedRecord(format!("REST status record {idx} has no call"))
        })?;
        let GroundTruth::Rest(shape) = id_mapper.get_ground_truth(&format!("rest_{idx}"))? else {
            return Err(GraderError::MalformedRecord(format!(
                "rest_{idx} does not hold a REST response shape"
            )));
        };
        let response = checker.check(call, shape);
        if !response.valid {
            failures.push((record.clone(), failure_type(&response)));
        }
    }
    summarize("REST", records.len(), failures)
}

/// Re-executes the first recorded call of each status record and compares it with the
/// recorded result in relaxed structural mode.
pub fn api_status_sanity_check_executable(
    config: &EvalConfig,
    registry: &dyn FunctionRegistry,
) -> Result<()> {
    let records = load_json_lines(&config.executable_api_status_ground_truth_path)?;
    let checker = ExecutableChecker::new(registry, config.real_time_match_allowed_difference);
    let mut failures = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        let malformed =
            || GraderError::MalformedRecord(format!("executable status record {idx} is incomplete"));
        let call = first_string(record.get("ground_truth")).ok_or_else(malformed)?;
        let expected = record
            .get("execution_result")
            .and_then(|v| v.as_array())
            .and_then(|v| v.first())
            .ok_or_else(malformed)?;
        let result_type = first_string(record.get("execution_result_type"))
            .map(ExecutionResultType::parse_lenient)
            .unwrap_or(ExecutionResultType::ExactMatch);
        let response = checker.check_simple(call, Expected::Recorded(expected), result_type, true)?;
        if !response.valid {
            failures.push((record.clone(), failure_type(&response)));
        }
    }
    summarize("executable", records.len(), failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::exec::{registry::NativeRegistry, rest::tests::StubTransport};
    use serde_json::json;
    use std::io::Write;

    fn write_lines(dir: &tempfile::TempDir, name: &str, lines: &[Value]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn executable_status_passes_when_results_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EvalConfig::with_data_dir(dir.path());
        config.executable_api_status_ground_truth_path = write_lines(
            &dir,
            "status.json",
            &[
                json!({"ground_truth": ["math_gcd(a=12, b=18)"], "execution_result": [6], "execution_result_type": ["exact_match"]}),
                json!({"ground_truth": ["sort_array(array=[3, 1, 2])"], "execution_result": [[9, 9, 9]], "execution_result_type": ["structural_match"]}),
            ],
        );
        api_status_sanity_check_executable(&config, &NativeRegistry::builtin()).unwrap();
    }

    #[test]
    fn executable_status_reports_error_rate() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EvalConfig::with_data_dir(dir.path());
        config.executable_api_status_ground_truth_path = write_lines(
            &dir,
            "status.json",
            &[
                json!({"ground_truth": ["math_gcd(a=12, b=18)"], "execution_result": [6], "execution_result_type": ["exact_match"]}),
                json!({"ground_truth": ["math_gcd(a=12, b=18)"], "execution_result": [7], "execution_result_type": ["exact_match"]}),
            ],
        );
        let err = api_status_sanity_check_executable(&config, &NativeRegistry::builtin())
            .unwrap_err();
        match err {
            GraderError::BadApiStatus {
                error_rate,
                failures,
            } => {
                assert_eq!(error_rate, "1 / 2");
                assert_eq!(failures[0].1, "executable_checker:wrong_result");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn rest_status_uses_positional_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EvalConfig::with_data_dir(dir.path());
        config.rest_api_status_ground_truth_path = write_lines(
            &dir,
            "rest_status.json",
            &[json!({"ground_truth": ["requests.get('https://example.org/a')"]})],
        );
        let mut id_mapper = IdMapper::default();
        id_mapper
            .insert_rest_ground_truth(0, json!({"ok": true}))
            .unwrap();

        let healthy = StubTransport::new(200, json!({"ok": false}));
        api_status_sanity_check_rest(&config, &id_mapper, &healthy).unwrap();

        let down = StubTransport::new(503, json!({}));
        let err = api_status_sanity_check_rest(&config, &id_mapper, &down).unwrap_err();
        assert!(matches!(err, GraderError::BadApiStatus { ref error_rate, .. } if error_rate == "1 / 1"));
    }
}
