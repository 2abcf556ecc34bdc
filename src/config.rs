use std::{path::PathBuf, sync::LazyLock, time::Duration};

use serde::{Deserialize, Serialize};

pub static BASE_PROMPT_PATH: LazyLock<PathBuf> = LazyLock::new(|| PathBuf::from("bfcl/data"));
pub static BASE_POSSIBLE_ANSWER_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| BASE_PROMPT_PATH.join("possible_answer"));
pub static BASE_EXEC_DATA_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from("bfcl/eval/exec/data"));

pub const VERSION_PREFIX: &str = "BFCL_v3";
pub const REAL_TIME_MATCH_ALLOWED_DIFFERENCE: f64 = 0.2;

/// A host that must not be hit back to back. Requests whose URL starts with
/// `host_prefix` sleep for `delay_ms` before being sent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RateLimitedHost {
    pub host_prefix: String,
    pub delay_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub prompt_path: PathBuf,
    pub possible_answer_path: PathBuf,
    pub rest_eval_ground_truth_path: PathBuf,
    pub rest_api_status_ground_truth_path: PathBuf,
    pub executable_api_status_ground_truth_path: PathBuf,
    pub version_prefix: String,
    pub real_time_match_allowed_difference: f64,
    pub rate_limited_hosts: Vec<RateLimitedHost>,
    pub http_timeout_secs: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            prompt_path: BASE_PROMPT_PATH.clone(),
            possible_answer_path: BASE_POSSIBLE_ANSWER_PATH.clone(),
            rest_eval_ground_truth_path: BASE_EXEC_DATA_PATH.join("rest-eval-response_v5.jsonl"),
            rest_api_status_ground_truth_path: BASE_EXEC_DATA_PATH
                .join("api_status_check_ground_truth_REST.json"),
            executable_api_status_ground_truth_path: BASE_EXEC_DATA_PATH
                .join("api_status_check_ground_truth_executable.json"),
            version_prefix: VERSION_PREFIX.to_string(),
            real_time_match_allowed_difference: REAL_TIME_MATCH_ALLOWED_DIFFERENCE,
            rate_limited_hosts: vec![RateLimitedHost {
                host_prefix: "https://geocode.maps.co".to_string(),
                delay_ms: 2000,
            }],
            http_timeout_secs: 30,
        }
    }
}

impl EvalConfig {
    /// Builds the configuration from the defaults, a `.env` file if one exists, and the
    /// `BFCL_*` environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = EvalConfig::default();
        if let Ok(path) = std::env::var("BFCL_PROMPT_PATH") {
            config.prompt_path = PathBuf::from(path);
            config.possible_answer_path = config.prompt_path.join("possible_answer");
        }
        if let Ok(path) = std::env::var("BFCL_POSSIBLE_ANSWER_PATH") {
            config.possible_answer_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("BFCL_REST_EVAL_GROUND_TRUTH_PATH") {
            config.rest_eval_ground_truth_path = PathBuf::from(path);
        }
        if let Some(tolerance) = std::env::var("BFCL_REAL_TIME_TOLERANCE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
        {
            config.real_time_match_allowed_difference = tolerance;
        }
        if let Some(timeout) = std::env::var("BFCL_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.http_timeout_secs = timeout;
        }
        config
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let prompt_path: PathBuf = data_dir.into();
        EvalConfig {
            possible_answer_path: prompt_path.join("possible_answer"),
            rest_eval_ground_truth_path: prompt_path.join("rest-eval-response_v5.jsonl"),
            prompt_path,
            ..EvalConfig::default()
        }
    }

    pub fn prompt_file_name(&self, category_name: &str) -> String {
        format!("{}_{}.json", self.version_prefix, category_name)
    }

    /// Delay to observe before calling `url`, if it targets a rate-limited host.
    pub fn delay_for(&self, url: &str) -> Option<Duration> {
        self.rate_limited_hosts
            .iter()
            .find(|host| url.contains(&host.host_prefix))
            .map(|host| Duration::from_millis(host.delay_ms))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
