use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use super::call_expr::CallExpr;
use crate::{
    config::EvalConfig,
    error::Result,
    single_or_list::SingleOrList,
    tool::{
        bfcl_formats::RestResponseShape,
        error_analysis::{ErrorKind, ErrorRecord},
        response::Response,
    },
    utils::json_type_name,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// An HTTP request described by a `requests.<method>(...)` call expression.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub json: Option<Value>,
    pub data: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Sends REST requests. Blocking: the call returns once the response body is read.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, String>;
}

pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(ReqwestTransport { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, String> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self
            .client
            .request(method, &request.url)
            .query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(json) = &request.json {
            builder = builder.json(json);
        }
        match &request.data {
            Some(form @ Value::Object(_)) => builder = builder.form(&string_pairs(form)),
            Some(Value::String(body)) => builder = builder.body(body.clone()),
            _ => {}
        }
        let response = builder.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| e.to_string())?;
        Ok(HttpResponse { status, body })
    }
}

impl HttpRequest {
    pub fn from_call(call: &CallExpr) -> std::result::Result<Self, String> {
        let method = match call.function_name.as_str() {
            "requests.get" => HttpMethod::Get,
            "requests.post" => HttpMethod::Post,
            "requests.put" => HttpMethod::Put,
            "requests.delete" => HttpMethod::Delete,
            other => return Err(format!("name '{other}' is not defined")),
        };
        let url = call
            .kwargs
            .get("url")
            .or_else(|| call.args.first())
            .and_then(Value::as_str)
            .ok_or_else(|| "missing url argument".to_string())?
            .to_string();
        for key in call.kwargs.keys() {
            if !["url", "params", "headers", "timeout", "json", "data"].contains(&key.as_str()) {
                return Err(format!("got an unexpected keyword argument '{key}'"));
            }
        }
        let timeout = match call.kwargs.get("timeout") {
            Some(value) => Some(
                value
                    .as_f64()
                    .filter(|secs| *secs > 0.0)
                    .map(Duration::from_secs_f64)
                    .ok_or_else(|| format!("invalid timeout {value}"))?,
            ),
            None => None,
        };
        Ok(HttpRequest {
            method,
            url,
            params: call.kwargs.get("params").map(string_pairs).unwrap_or_default(),
            headers: call.kwargs.get("headers").map(string_pairs).unwrap_or_default(),
            timeout,
            json: call.kwargs.get("json").cloned(),
            data: call.kwargs.get("data").cloned(),
        })
    }
}

// query and header values are sent the way `str()` prints them; None drops the key
fn string_pairs(value: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = value else {
        return Vec::new();
    };
    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                pairs.extend(items.iter().map(|item| (key.clone(), python_str(item))))
            }
            other => pairs.push((key.clone(), python_str(other))),
        }
    }
    pairs
}

fn python_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Grades the REST category: the call must answer 200 with a body whose keys (or element
/// count and per-element keys) match the recorded response. Values are never compared.
pub struct RestChecker<'a> {
    transport: &'a dyn HttpTransport,
    config: &'a EvalConfig,
}

impl<'a> RestChecker<'a> {
    pub fn new(transport: &'a dyn HttpTransport, config: &'a EvalConfig) -> Self {
        RestChecker { transport, config }
    }

    pub fn check(&self, func_call: &str, ground_truth: &RestResponseShape) -> Response {
        let func_call = func_call.replace("requests_get", "requests.get");
        if let Some(delay) = self.config.delay_for(&func_call) {
            debug!(?delay, "waiting before calling a rate-limited host");
            std::thread::sleep(delay);
        }

        let response = CallExpr::parse(&func_call)
            .map_err(|e| e.to_string())
            .and_then(|call| HttpRequest::from_call(&call))
            .and_then(|request| self.transport.send(&request));
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                return Response::failed(ErrorRecord::new(
                    ErrorKind::RestExecutionError,
                    format!("Execution failed. {e}"),
                ))
            }
        };

        if response.status != 200 {
            return Response::failed(ErrorRecord::new(
                ErrorKind::RestWrongStatusCode,
                format!(
                    "Execution result status code is not 200, got {}",
                    response.status
                ),
            ))
            .with_results(vec![Value::from(response.status)]);
        }
        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) => {
                return Response::failed(ErrorRecord::new(
                    ErrorKind::RestWrongStatusCode,
                    format!(
                        "Error in execution and type checking. Status code: {}. Error: {e}",
                        response.status
                    ),
                ))
                .with_results(vec![Value::String(response.body)])
            }
        };

        let error = match_shape(&body, ground_truth);
        match error {
            None => Response::passed().with_results(vec![body]),
            Some(error) => Response::failed(error).with_results(vec![body]),
        }
    }
}

fn keys_error(expected: &Map<String, Value>, actual: &Map<String, Value>) -> Option<ErrorRecord> {
    let same = expected.len() == actual.len() && expected.keys().all(|k| actual.contains_key(k));
    (!same).then(|| {
        let expected_keys: Vec<&String> = expected.keys().collect();
        let actual_keys: Vec<&String> = actual.keys().collect();
        ErrorRecord::new(
            ErrorKind::RestWrongKey,
            format!(
                "Key inconsistency between expected ({expected_keys:?}) and actual ({actual_keys:?})"
            ),
        )
    })
}

fn match_shape(body: &Value, ground_truth: &RestResponseShape) -> Option<ErrorRecord> {
    match (ground_truth, body) {
        (SingleOrList::Single(expected), Value::Object(actual)) => keys_error(expected, actual),
        (SingleOrList::Single(_), other) => Some(ErrorRecord::new(
            ErrorKind::RestWrongType,
            format!("Expected dictionary, but got {}", json_type_name(other)),
        )),
        (SingleOrList::List(expected), Value::Array(actual)) => {
            if expected.len() != actual.len() {
                return Some(ErrorRecord::new(
                    ErrorKind::RestWrongCount,
                    format!(
                        "Response list length inconsistency between expected ({}) and actual ({})",
                        expected.len(),
                        actual.len()
                    ),
                ));
            }
            expected.iter().zip(actual).find_map(|(expected, actual)| match actual {
                Value::Object(actual) => keys_error(expected, actual),
                other => Some(ErrorRecord::new(
                    ErrorKind::RestWrongType,
                    format!("Expected dictionary element, but got {}", json_type_name(other)),
                )),
            })
        }
        (SingleOrList::List(_), other) => Some(ErrorRecord::new(
            ErrorKind::RestWrongType,
            format!("Expected list, but got {}", json_type_name(other)),
        )),
    }
}
