use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool::error_analysis::{ErrorKind, ErrorRecord};

/// Outcome of grading one completion.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub formatted: bool,
    pub valid: bool,
    pub correct: bool,
    pub results: Option<Vec<Value>>,
    pub errors: Vec<ErrorRecord>,
}

impl Response {
    pub fn passed() -> Self {
        Response {
            formatted: true,
            valid: true,
            correct: true,
            ..Default::default()
        }
    }

    /// Decoded fine but graded wrong.
    pub fn failed(error: ErrorRecord) -> Self {
        Response {
            formatted: true,
            valid: false,
            correct: false,
            results: None,
            errors: vec![error],
        }
    }

    pub fn unformatted(error: ErrorRecord) -> Self {
        Response {
            errors: vec![error],
            ..Default::default()
        }
    }

    pub fn with_results(mut self, results: Vec<Value>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn push_error(&mut self, error: ErrorRecord) {
        self.errors.push(error);
    }

    pub fn leading_error_type(&self) -> Option<&str> {
        self.errors.first().map(|e| e.error_type.as_str())
    }

    pub fn has_error(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.is(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_flat_envelope() {
        let response = Response::failed(ErrorRecord::new(ErrorKind::WrongResult, "43 != 42"));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "formatted": true,
                "valid": false,
                "correct": false,
                "results": null,
                "errors": [{"message": ["43 != 42"], "error_type": "executable_checker:wrong_result"}]
            })
        );
    }

    #[test]
    fn unformatted_clears_every_flag() {
        let response = Response::unformatted(ErrorRecord::new(ErrorKind::NullCategory, "x"));
        assert!(!response.formatted && !response.valid && !response.correct);
        assert_eq!(response.leading_error_type(), Some("runner:null_category"));
    }
}
