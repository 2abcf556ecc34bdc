use serde::{Deserialize, Serialize};

use crate::tool::response::Response;

/// Body of one evaluation request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EvaluationRequest {
    pub id: String,
    pub completion: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EvaluationSummary {
    pub accuracy: f32,
    pub total_cases: usize,
    pub correct_cases: usize,
}

impl EvaluationSummary {
    pub fn from_responses<'a>(responses: impl IntoIterator<Item = &'a Response>) -> Self {
        let (total_cases, correct_cases) = responses
            .into_iter()
            .fold((0, 0), |(total, correct), r| (total + 1, correct + r.correct as usize));
        let accuracy = if total_cases == 0 {
            0.0
        } else {
            correct_cases as f32 / total_cases as f32
        };
        EvaluationSummary {
            accuracy,
            total_cases,
            correct_cases,
        }
    }
}
