use thiserror::Error;

use crate::tool::category::TestCategory;

pub type Result<T> = std::result::Result<T, GraderError>;

/// Errors that abort an evaluation instead of being reported inside a `Response`.
#[derive(Error, Debug)]
pub enum GraderError {
    /// The id is missing from one of the identifier index lookups.
    #[error("No {what} found for the given ID: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("{0} conversion is not implemented")]
    NotImplemented(String),

    #[error("Handler for category {0} is not supported yet.")]
    UnsupportedCategory(TestCategory),

    /// An executable function needs an API credential that is not configured.
    /// Grading cannot continue meaningfully, so this always reaches the caller.
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    #[error("Malformed dataset record: {0}")]
    MalformedRecord(String),

    #[error("API status check failed for {error_rate} entries")]
    BadApiStatus {
        error_rate: String,
        failures: Vec<(serde_json::Value, String)>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GraderError {
    pub fn not_found(what: &'static str, id: &str) -> Self {
        GraderError::NotFound {
            what,
            id: id.to_string(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, GraderError::MissingApiKey(_))
    }
}
