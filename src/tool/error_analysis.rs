use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Stable diagnostic keys. The serialized names are what reports and assertions match on.
#[derive(Clone, Copy, Debug, Display, EnumString, EnumIter, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[strum(serialize = "runner:null_category")]
    NullCategory,
    #[strum(serialize = "runner:decode_error")]
    DecodeError,
    #[strum(serialize = "ast_checker:runtime_error")]
    AstRuntimeError,

    #[strum(serialize = "simple_function_checker:wrong_count")]
    SimpleWrongCount,
    #[strum(serialize = "simple_function_checker:wrong_func_name")]
    WrongFuncName,
    #[strum(serialize = "simple_function_checker:missing_required")]
    MissingRequired,
    #[strum(serialize = "simple_function_checker:unexpected_param")]
    UnexpectedParam,
    #[strum(serialize = "simple_function_checker:missing_optional")]
    MissingOptional,
    #[strum(serialize = "simple_function_checker:incorrect_type")]
    IncorrectType,
    #[strum(serialize = "simple_function_checker:incorrect_value")]
    IncorrectValue,
    #[strum(serialize = "simple_function_checker:literal_conversion_error")]
    LiteralConversion,
    #[strum(serialize = "dict_checker:incorrect_value")]
    DictIncorrectValue,
    #[strum(serialize = "multiple_function_checker:wrong_count")]
    MultipleWrongCount,
    #[strum(serialize = "parallel_function_checker_no_order:wrong_count")]
    ParallelWrongCount,
    #[strum(serialize = "parallel_function_checker_no_order:cannot_find_match")]
    CannotFindMatch,

    #[strum(serialize = "executable_checker:execution_error")]
    ExecutionError,
    #[strum(serialize = "executable_checker:wrong_result")]
    WrongResult,
    #[strum(serialize = "executable_checker:wrong_result_real_time")]
    WrongResultRealTime,
    #[strum(serialize = "executable_checker:wrong_result_type")]
    WrongResultType,
    #[strum(serialize = "executable_checker:wrong_result_type:dict_length")]
    DictLength,
    #[strum(serialize = "executable_checker:wrong_result_type:dict_key_not_found")]
    DictKeyNotFound,
    #[strum(serialize = "executable_checker:wrong_result_type:dict_extra_key")]
    DictExtraKey,
    #[strum(serialize = "executable_checker:wrong_result_type:list_length")]
    ListLength,
    #[strum(serialize = "executable_checker:cannot_find_match")]
    ExecCannotFindMatch,
    #[strum(serialize = "exec_non_rest_checker:wrong_count")]
    ExecWrongCount,
    #[strum(serialize = "value_error:exec_result_count")]
    ExecResultCount,

    #[strum(serialize = "executable_checker_rest:execution_error")]
    RestExecutionError,
    #[strum(serialize = "executable_checker_rest:wrong_status_code")]
    RestWrongStatusCode,
    #[strum(serialize = "executable_checker_rest:wrong_key")]
    RestWrongKey,
    #[strum(serialize = "executable_checker_rest:wrong_count")]
    RestWrongCount,
    #[strum(serialize = "executable_checker_rest:wrong_type")]
    RestWrongType,
}

/// One diagnostic attached to a `Response`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorRecord {
    pub message: Vec<String>,
    pub error_type: String,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ErrorRecord {
            message: vec![message.into()],
            error_type: kind.to_string(),
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.error_type == kind.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, str::FromStr};
    use strum::IntoEnumIterator;

    #[test]
    fn keys_are_unique() {
        let keys: HashSet<String> = ErrorKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(keys.len(), ErrorKind::iter().count());
    }

    #[test]
    fn keys_parse_back() {
        assert_eq!(
            ErrorKind::from_str("simple_function_checker:unexpected_param").unwrap(),
            ErrorKind::UnexpectedParam
        );
        let record = ErrorRecord::new(ErrorKind::DictLength, "length differs");
        assert_eq!(record.error_type, "executable_checker:wrong_result_type:dict_length");
        assert!(record.is(ErrorKind::DictLength));
    }
}
