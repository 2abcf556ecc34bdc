use std::collections::HashMap;

use strum::IntoEnumIterator;
use tracing::{debug, warn};

use crate::{
    config::EvalConfig,
    error::{GraderError, Result},
    tool::{
        ast_checker::ast_checker,
        bfcl_formats::GroundTruth,
        category::{TestCategory, TestCollection},
        decoder::{Decoded, PlainJsonDecoder, ToolCallDecoder},
        error_analysis::{ErrorKind, ErrorRecord},
        exec::{
            checker::ExecutableChecker,
            registry::{FunctionRegistry, NativeRegistry},
            rest::{HttpTransport, ReqwestTransport, RestChecker},
        },
        file_models::EvaluationRequest,
        id_mapper::IdMapper,
        response::Response,
    },
};

/// Checker a category is graded with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryHandler {
    Relevance,
    Irrelevance,
    Ast,
    Executable,
}

impl CategoryHandler {
    pub fn for_category(category: TestCategory) -> Self {
        if TestCollection::Relevance.contains(category) {
            CategoryHandler::Relevance
        } else if TestCollection::Irrelevance.contains(category) {
            CategoryHandler::Irrelevance
        } else if TestCollection::Executable.contains(category) {
            CategoryHandler::Executable
        } else {
            CategoryHandler::Ast
        }
    }

    pub fn default_table() -> HashMap<TestCategory, CategoryHandler> {
        TestCategory::iter()
            .map(|category| (category, CategoryHandler::for_category(category)))
            .collect()
    }
}

/// Grades completions by question id. Holds no per-request state, so one runner can serve
/// concurrent callers once built.
pub struct Runner {
    id_mapper: IdMapper,
    config: EvalConfig,
    decoder: Box<dyn ToolCallDecoder>,
    registry: Box<dyn FunctionRegistry>,
    transport: Box<dyn HttpTransport>,
    handlers: HashMap<TestCategory, CategoryHandler>,
}

impl Runner {
    /// Plain JSON completions, the builtin function registry and a live HTTP transport.
    pub fn new(id_mapper: IdMapper, config: EvalConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.http_timeout())?;
        Ok(Runner {
            id_mapper,
            config,
            decoder: Box::new(PlainJsonDecoder),
            registry: Box::new(NativeRegistry::builtin()),
            transport: Box::new(transport),
            handlers: CategoryHandler::default_table(),
        })
    }

    /// Builds the identifier index from the configured dataset files first.
    pub fn from_config(config: EvalConfig) -> Result<Self> {
        let id_mapper = IdMapper::build(&config)?;
        Runner::new(id_mapper, config)
    }

    pub fn with_decoder(mut self, decoder: impl ToolCallDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn with_registry(mut self, registry: impl FunctionRegistry + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    pub fn with_transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    pub fn with_handlers(mut self, handlers: HashMap<TestCategory, CategoryHandler>) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn id_mapper(&self) -> &IdMapper {
        &self.id_mapper
    }

    pub fn get_category(&self, id: &str) -> Result<String> {
        Ok(self.id_mapper.get_category(id)?.name())
    }

    /// Grades one completion.
    ///
    /// Per-request faults end up in the returned `Response`. `Err` is kept for a missing API
    /// credential, an inconsistent index and a category with no handler.
    pub fn run(&self, id: &str, completion: &str) -> Result<Response> {
        let Ok(category) = self.id_mapper.get_category(id) else {
            return Ok(Response::unformatted(ErrorRecord::new(
                ErrorKind::NullCategory,
                format!("Category for id {id} is not found."),
            )));
        };
        debug!(id, %category, "grading completion");

        let skips_format_check = TestCollection::Irrelevance.contains(category)
            || TestCollection::Executable.contains(category);
        if !skips_format_check && !self.decoder.validate_format(completion) {
            return Ok(Response::unformatted(ErrorRecord::new(
                ErrorKind::DecodeError,
                "Completion is not in the expected format.",
            )));
        }

        let decoded = self.decoder.decode(completion, category);
        let Some(&handler) = self.handlers.get(&category) else {
            return Err(GraderError::UnsupportedCategory(category));
        };
        let handled = match handler {
            CategoryHandler::Relevance => self.run_relevance_calls(&decoded),
            CategoryHandler::Irrelevance => self.run_irrelevance_calls(&decoded),
            CategoryHandler::Ast => self.run_ast_calls(id, decoded, category)?,
            CategoryHandler::Executable => self.run_executable_calls(id, decoded, category)?,
        };

        // handlers set `formatted` themselves; only an undecodable completion clears it
        Ok(handled)
    }

    /// Grades requests one after the other, stopping at the first fatal error.
    pub fn run_batch(&self, requests: &[EvaluationRequest]) -> Result<Vec<Response>> {
        requests
            .iter()
            .map(|request| self.run(&request.id, &request.completion))
            .collect()
    }

    // any decodable call list counts as a call, including `[]`
    fn has_calls(&self, decoded: &Decoded) -> bool {
        match decoded {
            Decoded::Calls(_) | Decoded::CallStrings(_) => true,
            Decoded::Raw(text) => self.decoder.decode_calls(text).is_some(),
            Decoded::Undecodable => false,
        }
    }

    fn run_relevance_calls(&self, decoded: &Decoded) -> Response {
        let valid = self.has_calls(decoded);
        Response {
            formatted: true,
            valid,
            correct: valid,
            ..Response::default()
        }
    }

    fn run_irrelevance_calls(&self, decoded: &Decoded) -> Response {
        let valid = !self.has_calls(decoded);
        Response {
            formatted: true,
            valid,
            correct: valid,
            ..Response::default()
        }
    }

    fn undecodable(category: TestCategory) -> Response {
        Response::unformatted(ErrorRecord::new(
            ErrorKind::DecodeError,
            format!("Completion could not be decoded into {category} tool calls."),
        ))
    }

    fn run_ast_calls(&self, id: &str, decoded: Decoded, category: TestCategory) -> Result<Response> {
        let Decoded::Calls(tool_calls) = decoded else {
            return Ok(Self::undecodable(category));
        };
        let functions = self.id_mapper.get_function_description(id)?;
        let language = self.id_mapper.get_language(id)?;
        let Some(ground_truth) = self.id_mapper.get_ground_truth(id)?.as_ast() else {
            return Err(GraderError::MalformedRecord(format!(
                "ground truth of {id} is not a function call list"
            )));
        };
        match ast_checker(functions, &tool_calls, ground_truth, language, category) {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(id, error = %e, "AST checker failed");
                Ok(Response {
                    formatted: true,
                    errors: vec![ErrorRecord::new(
                        ErrorKind::AstRuntimeError,
                        "AST checker failed for unknown reason.",
                    )],
                    ..Response::default()
                })
            }
        }
    }

    fn run_executable_calls(
        &self,
        id: &str,
        decoded: Decoded,
        category: TestCategory,
    ) -> Result<Response> {
        let Decoded::CallStrings(calls) = decoded else {
            return Ok(Self::undecodable(category));
        };
        match self.id_mapper.get_ground_truth(id)? {
            GroundTruth::Rest(shape) => {
                let Some(call) = calls.first() else {
                    return Ok(Response::failed(ErrorRecord::new(
                        ErrorKind::RestExecutionError,
                        "Execution failed. No call was given.",
                    )));
                };
                Ok(RestChecker::new(self.transport.as_ref(), &self.config).check(call, shape))
            }
            GroundTruth::Executable(ground_truth) => ExecutableChecker::new(
                self.registry.as_ref(),
                self.config.real_time_match_allowed_difference,
            )
            .check_non_rest(&calls, ground_truth, category),
            GroundTruth::Ast(_) => Err(GraderError::MalformedRecord(format!(
                "ground truth of {id} is not executable"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_default_handler() {
        let table = CategoryHandler::default_table();
        assert_eq!(table.len(), TestCategory::iter().count());
        assert_eq!(table[&TestCategory::LiveRelevance], CategoryHandler::Relevance);
        assert_eq!(table[&TestCategory::LiveIrrelevance], CategoryHandler::Irrelevance);
        assert_eq!(table[&TestCategory::Rest], CategoryHandler::Executable);
        assert_eq!(table[&TestCategory::Javascript], CategoryHandler::Ast);
    }
}
