use std::{collections::HashMap, path::Path};

use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::{info, warn};

use crate::{
    config::EvalConfig,
    error::{GraderError, Result},
    tool::{
        bfcl_formats::{
            BfclDatasetEntry, BfclFunctionDef, ExecGroundTruth, ExecutionResultType, GroundTruth,
        },
        category::{Language, TestCategory, TestCollection},
    },
    utils::load_json_lines,
};

/// Read-only lookups from a question id to everything needed to grade it.
#[derive(Debug, Default)]
pub struct IdMapper {
    id_to_category: HashMap<String, TestCategory>,
    id_to_ground_truth: HashMap<String, GroundTruth>,
    id_to_function_description: HashMap<String, Vec<BfclFunctionDef>>,
    id_to_language: HashMap<String, Language>,
    // execution_result_type declared on the prompt record, used when the answer omits it
    id_to_prompt_result_types: HashMap<String, Vec<String>>,
}

impl IdMapper {
    /// Scans every category's prompt file, the possible-answer files of categories that have
    /// ground truth, and the positional REST ground-truth file. Missing files are skipped.
    pub fn build(config: &EvalConfig) -> Result<Self> {
        let mut mapper = IdMapper::default();
        for category in TestCategory::iter() {
            let file_name = category.prompt_file(config);
            let Some(records) = load_if_present(&config.prompt_path.join(&file_name))? else {
                continue;
            };
            for record in records {
                mapper.insert_prompt_record(category, record)?;
            }
            if category.has_ground_truth() {
                let answer_path = config.possible_answer_path.join(&file_name);
                if let Some(records) = load_if_present(&answer_path)? {
                    for record in records {
                        mapper.insert_ground_truth_record(category, record)?;
                    }
                }
            }
        }
        if let Some(records) = load_if_present(&config.rest_eval_ground_truth_path)? {
            for (idx, record) in records.into_iter().enumerate() {
                mapper.insert_rest_ground_truth(idx, record)?;
            }
        }
        info!(
            questions = mapper.id_to_category.len(),
            ground_truths = mapper.id_to_ground_truth.len(),
            "identifier index built"
        );
        Ok(mapper)
    }

    pub fn insert_prompt_record(&mut self, category: TestCategory, record: Value) -> Result<()> {
        let entry = BfclDatasetEntry::deserialize_from_json(record)?;
        self.id_to_category.insert(entry.id.clone(), category);
        self.id_to_language.insert(entry.id.clone(), category.language());
        if let Some(types) = entry.execution_result_type {
            self.id_to_prompt_result_types.insert(entry.id.clone(), types);
        }
        // some executable prompt files carry their answer inline
        if TestCollection::Executable.contains(category) && category != TestCategory::Rest {
            if let Some(ground_truth) = entry.ground_truth {
                let mut raw = serde_json::json!({"id": entry.id.clone(), "ground_truth": ground_truth});
                if let Some(types) = self.id_to_prompt_result_types.get(&entry.id) {
                    raw["execution_result_type"] = serde_json::json!(types);
                }
                self.id_to_function_description
                    .insert(entry.id.clone(), entry.function);
                return self.insert_ground_truth_record(category, raw);
            }
        }
        self.id_to_function_description.insert(entry.id, entry.function);
        Ok(())
    }

    /// Must follow the prompt record of the same id so the execution result type can fall back
    /// to what the prompt declares.
    pub fn insert_ground_truth_record(
        &mut self,
        category: TestCategory,
        mut record: Value,
    ) -> Result<()> {
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| GraderError::MalformedRecord(format!("record without id: {record}")))?
            .to_string();
        let ground_truth = record
            .get_mut("ground_truth")
            .map(Value::take)
            .ok_or_else(|| GraderError::MalformedRecord(format!("no ground_truth for {id}")))?;

        let typed = if TestCollection::Executable.contains(category) {
            let calls = match ground_truth {
                Value::String(call) => vec![call],
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(call) => Ok(call),
                        other => Err(GraderError::MalformedRecord(format!(
                            "executable ground truth must be call strings, got {other}"
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?,
                other => {
                    return Err(GraderError::MalformedRecord(format!(
                        "executable ground truth must be call strings, got {other}"
                    )))
                }
            };
            let declared = record
                .get("execution_result_type")
                .and_then(|v| serde_json::from_value::<Vec<String>>(v.clone()).ok());
            let execution_results = record
                .get_mut("execution_result")
                .map(Value::take)
                .and_then(|v| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                });
            GroundTruth::Executable(ExecGroundTruth {
                calls,
                result_types: self.resolve_result_types(&id, declared),
                execution_results,
            })
        } else {
            GroundTruth::parse_ast(&ground_truth)?
        };
        self.id_to_ground_truth.insert(id, typed);
        Ok(())
    }

    /// REST answers are addressed by position in their file, as `rest_{idx}`.
    pub fn insert_rest_ground_truth(&mut self, idx: usize, record: Value) -> Result<()> {
        let shape = GroundTruth::parse_rest(record)?;
        self.id_to_ground_truth.insert(format!("rest_{idx}"), shape);
        Ok(())
    }

    // ground truth record, then prompt record, then the first function definition
    fn resolve_result_types(
        &self,
        id: &str,
        declared: Option<Vec<String>>,
    ) -> Vec<ExecutionResultType> {
        let names = declared
            .or_else(|| self.id_to_prompt_result_types.get(id).cloned())
            .or_else(|| {
                self.id_to_function_description
                    .get(id)
                    .and_then(|functions| functions.first())
                    .and_then(|f| f.execution_result_type.clone())
            })
            .unwrap_or_default();
        if names.is_empty() {
            return vec![ExecutionResultType::ExactMatch];
        }
        names
            .iter()
            .map(|name| ExecutionResultType::parse_lenient(name))
            .collect()
    }

    pub fn get_category(&self, id: &str) -> Result<TestCategory> {
        self.id_to_category
            .get(id)
            .copied()
            .ok_or_else(|| GraderError::not_found("category", id))
    }

    pub fn get_ground_truth(&self, id: &str) -> Result<&GroundTruth> {
        self.id_to_ground_truth
            .get(id)
            .ok_or_else(|| GraderError::not_found("ground truth", id))
    }

    pub fn get_function_description(&self, id: &str) -> Result<&[BfclFunctionDef]> {
        self.id_to_function_description
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| GraderError::not_found("function description", id))
    }

    pub fn get_language(&self, id: &str) -> Result<Language> {
        self.id_to_language
            .get(id)
            .copied()
            .ok_or_else(|| GraderError::not_found("language", id))
    }

    pub fn len(&self) -> usize {
        self.id_to_category.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_category.is_empty()
    }
}

fn load_if_present(path: &Path) -> Result<Option<Vec<Value>>> {
    if !path.exists() {
        warn!(path = %path.display(), "dataset file not found, skipping");
        return Ok(None);
    }
    load_json_lines(path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn simple_prompt(id: &str) -> Value {
        json!({
            "id": id,
            "question": [[{"role": "user", "content": "?"}]],
            "function": [{"name": "f", "parameters": {"type": "dict", "properties": {}, "required": []}}]
        })
    }

    #[test]
    fn missing_id_is_not_found_everywhere() {
        let mapper = IdMapper::default();
        for err in [
            mapper.get_category("nope").unwrap_err(),
            mapper.get_ground_truth("nope").unwrap_err(),
            mapper.get_function_description("nope").unwrap_err(),
            mapper.get_language("nope").unwrap_err(),
        ] {
            assert!(matches!(err, GraderError::NotFound { .. }));
        }
    }

    #[test]
    fn ast_record_is_typed() {
        let mut mapper = IdMapper::default();
        mapper
            .insert_prompt_record(TestCategory::Java, simple_prompt("java_0"))
            .unwrap();
        mapper
            .insert_ground_truth_record(
                TestCategory::Java,
                json!({"id": "java_0", "ground_truth": [{"f": {"x": ["1"]}}]}),
            )
            .unwrap();
        assert_eq!(mapper.get_category("java_0").unwrap(), TestCategory::Java);
        assert_eq!(mapper.get_language("java_0").unwrap(), Language::Java);
        let calls = mapper.get_ground_truth("java_0").unwrap().as_ast().unwrap();
        assert_eq!(calls[0].function_name, "f");
    }

    #[test]
    fn result_type_falls_back_to_prompt_then_default() {
        let mut mapper = IdMapper::default();
        let mut prompt = simple_prompt("exec_simple_0");
        prompt["execution_result_type"] = json!(["real_time_match"]);
        mapper
            .insert_prompt_record(TestCategory::ExecSimple, prompt)
            .unwrap();
        mapper
            .insert_ground_truth_record(
                TestCategory::ExecSimple,
                json!({"id": "exec_simple_0", "ground_truth": ["f(x=1)"]}),
            )
            .unwrap();
        mapper
            .insert_prompt_record(TestCategory::ExecSimple, simple_prompt("exec_simple_1"))
            .unwrap();
        mapper
            .insert_ground_truth_record(
                TestCategory::ExecSimple,
                json!({"id": "exec_simple_1", "ground_truth": "f(x=2)", "execution_result": [3]}),
            )
            .unwrap();

        let GroundTruth::Executable(first) = mapper.get_ground_truth("exec_simple_0").unwrap()
        else {
            panic!("expected executable ground truth");
        };
        assert_eq!(first.result_types, vec![ExecutionResultType::RealTimeMatch]);
        let GroundTruth::Executable(second) = mapper.get_ground_truth("exec_simple_1").unwrap()
        else {
            panic!("expected executable ground truth");
        };
        assert_eq!(second.calls, vec!["f(x=2)".to_string()]);
        assert_eq!(second.result_types, vec![ExecutionResultType::ExactMatch]);
        assert_eq!(second.execution_results, Some(vec![json!(3)]));
    }

    #[test]
    fn rest_answers_are_positional() {
        let mut mapper = IdMapper::default();
        mapper.insert_rest_ground_truth(0, json!({"temp": 1})).unwrap();
        mapper.insert_rest_ground_truth(1, json!([{"a": 1}])).unwrap();
        assert!(matches!(
            mapper.get_ground_truth("rest_1").unwrap(),
            GroundTruth::Rest(shape) if shape.is_list()
        ));
    }
}
