use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum_macros::{Display, EnumString};

use crate::{error::GraderError, single_or_list::SingleOrList};

/// One line of a category prompt file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BfclDatasetEntry {
    pub id: String,
    #[serde(default)]
    pub question: Value,
    #[serde(default)]
    pub function: Vec<BfclFunctionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_result_type: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<Value>,
}

impl BfclDatasetEntry {
    pub fn deserialize_from_json(raw_entry: Value) -> Result<Self, GraderError> {
        serde_json::from_value(raw_entry).map_err(|e| GraderError::MalformedRecord(e.to_string()))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BfclFunctionDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: BfclParameter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_result_type: Option<Vec<String>>,
}

impl BfclFunctionDef {
    pub fn properties(&self) -> Option<&IndexMap<String, BfclParameter>> {
        self.parameters.properties.as_ref()
    }

    pub fn required(&self) -> &[String] {
        self.parameters.required.as_deref().unwrap_or(&[])
    }
}

fn default_parameter_type() -> String {
    "any".to_string()
}

/// JSON-schema-like parameter description. The outermost parameter of a function is a
/// `dict` whose `properties` are the call arguments.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BfclParameter {
    #[serde(rename = "type", default = "default_parameter_type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, BfclParameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<BfclParameter>>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub r#enum: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl BfclParameter {
    pub fn items_ty(&self) -> Option<&str> {
        self.items.as_ref().map(|items| items.ty.as_str())
    }
}

// sample ground truth function call:
// {"triangle_properties.get": {"side1": [5], "side2": [4], "get_area": ["", true]}}
// "" among the accepted values marks the parameter as omittable.
#[derive(Clone, Debug, PartialEq)]
pub struct BfclGroundTruthFunctionCall {
    pub function_name: String,
    pub parameters: IndexMap<String, Vec<Value>>,
}

impl BfclGroundTruthFunctionCall {
    pub fn serialize_to_json(&self) -> Value {
        let parameters_json = self
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), Value::Array(v.clone())))
            .collect::<Map<String, Value>>();
        json!({ self.function_name.clone(): Value::Object(parameters_json) })
    }

    pub fn deserialize_from_json(value: &Value) -> Result<Self, GraderError> {
        let malformed = |msg: &str| GraderError::MalformedRecord(format!("{msg}: {value}"));
        let obj = value
            .as_object()
            .ok_or_else(|| malformed("Expected a JSON object"))?;
        let mut entries = obj.iter();
        let (Some((function_name, params_value)), None) = (entries.next(), entries.next()) else {
            return Err(malformed("Expected exactly one function call"));
        };
        let params_obj = params_value
            .as_object()
            .ok_or_else(|| malformed("Expected parameters to be a JSON object"))?;

        let mut parameters = IndexMap::new();
        for (param_name, param_value) in params_obj {
            let param_array = param_value
                .as_array()
                .ok_or_else(|| malformed("Expected parameter value to be a JSON array"))?;
            parameters.insert(param_name.clone(), param_array.clone());
        }

        Ok(BfclGroundTruthFunctionCall {
            function_name: function_name.clone(),
            parameters,
        })
    }

    /// Whether the parameter may be left out of the call.
    pub fn is_optional(&self, param: &str) -> bool {
        self.parameters
            .get(param)
            .is_some_and(|values| values.iter().any(|v| v.as_str() == Some("")))
    }
}

/// Comparison policy for one executable ground-truth call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionResultType {
    ExactMatch,
    RealTimeMatch,
    /// Anything that is neither exact nor real-time is graded by shape.
    #[strum(serialize = "structural_match", serialize = "pattern_match")]
    StructuralMatch,
}

impl ExecutionResultType {
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or(ExecutionResultType::StructuralMatch)
    }
}

/// Ground truth of an executable category question.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecGroundTruth {
    /// Call expressions, one per expected call.
    pub calls: Vec<String>,
    pub result_types: Vec<ExecutionResultType>,
    /// Results recorded ahead of time. When present they replace running `calls`.
    pub execution_results: Option<Vec<Value>>,
}

impl ExecGroundTruth {
    pub fn result_type(&self, index: usize) -> ExecutionResultType {
        self.result_types
            .get(index)
            .or_else(|| self.result_types.first())
            .copied()
            .unwrap_or(ExecutionResultType::ExactMatch)
    }
}

/// Expected shape of a REST response: keys of one object, or one key set per list element.
pub type RestResponseShape = SingleOrList<Map<String, Value>>;

/// Typed ground truth, one variant per kind of checker.
#[derive(Clone, Debug, PartialEq)]
pub enum GroundTruth {
    Ast(Vec<BfclGroundTruthFunctionCall>),
    Executable(ExecGroundTruth),
    Rest(RestResponseShape),
}

impl GroundTruth {
    pub fn parse_ast(value: &Value) -> Result<Self, GraderError> {
        let gt_array = value.as_array().ok_or_else(|| {
            GraderError::MalformedRecord(format!("ground_truth should be a list: {value}"))
        })?;
        let calls = gt_array
            .iter()
            .map(BfclGroundTruthFunctionCall::deserialize_from_json)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GroundTruth::Ast(calls))
    }

    pub fn parse_rest(value: Value) -> Result<Self, GraderError> {
        let shape: RestResponseShape = serde_json::from_value(value)
            .map_err(|e| GraderError::MalformedRecord(format!("REST ground truth: {e}")))?;
        Ok(GroundTruth::Rest(shape))
    }

    pub fn as_ast(&self) -> Option<&[BfclGroundTruthFunctionCall]> {
        match self {
            GroundTruth::Ast(calls) => Some(calls),
            _ => None,
        }
    }
}
