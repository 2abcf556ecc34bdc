use std::fmt;

use indexmap::IndexMap;
use serde::de::{Error as DeError, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One decoded call. On the wire it is a single-key object: `{"name": {"arg": value}}`.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub function_name: String,
    pub parameters: IndexMap<String, Value>,
}

impl ToolCall {
    pub fn new(function_name: impl Into<String>, parameters: IndexMap<String, Value>) -> Self {
        ToolCall {
            function_name: function_name.into(),
            parameters,
        }
    }

    pub fn to_json(&self) -> Value {
        let params: Map<String, Value> = self
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut obj = Map::new();
        obj.insert(self.function_name.clone(), Value::Object(params));
        Value::Object(obj)
    }
}

impl<'de> Deserialize<'de> for ToolCall {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OneCallVisitor;

        impl<'de> Visitor<'de> for OneCallVisitor {
            type Value = ToolCall;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map with exactly one function name")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let (function_name, parameters) = map
                    .next_entry::<String, IndexMap<String, Value>>()?
                    .ok_or_else(|| DeError::custom("expected exactly one entry, found none"))?;

                if map.next_entry::<String, Value>()?.is_some() {
                    return Err(DeError::custom(
                        "expected exactly one entry, found more than one",
                    ));
                }

                Ok(ToolCall {
                    function_name,
                    parameters,
                })
            }
        }

        deserializer.deserialize_map(OneCallVisitor)
    }
}

impl Serialize for ToolCall {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.function_name, &self.parameters)?;
        map.end()
    }
}

/// Ordered calls of one completion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolCallList(pub Vec<ToolCall>);

impl ToolCallList {
    /// Reads a JSON list of single-key call objects. Any other shape is rejected.
    pub fn from_json_dict_list(value: &Value) -> Result<Self, serde_json::Error> {
        Vec::<ToolCall>::deserialize(value).map(ToolCallList)
    }

    /// Builds the list from a raw ground-truth list. Every parameter keeps its whole list of
    /// accepted values, so `[{"f": {"x": [1, ""]}}]` yields `x = [1, ""]`.
    pub fn from_ground_truth(value: &Value) -> Result<Self, serde_json::Error> {
        Self::from_json_dict_list(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ToolCall> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ToolCall> {
        self.0.get(index)
    }
}

impl std::ops::Index<usize> for ToolCallList {
    type Output = ToolCall;

    fn index(&self, index: usize) -> &ToolCall {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a ToolCallList {
    type Item = &'a ToolCall;
    type IntoIter = std::slice::Iter<'a, ToolCall>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_single_key_calls_in_order() {
        let raw = json!([
            {"spotify.play": {"artist": "Taylor Swift", "duration": 20}},
            {"spotify.play": {"artist": "Maroon 5", "duration": 15}}
        ]);
        let calls = ToolCallList::from_json_dict_list(&raw).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].parameters["artist"], json!("Maroon 5"));
        let keys: Vec<&String> = calls[0].parameters.keys().collect();
        assert_eq!(keys, ["artist", "duration"]);
    }

    #[test]
    fn rejects_multi_key_and_non_object_calls() {
        assert!(ToolCallList::from_json_dict_list(&json!([{"a": {}, "b": {}}])).is_err());
        assert!(ToolCallList::from_json_dict_list(&json!([{}])).is_err());
        assert!(ToolCallList::from_json_dict_list(&json!([{"a": 1}])).is_err());
        assert!(ToolCallList::from_json_dict_list(&json!({"a": {}})).is_err());
    }

    #[test]
    fn ground_truth_list_keeps_every_accepted_value() {
        let source = json!([
            {"calc_area": {"base": [10], "height": [5], "unit": ["", "cm"]}},
            {"calc_perimeter": {"sides": [[3, 4, 5]]}}
        ]);
        let calls = ToolCallList::from_ground_truth(&source).unwrap();
        assert_eq!(calls.len(), 2);
        for (call, truth) in calls.iter().zip(source.as_array().unwrap()) {
            assert_eq!(&call.to_json(), truth);
        }
        assert_eq!(calls[0].parameters["unit"], json!(["", "cm"]));
        assert_eq!(calls[1].parameters["sides"], json!([[3, 4, 5]]));
        assert!(ToolCallList::from_ground_truth(&json!({"calc_area": {}})).is_err());
    }

    #[test]
    fn serializes_back_to_single_key_object() {
        let call = ToolCall::new("f", IndexMap::from([("x".to_string(), json!(1))]));
        assert_eq!(serde_json::to_value(&call).unwrap(), json!({"f": {"x": 1}}));
        assert_eq!(call.to_json(), json!({"f": {"x": 1}}));
    }
}
