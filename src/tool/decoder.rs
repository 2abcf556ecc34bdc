use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::tool::{
    category::{TestCategory, TestCollection},
    exec::call_expr::render_call,
    tool_calls::{ToolCall, ToolCallList},
};

/// What a decoder produced for one completion, shaped by the category's checker.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// Irrelevance categories get the completion untouched.
    Raw(String),
    Calls(ToolCallList),
    /// Executable categories work on call expressions.
    CallStrings(Vec<String>),
    Undecodable,
}

/// Turns a model completion into tool calls. One implementation is active per runner.
pub trait ToolCallDecoder: Send + Sync {
    /// Cheap envelope check run before decoding AST-checked categories.
    fn validate_format(&self, completion: &str) -> bool;

    fn decode_calls(&self, completion: &str) -> Option<ToolCallList>;

    fn decode_call_strings(&self, completion: &str) -> Option<Vec<String>>;

    fn decode(&self, completion: &str, category: TestCategory) -> Decoded {
        if TestCollection::Irrelevance.contains(category) {
            return Decoded::Raw(completion.to_string());
        }
        let decoded = if TestCollection::Executable.contains(category) {
            self.decode_call_strings(completion).map(Decoded::CallStrings)
        } else {
            self.decode_calls(completion).map(Decoded::Calls)
        };
        decoded.unwrap_or(Decoded::Undecodable)
    }
}

/// Completions that are plain JSON: a list of `{"name": {args}}` objects, or for executable
/// categories a list of call expression strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainJsonDecoder;

impl ToolCallDecoder for PlainJsonDecoder {
    fn validate_format(&self, completion: &str) -> bool {
        serde_json::from_str::<Value>(completion).is_ok()
    }

    fn decode_calls(&self, completion: &str) -> Option<ToolCallList> {
        let json = serde_json::from_str::<Value>(completion).ok()?;
        ToolCallList::from_json_dict_list(&json).ok()
    }

    fn decode_call_strings(&self, completion: &str) -> Option<Vec<String>> {
        match serde_json::from_str::<Value>(completion).ok()? {
            Value::String(call) => Some(vec![call]),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(call) => Some(call),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

static TOOL_CALL_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tool_call>(.*?)</tool_call>").unwrap());

#[derive(Deserialize)]
struct TaggedCall {
    name: String,
    #[serde(default)]
    arguments: TaggedArguments,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaggedArguments {
    Object(IndexMap<String, Value>),
    Encoded(String),
}

impl Default for TaggedArguments {
    fn default() -> Self {
        TaggedArguments::Object(IndexMap::new())
    }
}

impl TaggedCall {
    fn into_tool_call(self) -> Option<ToolCall> {
        let parameters = match self.arguments {
            TaggedArguments::Object(map) => map,
            TaggedArguments::Encoded(text) => serde_json::from_str(&text).ok()?,
        };
        Some(ToolCall::new(self.name, parameters))
    }
}

/// Completions in the chat-template style `<tool_call>{"name": ..., "arguments": ...}</tool_call>`.
/// Several blocks may follow each other; a block may also hold a JSON array of calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToolTagDecoder;

impl ToolTagDecoder {
    fn blocks(completion: &str) -> Vec<&str> {
        let blocks: Vec<&str> = TOOL_CALL_BLOCK
            .captures_iter(completion)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .collect();
        if blocks.is_empty() {
            vec![completion.trim()]
        } else {
            blocks
        }
    }

    fn parse_block(block: &str) -> Option<Vec<TaggedCall>> {
        match serde_json::from_str::<Value>(block).ok()? {
            json @ Value::Array(_) => serde_json::from_value(json).ok(),
            json @ Value::Object(_) => serde_json::from_value(json).ok().map(|call| vec![call]),
            _ => None,
        }
    }
}

impl ToolCallDecoder for ToolTagDecoder {
    fn validate_format(&self, completion: &str) -> bool {
        Self::blocks(completion)
            .into_iter()
            .all(|block| serde_json::from_str::<Value>(block).is_ok())
    }

    fn decode_calls(&self, completion: &str) -> Option<ToolCallList> {
        let mut calls = Vec::new();
        for block in Self::blocks(completion) {
            for tagged in Self::parse_block(block)? {
                calls.push(tagged.into_tool_call()?);
            }
        }
        Some(ToolCallList(calls))
    }

    fn decode_call_strings(&self, completion: &str) -> Option<Vec<String>> {
        let calls = self.decode_calls(completion)?;
        Some(calls.iter().map(render_call).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_shapes_follow_category() {
        let decoder = PlainJsonDecoder;
        let completion = r#"[{"calc": {"x": 1}}]"#;
        assert!(matches!(
            decoder.decode(completion, TestCategory::Simple),
            Decoded::Calls(calls) if calls.len() == 1
        ));
        assert_eq!(
            decoder.decode(completion, TestCategory::Irrelevance),
            Decoded::Raw(completion.to_string())
        );
        assert_eq!(
            decoder.decode(r#"["calc(x=1)", "calc(x=2)"]"#, TestCategory::ExecParallel),
            Decoded::CallStrings(vec!["calc(x=1)".to_string(), "calc(x=2)".to_string()])
        );
    }

    #[test]
    fn plain_json_failures_are_undecodable() {
        let decoder = PlainJsonDecoder;
        assert!(!decoder.validate_format("not json"));
        assert_eq!(
            decoder.decode(r#"[{"a": {}, "b": {}}]"#, TestCategory::Simple),
            Decoded::Undecodable
        );
        assert_eq!(
            decoder.decode(r#"[1, 2]"#, TestCategory::ExecSimple),
            Decoded::Undecodable
        );
    }

    #[test]
    fn tool_tags_with_encoded_arguments() {
        let decoder = ToolTagDecoder;
        let completion = concat!(
            "<tool_call>\n{\"name\": \"get_weather\", \"arguments\": \"{\\\"city\\\": \\\"Paris\\\"}\"}\n</tool_call>\n",
            "<tool_call>{\"name\": \"get_time\", \"arguments\": {\"tz\": \"CET\"}}</tool_call>"
        );
        assert!(decoder.validate_format(completion));
        let calls = decoder.decode_calls(completion).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].function_name, "get_weather");
        assert_eq!(calls[0].parameters["city"], json!("Paris"));
        assert_eq!(calls[1].parameters["tz"], json!("CET"));
    }

    #[test]
    fn tool_tags_render_call_strings_for_execution() {
        let decoder = ToolTagDecoder;
        let completion =
            r#"<tool_call>{"name": "calc_area", "arguments": {"base": 10, "unit": "cm"}}</tool_call>"#;
        assert_eq!(
            decoder.decode(completion, TestCategory::ExecSimple),
            Decoded::CallStrings(vec!["calc_area(base=10, unit='cm')".to_string()])
        );
    }

    #[test]
    fn untagged_text_is_parsed_whole() {
        let decoder = ToolTagDecoder;
        let calls = decoder
            .decode_calls(r#"[{"name": "f", "arguments": {}}, {"name": "g"}]"#)
            .unwrap();
        assert_eq!(calls.len(), 2);
        assert!(decoder.decode_calls("I cannot help with that.").is_none());
    }
}
