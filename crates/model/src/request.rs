use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ToolCallRequest;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelRequest {
    /// The input messages.
    pub messages: Vec<ModelMessage>,
    /// Tools that are available to the model.
    pub tools: Vec<ModelTool>,
}

/// A complete message in the conversation log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ModelMessage {
    /// The system instructions.
    System {
        /// Instruction text.
        content: String,
    },
    /// A user input text.
    User {
        /// Input text.
        content: String,
    },
    /// A message generated by the model.
    Assistant(AssistantMessage),
    /// A tool call result.
    Tool(ToolCallResult),
}

impl ModelMessage {
    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates a text-only assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::Assistant(AssistantMessage {
            content: content.into(),
            tool_calls: vec![],
        })
    }

    /// Returns the role name of this message.
    pub fn role(&self) -> &'static str {
        match self {
            ModelMessage::System { .. } => "system",
            ModelMessage::User { .. } => "user",
            ModelMessage::Assistant(_) => "assistant",
            ModelMessage::Tool(_) => "tool",
        }
    }

    /// Returns the text content of this message.
    pub fn content(&self) -> &str {
        match self {
            ModelMessage::System { content } | ModelMessage::User { content } => {
                content
            }
            ModelMessage::Assistant(msg) => &msg.content,
            ModelMessage::Tool(result) => &result.content,
        }
    }
}

/// A message generated by the model, possibly requesting tool calls.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Generated text, may be empty when the model only calls tools.
    pub content: String,
    /// Tool calls requested in this message, in the order they were emitted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// The result of the tool call.
    pub content: String,
}

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// For most model providers, the parameters should typically be
    /// defined by a [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_with_role() {
        let messages = vec![
            ModelMessage::system("Be brief."),
            ModelMessage::user("Hi"),
            ModelMessage::Assistant(AssistantMessage {
                content: String::new(),
                tool_calls: vec![ToolCallRequest {
                    id: "call_1".to_owned(),
                    name: "internet_search".to_owned(),
                    arguments: json!({ "query": "rust" }),
                }],
            }),
            ModelMessage::Tool(ToolCallResult {
                id: "call_1".to_owned(),
                content: "[]".to_owned(),
            }),
            ModelMessage::assistant("Done."),
        ];
        let value = serde_json::to_value(&messages).unwrap();
        assert_eq!(
            value,
            json!([
                { "role": "system", "content": "Be brief." },
                { "role": "user", "content": "Hi" },
                {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{
                        "id": "call_1",
                        "name": "internet_search",
                        "arguments": { "query": "rust" },
                    }],
                },
                { "role": "tool", "id": "call_1", "content": "[]" },
                { "role": "assistant", "content": "Done." },
            ])
        );

        let back: Vec<ModelMessage> = serde_json::from_value(value).unwrap();
        assert_eq!(back, messages);
        assert_eq!(back[2].role(), "assistant");
        assert_eq!(back[3].content(), "[]");
    }
}
