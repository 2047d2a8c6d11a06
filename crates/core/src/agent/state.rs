use research_agent_model::ModelMessage;
use serde::Serialize;

/// A snapshot of the conversation during an agent run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AgentState {
    /// All messages so far, oldest first.
    pub messages: Vec<ModelMessage>,
}

impl AgentState {
    /// Returns the newest message.
    #[inline]
    pub fn last_message(&self) -> Option<&ModelMessage> {
        self.messages.last()
    }

    /// Returns the answer text if the run has finished with one.
    ///
    /// That is the case when the newest message is an assistant message
    /// without tool calls.
    pub fn final_answer(&self) -> Option<&str> {
        match self.messages.last() {
            Some(ModelMessage::Assistant(msg)) if msg.tool_calls.is_empty() => {
                Some(&msg.content)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use research_agent_model::{AssistantMessage, ToolCallRequest};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_final_answer() {
        let mut state = AgentState {
            messages: vec![ModelMessage::user("Hi")],
        };
        assert_eq!(state.final_answer(), None);

        state.messages.push(ModelMessage::Assistant(AssistantMessage {
            content: String::new(),
            tool_calls: vec![ToolCallRequest {
                id: "call_0".to_owned(),
                name: "internet_search".to_owned(),
                arguments: json!({ "query": "hi" }),
            }],
        }));
        assert_eq!(state.final_answer(), None);

        state.messages.push(ModelMessage::assistant("Hello!"));
        assert_eq!(state.final_answer(), Some("Hello!"));
        assert_eq!(state.last_message().map(ModelMessage::role), Some("assistant"));
    }
}
