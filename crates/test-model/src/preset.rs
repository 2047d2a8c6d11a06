use research_agent_model::ToolCallRequest;
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

/// The preset response for one assistant turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request fails with this message instead of producing
    /// any event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a text-only response.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Creates a response that always fails.
    #[inline]
    pub fn failing<S: Into<String>>(message: S) -> Self {
        Self {
            events: vec![],
            failure: Some(message.into()),
        }
    }

    #[inline]
    pub(crate) fn has_tool_call(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, PresetEvent::ToolCall(_)))
    }
}
