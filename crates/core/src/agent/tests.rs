use std::future::ready;

use futures_util::StreamExt;
use research_agent_model::{ErrorKind, ModelMessage, ToolCallRequest};
use research_agent_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::tool::{Tool, ToolResult};
use crate::{AgentBuilder, AgentError, AgentState, BuildError};

#[derive(Deserialize)]
struct LookupInput {
    term: String,
}

struct LookupTool {
    schema: Value,
}

impl LookupTool {
    fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": { "term": { "type": "string" } },
                "required": ["term"]
            }),
        }
    }
}

impl Tool for LookupTool {
    type Input = LookupInput;

    fn name(&self) -> &str {
        "lookup"
    }

    fn description(&self) -> &str {
        "Looks up a term"
    }

    fn parameter_schema(&self) -> &Value {
        &self.schema
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(format!("definition of {}", input.term)))
    }
}

fn lookup_call(id: &str, term: &str) -> PresetEvent {
    PresetEvent::ToolCall(ToolCallRequest {
        id: id.to_owned(),
        name: "lookup".to_owned(),
        arguments: json!({ "term": term }),
    })
}

async fn collect(
    stream: crate::AgentStream,
) -> Vec<Result<AgentState, AgentError>> {
    stream.collect().await
}

#[tokio::test]
async fn test_simple_message() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_assistant_turn(PresetResponse::with_events([
        PresetEvent::MessageDelta("Hi, ".to_owned()),
        PresetEvent::MessageDelta("what can I do for you?".to_owned()),
    ]));

    let agent = AgentBuilder::with_model_provider(model_provider)
        .with_system_prompt("Be brief.")
        .build()
        .unwrap();
    let states = collect(agent.stream("Hello")).await;
    assert_eq!(states.len(), 2);

    let initial = states[0].as_ref().unwrap();
    assert_eq!(
        initial.messages,
        vec![ModelMessage::system("Be brief."), ModelMessage::user("Hello")]
    );
    assert_eq!(initial.final_answer(), None);

    let last = states[1].as_ref().unwrap();
    assert_eq!(last.messages.len(), 3);
    assert_eq!(last.final_answer(), Some("Hi, what can I do for you?"));
}

#[tokio::test]
async fn test_tool_round_trip() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_assistant_turn(PresetResponse::with_events([
        PresetEvent::MessageDelta("Let me check.".to_owned()),
        lookup_call("call_0", "borrow checker"),
        lookup_call("call_1", "lifetime"),
    ]));
    model_provider.add_assistant_turn(PresetResponse::with_text("All done."));
    let recorded = model_provider.clone();

    let agent = AgentBuilder::with_model_provider(model_provider)
        .with_tool(LookupTool::new())
        .build()
        .unwrap();
    let states = collect(agent.stream("Explain borrowing")).await;

    // Initial, tool-calling turn, tool results, answer.
    assert_eq!(states.len(), 4);
    let states = states.into_iter().map(Result::unwrap).collect::<Vec<_>>();

    let roles = states[2]
        .messages
        .iter()
        .map(ModelMessage::role)
        .collect::<Vec<_>>();
    assert_eq!(roles, ["user", "assistant", "tool", "tool"]);
    assert_eq!(states[2].messages[2].content(), "definition of borrow checker");
    assert_eq!(states[2].messages[3].content(), "definition of lifetime");
    assert_eq!(states[3].final_answer(), Some("All done."));

    let requests = recorded.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools.len(), 1);
    assert_eq!(requests[0].tools[0].name, "lookup");
    assert_eq!(requests[1].messages, states[2].messages);
}

#[tokio::test]
async fn test_step_limit() {
    let mut model_provider = TestModelProvider::default();
    for idx in 0..3 {
        model_provider.add_assistant_turn(PresetResponse::with_events([
            lookup_call(&format!("call_{idx}"), "recursion"),
        ]));
    }

    let agent = AgentBuilder::with_model_provider(model_provider)
        .with_tool(LookupTool::new())
        .with_max_steps(2)
        .build()
        .unwrap();
    let states = collect(agent.stream("Loop forever")).await;

    // Initial, then two rounds of (assistant, tools), then the error.
    assert_eq!(states.len(), 6);
    assert!(states[..5].iter().all(Result::is_ok));
    assert!(matches!(
        states[5],
        Err(AgentError::StepLimitExceeded(2))
    ));
}

#[tokio::test]
async fn test_model_error_ends_stream() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_assistant_turn(PresetResponse::failing("overloaded"));

    let agent = AgentBuilder::with_model_provider(model_provider)
        .build()
        .unwrap();
    let states = collect(agent.stream("Hi")).await;
    assert_eq!(states.len(), 2);
    let err = states[1].as_ref().err().unwrap();
    assert_eq!(err.model_error_kind(), Some(ErrorKind::Other));
    assert!(err.to_string().contains("overloaded"));

    let err = agent.invoke("Hi").await.err().unwrap();
    assert!(matches!(err, AgentError::Model(_)));
}

#[tokio::test]
async fn test_invoke_keeps_existing_system_message() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_assistant_turn(PresetResponse::with_text("Sure."));

    let agent = AgentBuilder::with_model_provider(model_provider)
        .with_system_prompt("Default prompt.")
        .build()
        .unwrap();
    let state = agent
        .invoke(vec![
            ModelMessage::system("Custom prompt."),
            ModelMessage::user("Go"),
        ])
        .await
        .unwrap();
    assert_eq!(state.messages[0], ModelMessage::system("Custom prompt."));
    assert_eq!(state.messages.len(), 3);
    assert_eq!(state.final_answer(), Some("Sure."));
}

#[test]
fn test_build_errors() {
    let err = AgentBuilder::with_model_provider(TestModelProvider::default())
        .with_tool(LookupTool::new())
        .with_tool(LookupTool::new())
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, BuildError::DuplicateTool(ref name) if name == "lookup"));

    let err = AgentBuilder::with_model_provider(TestModelProvider::default())
        .with_max_steps(0)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, BuildError::ZeroMaxSteps));
}
