mod builder;
mod state;
#[cfg(test)]
mod tests;

use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use research_agent_model::{
    ErrorKind, ModelMessage, ModelProviderError, ModelRequest, ModelTool,
    ToolCallRequest,
};
use thiserror::Error;

use crate::model_client::ModelClient;
use crate::tool::Executor as ToolExecutor;
pub use builder::{AgentBuilder, BuildError};
pub use state::AgentState;

/// An agent that alternates between model turns and tool execution until
/// the model produces an answer.
///
/// The agent itself holds no conversation. Every call to [`Agent::stream`]
/// starts from the given input, so one agent can serve many independent
/// queries, and cloning it is cheap.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    model_client: ModelClient,
    tool_executor: ToolExecutor,
    system_prompt: Option<String>,
    max_steps: usize,
}

impl Agent {
    /// Runs the agent on the given input, yielding a snapshot of the
    /// conversation after every change.
    ///
    /// The stream is lazy: nothing is sent to the model until it is polled.
    pub fn stream<I: Into<AgentInput>>(&self, input: I) -> AgentStream {
        let mut messages = input.into().messages;
        if let Some(prompt) = &self.inner.system_prompt {
            if !matches!(messages.first(), Some(ModelMessage::System { .. })) {
                messages.insert(0, ModelMessage::system(prompt.clone()));
            }
        }

        let run = Run {
            inner: Arc::clone(&self.inner),
            state: AgentState { messages },
            step: Step::Start,
            turns: 0,
        };
        AgentStream {
            inner: stream::unfold(run, Run::advance).boxed(),
        }
    }

    /// Runs the agent to completion and returns the final state.
    pub async fn invoke<I: Into<AgentInput>>(
        &self,
        input: I,
    ) -> Result<AgentState, AgentError> {
        let mut stream = self.stream(input);
        let mut last = AgentState::default();
        while let Some(state) = stream.next().await {
            last = state?;
        }
        Ok(last)
    }

    /// Returns the tool definitions presented to the model.
    #[inline]
    pub fn tool_definitions(&self) -> Vec<ModelTool> {
        self.inner.tool_executor.definitions()
    }

    /// Returns the system prompt, if any.
    #[inline]
    pub fn system_prompt(&self) -> Option<&str> {
        self.inner.system_prompt.as_deref()
    }
}

/// The input of an agent run.
#[derive(Clone, Debug, Default)]
pub struct AgentInput {
    messages: Vec<ModelMessage>,
}

impl From<&str> for AgentInput {
    #[inline]
    fn from(value: &str) -> Self {
        Self {
            messages: vec![ModelMessage::user(value)],
        }
    }
}

impl From<String> for AgentInput {
    #[inline]
    fn from(value: String) -> Self {
        Self {
            messages: vec![ModelMessage::user(value)],
        }
    }
}

impl From<Vec<ModelMessage>> for AgentInput {
    #[inline]
    fn from(messages: Vec<ModelMessage>) -> Self {
        Self { messages }
    }
}

/// Errors that end an agent run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model provider failed.
    #[error("model request failed: {0}")]
    Model(Box<dyn ModelProviderError>),
    /// The model kept calling tools for more turns than allowed.
    #[error("exceeded the limit of {0} model turns")]
    StepLimitExceeded(usize),
}

impl AgentError {
    /// Returns the model error kind, if this error came from the model.
    #[inline]
    pub fn model_error_kind(&self) -> Option<ErrorKind> {
        match self {
            AgentError::Model(err) => Some(err.kind()),
            AgentError::StepLimitExceeded(_) => None,
        }
    }
}

/// A stream of [`AgentState`] snapshots, see [`Agent::stream`].
///
/// The stream ends after the model answers without calling tools, or right
/// after the first error.
pub struct AgentStream {
    inner: BoxStream<'static, Result<AgentState, AgentError>>,
}

impl Stream for AgentStream {
    type Item = Result<AgentState, AgentError>;

    #[inline]
    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

enum Step {
    Start,
    CallModel,
    RunTools(Vec<ToolCallRequest>),
    Done,
}

struct Run {
    inner: Arc<AgentInner>,
    state: AgentState,
    step: Step,
    turns: usize,
}

type Advanced = Option<(Result<AgentState, AgentError>, Run)>;

impl Run {
    async fn advance(mut self) -> Advanced {
        match mem::replace(&mut self.step, Step::Done) {
            Step::Done => None,
            Step::Start => {
                self.step = Step::CallModel;
                Some((Ok(self.state.clone()), self))
            }
            Step::CallModel => self.call_model().await,
            Step::RunTools(requests) => {
                let results = self.inner.tool_executor.execute(requests).await;
                self.state
                    .messages
                    .extend(results.into_iter().map(ModelMessage::Tool));
                self.step = Step::CallModel;
                Some((Ok(self.state.clone()), self))
            }
        }
    }

    async fn call_model(mut self) -> Advanced {
        let max_steps = self.inner.max_steps;
        if self.turns >= max_steps {
            warn!("giving up after {max_steps} model turns");
            return Some((Err(AgentError::StepLimitExceeded(max_steps)), self));
        }
        self.turns += 1;
        debug!("model turn {}", self.turns);

        let req = ModelRequest {
            messages: self.state.messages.clone(),
            tools: self.inner.tool_executor.definitions(),
        };
        let resp = match self.inner.model_client.send_request(req).await {
            Ok(resp) => resp,
            Err(err) => return Some((Err(AgentError::Model(err)), self)),
        };

        let msg = resp.into_message();
        if !msg.tool_calls.is_empty() {
            self.step = Step::RunTools(msg.tool_calls.clone());
        }
        self.state.messages.push(ModelMessage::Assistant(msg));
        Some((Ok(self.state.clone()), self))
    }
}
