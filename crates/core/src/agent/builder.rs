use std::sync::Arc;

use research_agent_model::ModelProvider;
use thiserror::Error;

use super::{Agent, AgentInner};
use crate::model_client::ModelClient;
use crate::tool::{AnyTool, Executor as ToolExecutor, Tool, ToolObject};

const DEFAULT_MAX_STEPS: usize = 25;

/// Errors that can occur when building an [`Agent`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// Two tools were registered with the same name.
    #[error("duplicate tool name `{0}`")]
    DuplicateTool(String),
    /// The step limit must allow at least one model turn.
    #[error("max steps must be at least 1")]
    ZeroMaxSteps,
}

/// [`Agent`] builder.
pub struct AgentBuilder {
    model_client: ModelClient,
    system_prompt: Option<String>,
    tools: Vec<Box<dyn ToolObject>>,
    max_steps: usize,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            system_prompt: None,
            tools: vec![],
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Sets the system prompt placed in front of every run.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(Box::new(AnyTool(tool)));
        self
    }

    /// Sets the maximum number of model turns in one run.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Builds the agent.
    pub fn build(self) -> Result<Agent, BuildError> {
        let AgentBuilder {
            model_client,
            system_prompt,
            tools,
            max_steps,
        } = self;

        if max_steps == 0 {
            return Err(BuildError::ZeroMaxSteps);
        }
        let tool_executor =
            ToolExecutor::with_tools(tools).map_err(BuildError::DuplicateTool)?;
        debug!(
            "built an agent with {} tools",
            tool_executor.definitions().len()
        );

        Ok(Agent {
            inner: Arc::new(AgentInner {
                model_client,
                tool_executor,
                system_prompt,
                max_steps,
            }),
        })
    }
}
