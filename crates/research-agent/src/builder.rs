use research_agent_core::tool::Tool;
use research_agent_core::{
    Agent, AgentBuilder, AgentError, AgentInput, AgentState, AgentStream,
};
use research_agent_model::ModelProvider;
use research_agent_search::SearchBackend;

use crate::error::ConstructionError;
use crate::instructions::{ToolDescription, render_instructions};
use crate::tool_server::ToolServerSet;
use crate::tools::{INTERNET_SEARCH_USAGE, InternetSearchTool};

/// A research agent builder.
///
/// See [`ResearchAgent`].
pub struct ResearchAgentBuilder<P, B> {
    provider: P,
    search_backend: B,
    tool_servers: Option<ToolServerSet>,
    max_steps: Option<usize>,
}

impl<P, B> ResearchAgentBuilder<P, B>
where
    P: ModelProvider + 'static,
    B: SearchBackend,
{
    /// Creates a builder with a model provider and a search backend.
    #[inline]
    pub fn new(provider: P, search_backend: B) -> Self {
        Self {
            provider,
            search_backend,
            tool_servers: None,
            max_steps: None,
        }
    }

    /// Adds the tools of already connected tool servers.
    ///
    /// The agent takes ownership of the servers, and closes them in
    /// [`ResearchAgent::shutdown`].
    #[inline]
    pub fn with_tool_servers(mut self, tool_servers: ToolServerSet) -> Self {
        self.tool_servers = Some(tool_servers);
        self
    }

    /// Sets the maximum number of model turns for one query.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Builds the agent.
    ///
    /// Tool servers given to the builder are closed if construction fails.
    pub async fn build(self) -> Result<ResearchAgent, ConstructionError> {
        let ResearchAgentBuilder {
            provider,
            search_backend,
            tool_servers,
            max_steps,
        } = self;

        let result =
            assemble(provider, search_backend, tool_servers.as_ref(), max_steps)
                .await;
        match result {
            Ok((agent, tool_descriptions)) => {
                info!(
                    "research agent ready with tools: {}",
                    tool_descriptions
                        .iter()
                        .map(|t| t.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                Ok(ResearchAgent {
                    agent,
                    tool_servers,
                    tool_descriptions,
                })
            }
            Err(err) => {
                error!("failed to construct the research agent: {err}");
                if let Some(tool_servers) = &tool_servers {
                    tool_servers.close().await;
                }
                Err(err)
            }
        }
    }
}

async fn assemble<P, B>(
    provider: P,
    search_backend: B,
    tool_servers: Option<&ToolServerSet>,
    max_steps: Option<usize>,
) -> Result<(Agent, Vec<ToolDescription>), ConstructionError>
where
    P: ModelProvider + 'static,
    B: SearchBackend,
{
    let remote_tools = match tool_servers {
        Some(tool_servers) => tool_servers.list_tools().await?,
        None => vec![],
    };

    let search_tool = InternetSearchTool::new(search_backend);
    let mut tool_descriptions =
        vec![ToolDescription::new(search_tool.name(), INTERNET_SEARCH_USAGE)];
    tool_descriptions.extend(
        remote_tools
            .iter()
            .map(|tool| ToolDescription::new(tool.name(), tool.description())),
    );

    let mut builder = AgentBuilder::with_model_provider(provider)
        .with_system_prompt(render_instructions(&tool_descriptions))
        .with_tool(search_tool);
    for tool in remote_tools {
        builder = builder.with_tool(tool);
    }
    if let Some(max_steps) = max_steps {
        builder = builder.with_max_steps(max_steps);
    }
    Ok((builder.build()?, tool_descriptions))
}

/// An agent that answers research questions with web searches and any
/// tools provided by tool servers.
pub struct ResearchAgent {
    agent: Agent,
    tool_servers: Option<ToolServerSet>,
    tool_descriptions: Vec<ToolDescription>,
}

impl ResearchAgent {
    /// Runs a query, yielding a snapshot of the conversation after every
    /// step.
    #[inline]
    pub fn stream<I: Into<AgentInput>>(&self, input: I) -> AgentStream {
        self.agent.stream(input)
    }

    /// Runs a query to completion.
    #[inline]
    pub async fn invoke<I: Into<AgentInput>>(
        &self,
        input: I,
    ) -> Result<AgentState, AgentError> {
        self.agent.invoke(input).await
    }

    /// Returns the tools available to the agent, in the order they are
    /// presented to the model.
    #[inline]
    pub fn tool_descriptions(&self) -> &[ToolDescription] {
        &self.tool_descriptions
    }

    /// Returns the system instructions.
    #[inline]
    pub fn instructions(&self) -> &str {
        self.agent.system_prompt().unwrap_or_default()
    }

    /// Closes all tool servers.
    pub async fn shutdown(self) {
        if let Some(tool_servers) = self.tool_servers {
            debug!("closing {} tool servers", tool_servers.len());
            tool_servers.close().await;
        }
    }
}
