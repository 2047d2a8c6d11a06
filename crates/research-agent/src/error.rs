use research_agent_core::BuildError;
use thiserror::Error;

use crate::tool_server::ToolServerError;

/// Errors that prevent a [`ResearchAgent`](crate::ResearchAgent) from
/// being constructed.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// A tool server could not be reached.
    #[error("failed to connect to tool server `{server}`: {source}")]
    Connect {
        /// Name of the server.
        server: String,
        /// The underlying failure.
        #[source]
        source: ToolServerError,
    },
    /// A tool server could not list its tools.
    #[error("failed to list tools of tool server `{server}`: {source}")]
    ListTools {
        /// Name of the server.
        server: String,
        /// The underlying failure.
        #[source]
        source: ToolServerError,
    },
    /// The agent rejected its configuration, e.g. two tools share a name.
    #[error(transparent)]
    Agent(#[from] BuildError),
}
