//! Core logic including the agent loop and tool execution.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
mod model_client;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, AgentError, AgentInput, AgentState, AgentStream,
    BuildError,
};
