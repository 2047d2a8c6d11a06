//! A research agent that searches the web and writes reports.
//!
//! The crate assembles the model providers, the search backend and the tools
//! of external tool servers into a ready-to-use [`ResearchAgent`]. It also
//! ships a CLI for using the agent in the terminal.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod builder;
pub mod config;
mod error;
pub mod instructions;
pub mod tool_server;
pub mod tools;

pub use builder::{ResearchAgent, ResearchAgentBuilder};
pub use error::ConstructionError;

/// Re-exports of [`research_agent_core`] crate.
pub mod core {
    pub use research_agent_core::*;
}
