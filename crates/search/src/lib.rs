//! Web search backends for the research agent.
//!
//! The agent talks to a [`SearchBackend`], which takes a [`SearchRequest`]
//! and returns the provider's JSON response untouched. [`TavilyClient`] is
//! the bundled implementation.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod request;
mod tavily;

use serde_json::Value;

pub use error::{SearchError, SearchErrorKind};
pub use request::{DEFAULT_MAX_RESULTS, SearchRequest, SearchTopic};
pub use tavily::{TavilyClient, TavilyConfig, TavilyConfigBuilder};

/// A web search service.
pub trait SearchBackend: Send + Sync + 'static {
    /// Runs a search.
    ///
    /// The returned future must not borrow from `self`.
    fn search(
        &self,
        req: SearchRequest,
    ) -> impl Future<Output = Result<Value, SearchError>> + Send + 'static;
}
