use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of results returned when the caller doesn't ask for a count.
pub const DEFAULT_MAX_RESULTS: u32 = 5;

/// The category of a search.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SearchTopic {
    /// Broad web search.
    #[default]
    General,
    /// Recent news.
    News,
    /// Markets and finance.
    Finance,
}

/// A single web search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    /// The query text.
    pub query: String,
    /// Maximum number of results.
    pub max_results: u32,
    /// The search category.
    pub topic: SearchTopic,
    /// Whether to include the cleaned page content of each result.
    pub include_raw_content: bool,
}

impl SearchRequest {
    /// Creates a request with default options.
    #[inline]
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            max_results: DEFAULT_MAX_RESULTS,
            topic: SearchTopic::General,
            include_raw_content: false,
        }
    }
}
