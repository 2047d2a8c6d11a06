use research_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use research_agent_search::{
    DEFAULT_MAX_RESULTS, SearchBackend, SearchRequest, SearchTopic,
};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

/// How the research instructions introduce [`InternetSearchTool`].
pub const INTERNET_SEARCH_USAGE: &str = "\
Use this to run an internet search for a given query. You can specify the \
max number of results to return, the topic, and whether raw content should \
be included.";

/// Arguments of [`InternetSearchTool`].
#[derive(Debug, Deserialize, JsonSchema)]
pub struct InternetSearchParameters {
    #[schemars(description = "The search query.")]
    query: String,
    #[serde(default = "default_max_results")]
    #[schemars(description = "Maximum number of results to return.")]
    max_results: u32,
    #[serde(default)]
    #[schemars(description = "The search category.")]
    topic: SearchTopic,
    #[serde(default)]
    #[schemars(
        description = "Whether to include the cleaned page content of each result."
    )]
    include_raw_content: bool,
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

impl From<InternetSearchParameters> for SearchRequest {
    #[inline]
    fn from(params: InternetSearchParameters) -> Self {
        SearchRequest {
            query: params.query,
            max_results: params.max_results,
            topic: params.topic,
            include_raw_content: params.include_raw_content,
        }
    }
}

/// A tool for running web searches.
pub struct InternetSearchTool<B> {
    backend: B,
    parameter_schema: Value,
}

impl<B: SearchBackend> InternetSearchTool<B> {
    /// Creates a search tool backed by `backend`.
    #[inline]
    pub fn new(backend: B) -> Self {
        InternetSearchTool {
            backend,
            parameter_schema: schema_for!(InternetSearchParameters).to_value(),
        }
    }
}

impl<B: SearchBackend> Tool for InternetSearchTool<B> {
    type Input = InternetSearchParameters;

    fn name(&self) -> &str {
        "internet_search"
    }

    fn description(&self) -> &str {
        "Run a web search"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let req = SearchRequest::from(input);
        let query = req.query.clone();
        let search_fut = self.backend.search(req);
        async move {
            match search_fut.await {
                Ok(value) => Ok(value.to_string()),
                Err(err) => {
                    warn!("search for `{query}` failed: {err}");
                    Err(ToolError::execution_error().with_reason(err.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;
    use std::sync::{Arc, Mutex};

    use research_agent_core::tool::ErrorKind as ToolErrorKind;
    use research_agent_search::{SearchError, SearchErrorKind};
    use serde_json::json;

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingBackend {
        requests: Arc<Mutex<Vec<SearchRequest>>>,
        fail: bool,
    }

    impl SearchBackend for RecordingBackend {
        fn search(
            &self,
            req: SearchRequest,
        ) -> impl Future<Output = Result<Value, SearchError>> + Send + 'static
        {
            let result = if self.fail {
                Err(SearchError::new(SearchErrorKind::RateLimited, "slow down"))
            } else {
                Ok(json!({ "query": req.query, "results": [] }))
            };
            self.requests.lock().unwrap().push(req);
            ready(result)
        }
    }

    fn params(value: Value) -> InternetSearchParameters {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_applied() {
        let backend = RecordingBackend::default();
        let tool = InternetSearchTool::new(backend.clone());

        let output = tool
            .execute(params(json!({ "query": "刘备 生平" })))
            .await
            .unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&output).unwrap(),
            json!({ "query": "刘备 生平", "results": [] })
        );

        let requests = backend.requests.lock().unwrap().clone();
        assert_eq!(requests, [SearchRequest::new("刘备 生平")]);
    }

    #[tokio::test]
    async fn test_all_arguments() {
        let backend = RecordingBackend::default();
        let tool = InternetSearchTool::new(backend.clone());
        tool.execute(params(json!({
            "query": "NVDA earnings",
            "max_results": 2,
            "topic": "finance",
            "include_raw_content": true
        })))
        .await
        .unwrap();

        let req = backend.requests.lock().unwrap()[0].clone();
        assert_eq!(req.max_results, 2);
        assert_eq!(req.topic, SearchTopic::Finance);
        assert!(req.include_raw_content);
    }

    #[tokio::test]
    async fn test_execute_outlives_tool() {
        let backend = RecordingBackend::default();
        let tool = InternetSearchTool::new(backend.clone());
        let fut = tool.execute(params(json!({ "query": "孙权" })));
        drop(tool);

        let output = tokio::spawn(fut).await.unwrap().unwrap();
        assert!(output.contains("孙权"));
        assert_eq!(backend.requests.lock().unwrap()[0].query, "孙权");
    }

    #[test]
    fn test_invalid_arguments() {
        let err = serde_json::from_value::<InternetSearchParameters>(json!({
            "query": "x",
            "topic": "sports"
        }));
        assert!(err.is_err());
        assert!(serde_json::from_value::<InternetSearchParameters>(json!({})).is_err());
    }

    #[tokio::test]
    async fn test_backend_error() {
        let backend = RecordingBackend {
            fail: true,
            ..Default::default()
        };
        let tool = InternetSearchTool::new(backend);
        let err = tool
            .execute(params(json!({ "query": "anything" })))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ToolErrorKind::ExecutionError);
        assert_eq!(err.reason(), "rate limited: slow down");
    }

    #[test]
    fn test_schema() {
        let tool = InternetSearchTool::new(RecordingBackend::default());
        let schema = tool.parameter_schema();
        assert_eq!(schema["required"], json!(["query"]));
        let properties = schema["properties"].as_object().unwrap();
        for name in ["query", "max_results", "topic", "include_raw_content"] {
            assert!(properties.contains_key(name), "{name}");
        }
    }
}
