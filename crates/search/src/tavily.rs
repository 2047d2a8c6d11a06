use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, header};
use serde_json::Value;

use crate::{SearchBackend, SearchError, SearchErrorKind, SearchRequest};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Builder for [`TavilyConfig`].
#[derive(Clone)]
pub struct TavilyConfigBuilder {
    api_key: String,
    base_url: Option<String>,
    timeout: Option<Duration>,
    no_proxy: bool,
}

impl TavilyConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout: None,
            no_proxy: false,
        }
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets a timeout for each search.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Bypasses any proxy configured through the environment.
    #[inline]
    pub fn with_no_proxy(mut self, no_proxy: bool) -> Self {
        self.no_proxy = no_proxy;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> TavilyConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        TavilyConfig {
            api_key: self.api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout: self.timeout,
            no_proxy: self.no_proxy,
        }
    }
}

impl Debug for TavilyConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("no_proxy", &self.no_proxy)
            .finish()
    }
}

/// Configuration for [`TavilyClient`].
#[derive(Clone)]
pub struct TavilyConfig {
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
    no_proxy: bool,
}

impl TavilyConfig {
    /// Returns the base URL, without a trailing slash.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Debug for TavilyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("no_proxy", &self.no_proxy)
            .finish()
    }
}

/// A client of the [Tavily](https://tavily.com) search API.
#[derive(Clone, Debug)]
pub struct TavilyClient {
    client: Client,
    config: Arc<TavilyConfig>,
}

impl TavilyClient {
    /// Creates a client with the given configuration.
    pub fn new(config: TavilyConfig) -> Result<Self, SearchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if config.no_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|err| {
            SearchError::new(
                SearchErrorKind::Transport,
                format!("failed to build HTTP client: {err}"),
            )
        })?;
        debug!("created Tavily client: {config:?}");
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }
}

impl SearchBackend for TavilyClient {
    fn search(
        &self,
        req: SearchRequest,
    ) -> impl Future<Output = Result<Value, SearchError>> + Send + 'static {
        debug!(
            "searching `{}` ({:?}, up to {} results)",
            req.query, req.topic, req.max_results
        );
        let send_fut = self
            .client
            .post(format!("{}/search", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .json(&req)
            .send();

        async move {
            let resp =
                send_fut.await.map_err(|err| SearchError::from_reqwest(&err))?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                warn!("search failed with {status}");
                return Err(SearchError::from_status(status, body.trim()));
            }
            let value: Value = resp
                .json()
                .await
                .map_err(|err| SearchError::from_reqwest(&err))?;
            trace!("search response: {value}");
            Ok(value)
        }
    }
}
