//! A model provider for OpenAI-compatible APIs.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use mime::Mime;
use reqwest::{Client, Response, StatusCode, header};
use research_agent_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};
use io::{Chunks, Sse};
use proto::ChatCompletionRequest;
pub use response::OpenAIResponse;

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() || err.is_request() || err.is_body() {
            ErrorKind::Transport
        } else {
            ErrorKind::Other
        };
        Self::new(format!("{err}"), kind)
    }

    fn from_status(status: StatusCode) -> Self {
        let kind = if status == StatusCode::TOO_MANY_REQUESTS {
            ErrorKind::RateLimitExceeded
        } else if status.is_server_error() {
            ErrorKind::Transport
        } else {
            ErrorKind::Other
        };
        Self::new(format!("server responded with {status}"), kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    ///
    /// Fails only if the HTTP client cannot be initialized, for example
    /// when no TLS backend is available.
    pub fn new(config: OpenAIConfig) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if config.no_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|err| {
            Error::new(format!("failed to build HTTP client: {err}"), ErrorKind::Other)
        })?;
        debug!("created OpenAI provider: {config:?}");
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;
    type Response = OpenAIResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let client = self.client.clone();
        let config = Arc::clone(&self.config);

        async move {
            let max_retries = config.max_retries;
            let attempts = AtomicU32::new(0);
            let policy = ExponentialBackoffBuilder::new()
                .with_initial_interval(Duration::from_millis(500))
                .with_max_interval(Duration::from_secs(8))
                .with_max_elapsed_time(None)
                .build();

            let resp = backoff::future::retry(policy, || {
                let attempt = attempts.fetch_add(1, Ordering::Relaxed);
                let fut = post_completion(&client, &config, &openai_req);
                async move {
                    fut.await.map_err(|err| {
                        if err.kind.is_retryable() && attempt < max_retries {
                            warn!(
                                "request failed (attempt {}), retrying: {err}",
                                attempt + 1
                            );
                            backoff::Error::transient(err)
                        } else {
                            backoff::Error::permanent(err)
                        }
                    })
                }
            })
            .await?;

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            let sse = Sse::new(Chunks::from_response(resp));
            Ok(OpenAIResponse::from_sse(sse))
        }
    }
}

fn post_completion(
    client: &Client,
    config: &OpenAIConfig,
    body: &ChatCompletionRequest,
) -> impl Future<Output = Result<Response, Error>> + Send + 'static {
    let send_fut = client
        .post(format!("{}/chat/completions", config.base_url))
        .header(header::AUTHORIZATION, format!("Bearer {}", config.api_key))
        .header(header::ACCEPT, "text/event-stream")
        .json(body)
        .send();

    async move {
        let resp = send_fut.await.map_err(|err| Error::from_reqwest(&err))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!("error response body: {body}");
            return Err(Error::from_status(status));
        }
        Ok(resp)
    }
}
