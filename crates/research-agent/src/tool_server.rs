//! Tools hosted by external tool servers.
//!
//! This crate doesn't speak any tool-server wire protocol itself. A host
//! supplies a [`ToolServerConnector`] that knows how to reach the servers
//! described in a [`ToolServersConfig`], and [`ToolServerSet`] turns the
//! tools they expose into ordinary agent tools.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use research_agent_config::{ServerConfig, ToolServersConfig};
use research_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use serde_json::Value;
use thiserror::Error;

use crate::error::ConstructionError;

/// Error reported by a tool server or its connector.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ToolServerError {
    message: String,
}

impl ToolServerError {
    /// Creates an error with the given message.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A tool as advertised by a tool server.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteToolSpec {
    /// Name of the tool.
    pub name: String,
    /// Description shown to the model.
    pub description: String,
    /// JSON schema of the arguments.
    pub input_schema: Value,
}

/// A connected tool server.
#[async_trait]
pub trait ToolServer: Send + Sync + 'static {
    /// Lists the tools this server provides.
    async fn list_tools(&self) -> Result<Vec<RemoteToolSpec>, ToolServerError>;

    /// Calls a tool and returns its textual output.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<String, ToolServerError>;

    /// Releases the connection. Calls after closing may fail.
    async fn close(&self) -> Result<(), ToolServerError>;
}

/// Options applied to every tool server connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Bypass any proxy configured through the environment.
    pub no_proxy: bool,
}

/// Establishes connections to configured tool servers.
#[async_trait]
pub trait ToolServerConnector: Send + Sync {
    /// Connects to the server named `name`.
    async fn connect(
        &self,
        name: &str,
        config: &ServerConfig,
        options: &ConnectOptions,
    ) -> Result<Arc<dyn ToolServer>, ToolServerError>;
}

/// A set of connected tool servers, ordered by server name.
#[derive(Clone, Default)]
pub struct ToolServerSet {
    servers: Vec<(String, Arc<dyn ToolServer>)>,
}

impl ToolServerSet {
    /// Connects to every server in `config`.
    ///
    /// If any connection fails, the servers connected so far are closed and
    /// the error is returned.
    pub async fn connect<C>(
        config: &ToolServersConfig,
        connector: &C,
        options: ConnectOptions,
    ) -> Result<Self, ConstructionError>
    where
        C: ToolServerConnector + ?Sized,
    {
        let mut set = Self::default();
        for (name, server_config) in config.servers() {
            debug!("connecting to tool server `{name}`");
            match connector.connect(name, server_config, &options).await {
                Ok(server) => set.servers.push((name.to_owned(), server)),
                Err(source) => {
                    set.close().await;
                    return Err(ConstructionError::Connect {
                        server: name.to_owned(),
                        source,
                    });
                }
            }
        }
        info!("connected to {} tool servers", set.servers.len());
        Ok(set)
    }

    /// Returns the number of connected servers.
    #[inline]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns `true` if no server is connected.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Returns the names of the connected servers.
    pub fn server_names(&self) -> impl Iterator<Item = &str> {
        self.servers.iter().map(|(name, _)| name.as_str())
    }

    /// Discovers the tools of every server, in server order.
    pub async fn list_tools(&self) -> Result<Vec<RemoteTool>, ConstructionError> {
        let mut tools = vec![];
        for (name, server) in &self.servers {
            let specs = server.list_tools().await.map_err(|source| {
                ConstructionError::ListTools {
                    server: name.clone(),
                    source,
                }
            })?;
            debug!("tool server `{name}` provides {} tools", specs.len());
            tools.extend(specs.into_iter().map(|spec| RemoteTool {
                server_name: name.clone(),
                server: Arc::clone(server),
                spec,
            }));
        }
        Ok(tools)
    }

    /// Closes every server. Failures are logged and otherwise ignored.
    pub async fn close(&self) {
        let results =
            join_all(self.servers.iter().map(|(_, server)| server.close())).await;
        for ((name, _), result) in self.servers.iter().zip(results) {
            if let Err(err) = result {
                warn!("failed to close tool server `{name}`: {err}");
            }
        }
    }
}

/// A tool provided by a tool server.
pub struct RemoteTool {
    server_name: String,
    server: Arc<dyn ToolServer>,
    spec: RemoteToolSpec,
}

impl RemoteTool {
    /// Returns the name of the server providing this tool.
    #[inline]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

impl Tool for RemoteTool {
    type Input = Value;

    fn name(&self) -> &str {
        &self.spec.name
    }

    fn description(&self) -> &str {
        &self.spec.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.spec.input_schema
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let server = Arc::clone(&self.server);
        let name = self.spec.name.clone();
        let server_name = self.server_name.clone();
        async move {
            server.call_tool(&name, input).await.map_err(|err| {
                debug!("`{name}` on `{server_name}` failed: {err}");
                ToolError::execution_error().with_reason(err.to_string())
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use research_agent_config::Document;
    use serde_json::json;

    use super::*;

    /// An in-memory tool server recording what happens to it.
    #[derive(Default)]
    pub(crate) struct FakeServer {
        pub(crate) tools: Vec<RemoteToolSpec>,
        pub(crate) closed: Mutex<bool>,
    }

    #[async_trait]
    impl ToolServer for FakeServer {
        async fn list_tools(&self) -> Result<Vec<RemoteToolSpec>, ToolServerError> {
            Ok(self.tools.clone())
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Value,
        ) -> Result<String, ToolServerError> {
            if *self.closed.lock().unwrap() {
                return Err(ToolServerError::new("server is closed"));
            }
            Ok(format!("{name} called with {arguments}"))
        }

        async fn close(&self) -> Result<(), ToolServerError> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    pub(crate) fn spec(name: &str) -> RemoteToolSpec {
        RemoteToolSpec {
            name: name.to_owned(),
            description: format!("The {name} tool"),
            input_schema: json!({ "type": "object" }),
        }
    }

    /// Hands out pre-built servers by name.
    #[derive(Default)]
    pub(crate) struct FakeConnector {
        pub(crate) servers: BTreeMap<String, Arc<FakeServer>>,
        pub(crate) seen_options: Mutex<Vec<ConnectOptions>>,
    }

    #[async_trait]
    impl ToolServerConnector for FakeConnector {
        async fn connect(
            &self,
            name: &str,
            _config: &ServerConfig,
            options: &ConnectOptions,
        ) -> Result<Arc<dyn ToolServer>, ToolServerError> {
            self.seen_options.lock().unwrap().push(*options);
            match self.servers.get(name) {
                Some(server) => Ok(Arc::clone(server) as Arc<dyn ToolServer>),
                None => Err(ToolServerError::new("connection refused")),
            }
        }
    }

    pub(crate) fn servers_config(names: &[&str]) -> ToolServersConfig {
        let servers = names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    json!({ "url": format!("https://{name}.example.com/mcp") }),
                )
            })
            .collect::<serde_json::Map<_, _>>();
        let document: Document = json!({ "mcpServers": servers });
        ToolServersConfig::from_document(&document).unwrap()
    }

    #[tokio::test]
    async fn test_connect_and_discover() {
        let mut connector = FakeConnector::default();
        connector.servers.insert(
            "weather".to_owned(),
            Arc::new(FakeServer {
                tools: vec![spec("forecast")],
                ..Default::default()
            }),
        );
        connector.servers.insert(
            "files".to_owned(),
            Arc::new(FakeServer {
                tools: vec![spec("ls"), spec("cat")],
                ..Default::default()
            }),
        );

        let options = ConnectOptions { no_proxy: true };
        let set = ToolServerSet::connect(
            &servers_config(&["weather", "files"]),
            &connector,
            options,
        )
        .await
        .unwrap();
        assert_eq!(set.server_names().collect::<Vec<_>>(), ["files", "weather"]);
        assert!(connector.seen_options.lock().unwrap().iter().all(|o| o.no_proxy));

        let tools = set.list_tools().await.unwrap();
        let names = tools
            .iter()
            .map(|t| (t.server_name(), t.name()))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [("files", "ls"), ("files", "cat"), ("weather", "forecast")]
        );

        let output = tools[2].execute(json!({ "city": "Chengdu" })).await.unwrap();
        assert_eq!(output, r#"forecast called with {"city":"Chengdu"}"#);

        set.close().await;
        assert!(*connector.servers["files"].closed.lock().unwrap());
        let err = tools[0].execute(json!({})).await.err().unwrap();
        assert_eq!(err.reason(), "server is closed");
    }

    #[tokio::test]
    async fn test_connect_failure_closes_connected() {
        let mut connector = FakeConnector::default();
        connector
            .servers
            .insert("alpha".to_owned(), Arc::new(FakeServer::default()));

        let err = ToolServerSet::connect(
            &servers_config(&["alpha", "beta"]),
            &connector,
            ConnectOptions::default(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(
            err,
            ConstructionError::Connect { ref server, .. } if server == "beta"
        ));
        assert!(*connector.servers["alpha"].closed.lock().unwrap());
    }
}
