use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{Document, Error};

/// Named tool servers declared in a resolved configuration document.
///
/// Servers are read from the top-level `mcpServers` field (`servers` is
/// accepted as well). A document without that field declares no servers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ToolServersConfig {
    #[serde(default, rename = "mcpServers", alias = "servers")]
    servers: BTreeMap<String, ServerConfig>,
}

impl ToolServersConfig {
    /// Extracts the server declarations from `document`.
    ///
    /// Pass a materialized document here, placeholders are not resolved.
    pub fn from_document(document: &Document) -> Result<Self, Error> {
        Self::deserialize(document)
            .map_err(|err| Error::malformed(format!("tool servers: {err}")))
    }

    /// Iterates over servers ordered by their names.
    #[inline]
    pub fn servers(&self) -> impl Iterator<Item = (&str, &ServerConfig)> {
        self.servers.iter().map(|(name, config)| (name.as_str(), config))
    }

    /// Returns the configuration of a server by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.get(name)
    }

    /// Returns the number of servers.
    #[inline]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns `true` if no server is declared.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

/// How to reach one tool server.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ServerConfig {
    /// A server spawned as a child process speaking over stdio.
    Stdio(StdioServer),
    /// A server reachable over HTTP.
    Remote(RemoteServer),
}

/// A server launched as a local process.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StdioServer {
    /// The executable to run.
    pub command: String,
    /// Arguments passed to the executable, in order.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// A server reachable by URL.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RemoteServer {
    /// Endpoint of the server.
    pub url: String,
    /// Transport used to talk to the endpoint.
    #[serde(default)]
    pub transport: RemoteTransport,
    /// Extra HTTP headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Transport of a [`RemoteServer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteTransport {
    /// Streamable HTTP.
    #[default]
    #[serde(alias = "http")]
    StreamableHttp,
    /// Server-sent events.
    Sse,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_parse_servers() {
        let config = ToolServersConfig::from_document(&json!({
            "mcpServers": {
                "web": {
                    "url": "https://tools.example.com/mcp",
                    "headers": { "Authorization": "Bearer t" },
                },
                "fs": {
                    "command": "npx",
                    "args": ["-y", "@modelcontextprotocol/server-filesystem", "/tmp"],
                },
                "events": { "url": "http://localhost:8001/sse", "transport": "sse" },
            }
        }))
        .unwrap();

        assert_eq!(config.len(), 3);
        let names = config.servers().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, ["events", "fs", "web"]);

        let Some(ServerConfig::Stdio(fs)) = config.get("fs") else {
            panic!("`fs` should be a stdio server");
        };
        assert_eq!(fs.command, "npx");
        assert_eq!(fs.args.len(), 3);
        assert!(fs.env.is_empty());

        let Some(ServerConfig::Remote(web)) = config.get("web") else {
            panic!("`web` should be a remote server");
        };
        assert_eq!(web.transport, RemoteTransport::StreamableHttp);
        assert_eq!(web.headers["Authorization"], "Bearer t");

        let Some(ServerConfig::Remote(events)) = config.get("events") else {
            panic!("`events` should be a remote server");
        };
        assert_eq!(events.transport, RemoteTransport::Sse);
    }

    #[test]
    fn test_servers_alias_and_absence() {
        let config = ToolServersConfig::from_document(&json!({
            "servers": { "a": { "command": "a-server" } }
        }))
        .unwrap();
        assert_eq!(config.len(), 1);

        let config =
            ToolServersConfig::from_document(&json!({ "other": 1 })).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_bad_shape() {
        let err = ToolServersConfig::from_document(&json!({
            "mcpServers": { "broken": { "args": ["no command or url"] } }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);

        let err = ToolServersConfig::from_document(&json!(["not", "a", "map"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }
}
