//! Loading the tool-server configuration used by the agent.

use std::path::Path;

use research_agent_config::{
    EnvSource, Error, ErrorKind, Materializer, ToolServersConfig,
    load_materialized,
};

/// Options for [`load_tool_servers`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadOptions {
    /// The path was given by the user. A missing file is an error instead
    /// of meaning "no tool servers".
    pub explicit: bool,
    /// Fail if a placeholder has no value instead of substituting an empty
    /// string.
    pub strict_env: bool,
}

/// Loads, resolves and parses the tool-server configuration at `path`.
///
/// A missing file yields an empty configuration unless
/// [`LoadOptions::explicit`] is set.
pub fn load_tool_servers<P, E>(
    path: P,
    options: LoadOptions,
    materializer: &Materializer<E>,
) -> Result<ToolServersConfig, Error>
where
    P: AsRef<Path>,
    E: EnvSource,
{
    let path = path.as_ref();
    let materialized = match load_materialized(path, materializer) {
        Ok(materialized) => materialized,
        Err(err) if !options.explicit && err.kind() == ErrorKind::NotFound => {
            debug!("no tool-server configuration at {}", path.display());
            return Ok(ToolServersConfig::default());
        }
        Err(err) => return Err(err),
    };
    let document = if options.strict_env {
        materialized.require_complete()?
    } else {
        materialized.into_document()
    };

    let config = ToolServersConfig::from_document(&document)?;
    info!(
        "loaded {} tool servers from {}",
        config.len(),
        path.display()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use research_agent_config::ServerConfig;
    use tempfile::NamedTempFile;

    use super::*;

    const REMOTE: &[u8] = br#"{"mcpServers": {"api": {"url": "https://${HOST}/mcp", "headers": {"Authorization": "Bearer ${TOKEN}"}}}}"#;

    fn write_temp(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    fn materializer(pairs: &[(&str, &str)]) -> Materializer<HashMap<String, String>> {
        Materializer::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        )
    }

    #[test]
    fn test_missing_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_tool_servers(
            dir.path().join("mcp_config.json"),
            LoadOptions::default(),
            &materializer(&[]),
        )
        .unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = LoadOptions {
            explicit: true,
            ..Default::default()
        };
        let err = load_tool_servers(
            dir.path().join("tools.json"),
            options,
            &materializer(&[]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_malformed_default_file() {
        let file = write_temp(b"{ not json");
        let err =
            load_tool_servers(file.path(), LoadOptions::default(), &materializer(&[]))
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_unset_variable_substituted() {
        let file = write_temp(REMOTE);
        let config = load_tool_servers(
            file.path(),
            LoadOptions::default(),
            &materializer(&[("HOST", "tools.internal")]),
        )
        .unwrap();
        let Some(ServerConfig::Remote(api)) = config.get("api") else {
            panic!("expected a remote server");
        };
        assert_eq!(api.url, "https://tools.internal/mcp");
        assert_eq!(api.headers["Authorization"], "Bearer ");
    }

    #[test]
    fn test_strict_env() {
        let file = write_temp(REMOTE);
        let options = LoadOptions {
            strict_env: true,
            ..Default::default()
        };

        let err = load_tool_servers(
            file.path(),
            options,
            &materializer(&[("HOST", "tools.internal")]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unresolved);
        assert_eq!(err.message(), "TOKEN");

        let config = load_tool_servers(
            file.path(),
            options,
            &materializer(&[("HOST", "tools.internal"), ("TOKEN", "t")]),
        )
        .unwrap();
        assert_eq!(config.len(), 1);
    }
}
