use std::fs;
use std::io;
use std::path::Path;

use crate::env::EnvSource;
use crate::{Document, Error, Materialized, Materializer};

/// Where the tool-server configuration is looked up when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "mcp_config.json";

/// Reads and parses the JSON document at `path`.
///
/// Nothing is substituted here, see [`load_materialized`] for that.
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document, Error> {
    let path = path.as_ref();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::not_found(path));
        }
        Err(err) if err.kind() == io::ErrorKind::InvalidData => {
            // The file is not valid UTF-8.
            return Err(Error::malformed(format!("{}: {err}", path.display())));
        }
        Err(err) => return Err(Error::io(path, &err)),
    };
    serde_json::from_str(&raw)
        .map_err(|err| Error::malformed(format!("{}: {err}", path.display())))
}

/// Reads the document at `path` and resolves its placeholders.
pub fn load_materialized<P, E>(
    path: P,
    materializer: &Materializer<E>,
) -> Result<Materialized, Error>
where
    P: AsRef<Path>,
    E: EnvSource,
{
    let document = load_document(&path)?;
    debug!("loaded configuration from {}", path.as_ref().display());
    Ok(materializer.materialize(&document))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::ErrorKind;

    fn write_temp(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(dir.path().join("mcp_config.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_truncated_json() {
        let file = write_temp(br#"{"mcpServers": {"fs": {"command": "np"#);
        let err = load_document(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_invalid_utf8() {
        let file = write_temp(&[b'"', 0xff, 0xfe, b'"']);
        let err = load_document(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_load_materialized() {
        let file = write_temp(
            br#"{"mcpServers": {"api": {"url": "https://${HOST}/mcp", "headers": {"Authorization": "Bearer ${TOKEN}"}}}}"#,
        );
        let env: HashMap<String, String> =
            [("HOST".to_owned(), "tools.internal".to_owned())].into();
        let resolved =
            load_materialized(file.path(), &Materializer::new(env)).unwrap();
        assert_eq!(
            resolved.document,
            json!({
                "mcpServers": {
                    "api": {
                        "url": "https://tools.internal/mcp",
                        "headers": { "Authorization": "Bearer " },
                    }
                }
            })
        );
        assert_eq!(resolved.unresolved, vec!["TOKEN"]);
    }
}
