//! Loading and resolving the tool-server configuration document.
//!
//! The document is plain JSON. String leaves may reference environment
//! variables with `${NAME}` placeholders, which are substituted by a
//! [`Materializer`] before the document is handed to whoever consumes it.
//! A variable that is unset or empty resolves to an empty string and is
//! reported as a warning, never as an error.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod env;
mod error;
mod loader;
mod materialize;
mod servers;

pub use env::{EnvSource, ProcessEnv};
pub use error::{Error, ErrorKind};
pub use loader::{DEFAULT_CONFIG_PATH, load_document, load_materialized};
pub use materialize::{Materialized, Materializer, materialize};
pub use servers::{
    RemoteServer, RemoteTransport, ServerConfig, StdioServer,
    ToolServersConfig,
};

/// A parsed configuration document.
///
/// It's a tree of mappings, sequences, strings and other scalars, which is
/// exactly what [`serde_json::Value`] models.
pub type Document = serde_json::Value;
