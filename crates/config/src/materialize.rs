use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::env::{EnvSource, ProcessEnv};
use crate::{Document, Error};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid")
});

/// Substitutes `${NAME}` placeholders in a document with values from an
/// [`EnvSource`].
///
/// The materializer only reads from its source, and it never modifies the
/// input document. It can be shared and reused freely.
#[derive(Clone, Debug, Default)]
pub struct Materializer<E = ProcessEnv> {
    env: E,
}

impl Materializer<ProcessEnv> {
    /// Creates a materializer that reads the current process environment.
    #[inline]
    pub fn from_process_env() -> Self {
        Self { env: ProcessEnv }
    }
}

impl<E: EnvSource> Materializer<E> {
    /// Creates a materializer with the specified environment source.
    #[inline]
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Resolves every placeholder in `document`.
    ///
    /// The returned document has exactly the same shape as the input. A
    /// placeholder whose variable is unset or empty becomes an empty string,
    /// a warning is emitted for it and its name is recorded in
    /// [`Materialized::unresolved`].
    pub fn materialize(&self, document: &Document) -> Materialized {
        let mut unresolved = Vec::new();
        let document = self.resolve_value(document, &mut unresolved);
        Materialized {
            document,
            unresolved,
        }
    }

    fn resolve_value(&self, value: &Value, unresolved: &mut Vec<String>) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| {
                        (key.clone(), self.resolve_value(value, unresolved))
                    })
                    .collect(),
            ),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_value(item, unresolved))
                    .collect(),
            ),
            Value::String(s) => Value::String(self.resolve_str(s, unresolved)),
            other => other.clone(),
        }
    }

    fn resolve_str(&self, s: &str, unresolved: &mut Vec<String>) -> String {
        PLACEHOLDER
            .replace_all(s, |caps: &Captures<'_>| {
                let name = &caps[1];
                match self.env.var(name) {
                    Some(value) if !value.is_empty() => value,
                    _ => {
                        warn!("environment variable `{name}` is not set or empty");
                        unresolved.push(name.to_owned());
                        String::new()
                    }
                }
            })
            .into_owned()
    }
}

/// The outcome of one materialization pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Materialized {
    /// The resolved document.
    pub document: Document,
    /// Names of the variables that resolved to an empty string, one entry
    /// per placeholder occurrence, in traversal order.
    pub unresolved: Vec<String>,
}

impl Materialized {
    /// Returns `true` if every placeholder was filled with a non-empty value.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Takes the resolved document, ignoring any unresolved placeholders.
    #[inline]
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Takes the resolved document, failing if any placeholder was left
    /// unresolved.
    pub fn require_complete(self) -> Result<Document, Error> {
        if self.is_complete() {
            return Ok(self.document);
        }
        let mut seen = HashSet::new();
        let names = self
            .unresolved
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect::<Vec<_>>();
        Err(Error::unresolved(&names))
    }
}

/// Resolves `document` against the process environment.
///
/// This is a shorthand of [`Materializer::from_process_env`] followed by
/// [`Materializer::materialize`].
#[inline]
pub fn materialize(document: &Document) -> Document {
    Materializer::from_process_env()
        .materialize(document)
        .into_document()
}
