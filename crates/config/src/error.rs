use std::fmt::{self, Display};
use std::path::Path;

use thiserror::Error;

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The configuration file doesn't exist.
    NotFound,
    /// The content is not valid JSON, or doesn't have the expected shape.
    Malformed,
    /// Any other I/O error while reading the file.
    Io,
    /// Some placeholders could not be resolved and the caller asked for a
    /// fully resolved document.
    Unresolved,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "document not found"),
            ErrorKind::Malformed => write!(f, "malformed document"),
            ErrorKind::Io => write!(f, "I/O error"),
            ErrorKind::Unresolved => write!(f, "unresolved placeholders"),
        }
    }
}

/// Describes a configuration error.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub(crate) fn not_found(path: &Path) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            message: path.display().to_string(),
        }
    }

    pub(crate) fn malformed<S: Into<String>>(message: S) -> Self {
        Self {
            kind: ErrorKind::Malformed,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &Path, err: &std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io,
            message: format!("{}: {err}", path.display()),
        }
    }

    pub(crate) fn unresolved(names: &[String]) -> Self {
        Self {
            kind: ErrorKind::Unresolved,
            message: names.join(", "),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the detail message of this error.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}
