use std::fmt::{self, Display};

use reqwest::StatusCode;
use thiserror::Error;

/// The category of a [`SearchError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchErrorKind {
    /// The API key was missing or rejected.
    Unauthorized,
    /// The service asked us to slow down, or the plan quota is used up.
    RateLimited,
    /// The request could not be delivered or timed out.
    Transport,
    /// The service answered with something we could not use.
    InvalidResponse,
}

impl Display for SearchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchErrorKind::Unauthorized => "unauthorized",
            SearchErrorKind::RateLimited => "rate limited",
            SearchErrorKind::Transport => "transport error",
            SearchErrorKind::InvalidResponse => "invalid response",
        };
        f.write_str(s)
    }
}

/// Error returned by a [`SearchBackend`](crate::SearchBackend).
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct SearchError {
    kind: SearchErrorKind,
    message: String,
}

impl SearchError {
    /// Creates an error of the given kind.
    #[inline]
    pub fn new<S: Into<String>>(kind: SearchErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_decode() {
            SearchErrorKind::InvalidResponse
        } else {
            SearchErrorKind::Transport
        };
        Self::new(kind, err.to_string())
    }

    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let kind = match status.as_u16() {
            401 | 403 => SearchErrorKind::Unauthorized,
            // Tavily answers 432/433 when the plan limit is exceeded.
            429 | 432 | 433 => SearchErrorKind::RateLimited,
            500..=599 => SearchErrorKind::Transport,
            _ => SearchErrorKind::InvalidResponse,
        };
        let message = if body.is_empty() {
            format!("server responded with {status}")
        } else {
            format!("server responded with {status}: {body}")
        };
        Self::new(kind, message)
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> SearchErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_kinds() {
        let cases = [
            (401, SearchErrorKind::Unauthorized),
            (403, SearchErrorKind::Unauthorized),
            (429, SearchErrorKind::RateLimited),
            (432, SearchErrorKind::RateLimited),
            (502, SearchErrorKind::Transport),
            (400, SearchErrorKind::InvalidResponse),
        ];
        for (code, kind) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(SearchError::from_status(status, "").kind(), kind, "{code}");
        }

        let err = SearchError::from_status(StatusCode::BAD_REQUEST, "bad topic");
        assert_eq!(
            err.to_string(),
            "invalid response: server responded with 400 Bad Request: bad topic"
        );
    }
}
