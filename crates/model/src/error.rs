use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The content is moderated.
    Moderated,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The request didn't finish in time.
    Timeout,
    /// The connection failed or the server had a transient failure.
    Transport,
    /// Any other errors.
    Other,
}

impl ErrorKind {
    /// Returns `true` if sending the same request again may succeed.
    #[inline]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimitExceeded
                | ErrorKind::Timeout
                | ErrorKind::Transport
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Moderated => write!(f, "content moderated"),
            ErrorKind::RateLimitExceeded => write!(f, "rate limit exceeded"),
            ErrorKind::Timeout => write!(f, "timed out"),
            ErrorKind::Transport => write!(f, "transport error"),
            ErrorKind::Other => write!(f, "model error"),
        }
    }
}
