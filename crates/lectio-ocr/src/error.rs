//! OCR client error types.

use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with the OCR [`Error`] type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of failures of a remote recognition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The remote service could not be reached.
    UpstreamUnavailable,
    /// The call did not complete before its deadline.
    UpstreamTimeout,
    /// The remote service answered with an error.
    RecognitionFailed,
    /// The client could not be constructed from its configuration.
    Configuration,
}

/// A structured OCR client error.
#[derive(Debug, Error)]
#[error("{kind}{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new upstream unavailable error.
    pub fn upstream_unavailable() -> Self {
        Self::new(ErrorKind::UpstreamUnavailable)
    }

    /// Creates a new upstream timeout error.
    pub fn upstream_timeout() -> Self {
        Self::new(ErrorKind::UpstreamTimeout)
    }

    /// Creates a new recognition failed error.
    pub fn recognition_failed() -> Self {
        Self::new(ErrorKind::RecognitionFailed)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::upstream_timeout()
                .with_message(err.to_string())
                .with_source(err)
        } else if err.is_connect() || err.is_request() {
            Error::upstream_unavailable()
                .with_message("connection failed")
                .with_source(err)
        } else if err.is_builder() {
            Error::configuration()
                .with_message(err.to_string())
                .with_source(err)
        } else {
            Error::recognition_failed()
                .with_message(err.to_string())
                .with_source(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let error = Error::upstream_timeout().with_message("deadline of 30s elapsed");
        assert_eq!(error.to_string(), "upstream_timeout: deadline of 30s elapsed");
    }

    #[test]
    fn display_without_message() {
        let error = Error::recognition_failed();
        assert_eq!(error.to_string(), "recognition_failed");
        assert_eq!(error.kind().as_ref(), "recognition_failed");
    }
}
