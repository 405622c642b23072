//! Service layer error types.
//!
//! [`ErrorKind`] is the gateway's failure taxonomy. Every service operation
//! reports one of these kinds, and the handler boundary maps each kind to a
//! stable HTTP status.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use lectio_postgres::PgError;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for service layer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kind enumeration for categorizing service layer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request body, missing file or bad identifier.
    InvalidInput,
    /// Missing, invalid or expired token, or wrong credentials.
    Unauthenticated,
    /// Duplicate username on registration.
    Conflict,
    /// The OCR remote could not be reached.
    UpstreamUnavailable,
    /// The OCR remote did not answer before the deadline.
    UpstreamTimeout,
    /// The OCR remote answered with an error.
    RecognitionFailed,
    /// Unknown record identifier.
    NotFound,
    /// Filesystem or database I/O failure.
    StorageFailure,
    /// Invalid startup configuration.
    Config,
}

impl ErrorKind {
    /// Returns the error kind as a string for categorization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Unauthenticated => "unauthenticated",
            Self::Conflict => "conflict",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::UpstreamTimeout => "upstream_timeout",
            Self::RecognitionFailed => "recognition_failed",
            Self::NotFound => "not_found",
            Self::StorageFailure => "storage_failure",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service layer error with structured information.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new [`Error`].
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error to this error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn invalid_input(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    #[inline]
    pub fn unauthenticated(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    #[inline]
    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    #[inline]
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    #[inline]
    pub fn storage(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::StorageFailure, message)
    }

    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }
}

impl From<lectio_ocr::Error> for Error {
    fn from(err: lectio_ocr::Error) -> Self {
        use lectio_ocr::ErrorKind as OcrErrorKind;

        let (kind, message) = match err.kind() {
            OcrErrorKind::UpstreamUnavailable => {
                (ErrorKind::UpstreamUnavailable, "Could not connect to OCR server")
            }
            OcrErrorKind::UpstreamTimeout => {
                (ErrorKind::UpstreamTimeout, "Could not perform OCR operation")
            }
            OcrErrorKind::RecognitionFailed => {
                (ErrorKind::RecognitionFailed, "Could not perform OCR operation")
            }
            OcrErrorKind::Configuration => (ErrorKind::Config, "OCR client is misconfigured"),
        };

        Self::new(kind, message).with_source(err)
    }
}

impl From<PgError> for Error {
    fn from(err: PgError) -> Self {
        Self::storage("Database operation failed").with_source(err)
    }
}
