//! Deadline-bounded OCR service handle.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::{Error, OcrProvider, Result, TRACING_TARGET};

/// Default upper bound for a single recognition call.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Cheap-to-clone handle over an [`OcrProvider`] that bounds every call.
///
/// When the deadline fires the in-flight future is dropped and the caller
/// receives [`ErrorKind::UpstreamTimeout`]. The remote side may still finish
/// its work after the call has been abandoned.
///
/// [`ErrorKind::UpstreamTimeout`]: crate::ErrorKind::UpstreamTimeout
#[derive(Clone)]
pub struct OcrService {
    inner: Arc<dyn OcrProvider>,
    deadline: Duration,
}

impl OcrService {
    /// Wraps a provider with the default deadline.
    pub fn new<P>(provider: P) -> Self
    where
        P: OcrProvider + 'static,
    {
        Self::from_arc(Arc::new(provider))
    }

    /// Wraps an already shared provider with the default deadline.
    pub fn from_arc(provider: Arc<dyn OcrProvider>) -> Self {
        Self {
            inner: provider,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Sets the deadline applied by [`OcrService::recognize`].
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns the configured deadline.
    #[inline]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Recognizes text using the configured deadline.
    pub async fn recognize(&self, image: Bytes) -> Result<String> {
        self.recognize_within(image, self.deadline).await
    }

    /// Recognizes text, giving up once `deadline` has elapsed.
    pub async fn recognize_within(&self, image: Bytes, deadline: Duration) -> Result<String> {
        let payload_size = image.len();
        let start = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            payload_size,
            deadline_ms = deadline.as_millis(),
            "sending recognition request"
        );

        let result = match tokio::time::timeout(deadline, self.inner.recognize(image)).await {
            Ok(result) => result,
            Err(_) => Err(Error::upstream_timeout()
                .with_message(format!("no response within {}ms", deadline.as_millis()))),
        };

        match &result {
            Ok(text) => tracing::debug!(
                target: TRACING_TARGET,
                payload_size,
                text_length = text.len(),
                elapsed_ms = start.elapsed().as_millis(),
                "recognition completed"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET,
                payload_size,
                kind = %error.kind(),
                error = %error,
                elapsed_ms = start.elapsed().as_millis(),
                "recognition failed"
            ),
        }

        result
    }
}

impl fmt::Debug for OcrService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrService")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
