//! Scripted OCR provider for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;

use crate::{Error, ErrorKind, OcrProvider, Result};

type Script = dyn Fn(usize, &[u8]) -> Result<String> + Send + Sync;

/// OCR provider whose answers are produced by a closure.
///
/// The closure receives the zero-based call index and the payload. Clones
/// share the call counter, so a test can keep one handle for assertions.
#[derive(Clone)]
pub struct MockOcrProvider {
    script: Arc<Script>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockOcrProvider {
    /// Creates a provider driven by `script`.
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(usize, &[u8]) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            script: Arc::new(script),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always returns `text`.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// Always fails with `kind`.
    pub fn failing(kind: ErrorKind) -> Self {
        Self::new(move |_, _| Err(Error::new(kind).with_message("scripted failure")))
    }

    /// Succeeds with `text` on even calls and fails with `kind` on odd calls.
    pub fn alternating(text: impl Into<String>, kind: ErrorKind) -> Self {
        let text = text.into();
        Self::new(move |index, _| {
            if index % 2 == 0 {
                Ok(text.clone())
            } else {
                Err(Error::new(kind).with_message("scripted failure"))
            }
        })
    }

    /// Delays every answer by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl OcrProvider for MockOcrProvider {
    async fn recognize(&self, image: Bytes) -> Result<String> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.script)(index, &image)
    }
}

impl std::fmt::Debug for MockOcrProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockOcrProvider")
            .field("delay", &self.delay)
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}
