#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod service;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod reqwest;

use bytes::Bytes;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::service::{DEFAULT_DEADLINE, OcrService};

/// Tracing target for OCR client operations.
pub const TRACING_TARGET: &str = "lectio_ocr::client";

/// Core trait for OCR providers.
///
/// A provider turns an opaque image payload into extracted text. Providers do
/// not enforce deadlines themselves; wrap them in an [`OcrService`] for that.
#[async_trait::async_trait]
pub trait OcrProvider: Send + Sync {
    /// Extracts text from the image payload.
    ///
    /// The payload encoding is not validated. An empty string is a valid result.
    async fn recognize(&self, image: Bytes) -> Result<String>;
}
