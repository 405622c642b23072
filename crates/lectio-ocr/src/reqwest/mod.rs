//! HTTP transport for the OCR service, built on `reqwest`.

mod client;
mod config;

pub use client::ReqwestOcrClient;
pub use config::{ConnectionStrategy, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, OcrClientConfig};
