//! HTTP transport for the OCR service.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::{Client, header};
use serde::Deserialize;
use url::Url;

use super::{ConnectionStrategy, OcrClientConfig};
use crate::{Error, OcrProvider, OcrService, Result, TRACING_TARGET};

/// Body returned by the OCR service on success.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeResponse {
    extracted_text: String,
}

struct ReqwestOcrClientInner {
    http: Client,
    url: Url,
    config: OcrClientConfig,
}

/// OCR provider that posts raw image bytes to `{endpoint}/ocr`.
///
/// With [`ConnectionStrategy::Pooled`] every clone shares one connection pool.
/// With [`ConnectionStrategy::PerCall`] each call builds a client with pooling
/// disabled, so the connection is closed once the response has been read.
#[derive(Clone)]
pub struct ReqwestOcrClient {
    inner: Arc<ReqwestOcrClientInner>,
}

impl ReqwestOcrClient {
    /// Creates a new client from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`] if the endpoint cannot be used as a
    /// base URL or the HTTP client cannot be built.
    ///
    /// [`ErrorKind::Configuration`]: crate::ErrorKind::Configuration
    pub fn new(config: OcrClientConfig) -> Result<Self> {
        let url = config.recognize_url()?;
        let http = Self::build_http(&config, config.ocr_connection_strategy)?;

        tracing::info!(
            target: TRACING_TARGET,
            endpoint = %config.ocr_endpoint,
            strategy = %config.ocr_connection_strategy,
            timeout_ms = config.timeout().as_millis(),
            "ocr client created"
        );

        let inner = ReqwestOcrClientInner { http, url, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &OcrClientConfig {
        &self.inner.config
    }

    /// Wraps this client into an [`OcrService`] whose deadline matches the
    /// configured timeout.
    pub fn into_service(self) -> OcrService {
        let deadline = self.inner.config.timeout();
        OcrService::new(self).with_deadline(deadline)
    }

    fn build_http(config: &OcrClientConfig, strategy: ConnectionStrategy) -> Result<Client> {
        let builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent());

        let builder = match strategy {
            ConnectionStrategy::Pooled => builder,
            ConnectionStrategy::PerCall => builder.pool_max_idle_per_host(0),
        };

        Ok(builder.build()?)
    }

    fn http_for_call(&self) -> Result<Client> {
        match self.inner.config.ocr_connection_strategy {
            ConnectionStrategy::Pooled => Ok(self.inner.http.clone()),
            ConnectionStrategy::PerCall => {
                Self::build_http(&self.inner.config, ConnectionStrategy::PerCall)
            }
        }
    }
}

#[async_trait::async_trait]
impl OcrProvider for ReqwestOcrClient {
    async fn recognize(&self, image: Bytes) -> Result<String> {
        let http = self.http_for_call()?;

        let response = http
            .post(self.inner.url.clone())
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(
                target: TRACING_TARGET,
                status = status.as_u16(),
                body = %body,
                "ocr service rejected the request"
            );

            // Every non-2xx answer is a recognition failure, whatever the status.
            return Err(Error::recognition_failed()
                .with_message(format!("ocr service responded with {status}")));
        }

        let body: RecognizeResponse = response.json().await.map_err(|err| {
            Error::recognition_failed()
                .with_message("malformed ocr response")
                .with_source(err)
        })?;

        Ok(body.extracted_text)
    }
}

impl std::fmt::Debug for ReqwestOcrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestOcrClient")
            .field("url", &self.inner.url.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
