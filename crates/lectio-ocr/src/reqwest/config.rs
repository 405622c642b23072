//! Configuration for the HTTP OCR client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use url::Url;

use crate::{Error, Result};

/// Default OCR endpoint.
///
/// The service behind it must expose the HTTP `/ocr` route; a gRPC
/// recognizer on the same port is not compatible.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:50051";

/// Default timeout for recognition requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How connections to the OCR service are managed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "config", derive(ValueEnum))]
pub enum ConnectionStrategy {
    /// One connection pool shared by every caller.
    #[default]
    Pooled,
    /// A fresh connection per call, closed when the call completes.
    PerCall,
}

/// Configuration for [`ReqwestOcrClient`].
///
/// [`ReqwestOcrClient`]: super::ReqwestOcrClient
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct OcrClientConfig {
    /// Base URL of the OCR service.
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-endpoint", env = "OCR_ENDPOINT", default_value = DEFAULT_ENDPOINT)
    )]
    pub ocr_endpoint: Url,

    /// Upper bound for a single recognition call in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-timeout-secs", env = "OCR_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)
    )]
    pub ocr_timeout_secs: u64,

    /// Connection strategy towards the OCR service.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "ocr-connection-strategy",
            env = "OCR_CONNECTION_STRATEGY",
            value_enum,
            default_value_t = ConnectionStrategy::Pooled
        )
    )]
    pub ocr_connection_strategy: ConnectionStrategy,

    /// User-Agent header sent with every request.
    #[cfg_attr(feature = "config", arg(long = "ocr-user-agent", env = "OCR_USER_AGENT"))]
    pub ocr_user_agent: Option<String>,
}

impl Default for OcrClientConfig {
    fn default() -> Self {
        Self {
            ocr_endpoint: default_endpoint(),
            ocr_timeout_secs: DEFAULT_TIMEOUT_SECS,
            ocr_connection_strategy: ConnectionStrategy::default(),
            ocr_user_agent: None,
        }
    }
}

impl OcrClientConfig {
    /// Creates a configuration pointing at `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self {
            ocr_endpoint: endpoint,
            ..Self::default()
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.ocr_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the connection strategy.
    pub fn with_connection_strategy(mut self, strategy: ConnectionStrategy) -> Self {
        self.ocr_connection_strategy = strategy;
        self
    }

    /// Sets the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.ocr_user_agent = Some(user_agent.into());
        self
    }

    /// Returns the request timeout, falling back to the default when zero.
    pub fn timeout(&self) -> Duration {
        match self.ocr_timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns the User-Agent header, falling back to the crate default.
    pub fn user_agent(&self) -> String {
        match self.ocr_user_agent.as_deref() {
            Some(agent) if !agent.is_empty() => agent.to_owned(),
            _ => format!("lectio-ocr/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Returns the URL recognition requests are posted to.
    pub fn recognize_url(&self) -> Result<Url> {
        let mut url = self.ocr_endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::configuration()
                    .with_message(format!("endpoint {} cannot be a base url", self.ocr_endpoint))
            })?
            .pop_if_empty()
            .push("ocr");
        Ok(url)
    }
}

fn default_endpoint() -> Url {
    // The constant is a well-formed absolute URL.
    Url::parse(DEFAULT_ENDPOINT).unwrap_or_else(|_| unreachable!("invalid default endpoint"))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn defaults() {
        let config = OcrClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.ocr_connection_strategy, ConnectionStrategy::Pooled);
        assert!(config.user_agent().starts_with("lectio-ocr/"));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let config = OcrClientConfig::default().with_timeout(Duration::ZERO);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn recognize_url_appends_segment() -> anyhow::Result<()> {
        let config = OcrClientConfig::new(Url::parse("http://ocr.internal:8080/v1/")?);
        assert_eq!(
            config.recognize_url()?.as_str(),
            "http://ocr.internal:8080/v1/ocr"
        );

        let config = OcrClientConfig::new(Url::parse("http://ocr.internal:8080")?);
        assert_eq!(config.recognize_url()?.as_str(), "http://ocr.internal:8080/ocr");
        Ok(())
    }

    #[test]
    fn strategy_parses_kebab_case() -> anyhow::Result<()> {
        assert_eq!(
            <ConnectionStrategy as FromStr>::from_str("per-call")?,
            ConnectionStrategy::PerCall
        );
        assert_eq!(ConnectionStrategy::Pooled.as_ref(), "pooled");
        Ok(())
    }
}
