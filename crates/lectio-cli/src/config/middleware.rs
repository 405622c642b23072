//! Middleware configuration for the HTTP server.
//!
//! The configs themselves live in `lectio-server`; this module groups them
//! for the CLI.

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use lectio_server::middleware::{OpenApiConfig, RecoveryConfig, SecurityConfig};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Largest accepted request timeout in seconds.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// OpenAPI, recovery and request size settings.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Paths where the OpenAPI document and Scalar UI are served.
    #[clap(flatten)]
    pub openapi: OpenApiConfig,

    /// Request timeout and panic recovery.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,

    /// Request body limits.
    #[clap(flatten)]
    pub security: SecurityConfig,
}

impl MiddlewareConfig {
    pub fn validate(&self) -> AnyhowResult<()> {
        let timeout = self.recovery.request_timeout;
        if timeout == 0 || timeout > MAX_REQUEST_TIMEOUT_SECS {
            return Err(anyhow!(
                "Request timeout {timeout} seconds is invalid. Must be between 1 and \
                 {MAX_REQUEST_TIMEOUT_SECS} seconds."
            ));
        }

        if self.security.max_body_size == 0 {
            return Err(anyhow!("Maximum body size must be greater than 0"));
        }

        Ok(())
    }

    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            openapi_path = %self.openapi.open_api_json,
            scalar_path = %self.openapi.scalar_ui,
            "openapi configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            max_body_size = self.security.max_body_size,
            "recovery and security configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MiddlewareConfig {
        MiddlewareConfig {
            openapi: OpenApiConfig::default(),
            recovery: RecoveryConfig::default(),
            security: SecurityConfig::default(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn reject_invalid_timeouts() {
        let mut config = config();

        config.recovery.request_timeout = 0;
        assert!(config.validate().is_err());

        config.recovery.request_timeout = 301;
        assert!(config.validate().is_err());
    }
}
