//! Ed25519 key pair used to sign and verify bearer tokens.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(any(test, feature = "config"))]
use clap::Args;
use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};

use crate::utility::tracing_targets::SESSION_KEYS as TRACING_TARGET;
use crate::{Error, Result};

/// Locations of the PEM files holding the token signing key pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(any(test, feature = "config"), derive(Args))]
pub struct SessionKeysConfig {
    /// Ed25519 public key used to verify tokens.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "AUTH_PUBLIC_PEM_FILEPATH", default_value = "./public.pem")
    )]
    #[serde(default = "SessionKeysConfig::default_decoding_key")]
    pub decoding_key: PathBuf,

    /// Ed25519 private key used to sign tokens.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(
            long,
            env = "AUTH_PRIVATE_PEM_FILEPATH",
            default_value = "./private.pem"
        )
    )]
    #[serde(default = "SessionKeysConfig::default_encoding_key")]
    pub encoding_key: PathBuf,
}

impl SessionKeysConfig {
    fn default_decoding_key() -> PathBuf {
        "./public.pem".into()
    }

    fn default_encoding_key() -> PathBuf {
        "./private.pem".into()
    }
}

impl Default for SessionKeysConfig {
    fn default() -> Self {
        Self {
            decoding_key: Self::default_decoding_key(),
            encoding_key: Self::default_encoding_key(),
        }
    }
}

/// Loaded signing and verification keys, cheap to clone.
#[derive(Clone)]
pub struct SessionKeys {
    inner: Arc<SessionKeysInner>,
}

struct SessionKeysInner {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    config: SessionKeysConfig,
}

impl SessionKeys {
    /// Reads both PEM files named by `config`.
    ///
    /// Fails with a configuration error when either file is missing or does
    /// not hold an Ed25519 key.
    pub async fn from_config(config: &SessionKeysConfig) -> Result<Self> {
        Self::validate_config(config)?;

        tracing::debug!(
            target: TRACING_TARGET,
            decoding_key_path = %config.decoding_key.display(),
            encoding_key_path = %config.encoding_key.display(),
            "loading token signing keys",
        );

        let decoding_pem = Self::read_pem(&config.decoding_key).await?;
        let decoding_key = DecodingKey::from_ed_pem(&decoding_pem).map_err(|err| {
            Error::config("Invalid public key PEM format").with_source(err)
        })?;

        let encoding_pem = Self::read_pem(&config.encoding_key).await?;
        let encoding_key = EncodingKey::from_ed_pem(&encoding_pem).map_err(|err| {
            Error::config("Invalid private key PEM format").with_source(err)
        })?;

        tracing::info!(target: TRACING_TARGET, "token signing keys loaded");

        Ok(Self {
            inner: Arc::new(SessionKeysInner {
                decoding_key,
                encoding_key,
                config: config.clone(),
            }),
        })
    }

    /// Convenience wrapper around [`SessionKeys::from_config`].
    pub async fn new(
        decoding_pem_key: impl AsRef<Path>,
        encoding_pem_key: impl AsRef<Path>,
    ) -> Result<Self> {
        let config = SessionKeysConfig {
            decoding_key: decoding_pem_key.as_ref().to_path_buf(),
            encoding_key: encoding_pem_key.as_ref().to_path_buf(),
        };

        Self::from_config(&config).await
    }

    /// Builds keys directly from PEM contents.
    pub fn from_pem(decoding_pem: &[u8], encoding_pem: &[u8]) -> Result<Self> {
        let decoding_key = DecodingKey::from_ed_pem(decoding_pem).map_err(|err| {
            Error::config("Invalid public key PEM format").with_source(err)
        })?;
        let encoding_key = EncodingKey::from_ed_pem(encoding_pem).map_err(|err| {
            Error::config("Invalid private key PEM format").with_source(err)
        })?;

        Ok(Self {
            inner: Arc::new(SessionKeysInner {
                decoding_key,
                encoding_key,
                config: SessionKeysConfig::default(),
            }),
        })
    }

    #[inline]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.inner.decoding_key
    }

    #[inline]
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.inner.encoding_key
    }

    #[inline]
    pub fn config(&self) -> &SessionKeysConfig {
        &self.inner.config
    }

    fn validate_config(config: &SessionKeysConfig) -> Result<()> {
        if !config.decoding_key.is_file() {
            return Err(Error::config(format!(
                "Public key file not found: {}",
                config.decoding_key.display()
            )));
        }

        if !config.encoding_key.is_file() {
            return Err(Error::config(format!(
                "Private key file not found: {}",
                config.encoding_key.display()
            )));
        }

        Ok(())
    }

    async fn read_pem(path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET,
                path = %path.display(),
                error = %err,
                "failed to read key file",
            );
            Error::config("Failed to read key file").with_source(err)
        })
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
