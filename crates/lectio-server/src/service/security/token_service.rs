//! Issues and verifies signed, time-bound identity tokens.

use std::borrow::Cow;
use std::time::Duration;

#[cfg(any(test, feature = "config"))]
use clap::Args;
use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SessionKeys;
use crate::utility::tracing_targets::TOKEN_SERVICE as TRACING_TARGET;
use crate::{Error, Result};

/// Token lifetime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(any(test, feature = "config"), derive(Args))]
pub struct TokenConfig {
    /// Seconds between issuing a token and its expiry.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "AUTH_TOKEN_TTL_SECS", default_value_t = 86400)
    )]
    #[serde(default = "TokenConfig::default_ttl_secs")]
    pub ttl_secs: u64,
}

impl TokenConfig {
    fn default_ttl_secs() -> u64 {
        86400
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Self::default_ttl_secs(),
        }
    }
}

/// Why a token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Malformed, unsigned or tampered token.
    #[error("invalid token")]
    InvalidToken,
    /// Well-formed and correctly signed, but past its expiry.
    #[error("token expired")]
    Expired,
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    #[serde(rename = "iss")]
    issued_by: Cow<'static, str>,
    #[serde(rename = "aud")]
    audience: Cow<'static, str>,

    #[serde(rename = "jti")]
    pub token_id: Uuid,
    #[serde(rename = "sub")]
    pub subject: String,

    #[serde(rename = "iat", with = "jiff::fmt::serde::timestamp::second::required")]
    pub issued_at: Timestamp,
    #[serde(rename = "exp", with = "jiff::fmt::serde::timestamp::second::required")]
    pub expires_at: Timestamp,
}

impl TokenClaims {
    const JWT_AUDIENCE: &str = "lectio:server";
    const JWT_ISSUER: &str = "lectio";

    fn new(subject: String, issued_at: Timestamp, ttl: Duration) -> Self {
        let ttl = SignedDuration::try_from(ttl).unwrap_or(SignedDuration::MAX);
        let expires_at = issued_at.checked_add(ttl).unwrap_or(Timestamp::MAX);

        Self {
            issued_by: Cow::Borrowed(Self::JWT_ISSUER),
            audience: Cow::Borrowed(Self::JWT_AUDIENCE),
            token_id: Uuid::new_v4(),
            subject,
            issued_at,
            expires_at,
        }
    }
}

/// Signs tokens with the Ed25519 session keys and checks them on the way back in.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: SessionKeys,
    ttl: Duration,
}

impl TokenService {
    pub fn new(keys: SessionKeys, config: &TokenConfig) -> Self {
        Self {
            keys,
            ttl: config.ttl(),
        }
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `subject` valid from now until now plus the TTL.
    pub fn issue(&self, subject: &str) -> Result<String> {
        self.issue_at(subject, Timestamp::now())
    }

    /// Issues a token as if it had been minted at `issued_at`.
    pub fn issue_at(&self, subject: &str, issued_at: Timestamp) -> Result<String> {
        let claims = TokenClaims::new(subject.to_owned(), issued_at, self.ttl);
        let header = Header::new(Algorithm::EdDSA);

        let token = encode(&header, &claims, self.keys.encoding_key()).map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %err,
                "failed to sign token",
            );
            Error::config("Authentication token generation failed").with_source(err)
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            token_id = %claims.token_id,
            expires_at = %claims.expires_at,
            "token issued",
        );

        Ok(token)
    }

    /// Returns the subject of a valid token.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_claims(token).map(|claims| claims.subject)
    }

    /// Returns every claim of a valid token.
    pub fn verify_claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_audience(&[TokenClaims::JWT_AUDIENCE]);
        validation.set_issuer(&[TokenClaims::JWT_ISSUER]);
        validation.set_required_spec_claims(&["iss", "aud", "sub", "iat", "exp"]);

        let token_data = decode::<TokenClaims>(token, self.keys.decoding_key(), &validation)
            .map_err(|err| match err.kind() {
                JwtErrorKind::ExpiredSignature => {
                    tracing::debug!(target: TRACING_TARGET, "token expired");
                    TokenError::Expired
                }
                kind => {
                    tracing::debug!(target: TRACING_TARGET, reason = ?kind, "token rejected");
                    TokenError::InvalidToken
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::security::session_keys::tests::test_keys;

    fn service(ttl_secs: u64) -> TokenService {
        TokenService::new(test_keys(), &TokenConfig { ttl_secs })
    }

    #[test]
    fn issued_token_verifies_to_subject() -> anyhow::Result<()> {
        let tokens = service(60);
        let token = tokens.issue("1")?;

        assert_eq!(tokens.verify(&token), Ok("1".to_owned()));
        Ok(())
    }

    #[test]
    fn claims_span_the_ttl() -> anyhow::Result<()> {
        let tokens = service(3600);
        let token = tokens.issue("alice")?;
        let claims = tokens.verify_claims(&token).map_err(anyhow::Error::from)?;

        let lifetime = claims.issued_at.duration_until(claims.expires_at);
        assert_eq!(lifetime, SignedDuration::from_secs(3600));
        Ok(())
    }

    #[test]
    fn lapsed_token_is_expired() -> anyhow::Result<()> {
        let tokens = service(60);
        let issued_at = Timestamp::now() - SignedDuration::from_secs(120);
        let token = tokens.issue_at("1", issued_at)?;

        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
        Ok(())
    }

    #[test]
    fn tampered_token_is_invalid() -> anyhow::Result<()> {
        let tokens = service(60);
        let token = tokens.issue("1")?;

        for index in 0..token.len() {
            let mut tampered = token.clone().into_bytes();
            tampered[index] = if tampered[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(tampered)?;

            assert_eq!(
                tokens.verify(&tampered),
                Err(TokenError::InvalidToken),
                "byte {index} flipped",
            );
        }
        Ok(())
    }

    #[test]
    fn garbage_is_invalid() {
        let tokens = service(60);
        assert_eq!(tokens.verify(""), Err(TokenError::InvalidToken));
        assert_eq!(tokens.verify("not.a.jwt"), Err(TokenError::InvalidToken));
    }
}
