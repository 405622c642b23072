//! Bearer token extraction and verification.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use axum_extra::typed_header::TypedHeaderRejectionReason;

use crate::handler::{Error, ErrorKind, Result};
use crate::service::{TokenClaims, TokenError, TokenService};
use crate::utility::tracing_targets::AUTHENTICATION as TRACING_TARGET;

/// Claims of a bearer token that passed signature and expiry checks.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    claims: TokenClaims,
}

impl AuthHeader {
    #[inline]
    pub const fn as_claims(&self) -> &TokenClaims {
        &self.claims
    }

    #[inline]
    pub fn into_claims(self) -> TokenClaims {
        self.claims
    }

    /// Verifies a raw token string.
    pub fn from_token(token: &str, token_service: &TokenService) -> Result<Self> {
        let claims = token_service.verify_claims(token).map_err(Error::from)?;

        tracing::debug!(
            target: TRACING_TARGET,
            subject = %claims.subject,
            token_id = %claims.token_id,
            "bearer token verified",
        );

        Ok(Self { claims })
    }
}

impl From<TokenError> for Error<'static> {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Expired => ErrorKind::TokenExpired
                .with_message("Authentication session has expired")
                .with_resource("authentication"),
            TokenError::InvalidToken => ErrorKind::MalformedAuthToken
                .with_message("Invalid JWT token")
                .with_resource("authentication"),
        }
    }
}

impl<S> FromRequestParts<S> for AuthHeader
where
    S: Sync + Send,
    TokenService: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth_header) = parts.extensions.get::<Self>() {
            return Ok(auth_header.clone());
        }

        type AuthBearerHeader = TypedHeader<Authorization<Bearer>>;

        let bearer = match AuthBearerHeader::from_request_parts(parts, state).await {
            Ok(TypedHeader(bearer)) => bearer,
            Err(rejection) => {
                let error = match rejection.reason() {
                    TypedHeaderRejectionReason::Missing => ErrorKind::MissingAuthToken
                        .with_message("Authentication required")
                        .with_context("Missing Authorization header with Bearer token")
                        .with_resource("authentication"),
                    _ => ErrorKind::MalformedAuthToken
                        .with_message("Invalid token format")
                        .with_context("Authorization header must contain a valid Bearer token")
                        .with_resource("authentication"),
                };

                tracing::debug!(target: TRACING_TARGET, error = %error, "bearer header rejected");
                return Err(error);
            }
        };

        let token_service = TokenService::from_ref(state);
        let auth_header = Self::from_token(bearer.token(), &token_service)?;
        parts.extensions.insert(auth_header.clone());
        Ok(auth_header)
    }
}

impl aide::OperationInput for AuthHeader {}
