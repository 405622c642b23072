use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use derive_more::Deref;

use super::AuthHeader;
use crate::handler::Error;
use crate::service::{TokenClaims, TokenService};

/// The authenticated caller of a request.
///
/// Tokens are self-contained, so no store lookup is made. The state is
/// cached in the request extensions after the first extraction.
#[derive(Debug, Clone, Deref, PartialEq, Eq)]
pub struct AuthState(pub TokenClaims);

impl AuthState {
    /// Subject the token was issued to.
    #[inline]
    pub fn subject(&self) -> &str {
        &self.0.subject
    }
}

impl<S> FromRequestParts<S> for AuthState
where
    S: Sync + Send,
    TokenService: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth_state) = parts.extensions.get::<Self>() {
            return Ok(auth_state.clone());
        }

        let auth_header = AuthHeader::from_request_parts(parts, state).await?;
        let auth_state = Self(auth_header.into_claims());
        parts.extensions.insert(auth_state.clone());
        Ok(auth_state)
    }
}

impl aide::OperationInput for AuthState {}
