use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::extract::AuthState;

/// Rejects requests without a valid bearer token.
///
/// The verified [`AuthState`] is cached in the request extensions, so
/// handlers behind this layer can extract it again for free.
pub async fn require_authentication(
    AuthState(_): AuthState,
    request: Request,
    next: Next,
) -> Response {
    next.run(request).await
}
