//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! Routes under `/api` require a bearer token. Registration, login and the
//! streaming endpoint are public; `/ws` authenticates its own handshake.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod authentication;
mod error;
mod ocr;
pub mod request;
pub mod response;
mod text_readings;
mod websocket;

use aide::axum::ApiRouter;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::middleware::{OpenApiConfig, RouterOpenApiExt, require_authentication};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns an [`ApiRouter`] with all private routes.
fn private_routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(text_readings::routes())
        .merge(ocr::routes())
}

/// Returns an [`ApiRouter`] with all public routes.
fn public_routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(authentication::routes())
        .merge(websocket::routes())
}

/// Returns an [`ApiRouter`] with all routes.
pub fn openapi_routes(state: ServiceState) -> ApiRouter<ServiceState> {
    let require_authentication = from_fn_with_state(state, require_authentication);

    // Private routes with authentication middleware
    let private_router = private_routes().route_layer(require_authentication);

    ApiRouter::new()
        .merge(private_router)
        .merge(public_routes())
        .fallback(handler)
}

/// Returns the finished router with the OpenAPI document and state applied.
///
/// Middleware from [`crate::middleware`] is layered on by the caller.
pub fn router(state: ServiceState, open_api: &OpenApiConfig) -> Router {
    openapi_routes(state.clone())
        .with_open_api(open_api)
        .with_state(state)
}
