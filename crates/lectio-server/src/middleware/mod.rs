//! Middleware for `axum::Router` and HTTP request processing.
//!
//! Each concern is an extension trait on the router:
//! [`RouterRecoveryExt`], [`RouterObservabilityExt`], [`RouterSecurityExt`]
//! and [`RouterOpenApiExt`]. Authentication is a route layer built from
//! [`require_authentication`].

mod authentication;
mod observability;
mod recovery;
mod security;
mod specification;

pub use authentication::require_authentication;
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{DEFAULT_MAX_BODY_SIZE, RouterSecurityExt, SecurityConfig};
pub use specification::{OpenApiConfig, RouterOpenApiExt};
