//! Application state and dependency injection.

mod config;
mod security;
mod state;
mod storage;
mod store;
mod submission;

pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::service::security::{
    PasswordHasher, SessionKeys, SessionKeysConfig, TokenClaims, TokenConfig, TokenError,
    TokenService,
};
#[cfg(test)]
pub(crate) use crate::service::state::tests::test_state;
pub use crate::service::state::ServiceState;
pub use crate::service::storage::{ImageStorage, StorageConfig, StoredImage, content_type_for};
pub use crate::service::store::{
    PgStore, ResultStore, SharedResultStore, SharedUserStore, UserStore,
};
pub use crate::service::submission::SubmissionService;
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};
