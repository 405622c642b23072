//! Credential handling: password hashing, signing keys and identity tokens.

mod password_hasher;
pub(crate) mod session_keys;
mod token_service;

pub use password_hasher::PasswordHasher;
pub use session_keys::{SessionKeys, SessionKeysConfig};
pub use token_service::{TokenClaims, TokenConfig, TokenError, TokenService};
