//! Persistence boundary for users and text readings.
//!
//! Handlers and the submission service talk to these traits only. The
//! Postgres binding is used in production; tests swap in the in-memory store.

mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use std::sync::Arc;

use lectio_postgres::model::{NewTextReading, NewUser, TextReading, User};

pub use self::postgres::PgStore;
use crate::Result;

/// Shared handle to a [`ResultStore`].
pub type SharedResultStore = Arc<dyn ResultStore>;

/// Shared handle to a [`UserStore`].
pub type SharedUserStore = Arc<dyn UserStore>;

/// Create, list, get, update-text and delete for OCR results.
///
/// Lookups by unknown id return `Ok(None)`; translating that into a
/// not-found error is left to the caller.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    async fn create(&self, new_reading: NewTextReading) -> Result<TextReading>;

    /// Returns every record, oldest first.
    async fn list(&self) -> Result<Vec<TextReading>>;

    async fn get(&self, id: i64) -> Result<Option<TextReading>>;

    /// Replaces the recognized text of a record.
    async fn update_text(&self, id: i64, ocr_text: String) -> Result<Option<TextReading>>;

    async fn delete(&self, id: i64) -> Result<Option<TextReading>>;
}

/// Registered user accounts.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user, failing with a conflict when the name is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}
