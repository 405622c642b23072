use lectio_postgres::model::{NewTextReading, NewUser, TextReading, UpdateTextReading, User};
use lectio_postgres::query::{TextReadingRepository, UserRepository};
use lectio_postgres::{PgClient, PgError};

use super::{ResultStore, UserStore};
use crate::{Error, Result};

/// Store backed by the Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pg_client: PgClient,
}

impl PgStore {
    pub fn new(pg_client: PgClient) -> Self {
        Self { pg_client }
    }

    #[inline]
    pub fn pg_client(&self) -> &PgClient {
        &self.pg_client
    }
}

#[async_trait::async_trait]
impl ResultStore for PgStore {
    async fn create(&self, new_reading: NewTextReading) -> Result<TextReading> {
        let mut conn = self.pg_client.get_connection().await?;
        Ok(conn.create_text_reading(new_reading).await?)
    }

    async fn list(&self) -> Result<Vec<TextReading>> {
        let mut conn = self.pg_client.get_connection().await?;
        Ok(conn.list_text_readings().await?)
    }

    async fn get(&self, id: i64) -> Result<Option<TextReading>> {
        let mut conn = self.pg_client.get_connection().await?;
        Ok(conn.find_text_reading_by_id(id).await?)
    }

    async fn update_text(&self, id: i64, ocr_text: String) -> Result<Option<TextReading>> {
        let updates = UpdateTextReading {
            ocr_text: Some(ocr_text),
        };

        let mut conn = self.pg_client.get_connection().await?;
        Ok(conn.update_text_reading(id, updates).await?)
    }

    async fn delete(&self, id: i64) -> Result<Option<TextReading>> {
        let mut conn = self.pg_client.get_connection().await?;
        Ok(conn.delete_text_reading(id).await?)
    }
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut conn = self.pg_client.get_connection().await?;
        conn.create_user(new_user).await.map_err(|err| match err {
            err @ PgError::Query(_) if err.is_unique_violation() => {
                Error::conflict("User with this name already exists").with_source(err)
            }
            err => err.into(),
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let mut conn = self.pg_client.get_connection().await?;
        Ok(conn.find_user_by_username(username).await?)
    }
}
