//! Text reading repository.

use std::future::Future;

use diesel::dsl::{Asc, Order};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{NewTextReading, TextReading, UpdateTextReading};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for text reading database operations.
pub trait TextReadingRepository {
    /// Inserts a record; the insertion date is assigned by the database.
    fn create_text_reading(
        &mut self,
        new_reading: NewTextReading,
    ) -> impl Future<Output = PgResult<TextReading>> + Send;

    /// Lists all records, oldest first.
    fn list_text_readings(&mut self) -> impl Future<Output = PgResult<Vec<TextReading>>> + Send;

    fn find_text_reading_by_id(
        &mut self,
        reading_id: i64,
    ) -> impl Future<Output = PgResult<Option<TextReading>>> + Send;

    /// Applies the update, returning `None` if the record does not exist.
    fn update_text_reading(
        &mut self,
        reading_id: i64,
        updates: UpdateTextReading,
    ) -> impl Future<Output = PgResult<Option<TextReading>>> + Send;

    /// Deletes a record, returning it, or `None` if it did not exist.
    fn delete_text_reading(
        &mut self,
        reading_id: i64,
    ) -> impl Future<Output = PgResult<Option<TextReading>>> + Send;
}

/// All text readings in insertion order.
fn oldest_first() -> Order<schema::text_readings::table, Asc<schema::text_readings::id>> {
    use schema::text_readings::{self, dsl};

    text_readings::table.order(dsl::id.asc())
}

impl TextReadingRepository for PgConnection {
    async fn create_text_reading(&mut self, new_reading: NewTextReading) -> PgResult<TextReading> {
        use schema::text_readings;

        let reading = diesel::insert_into(text_readings::table)
            .values(&new_reading)
            .returning(TextReading::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            reading_id = reading.id,
            file_path = %reading.file_path,
            "text reading created"
        );

        Ok(reading)
    }

    async fn list_text_readings(&mut self) -> PgResult<Vec<TextReading>> {
        oldest_first()
            .select(TextReading::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_text_reading_by_id(&mut self, reading_id: i64) -> PgResult<Option<TextReading>> {
        use schema::text_readings::{self, dsl};

        text_readings::table
            .filter(dsl::id.eq(reading_id))
            .select(TextReading::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn update_text_reading(
        &mut self,
        reading_id: i64,
        updates: UpdateTextReading,
    ) -> PgResult<Option<TextReading>> {
        use schema::text_readings::{self, dsl};

        diesel::update(text_readings::table.filter(dsl::id.eq(reading_id)))
            .set(&updates)
            .returning(TextReading::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn delete_text_reading(&mut self, reading_id: i64) -> PgResult<Option<TextReading>> {
        use schema::text_readings::{self, dsl};

        let deleted = diesel::delete(text_readings::table.filter(dsl::id.eq(reading_id)))
            .returning(TextReading::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        if deleted.is_some() {
            tracing::debug!(target: TRACING_TARGET_QUERY, reading_id, "text reading deleted");
        }

        Ok(deleted)
    }
}
