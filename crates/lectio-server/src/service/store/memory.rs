//! In-process stores for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use jiff::Timestamp;
use lectio_postgres::model::{NewTextReading, NewUser, TextReading, User};

use super::{ResultStore, UserStore};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    readings: BTreeMap<i64, TextReading>,
    users: BTreeMap<i64, User>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Map-backed store implementing both store traits.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reading_count(&self) -> usize {
        self.tables.lock().map(|t| t.readings.len()).unwrap_or_default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| Error::storage("memory store poisoned"))?;
        Ok(f(&mut tables))
    }
}

#[async_trait::async_trait]
impl ResultStore for MemoryStore {
    async fn create(&self, new_reading: NewTextReading) -> Result<TextReading> {
        self.with_tables(|tables| {
            // Mirrors the unique constraint on `text_readings.file_path`.
            let path_taken = tables
                .readings
                .values()
                .any(|r| r.file_path == new_reading.file_path);
            if path_taken {
                return Err(Error::storage("Database operation failed"));
            }

            let id = tables.next_id();
            let reading = TextReading {
                id,
                insert_date: Timestamp::now().into(),
                ocr_text: new_reading.ocr_text,
                file_path: new_reading.file_path,
                file_size: new_reading.file_size,
            };
            tables.readings.insert(id, reading.clone());
            Ok(reading)
        })?
    }

    async fn list(&self) -> Result<Vec<TextReading>> {
        self.with_tables(|tables| tables.readings.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<TextReading>> {
        self.with_tables(|tables| tables.readings.get(&id).cloned())
    }

    async fn update_text(&self, id: i64, ocr_text: String) -> Result<Option<TextReading>> {
        self.with_tables(|tables| {
            tables.readings.get_mut(&id).map(|reading| {
                reading.ocr_text = ocr_text;
                reading.clone()
            })
        })
    }

    async fn delete(&self, id: i64) -> Result<Option<TextReading>> {
        self.with_tables(|tables| tables.readings.remove(&id))
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.with_tables(|tables| {
            if tables.users.values().any(|u| u.username == new_user.username) {
                return Err(Error::conflict("User with this name already exists"));
            }

            let id = tables.next_id();
            let user = User {
                id,
                username: new_user.username,
                password_hash: new_user.password_hash,
                created_at: Timestamp::now().into(),
            };
            tables.users.insert(id, user.clone());
            Ok(user)
        })?
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_tables(|tables| {
            tables
                .users
                .values()
                .find(|u| u.username == username)
                .cloned()
        })
    }
}

/// Result store whose writes always fail. Reads see an empty table.
#[derive(Debug, Default)]
pub(crate) struct FailingStore {
    create_calls: AtomicUsize,
}

impl FailingStore {
    pub(crate) fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ResultStore for FailingStore {
    async fn create(&self, _new_reading: NewTextReading) -> Result<TextReading> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::storage("Database operation failed"))
    }

    async fn list(&self) -> Result<Vec<TextReading>> {
        Ok(Vec::new())
    }

    async fn get(&self, _id: i64) -> Result<Option<TextReading>> {
        Ok(None)
    }

    async fn update_text(&self, _id: i64, _ocr_text: String) -> Result<Option<TextReading>> {
        Err(Error::storage("Database operation failed"))
    }

    async fn delete(&self, _id: i64) -> Result<Option<TextReading>> {
        Err(Error::storage("Database operation failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_reading(file_path: &str) -> NewTextReading {
        NewTextReading {
            ocr_text: "HELLO".to_owned(),
            file_path: file_path.to_owned(),
            file_size: 3,
        }
    }

    #[tokio::test]
    async fn duplicate_file_path_is_rejected() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.create(new_reading("static/images/abcde_a.png")).await?;

        let error = store
            .create(new_reading("static/images/abcde_a.png"))
            .await
            .expect_err("file paths are unique");
        assert_eq!(error.kind(), crate::ErrorKind::StorageFailure);
        assert_eq!(store.reading_count(), 1);

        store.create(new_reading("static/images/12345_a.png")).await?;
        assert_eq!(store.reading_count(), 2);
        Ok(())
    }
}
