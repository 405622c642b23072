//! Recognize, store and record an uploaded image as one unit.

use bytes::Bytes;
use lectio_ocr::OcrService;
use lectio_postgres::model::{NewTextReading, TextReading};

use super::{ImageStorage, SharedResultStore};
use crate::utility::tracing_targets::SUBMISSION as TRACING_TARGET;
use crate::{Error, Result};

/// Keeps stored images and text reading records in step.
///
/// A file is only left on disk when a record references it, and a record
/// is only removed after its file is gone.
#[derive(Clone)]
pub struct SubmissionService {
    ocr: OcrService,
    results: SharedResultStore,
    storage: ImageStorage,
}

impl SubmissionService {
    pub fn new(ocr: OcrService, results: SharedResultStore, storage: ImageStorage) -> Self {
        Self {
            ocr,
            results,
            storage,
        }
    }

    /// Recognizes `content`, stores it and records the result.
    ///
    /// Nothing is written when recognition fails. When the record cannot be
    /// created the stored file is removed again before the error is returned.
    pub async fn submit(&self, content: Bytes, original_name: &str) -> Result<TextReading> {
        let ocr_text = self.ocr.recognize(content.clone()).await?;

        let stored = self.storage.write(&content, original_name).await?;
        let new_reading = NewTextReading {
            ocr_text,
            file_path: stored.file_path.clone(),
            file_size: stored.file_size,
        };

        match self.results.create(new_reading).await {
            Ok(reading) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    reading_id = reading.id,
                    file_path = %reading.file_path,
                    file_size = reading.file_size,
                    "text reading created",
                );
                Ok(reading)
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    file_path = %stored.file_path,
                    error = %err,
                    "record write failed, removing stored image",
                );

                if let Err(cleanup) = self.storage.remove(&stored.file_path).await {
                    tracing::error!(
                        target: TRACING_TARGET,
                        file_path = %stored.file_path,
                        error = %cleanup,
                        "failed to remove orphaned image",
                    );
                }

                Err(Error::storage("Failed to save text reading").with_source(err))
            }
        }
    }

    /// Deletes a record together with its image.
    ///
    /// An already missing image is tolerated. Any other filesystem error
    /// keeps the record in place.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let reading = self
            .results
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("TextReading not found"))?;

        self.storage.remove(&reading.file_path).await?;

        self.results
            .delete(id)
            .await?
            .ok_or_else(|| Error::not_found("TextReading not found"))?;

        tracing::info!(
            target: TRACING_TARGET,
            reading_id = id,
            file_path = %reading.file_path,
            "text reading deleted",
        );

        Ok(())
    }
}

impl std::fmt::Debug for SubmissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionService")
            .field("ocr", &self.ocr)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}
