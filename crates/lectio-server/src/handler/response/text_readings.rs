use jiff::Timestamp;
use lectio_postgres::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A stored OCR result and the image it was extracted from.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextReading {
    pub id: i64,
    /// Time the record was created.
    pub insert_date: Timestamp,
    /// Text extracted from the image.
    pub ocr_text: String,
    /// Path of the stored image, for example `static/images/3fa2c_scan.png`.
    pub file_path: String,
    /// Size of the stored image in bytes.
    pub file_size: i64,
}

impl From<model::TextReading> for TextReading {
    fn from(reading: model::TextReading) -> Self {
        Self {
            id: reading.id,
            insert_date: reading.insert_date.into(),
            ocr_text: reading.ocr_text,
            file_path: reading.file_path,
            file_size: reading.file_size,
        }
    }
}

/// List of text readings, oldest first.
pub type TextReadings = Vec<TextReading>;

/// Acknowledgement of a deletion.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub message: String,
}

impl Deleted {
    pub fn text_reading() -> Self {
        Self {
            message: "TextReading and associated file deleted".to_owned(),
        }
    }
}
