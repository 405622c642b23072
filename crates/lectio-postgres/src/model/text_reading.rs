//! Text reading models.
//!
//! A text reading links the OCR output of an image to the path of the stored
//! image file. The path is unique, so a file is referenced by at most one record.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::text_readings;

/// A persisted OCR result.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = text_readings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TextReading {
    /// Unique record identifier.
    pub id: i64,
    /// Timestamp when the record was created.
    pub insert_date: Timestamp,
    /// Text extracted from the image.
    pub ocr_text: String,
    /// Path of the stored image, relative to the working directory.
    pub file_path: String,
    /// Size of the stored image in bytes.
    pub file_size: i64,
}

/// Data for creating a text reading.
#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = text_readings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewTextReading {
    pub ocr_text: String,
    pub file_path: String,
    pub file_size: i64,
}

/// Data for updating a text reading. Only the text is mutable.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = text_readings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateTextReading {
    pub ocr_text: Option<String>,
}
