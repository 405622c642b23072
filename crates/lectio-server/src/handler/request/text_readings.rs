use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for replacing the extracted text of a record.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextReading {
    /// The corrected text. May be empty.
    #[validate(length(max = 1048576))]
    pub ocr_text: String,
}
