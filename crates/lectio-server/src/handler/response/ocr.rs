use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Text recognized in an image that was not persisted.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    pub extracted_text: String,
}
