//! Path and query parameter types for HTTP handlers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Path parameters for text reading operations.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextReadingPathParams {
    /// Unique identifier of the text reading.
    pub id: i64,
}

/// Query parameters of the streaming session handshake.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamQueryParams {
    /// Identity token issued by `/login`.
    #[serde(default)]
    pub token: Option<String>,
}
