use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Acknowledgement of a successful registration.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    pub message: String,
}

impl Registered {
    pub fn new() -> Self {
        Self {
            message: "User registered successfully".to_owned(),
        }
    }
}

impl Default for Registered {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed identity token returned by a successful login.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoggedIn {
    /// Bearer token for the `Authorization` header and the `token` query parameter.
    pub token: String,
}
