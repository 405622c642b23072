//! Authentication request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for registration.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    /// Unique name of the account.
    #[validate(length(min = 1, max = 64))]
    pub username: String,

    /// Password of the account.
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Request payload for login.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Login {
    #[validate(length(min = 1, max = 64))]
    pub username: String,

    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_username_is_rejected() {
        let request = Register {
            username: String::new(),
            password: "secret".to_owned(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn oversized_password_is_rejected() {
        let request = Login {
            username: "alice".to_owned(),
            password: "x".repeat(257),
        };
        assert!(request.validate().is_err());
    }
}
