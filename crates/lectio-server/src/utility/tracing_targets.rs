//! Centralized tracing target constants for structured logging.
//!
//! Handlers declare their own `TRACING_TARGET`; the constants here cover the
//! services and middleware shared between them.

/// Bearer and query token extraction and verification.
pub const AUTHENTICATION: &str = "lectio_server::authentication";

/// Token issuance and verification.
pub const TOKEN_SERVICE: &str = "lectio_server::token_service";

/// Session key loading.
pub const SESSION_KEYS: &str = "lectio_server::session_keys";

/// Password hashing and verification.
pub const PASSWORD_HASHER: &str = "lectio_server::password_hasher";

/// Image storage on the local filesystem.
pub const IMAGE_STORAGE: &str = "lectio_server::image_storage";

/// Submission and deletion of text readings.
pub const SUBMISSION: &str = "lectio_server::submission";

/// Middleware errors and timeouts.
pub const RECOVERY_ERROR: &str = "lectio_server::recovery::error";

/// Handler panics.
pub const RECOVERY_PANIC: &str = "lectio_server::recovery::panic";

/// Service state lifecycle.
pub const SERVICE_STATE: &str = "lectio_server::service_state";
