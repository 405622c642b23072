//! Request extractors whose rejections render as [`Error`] responses.
//!
//! [`Error`]: crate::handler::Error

mod json;
mod multipart;
mod path;
mod query;
mod validated_json;

pub use self::json::Json;
pub use self::multipart::{Multipart, UploadedFile};
pub use self::path::Path;
pub use self::query::Query;
pub use self::validated_json::ValidateJson;
