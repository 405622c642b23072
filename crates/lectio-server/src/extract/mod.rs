//! Request extractors with structured rejections.
//!
//! - [`AuthHeader`] and [`AuthState`] verify the bearer token of a request.
//! - [`Json`], [`ValidateJson`], [`Path`], [`Query`] and [`Multipart`] replace
//!   their axum counterparts and render rejections as [`Error`] responses.
//!
//! [`Error`]: crate::handler::Error

pub mod auth;
pub mod reject;

pub use crate::extract::auth::{AuthHeader, AuthState};
pub use crate::extract::reject::{Json, Multipart, Path, Query, UploadedFile, ValidateJson};
