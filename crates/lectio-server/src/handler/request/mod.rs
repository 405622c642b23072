//! Request types for HTTP handlers.

mod authentications;
mod paths;
mod text_readings;

pub use authentications::*;
pub use paths::*;
pub use text_readings::*;
