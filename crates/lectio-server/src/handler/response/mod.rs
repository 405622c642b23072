//! Response types for HTTP handlers.

mod authentications;
mod errors;
mod ocr;
mod text_readings;

pub use authentications::*;
pub use errors::*;
pub use ocr::*;
pub use text_readings::*;
