//! Diesel models for querying, inserting and updating records.

mod text_reading;
mod user;

pub use text_reading::{NewTextReading, TextReading, UpdateTextReading};
pub use user::{NewUser, User};
