//! Repository traits implemented on [`PgConnection`].
//!
//! [`PgConnection`]: crate::PgConnection

pub mod text_reading;
pub mod user;

pub use text_reading::TextReadingRepository;
pub use user::UserRepository;
