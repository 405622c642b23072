use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::users;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2id hash in PHC string format.
    pub password_hash: String,
    pub created_at: Timestamp,
}

/// Data for registering a user.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}
