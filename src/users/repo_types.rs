use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,                      // assigned by the store
    pub full_name: String,
    pub email: String,                // unique, immutable
    pub password_hash: String,        // Argon2 PHC string, never leaves the service
    pub created_at: OffsetDateTime,
}

/// Fields supplied by the caller when inserting a user.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}
