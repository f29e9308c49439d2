//! Database row types, mapped directly from SQLite rows.
//! Distinct from bookeasy-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    pub confirmation_token: Option<String>,
    pub is_confirmed: bool,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub content: String,
    pub created_at: String,
}
