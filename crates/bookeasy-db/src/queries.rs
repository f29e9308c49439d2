use crate::models::{MessageRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, ErrorCode};

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub confirmation_token: &'a str,
}

impl Database {
    // -- Users --

    /// Returns `None` when the email is already taken.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (first_name, last_name, email, password, confirmation_token)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    user.first_name,
                    user.last_name,
                    user.email,
                    user.password_hash,
                    user.confirmation_token,
                ],
            );

            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    /// Marks the owner of `token` as confirmed and burns the token.
    /// Returns false when no user holds it.
    pub fn confirm_user(&self, token: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET is_confirmed = 1, confirmation_token = NULL
                 WHERE confirmation_token = ?1",
                [token],
            )?;
            Ok(updated > 0)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO messages (content) VALUES (?1)", [content])?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(query_messages)
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, content, created_at FROM messages WHERE id = ?1",
                [id],
                map_message,
            )
            .optional()
        })
    }

    /// Deletes every message. Returns the number of rows removed.
    pub fn clear_messages(&self) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM messages", [])?))
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, email, password, confirmation_token, is_confirmed, created_at
         FROM users WHERE email = ?1",
    )?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                password: row.get(4)?,
                confirmation_token: row.get(5)?,
                is_confirmed: row.get(6)?,
                created_at: row.get(7)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_messages(conn: &Connection) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare("SELECT id, content, created_at FROM messages ORDER BY id")?;

    let rows = stmt
        .query_map([], map_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        content: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice(token: &str) -> NewUser<'_> {
        NewUser {
            first_name: "Alice",
            last_name: "Smith",
            email: "alice@example.com",
            password_hash: "$argon2id$stub",
            confirmation_token: token,
        }
    }

    #[test]
    fn duplicate_email_is_reported_not_raised() {
        let db = Database::open_in_memory().unwrap();

        assert!(db.create_user(&alice("t1")).unwrap().is_some());
        assert!(db.create_user(&alice("t2")).unwrap().is_none());
    }

    #[test]
    fn confirm_burns_token() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&alice("tok")).unwrap();

        let user = db.get_user_by_email("alice@example.com").unwrap().unwrap();
        assert!(!user.is_confirmed);
        assert_eq!(user.confirmation_token.as_deref(), Some("tok"));

        assert!(db.confirm_user("tok").unwrap());
        assert!(!db.confirm_user("tok").unwrap());

        let user = db.get_user_by_email("alice@example.com").unwrap().unwrap();
        assert!(user.is_confirmed);
        assert!(user.confirmation_token.is_none());
    }

    #[test]
    fn unknown_email_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn clear_empties_the_listed_table() {
        let db = Database::open_in_memory().unwrap();
        let first = db.insert_message("hello").unwrap();
        db.insert_message("world").unwrap();

        let rows = db.get_messages().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, first);
        assert_eq!(db.get_message(first).unwrap().unwrap().content, "hello");

        assert_eq!(db.clear_messages().unwrap(), 2);
        assert!(db.get_messages().unwrap().is_empty());
        assert!(db.get_message(first).unwrap().is_none());
    }
}
