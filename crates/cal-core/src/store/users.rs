//! User storage

use rusqlite::{Connection, params};

use crate::Result;
use crate::model::User;

/// SQLite-based storage for users
pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    /// Create a new UserStore with the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    /// Create an in-memory UserStore (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Insert or replace a user
    pub fn save(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO users (id, name, email) VALUES (?1, ?2, ?3)",
            params![user.id, user.name, user.email],
        )?;
        Ok(())
    }

    /// Load a user by id
    pub fn get(&self, id: &str) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM users WHERE id = ?1")?;
        let result = stmt.query_row(params![id], |row| {
            Ok(User {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        });
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() -> Result<()> {
        let store = UserStore::in_memory()?;
        let user = User::new("Alice", "alice@example.com");
        store.save(&user)?;

        let loaded = store.get(&user.id)?.unwrap();
        assert_eq!(loaded.name, "Alice");
        assert_eq!(loaded.email, "alice@example.com");
        assert!(store.get("missing")?.is_none());
        Ok(())
    }
}
