/// # Test Utilities Module
///
/// Isolated database fixtures for unit tests. Every fixture owns its own
/// in-memory database, so tests never share state.

use crate::core::db::{ConnectOptions, Dbal};
use crate::core::{DbalError, Result};

/// Isolated database test fixture
pub struct DatabaseFixture {
    pub dbal: Dbal,
}

impl DatabaseFixture {
    /// Create an empty in-memory database
    pub fn new() -> Result<Self> {
        let dbal = Dbal::connect(ConnectOptions::in_memory())?;
        Ok(DatabaseFixture { dbal })
    }

    /// Create fixture with the sample `users` / `orders` schema and data
    pub fn with_sample_data() -> Result<Self> {
        let fixture = Self::new()?;
        let conn = fixture.dbal.handle().ok_or(DbalError::NotConnected)?;

        conn.execute_batch(
            "
            CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE,
                age INTEGER DEFAULT 0
            );

            CREATE TABLE orders (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users (id),
                total REAL
            );

            INSERT INTO users (name, email, age) VALUES ('alice', 'alice@example.com', 30);
            INSERT INTO users (name, email, age) VALUES ('bob', 'bob@example.com', 25);
            INSERT INTO users (name, email) VALUES ('carol', NULL);

            INSERT INTO orders (user_id, total) VALUES (1, 9.5);
            INSERT INTO orders (user_id, total) VALUES (1, 20.0);
            ",
        )
        .map_err(|source| DbalError::Statement {
            sql: "sample schema".to_string(),
            source,
        })?;

        Ok(fixture)
    }
}
