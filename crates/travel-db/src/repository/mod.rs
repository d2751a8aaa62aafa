//! Database repository implementation

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::error::DbError;

// Submodules
mod airports;
mod cities;
mod comments;
mod users;

/// Default upper bound on pooled connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection with the default pool size
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        Self::with_max_connections(database_url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Create a new database connection with a bounded pool
    pub async fn with_max_connections(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, DbError> {
        info!(
            "Connecting to database: {} (max connections: {})",
            database_url, max_connections
        );

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        const STATEMENTS: &[(&str, &str)] = &[
            (
                "users",
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    salt TEXT NOT NULL,
                    role TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )
                "#,
            ),
            (
                "cities",
                r#"
                CREATE TABLE IF NOT EXISTS cities (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    country TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )
                "#,
            ),
            (
                "idx_cities_natural_key",
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_cities_natural_key
                ON cities(name COLLATE NOCASE, country COLLATE NOCASE)
                "#,
            ),
            (
                "airports",
                r#"
                CREATE TABLE IF NOT EXISTS airports (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    city_id INTEGER NOT NULL REFERENCES cities(id),
                    name TEXT NOT NULL,
                    code TEXT NOT NULL
                )
                "#,
            ),
            (
                "routes",
                r#"
                CREATE TABLE IF NOT EXISTS routes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    source_id INTEGER NOT NULL REFERENCES airports(id),
                    destination_id INTEGER NOT NULL REFERENCES airports(id),
                    price REAL NOT NULL
                )
                "#,
            ),
            (
                "comments",
                r#"
                CREATE TABLE IF NOT EXISTS comments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    city_id INTEGER NOT NULL REFERENCES cities(id),
                    poster_id INTEGER NOT NULL REFERENCES users(id),
                    text TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    modified_at TEXT NOT NULL
                )
                "#,
            ),
            (
                "idx_comments_city",
                r#"
                CREATE INDEX IF NOT EXISTS idx_comments_city ON comments(city_id, created_at)
                "#,
            ),
        ];

        for &(name, statement) in STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DbError::Migration(format!("{}: {}", name, e)))?;
        }

        info!("Database migrations completed");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use tempfile::TempDir;

    /// Open a fresh database in a temporary directory
    pub async fn temp_database() -> (Database, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("travel.db").display());
        let db = Database::new(&url).await.unwrap();
        (db, dir)
    }
}
