//! Database schema and migrations
//!
//! Applies versioned SQL migrations on startup. Each migration runs in
//! its own transaction and is recorded in the `migrations` table, so a
//! database is only ever moved forward.
//! Uses SQLite with WAL mode for crash safety.
//!
//! Tables: `folders`, `contacts` (with `deleted_at` for the trash),
//! `contact_images`, `shared_items` and `user_settings`.

use crate::error::Result;
use sqlx::{sqlite::SqlitePool, Row};

/// Initialize database with schema.
///
/// Safe to call on every start: already applied versions are skipped.
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Initializing database schema");

    // WAL lets readers continue while a write is in progress
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    // Image records cascade with their contact
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 0 for a fresh database
    let current_version: i32 = sqlx::query("SELECT COALESCE(MAX(version), 0) FROM migrations")
        .fetch_one(pool)
        .await?
        .get(0);

    tracing::info!("Current database version: {}", current_version);

    apply_migrations(pool, current_version).await?;

    tracing::info!("Database initialization complete");
    Ok(())
}

/// Run every migration newer than `current_version`, in order
async fn apply_migrations(pool: &SqlitePool, current_version: i32) -> Result<()> {
    for (version, sql) in get_migrations() {
        if version <= current_version {
            continue;
        }

        tracing::info!("Applying migration version {}", version);

        let mut tx = pool.begin().await?;

        // sqlx executes one statement per query
        for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query("INSERT INTO migrations (version) VALUES (?)")
            .bind(version)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Migration version {} applied successfully", version);
    }

    Ok(())
}

/// Versioned migrations. Append new versions; never edit an applied one.
fn get_migrations() -> Vec<(i32, &'static str)> {
    vec![(1, include_str!("migrations/001_initial_schema.sql"))]
}
