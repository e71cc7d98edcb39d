//! Schema migrations
//!
//! Each migration runs at most once, inside a transaction together with the
//! row that records it.

use crate::error::{Result, StorageError};
use rusqlite::Connection;
use std::collections::HashSet;
use tracing::{debug, info};

struct Migration {
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_themes",
        // Tokens hold the JSON token map of the row's version
        sql: r#"
            CREATE TABLE themes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 0,
                tokens TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            );
            CREATE INDEX idx_themes_created ON themes(created_at);
        "#,
    },
    Migration {
        name: "002_settings",
        sql: r#"
            CREATE TABLE settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
];

/// Bring the schema up to date
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS migrations (
            name TEXT PRIMARY KEY,
            applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );",
    )?;

    let applied: HashSet<String> = conn
        .prepare("SELECT name FROM migrations")?
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;

    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(m.name)) {
        debug!("Applying migration {}", migration.name);
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)
            .map_err(|e| StorageError::MigrationFailed(format!("{}: {}", migration.name, e)))?;
        tx.execute("INSERT INTO migrations (name) VALUES (?1)", [migration.name])?;
        tx.commit()?;
        info!("Applied migration {}", migration.name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_migrations_create_schema() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(table_names(&conn), vec!["migrations", "settings", "themes"]);
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_failed_migration_is_not_recorded() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE themes (id TEXT);").unwrap();

        let err = run_migrations(&conn).unwrap_err();
        assert!(err.to_string().contains("001_themes"));
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
