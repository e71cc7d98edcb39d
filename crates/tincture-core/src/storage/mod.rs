//! SQLite persistence for the theme library and the active selection

mod migrations;
mod queries;

pub use migrations::run_migrations;
pub use queries::*;

use crate::error::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use tracing::info;

/// File name of the database inside the data directory
pub const DATABASE_FILE: &str = "tincture.db";

/// Pooled handle to the theme database
pub struct Storage {
    pool: Pool<SqliteConnectionManager>,
}

impl Storage {
    /// Open (or create) the database inside `data_dir`
    pub fn new_with_path(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join(DATABASE_FILE);
        info!("Theme database: {}", db_path.display());
        Self::open(SqliteConnectionManager::file(db_path), 4)
    }

    /// Private in-memory database
    ///
    /// Every connection to `:memory:` is its own database, so the pool is
    /// limited to one.
    pub fn in_memory() -> Result<Self> {
        Self::open(SqliteConnectionManager::memory(), 1)
    }

    fn open(manager: SqliteConnectionManager, max_size: u32) -> Result<Self> {
        let pool = Pool::builder().max_size(max_size).build(manager)?;
        run_migrations(&*pool.get()?)?;
        Ok(Self { pool })
    }

    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::builtin::{builtin_theme, DARK_THEME_ID};

    #[test]
    fn test_in_memory_storage_is_migrated() {
        let storage = Storage::in_memory().unwrap();
        assert!(list_themes(&storage.connection().unwrap()).unwrap().is_empty());
    }

    #[test]
    fn test_file_storage_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested");
        let mut theme = builtin_theme(DARK_THEME_ID).unwrap().clone();
        theme.id = "saved".to_string();

        {
            let storage = Storage::new_with_path(&data_dir).unwrap();
            upsert_theme(&storage.connection().unwrap(), &theme).unwrap();
        }
        assert!(data_dir.join(DATABASE_FILE).is_file());

        let storage = Storage::new_with_path(&data_dir).unwrap();
        let loaded = get_theme(&storage.connection().unwrap(), "saved").unwrap();
        assert_eq!(loaded, Some(theme));
    }
}
