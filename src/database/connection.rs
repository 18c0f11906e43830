/*!
 * Database connection management.
 *
 * This module handles SQLite database connection creation and initialization,
 * and serializes access to the connection behind a mutex.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::schema;
use crate::app_config::Config;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "translatable.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "translatable";

/// Database connection wrapper with thread-safe access
#[derive(Clone)]
pub struct DatabaseConnection {
    /// Path to the database file
    db_path: PathBuf,
    /// Connection shared between clones
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Create a new database connection at the default location
    pub fn new_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Create a connection from the application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let db_path = config.database_path()?;
        Self::open(&db_path, config.database.wal)
    }

    /// Create a new database connection at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::open(db_path.as_ref(), true)
    }

    fn open(db_path: &Path, wal: bool) -> Result<Self> {
        let db_path = db_path.to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }

        info!("Opening database at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        if wal {
            conn.execute_batch("PRAGMA journal_mode=WAL;")
                .context("Failed to enable WAL journal mode")?;
        }
        Self::prepare(conn, db_path)
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");

        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;

        Self::prepare(conn, PathBuf::from(":memory:"))
    }

    fn prepare(conn: Connection, db_path: PathBuf) -> Result<Self> {
        // Foreign keys are a per-connection setting in SQLite
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .context("Failed to enable foreign keys")?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        // Try to use the system data directory
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }

    /// Execute a database operation with the connection
    ///
    /// The connection stays locked for the duration of the closure.
    pub fn execute<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        let conn = self.connection.lock();
        f(&conn)
    }

    /// Begin a transaction and execute operations within it
    ///
    /// The transaction is rolled back when the closure fails.
    pub fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let mut conn = self.connection.lock();

        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;

        Ok(result)
    }

    /// Vacuum the database to reclaim space
    pub fn vacuum(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("VACUUM", [])?;
            Ok(())
        })
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DatabaseStats> {
        let tables = self.execute(|conn| schema::list_translation_tables(conn))?;

        let translation_rows = self.execute(|conn| -> Result<i64> {
            let mut total = 0;
            for table in &tables {
                let count: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM {}", schema::quote_identifier(&table.table_name)),
                    [],
                    |row| row.get(0),
                )?;
                total += count;
            }
            Ok(total)
        })?;

        // Get file size if not in-memory
        let file_size = if self.is_in_memory() {
            0
        } else {
            std::fs::metadata(&self.db_path)
                .map(|m| m.len())
                .unwrap_or(0)
        };

        Ok(DatabaseStats {
            translation_tables: tables.len() as i64,
            translation_rows,
            file_size_bytes: file_size,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    /// Number of registered translation tables
    pub translation_tables: i64,
    /// Rows across all translation tables
    pub translation_rows: i64,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Translation tables: {}, Translation rows: {}, Size: {} KB",
            self.translation_tables,
            self.translation_rows,
            self.file_size_bytes / 1024
        )
    }
}
