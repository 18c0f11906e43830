/*!
 * Database schema definitions and migrations.
 *
 * This module owns the bookkeeping tables and creates, extends and drops the
 * per-entity translation tables.
 */

use anyhow::Context;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::TranslationTableInfo;
use crate::errors::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid"));

/// Check that a table or column name is safe to interpolate into SQL
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(name)
}

/// Double-quote an identifier for use in SQL text
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> anyhow::Result<()> {
    // Check current schema version
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        // Fresh database - create all tables
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        // Need to migrate
        info!(
            "Migrating database schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> anyhow::Result<i32> {
    if !table_exists(conn, "schema_version")? {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all bookkeeping tables
fn create_all_tables(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS translation_tables (
            table_name TEXT PRIMARY KEY,
            base_table TEXT NOT NULL,
            foreign_key TEXT NOT NULL,
            attributes TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .context("Failed to create bookkeeping tables")?;

    info!("Database schema created successfully");
    Ok(())
}

/// Migrate the schema from one version to another
fn migrate_schema(conn: &Connection, from_version: i32) -> anyhow::Result<()> {
    let current = from_version;

    if current < SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Unknown schema version: {}. Cannot migrate.",
            current
        ));
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    info!("Schema migration completed to v{}", SCHEMA_VERSION);
    Ok(())
}

/// Check if a table exists
pub fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Column names of an existing table
fn table_columns(conn: &Connection, name: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(name)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Create the translation table described by `info`, or add its missing columns.
///
/// Returns the attribute columns that were added to an existing table.
pub fn ensure_translation_table(conn: &Connection, info: &TranslationTableInfo, base_id_column: &str) -> Result<Vec<String>> {
    let table = quote_identifier(&info.table_name);
    let fk = quote_identifier(&info.foreign_key);
    let mut added = Vec::new();

    if !table_exists(conn, &info.table_name)? {
        let attribute_columns: String = info
            .attributes
            .iter()
            .map(|a| format!("{} TEXT,\n", quote_identifier(a)))
            .collect();

        conn.execute_batch(&format!(
            r#"
            CREATE TABLE {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                {fk} INTEGER NOT NULL REFERENCES {base}({base_id}) ON DELETE CASCADE,
                locale TEXT NOT NULL,
                {attribute_columns}created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE({fk}, locale)
            );

            CREATE INDEX IF NOT EXISTS {index} ON {table}({fk});
            "#,
            base = quote_identifier(&info.base_table),
            base_id = quote_identifier(base_id_column),
            index = quote_identifier(&format!("idx_{}_owner", info.table_name)),
        ))?;

        info!("Created translation table '{}'", info.table_name);
    } else {
        let existing = table_columns(conn, &info.table_name)?;
        for attribute in &info.attributes {
            if !existing.iter().any(|c| c.eq_ignore_ascii_case(attribute)) {
                conn.execute_batch(&format!(
                    "ALTER TABLE {} ADD COLUMN {} TEXT;",
                    table,
                    quote_identifier(attribute)
                ))?;
                added.push(attribute.clone());
            }
        }

        if added.is_empty() {
            debug!("No schema changes detected for '{}'", info.table_name);
        } else {
            info!(
                "Added columns to '{}': {}",
                info.table_name,
                added.join(", ")
            );
        }
    }

    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        r#"
        INSERT INTO translation_tables (table_name, base_table, foreign_key, attributes, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        ON CONFLICT(table_name) DO UPDATE SET
            base_table = excluded.base_table,
            foreign_key = excluded.foreign_key,
            attributes = excluded.attributes,
            updated_at = excluded.updated_at
        "#,
        params![
            info.table_name,
            info.base_table,
            info.foreign_key,
            serde_json::to_string(&info.attributes)?,
            now,
        ],
    )?;

    Ok(added)
}

/// Drop a translation table and forget it
///
/// Only tables recorded in `translation_tables` are dropped; any other name is left alone.
pub fn drop_translation_table(conn: &Connection, table_name: &str) -> Result<bool> {
    if get_translation_table(conn, table_name)?.is_none() {
        warn!("Refusing to drop '{}': not a recorded translation table", table_name);
        return Ok(false);
    }
    let existed = table_exists(conn, table_name)?;
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_identifier(table_name)))?;
    conn.execute(
        "DELETE FROM translation_tables WHERE table_name = ?1",
        [table_name],
    )?;
    if existed {
        info!("Dropped translation table '{}'", table_name);
    }
    Ok(existed)
}

/// Recorded layout of one translation table
pub fn get_translation_table(conn: &Connection, table_name: &str) -> Result<Option<TranslationTableInfo>> {
    let row = conn
        .query_row(
            "SELECT table_name, base_table, foreign_key, attributes FROM translation_tables WHERE table_name = ?1",
            [table_name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(table_name, base_table, foreign_key, attributes)| -> Result<TranslationTableInfo> {
        Ok(TranslationTableInfo {
            table_name,
            base_table,
            foreign_key,
            attributes: serde_json::from_str(&attributes)?,
        })
    })
    .transpose()
}

/// Every recorded translation table, by name
pub fn list_translation_tables(conn: &Connection) -> Result<Vec<TranslationTableInfo>> {
    let mut stmt = conn.prepare(
        "SELECT table_name, base_table, foreign_key, attributes FROM translation_tables ORDER BY table_name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(table_name, base_table, foreign_key, attributes)| -> Result<TranslationTableInfo> {
            Ok(TranslationTableInfo {
                table_name,
                base_table,
                foreign_key,
                attributes: serde_json::from_str(&attributes)?,
            })
        })
        .collect()
}
