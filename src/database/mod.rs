/*!
 * Database module for persistent storage of translated entities.
 *
 * This module provides SQLite-based persistence for:
 * - Translation tables, one row per (base entity, locale)
 * - Bookkeeping of the translation tables created so far
 * - Saving, loading and querying entities together with their translations
 */

pub mod connection;
pub mod entity;
pub mod models;
pub mod query;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use entity::BaseEntity;
pub use models::{TranslationRecord, TranslationTableInfo};
pub use query::TranslatedQuery;
pub use repository::TranslatedRepository;
