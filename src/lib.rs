/*!
 * # translatable - per-locale attribute translations over SQLite
 *
 * A Rust library that gives base entities translated attributes: one value per
 * locale, stored in a companion translation table and resolved through a
 * configurable locale fallback chain.
 *
 * ## Features
 *
 * - Register translated attributes per entity type, append-only and idempotent
 * - Typed getters and setters keyed by a generated attribute enum
 * - Locale fallback chains with separate policies for missing rows and empty values
 * - Serialized (JSON) attributes through serde
 * - Translation tables created and extended on demand, cascading on delete
 * - Query builder filtering and ordering by translated attributes
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `locale`: Locale identifiers and the explicit locale context
 * - `translation`: Registration and accessors:
 *   - `translation::attribute`: Attribute enums and the `translated_attributes!` macro
 *   - `translation::registry`: Per-type registration of attributes and options
 *   - `translation::collection`: In-memory translation rows of one entity
 *   - `translation::translatable`: The `Translatable` accessor trait
 * - `database`: SQLite persistence:
 *   - `database::schema`: Translation tables and bookkeeping
 *   - `database::repository`: Save, load and delete with translations
 *   - `database::query`: Queries over translated attributes
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod errors;
pub mod locale;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{BaseEntity, DatabaseConnection, TranslatedQuery, TranslatedRepository, TranslationRecord};
pub use errors::{Result, TranslationError};
pub use locale::{Locale, LocaleContext};
pub use translation::{
    TranslatedAttribute, Translatable, TranslationOptions, TranslationRegistration, TranslationRegistry,
    Translations,
};
