/*!
 * Translated attributes for base entities.
 *
 * This module is split into several submodules:
 *
 * - `attribute`: The `TranslatedAttribute` trait and the `translated_attributes!` macro
 * - `registry`: Per-type registration of translated attributes and options
 * - `collection`: In-memory translation rows of one entity
 * - `translatable`: Locale-aware accessors provided to registered entities
 */

// Re-export main types for easier usage
pub use self::attribute::TranslatedAttribute;
pub use self::collection::Translations;
pub use self::registry::{TranslationOptions, TranslationRegistration, TranslationRegistry};
pub use self::translatable::Translatable;

// Submodules
pub mod attribute;
pub mod collection;
pub mod registry;
pub mod translatable;
