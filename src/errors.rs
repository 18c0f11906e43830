/*!
 * Error types for the translatable library.
 *
 * Registration, accessor and persistence failures are all reported through
 * `TranslationError`, defined with the thiserror crate. Store failures keep
 * the original `rusqlite::Error` so callers can inspect constraint violations.
 */

use thiserror::Error;

/// Errors raised by registration, accessors and the translation store
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Registration was invoked incoherently (no attributes, bad identifiers)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No translation row was found for any locale in the fallback chain
    #[error("No translation of '{attribute}' found for locale '{locale}'")]
    Lookup {
        /// Attribute that was read
        attribute: String,
        /// Locale the read was made in
        locale: String,
    },

    /// Attribute exists on the enum but was never registered for the entity
    #[error("Attribute '{attribute}' is not registered as translated on '{entity}'")]
    UnregisteredAttribute {
        /// Base table of the entity
        entity: String,
        /// Attribute name
        attribute: String,
    },

    /// Locale identifier could not be parsed
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    /// Serialized access was used on a plain text attribute
    #[error("Attribute '{0}' is not declared as serialized")]
    NotSerialized(String),

    /// Operation needs a base entity that has been saved
    #[error("Entity of '{0}' has not been persisted yet")]
    NotPersisted(String),

    /// JSON encoding or decoding of a serialized attribute failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error reported by the backing store, passed through unchanged
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Any other error
    #[error("Unknown error: {0}")]
    Other(String),
}

impl TranslationError {
    /// Shorthand for building a lookup failure
    pub fn lookup(attribute: &str, locale: impl ToString) -> Self {
        Self::Lookup {
            attribute: attribute.to_string(),
            locale: locale.to_string(),
        }
    }

    /// True when the error is a missing translation
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup { .. })
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for TranslationError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error.to_string())
    }
}

/// Result alias used throughout the library
pub type Result<T, E = TranslationError> = std::result::Result<T, E>;
