/*!
 * Registration of translated attributes per entity type.
 *
 * Registering an entity type derives its translation table layout, records the
 * fallback options and appends attribute names to the type's registered set.
 * The set only ever grows; names registered twice are kept once.
 */

use log::{debug, info};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::attribute::TranslatedAttribute;
use super::translatable::Translatable;
use crate::app_config::TranslationDefaults;
use crate::database::models::TranslationTableInfo;
use crate::database::schema::is_valid_identifier;
use crate::errors::{Result, TranslationError};

/// Columns every translation table owns besides the attributes
const RESERVED_COLUMNS: &[&str] = &["id", "locale", "created_at", "updated_at"];

static GLOBAL_REGISTRY: Lazy<TranslationRegistry> = Lazy::new(TranslationRegistry::new);

/// Options accepted by the first registration of an entity type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationOptions {
    /// Translation table name; `<singular base table>_translations` when absent
    pub table_name: Option<String>,
    /// Foreign key column; `<singular base table>_id` when absent
    pub foreign_key: Option<String>,
    /// Return no value instead of a lookup error when no row exists
    pub fallback_to_empty_on_missing: bool,
    /// Treat NULL or empty values as missing and keep walking the fallback chain
    pub fallbacks_for_empty_translations: bool,
}

impl TranslationOptions {
    /// Options seeded from configured defaults
    pub fn from_defaults(defaults: &TranslationDefaults) -> Self {
        Self {
            fallback_to_empty_on_missing: defaults.fallback_to_empty_on_missing,
            fallbacks_for_empty_translations: defaults.fallbacks_for_empty_translations,
            ..Self::default()
        }
    }

    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    pub fn fallback_to_empty_on_missing(mut self, enabled: bool) -> Self {
        self.fallback_to_empty_on_missing = enabled;
        self
    }

    pub fn fallbacks_for_empty_translations(mut self, enabled: bool) -> Self {
        self.fallbacks_for_empty_translations = enabled;
        self
    }
}

/// Registered translation metadata of one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRegistration {
    /// Base table of the entity
    pub base_table: &'static str,
    /// Primary key column of the base table
    pub base_id_column: &'static str,
    /// Table holding one row per (entity, locale)
    pub translation_table: String,
    /// Column referencing the base row
    pub foreign_key: String,
    /// Registered attribute columns, in registration order
    pub attribute_names: Vec<&'static str>,
    pub fallback_to_empty_on_missing: bool,
    pub fallbacks_for_empty_translations: bool,
}

impl TranslationRegistration {
    fn setup(base_table: &'static str, base_id_column: &'static str, options: TranslationOptions) -> Result<Self> {
        let singular = singularize(base_table);
        let translation_table = options
            .table_name
            .unwrap_or_else(|| format!("{}_translations", singular));
        let foreign_key = options
            .foreign_key
            .unwrap_or_else(|| format!("{}_id", singular));

        for identifier in [
            base_table,
            base_id_column,
            translation_table.as_str(),
            foreign_key.as_str(),
        ] {
            if !is_valid_identifier(identifier) {
                return Err(TranslationError::Configuration(format!(
                    "'{}' is not a valid SQL identifier",
                    identifier
                )));
            }
        }

        if is_reserved(&foreign_key) {
            return Err(TranslationError::Configuration(format!(
                "Foreign key '{}' collides with a reserved translation column",
                foreign_key
            )));
        }

        Ok(Self {
            base_table,
            base_id_column,
            translation_table,
            foreign_key,
            attribute_names: Vec::new(),
            fallback_to_empty_on_missing: options.fallback_to_empty_on_missing,
            fallbacks_for_empty_translations: options.fallbacks_for_empty_translations,
        })
    }

    /// Check if an attribute column is part of the registered set
    ///
    /// Column names compare case-insensitively, as in SQLite.
    pub fn is_registered(&self, name: &str) -> bool {
        self.attribute_names.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Table layout as stored in the bookkeeping table
    pub fn table_info(&self) -> TranslationTableInfo {
        TranslationTableInfo {
            table_name: self.translation_table.clone(),
            base_table: self.base_table.to_string(),
            foreign_key: self.foreign_key.clone(),
            attributes: self.attribute_names.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Process-wide map from entity type to its translation registration
#[derive(Debug, Default)]
pub struct TranslationRegistry {
    entries: RwLock<HashMap<TypeId, TranslationRegistration>>,
}

impl TranslationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry consulted by the `Translatable` accessors
    pub fn global() -> &'static TranslationRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register translated attributes of `T`, appending names not yet present
    pub fn register<T: Translatable>(
        &self,
        attributes: &[T::Attribute],
        options: TranslationOptions,
    ) -> Result<TranslationRegistration> {
        let names: Vec<&'static str> = attributes.iter().map(|a| a.name()).collect();
        if let Some(bad) = names
            .iter()
            .find(|n| !is_valid_identifier(n) || is_reserved(n))
        {
            return Err(TranslationError::Configuration(format!(
                "'{}' cannot be used as a translated attribute of '{}'",
                bad,
                T::table_name()
            )));
        }

        let mut entries = self.entries.write();
        let registration = match entries.entry(TypeId::of::<T>()) {
            Entry::Occupied(entry) => {
                if options != TranslationOptions::default() {
                    debug!(
                        "Ignoring options for '{}': translations already set up",
                        T::table_name()
                    );
                }
                let registration = entry.into_mut();
                ensure_no_collision(registration, &names)?;
                registration
            }
            Entry::Vacant(entry) => {
                if names.is_empty() {
                    return Err(TranslationError::Configuration(format!(
                        "'{}' must declare at least one translated attribute",
                        T::table_name()
                    )));
                }
                let registration =
                    TranslationRegistration::setup(T::table_name(), T::id_column(), options)?;
                ensure_no_collision(&registration, &names)?;
                info!(
                    "Set up translations for '{}' in '{}'",
                    registration.base_table, registration.translation_table
                );
                entry.insert(registration)
            }
        };

        for name in names {
            if !registration.is_registered(name) {
                debug!("Registered translated attribute '{}.{}'", registration.base_table, name);
                registration.attribute_names.push(name);
            }
        }

        Ok(registration.clone())
    }

    /// Check if `T` has been registered
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    /// Snapshot of the registration of `T`
    pub fn registration<T: 'static>(&self) -> Option<TranslationRegistration> {
        self.entries.read().get(&TypeId::of::<T>()).cloned()
    }

    /// Run `f` against the registration of `T` without cloning it
    pub fn with_registration<T: 'static, R>(
        &self,
        f: impl FnOnce(&TranslationRegistration) -> R,
    ) -> Option<R> {
        self.entries.read().get(&TypeId::of::<T>()).map(f)
    }
}

fn is_reserved(name: &str) -> bool {
    RESERVED_COLUMNS.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// Reject names that SQLite would treat as the same column as another one
fn ensure_no_collision(registration: &TranslationRegistration, names: &[&str]) -> Result<()> {
    if let Some(name) = names
        .iter()
        .find(|n| n.eq_ignore_ascii_case(&registration.foreign_key))
    {
        return Err(TranslationError::Configuration(format!(
            "Attribute '{}' collides with the foreign key of '{}'",
            name, registration.translation_table
        )));
    }

    let mut seen: Vec<&str> = registration.attribute_names.clone();
    for name in names {
        match seen.iter().find(|s| s.eq_ignore_ascii_case(name)) {
            Some(existing) if existing != name => {
                return Err(TranslationError::Configuration(format!(
                    "Attribute '{}' differs from '{}' only by case in '{}'",
                    name, existing, registration.translation_table
                )));
            }
            Some(_) => {}
            None => seen.push(*name),
        }
    }
    Ok(())
}

/// Words whose plural and singular forms are the same
const UNCOUNTABLE: &[&str] = &[
    "news",
    "series",
    "species",
    "information",
    "equipment",
    "data",
    "metadata",
    "sheep",
    "fish",
];

/// Singular form of an English table name (`categories` -> `category`)
pub fn singularize(word: &str) -> String {
    let last = word.rsplit('_').next().unwrap_or(word);
    if UNCOUNTABLE.iter().any(|u| u.eq_ignore_ascii_case(last)) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") {
        return word.to_string();
    }
    word.strip_suffix('s').unwrap_or(word).to_string()
}
