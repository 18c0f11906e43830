/*!
 * Repository layer for translated entities.
 *
 * `TranslatedRepository<T>` saves, loads and deletes base entities together
 * with their translation rows. Saving runs the base insert or update and then
 * flushes staged translation values in the same transaction.
 */

use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::marker::PhantomData;

use super::connection::DatabaseConnection;
use super::models::{TranslationRecord, TranslationTableInfo};
use super::query::TranslatedQuery;
use super::schema::{self, quote_identifier};
use crate::errors::{Result, TranslationError};
use crate::locale::Locale;
use crate::translation::{Translatable, TranslationRegistration, Translations};

/// Outcome of writing one translation row
#[derive(Debug, Clone)]
struct SavedRow {
    locale: Locale,
    id: i64,
    created_at: String,
    updated_at: String,
}

/// Repository for one translated entity type
pub struct TranslatedRepository<T: Translatable> {
    /// Database connection
    db: DatabaseConnection,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Translatable> Clone for TranslatedRepository<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Translatable> TranslatedRepository<T> {
    /// Create a repository; `T` must already be registered
    pub fn new(db: DatabaseConnection) -> Result<Self> {
        T::translation_registration()?;
        Ok(Self {
            db,
            _entity: PhantomData,
        })
    }

    /// Get the underlying database connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Create or extend the translation table of `T`
    pub fn ensure_schema(&self) -> Result<Vec<String>> {
        let registration = T::translation_registration()?;
        self.db.execute(|conn| {
            schema::ensure_translation_table(conn, &registration.table_info(), registration.base_id_column)
        })
    }

    /// Start a translation-aware query over `T`
    pub fn query(&self) -> Result<TranslatedQuery<T>> {
        Ok(TranslatedQuery::new(
            self.db.clone(),
            T::translation_registration()?,
        ))
    }

    // =========================================================================
    // Entity Operations
    // =========================================================================

    /// Insert or update the base row, then write staged translations
    pub fn save(&self, entity: &mut T) -> Result<()> {
        let registration = T::translation_registration()?;

        let (owner_id, created, saved) = self.db.transaction(|tx| -> Result<_> {
            let (owner_id, created) = match entity.id() {
                Some(id) => {
                    entity.update(tx)?;
                    (id, false)
                }
                None => (entity.insert(tx)?, true),
            };
            let saved = write_translations(tx, &registration, owner_id, entity.translations())?;
            Ok((owner_id, created, saved))
        })?;

        if created {
            entity.set_id(owner_id);
        }
        debug!(
            "Saved {} #{} ({}) with {} translation row(s)",
            T::table_name(),
            owner_id,
            if created { "created" } else { "updated" },
            saved.len()
        );
        apply_saved(entity.translations_mut(), owner_id, saved);
        Ok(())
    }

    /// Write staged translations of an already persisted entity
    pub fn save_translations(&self, entity: &mut T) -> Result<()> {
        let owner_id = persisted_id(entity)?;
        let registration = T::translation_registration()?;

        let saved = self.db.transaction(|tx| {
            write_translations(tx, &registration, owner_id, entity.translations())
        })?;

        apply_saved(entity.translations_mut(), owner_id, saved);
        Ok(())
    }

    /// Load an entity and all of its translations
    pub fn find(&self, id: i64) -> Result<Option<T>> {
        let info = T::translation_registration()?.table_info();
        self.db.execute(|conn| find_with_conn::<T>(conn, &info, id))
    }

    /// Load every entity of `T`, ordered by id
    pub fn find_all(&self) -> Result<Vec<T>> {
        let info = T::translation_registration()?.table_info();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            base_column_list::<T>(None),
            quote_identifier(T::table_name()),
            quote_identifier(T::id_column())
        );

        self.db.execute(|conn| -> Result<Vec<T>> {
            let mut stmt = conn.prepare(&sql)?;
            let entities = stmt
                .query_map([], T::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            attach_translations(conn, &info, entities)
        })
    }

    /// Re-read the entity from the store, discarding staged edits
    pub fn reload(&self, entity: &mut T) -> Result<()> {
        let id = persisted_id(entity)?;
        *entity = self
            .find(id)?
            .ok_or_else(|| TranslationError::NotPersisted(T::table_name().to_string()))?;
        Ok(())
    }

    /// Delete an entity and all of its translation rows
    pub fn delete(&self, entity: &T) -> Result<bool> {
        self.delete_by_id(persisted_id(entity)?)
    }

    /// Delete by id; returns false when no base row matched
    pub fn delete_by_id(&self, id: i64) -> Result<bool> {
        let registration = T::translation_registration()?;

        self.db.transaction(|tx| -> Result<bool> {
            let removed = tx.execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?1",
                    quote_identifier(&registration.translation_table),
                    quote_identifier(&registration.foreign_key)
                ),
                [id],
            )?;
            let deleted = tx.execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?1",
                    quote_identifier(T::table_name()),
                    quote_identifier(T::id_column())
                ),
                [id],
            )?;

            debug!(
                "Deleted {} #{} and {} translation row(s)",
                T::table_name(),
                id,
                removed
            );
            Ok(deleted > 0)
        })
    }

    // =========================================================================
    // Translation Operations
    // =========================================================================

    /// Number of stored translation rows of one entity
    pub fn count_translations(&self, owner_id: i64) -> Result<i64> {
        let registration = T::translation_registration()?;
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            quote_identifier(&registration.translation_table),
            quote_identifier(&registration.foreign_key)
        );

        self.db
            .execute(|conn| conn.query_row(&sql, [owner_id], |row| row.get(0)))
            .map_err(TranslationError::from)
    }

    /// Stored row for `locale`, or a new unpersisted row pre-filled with that locale
    pub fn find_or_init_by_locale(&self, entity: &T, locale: &Locale) -> Result<TranslationRecord> {
        if let Some(owner_id) = entity.id() {
            let info = T::translation_registration()?.table_info();
            let stored = self.db.execute(|conn| {
                load_translation_rows(conn, &info, owner_id, Some(locale))
            })?;
            if let Some(record) = stored.into_iter().next() {
                return Ok(record);
            }
        }

        let mut record = TranslationRecord::new(locale.clone());
        record.owner_id = entity.id();
        Ok(record)
    }
}

fn persisted_id<T: Translatable>(entity: &T) -> Result<i64> {
    entity
        .id()
        .ok_or_else(|| TranslationError::NotPersisted(T::table_name().to_string()))
}

/// Comma-separated base columns, optionally prefixed with a table alias
pub(crate) fn base_column_list<T: Translatable>(alias: Option<&str>) -> String {
    T::columns()
        .iter()
        .map(|c| match alias {
            Some(alias) => format!("{}.{}", alias, quote_identifier(c)),
            None => quote_identifier(c),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn find_with_conn<T: Translatable>(conn: &Connection, info: &TranslationTableInfo, id: i64) -> Result<Option<T>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1",
        base_column_list::<T>(None),
        quote_identifier(T::table_name()),
        quote_identifier(T::id_column())
    );

    let Some(mut entity) = conn.query_row(&sql, [id], T::from_row).optional()? else {
        return Ok(None);
    };
    let records = load_translation_rows(conn, info, id, None)?;
    *entity.translations_mut() = Translations::from_records(records);
    Ok(Some(entity))
}

/// Fill the translation collections of freshly loaded entities
pub(crate) fn attach_translations<T: Translatable>(
    conn: &Connection,
    info: &TranslationTableInfo,
    mut entities: Vec<T>,
) -> Result<Vec<T>> {
    for entity in &mut entities {
        if let Some(id) = entity.id() {
            let records = load_translation_rows(conn, info, id, None)?;
            *entity.translations_mut() = Translations::from_records(records);
        }
    }
    Ok(entities)
}

/// Read the translation rows of one owner, optionally restricted to one locale
pub fn load_translation_rows(
    conn: &Connection,
    info: &TranslationTableInfo,
    owner_id: i64,
    locale: Option<&Locale>,
) -> Result<Vec<TranslationRecord>> {
    let attribute_list: String = info
        .attributes
        .iter()
        .map(|a| format!(", {}", quote_identifier(a)))
        .collect();
    let sql = format!(
        "SELECT id, {fk}, locale, created_at, updated_at{attribute_list} FROM {table}
         WHERE {fk} = ?1 AND (?2 IS NULL OR locale = ?2)
         ORDER BY locale",
        fk = quote_identifier(&info.foreign_key),
        table = quote_identifier(&info.table_name),
    );

    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params![owner_id, locale], |row| {
            let mut record = TranslationRecord::new(row.get(2)?);
            record.id = Some(row.get(0)?);
            record.owner_id = Some(row.get(1)?);
            record.created_at = row.get(3)?;
            record.updated_at = row.get(4)?;
            for (index, attribute) in info.attributes.iter().enumerate() {
                record
                    .values
                    .insert(attribute.clone(), row.get::<_, Option<String>>(5 + index)?);
            }
            Ok(record)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(records)
}

/// Upsert every changed row of `translations` for `owner_id`
fn write_translations(
    conn: &Connection,
    registration: &TranslationRegistration,
    owner_id: i64,
    translations: &Translations,
) -> Result<Vec<SavedRow>> {
    let table = quote_identifier(&registration.translation_table);
    let fk = quote_identifier(&registration.foreign_key);
    let now = chrono::Utc::now().to_rfc3339();
    let mut saved = Vec::new();

    for record in translations.records().iter().filter(|r| r.is_changed()) {
        let columns: Vec<&str> = record
            .changed_attributes()
            .filter(|name| {
                let registered = registration.is_registered(name);
                if !registered {
                    warn!(
                        "Skipping unregistered attribute '{}' on '{}'",
                        name, registration.translation_table
                    );
                }
                registered
            })
            .collect();

        let column_list: String = columns
            .iter()
            .map(|c| format!(", {}", quote_identifier(c)))
            .collect();
        let placeholders: String = (0..columns.len())
            .map(|i| format!(", ?{}", i + 4))
            .collect();
        let updates: String = columns
            .iter()
            .map(|c| {
                let column = quote_identifier(c);
                format!("{column} = excluded.{column}, ")
            })
            .collect();

        let sql = format!(
            "INSERT INTO {table} ({fk}, locale, created_at, updated_at{column_list})
             VALUES (?1, ?2, ?3, ?3{placeholders})
             ON CONFLICT({fk}, locale) DO UPDATE SET {updates}updated_at = excluded.updated_at
             RETURNING id, created_at"
        );

        let mut values = vec![
            Value::Integer(owner_id),
            Value::Text(record.locale.to_string()),
            Value::Text(now.clone()),
        ];
        values.extend(columns.iter().map(|c| match record.get(c) {
            Some(text) => Value::Text(text.to_string()),
            None => Value::Null,
        }));

        let (id, created_at): (i64, String) =
            conn.query_row(&sql, params_from_iter(values), |row| Ok((row.get(0)?, row.get(1)?)))?;

        saved.push(SavedRow {
            locale: record.locale.clone(),
            id,
            created_at,
            updated_at: now.clone(),
        });
    }

    Ok(saved)
}

fn apply_saved(translations: &mut Translations, owner_id: i64, saved: Vec<SavedRow>) {
    for row in saved {
        if let Some(record) = translations.get_mut(&row.locale) {
            record.mark_saved(row.id, owner_id, row.created_at, row.updated_at);
        }
    }
}
