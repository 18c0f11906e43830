/*!
 * Query builder over translated attributes.
 *
 * Filters and ordering apply to translation rows; results are the distinct
 * base entities owning a matching row, with all their translations loaded.
 */

use log::debug;
use rusqlite::types::Value;
use rusqlite::params_from_iter;
use std::marker::PhantomData;

use super::connection::DatabaseConnection;
use super::repository::{attach_translations, base_column_list};
use super::schema::quote_identifier;
use crate::errors::{Result, TranslationError};
use crate::locale::Locale;
use crate::translation::{Translatable, TranslatedAttribute, TranslationRegistration};

#[derive(Debug, Clone)]
enum Condition {
    Eq(&'static str, String),
    NotEq(&'static str, String),
    Like(&'static str, String),
    IsNull(&'static str),
    IsNotNull(&'static str),
}

impl Condition {
    fn attribute(&self) -> &'static str {
        match self {
            Condition::Eq(a, _)
            | Condition::NotEq(a, _)
            | Condition::Like(a, _)
            | Condition::IsNull(a)
            | Condition::IsNotNull(a) => a,
        }
    }
}

/// Composable query returning entities of `T`
pub struct TranslatedQuery<T: Translatable> {
    db: DatabaseConnection,
    registration: TranslationRegistration,
    locales: Vec<Locale>,
    conditions: Vec<Condition>,
    order: Vec<(&'static str, bool)>,
    limit: Option<u64>,
    offset: Option<u64>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Translatable> Clone for TranslatedQuery<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            registration: self.registration.clone(),
            locales: self.locales.clone(),
            conditions: self.conditions.clone(),
            order: self.order.clone(),
            limit: self.limit,
            offset: self.offset,
            _entity: PhantomData,
        }
    }
}

impl<T: Translatable> TranslatedQuery<T> {
    pub(crate) fn new(db: DatabaseConnection, registration: TranslationRegistration) -> Self {
        Self {
            db,
            registration,
            locales: Vec::new(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            _entity: PhantomData,
        }
    }

    /// Only match translation rows in `locale`
    pub fn in_locale(mut self, locale: &Locale) -> Self {
        self.locales = vec![locale.clone()];
        self
    }

    /// Only match translation rows in any of `locales`
    pub fn in_locales(mut self, locales: &[Locale]) -> Self {
        self.locales = locales.to_vec();
        self
    }

    pub fn where_eq(mut self, attribute: T::Attribute, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Eq(attribute.name(), value.into()));
        self
    }

    pub fn where_not_eq(mut self, attribute: T::Attribute, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::NotEq(attribute.name(), value.into()));
        self
    }

    /// SQL `LIKE` match, `%` and `_` are wildcards
    pub fn where_like(mut self, attribute: T::Attribute, pattern: impl Into<String>) -> Self {
        self.conditions.push(Condition::Like(attribute.name(), pattern.into()));
        self
    }

    pub fn where_null(mut self, attribute: T::Attribute) -> Self {
        self.conditions.push(Condition::IsNull(attribute.name()));
        self
    }

    pub fn where_not_null(mut self, attribute: T::Attribute) -> Self {
        self.conditions.push(Condition::IsNotNull(attribute.name()));
        self
    }

    /// Order by an attribute; entities with several matching rows sort by the smallest value
    pub fn order_by(mut self, attribute: T::Attribute, ascending: bool) -> Self {
        self.order.push((attribute.name(), ascending));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn check_registered(&self, attribute: &'static str) -> Result<()> {
        if self.registration.is_registered(attribute) {
            Ok(())
        } else {
            Err(TranslationError::UnregisteredAttribute {
                entity: T::table_name().to_string(),
                attribute: attribute.to_string(),
            })
        }
    }

    /// FROM, JOIN and WHERE clauses shared by select and count
    fn build_filter(&self) -> Result<(String, Vec<Value>)> {
        let mut sql = format!(
            " FROM {base} AS b INNER JOIN {table} AS t ON t.{fk} = b.{id}",
            base = quote_identifier(T::table_name()),
            table = quote_identifier(&self.registration.translation_table),
            fk = quote_identifier(&self.registration.foreign_key),
            id = quote_identifier(T::id_column()),
        );
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if !self.locales.is_empty() {
            let placeholders = vec!["?"; self.locales.len()].join(", ");
            clauses.push(format!("t.locale IN ({})", placeholders));
            values.extend(self.locales.iter().map(|l| Value::Text(l.to_string())));
        }

        for condition in &self.conditions {
            self.check_registered(condition.attribute())?;
            let column = format!("t.{}", quote_identifier(condition.attribute()));
            match condition {
                Condition::Eq(_, value) => {
                    clauses.push(format!("{} = ?", column));
                    values.push(Value::Text(value.clone()));
                }
                Condition::NotEq(_, value) => {
                    clauses.push(format!("{} != ?", column));
                    values.push(Value::Text(value.clone()));
                }
                Condition::Like(_, pattern) => {
                    clauses.push(format!("{} LIKE ?", column));
                    values.push(Value::Text(pattern.clone()));
                }
                Condition::IsNull(_) => clauses.push(format!("{} IS NULL", column)),
                Condition::IsNotNull(_) => clauses.push(format!("{} IS NOT NULL", column)),
            }
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        Ok((sql, values))
    }

    /// Build the SELECT statement and its parameters
    pub fn build_select(&self) -> Result<(String, Vec<Value>)> {
        let (filter, values) = self.build_filter()?;
        let id = format!("b.{}", quote_identifier(T::id_column()));

        let mut sql = format!(
            "SELECT {}{} GROUP BY {}",
            base_column_list::<T>(Some("b")),
            filter,
            id
        );

        let mut order = Vec::new();
        // Sort each entity by its smallest value ascending, by its largest descending
        for &(attribute, ascending) in &self.order {
            self.check_registered(attribute)?;
            let (aggregate, direction) = if ascending { ("MIN", "ASC") } else { ("MAX", "DESC") };
            order.push(format!(
                "{}(t.{}) {}",
                aggregate,
                quote_identifier(attribute),
                direction
            ));
        }
        order.push(id);
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        Ok((sql, values))
    }

    /// Build the COUNT statement and its parameters
    pub fn build_count(&self) -> Result<(String, Vec<Value>)> {
        let (filter, values) = self.build_filter()?;
        let sql = format!(
            "SELECT COUNT(DISTINCT b.{}){}",
            quote_identifier(T::id_column()),
            filter
        );
        Ok((sql, values))
    }

    /// Execute the query and load matching entities with their translations
    pub fn load(&self) -> Result<Vec<T>> {
        let (sql, values) = self.build_select()?;
        let info = self.registration.table_info();
        debug!("Running translated query: {}", sql);

        self.db.execute(|conn| -> Result<Vec<T>> {
            let mut stmt = conn.prepare(&sql)?;
            let entities = stmt
                .query_map(params_from_iter(values), T::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            attach_translations(conn, &info, entities)
        })
    }

    /// First matching entity, if any
    pub fn first(&self) -> Result<Option<T>> {
        Ok(self.clone().limit(1).load()?.into_iter().next())
    }

    /// Number of distinct matching entities; limit and offset are ignored
    pub fn count(&self) -> Result<i64> {
        let (sql, values) = self.build_count()?;
        self.db
            .execute(|conn| conn.query_row(&sql, params_from_iter(values), |row| row.get(0)))
            .map_err(TranslationError::from)
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.count()? > 0)
    }
}
