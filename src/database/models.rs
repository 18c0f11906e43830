/*!
 * Database entity models.
 *
 * These structures map directly to translation table rows and to the
 * bookkeeping table that records which translation tables exist.
 */

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::locale::Locale;

/// One translation row: the values of all translated attributes in one locale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Database ID, `None` until the row is inserted
    pub id: Option<i64>,
    /// ID of the owning base row, `None` until the owner is saved
    pub owner_id: Option<i64>,
    /// Locale of this row
    pub locale: Locale,
    /// Attribute column -> value
    pub values: BTreeMap<String, Option<String>>,
    /// Creation timestamp (RFC 3339)
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339)
    pub updated_at: Option<String>,
    /// Attributes written since the last save
    #[serde(skip)]
    changed: BTreeSet<String>,
}

impl TranslationRecord {
    /// Create a new, unpersisted record for the given locale
    pub fn new(locale: Locale) -> Self {
        Self {
            id: None,
            owner_id: None,
            locale,
            values: BTreeMap::new(),
            created_at: None,
            updated_at: None,
            changed: BTreeSet::new(),
        }
    }

    /// Value of an attribute; `None` for NULL or never-set values
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.values.get(attribute).and_then(|v| v.as_deref())
    }

    /// Stage a value; it is written on the owner's next save
    pub fn set(&mut self, attribute: &str, value: Option<String>) {
        self.values.insert(attribute.to_string(), value);
        self.changed.insert(attribute.to_string());
    }

    /// True until the row has been inserted
    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    /// True if some attribute was staged since the last save
    pub fn is_changed(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Attributes staged since the last save
    pub fn changed_attributes(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// Record the outcome of a successful write
    pub(crate) fn mark_saved(&mut self, id: i64, owner_id: i64, created_at: String, updated_at: String) {
        self.id = Some(id);
        self.owner_id = Some(owner_id);
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self.changed.clear();
    }
}

/// Layout of a translation table as recorded in the bookkeeping table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationTableInfo {
    /// Translation table name
    pub table_name: String,
    /// Base table the rows belong to
    pub base_table: String,
    /// Column referencing the base row
    pub foreign_key: String,
    /// Attribute columns
    pub attributes: Vec<String>,
}
