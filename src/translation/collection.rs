use crate::database::models::TranslationRecord;
use crate::locale::Locale;

/// In-memory translation rows owned by one base entity, at most one per locale
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translations {
    records: Vec<TranslationRecord>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection built from loaded rows; later rows win on duplicate locales
    pub fn from_records(records: impl IntoIterator<Item = TranslationRecord>) -> Self {
        let mut translations = Self::new();
        for record in records {
            match translations.position(&record.locale) {
                Some(index) => translations.records[index] = record,
                None => translations.records.push(record),
            }
        }
        translations
    }

    fn position(&self, locale: &Locale) -> Option<usize> {
        self.records.iter().position(|r| &r.locale == locale)
    }

    /// Row for `locale`, if present
    pub fn get(&self, locale: &Locale) -> Option<&TranslationRecord> {
        self.records.iter().find(|r| &r.locale == locale)
    }

    pub fn get_mut(&mut self, locale: &Locale) -> Option<&mut TranslationRecord> {
        self.records.iter_mut().find(|r| &r.locale == locale)
    }

    /// Existing row for `locale`, or a new unpersisted row added to the collection
    pub fn find_or_init_by_locale(&mut self, locale: &Locale) -> &mut TranslationRecord {
        let index = match self.position(locale) {
            Some(index) => index,
            None => {
                self.records.push(TranslationRecord::new(locale.clone()));
                self.records.len() - 1
            }
        };
        &mut self.records[index]
    }

    /// Locales that have a row, in collection order
    pub fn locales(&self) -> Vec<Locale> {
        self.records.iter().map(|r| r.locale.clone()).collect()
    }

    pub fn records(&self) -> &[TranslationRecord] {
        &self.records
    }

    /// True if any row holds staged, unsaved values
    pub fn has_changes(&self) -> bool {
        self.records.iter().any(TranslationRecord::is_changed)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
