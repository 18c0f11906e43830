/*!
 * Locale identifiers and the locale context consulted by accessors.
 *
 * A `Locale` is a validated language tag such as `en`, `fr-CA` or `zh-Hant-TW`.
 * The primary language subtag must be a known ISO 639-1 or ISO 639-2 code.
 *
 * `LocaleContext` carries the "current locale" and its fallback chains. It is
 * an explicit value handed to every accessor call; there is no global locale.
 */

use isolang::Language;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, TranslationError};

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Resolve a primary language subtag to its ISO 639-2/T form
fn language_to_part2t(code: &str) -> Option<String> {
    match code.len() {
        2 => Language::from_639_1(code).map(|lang| lang.to_639_3().to_string()),
        3 => {
            if Language::from_639_3(code).is_some() {
                return Some(code.to_string());
            }
            PART2B_TO_PART2T
                .iter()
                .find(|(b, _)| *b == code)
                .map(|(_, t)| t.to_string())
        }
        _ => None,
    }
}

/// A validated locale identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Parse and normalize a locale tag (`pt_br` becomes `pt-BR`)
    pub fn parse(tag: &str) -> Result<Self> {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(TranslationError::InvalidLocale(tag.to_string()));
        }

        let mut subtags = trimmed.split(['-', '_']);
        let language = subtags.next().unwrap_or_default().to_lowercase();
        if language_to_part2t(&language).is_none() {
            return Err(TranslationError::InvalidLocale(tag.to_string()));
        }

        let mut normalized = language;
        let mut seen_script = false;
        let mut seen_region = false;

        for subtag in subtags {
            let is_alpha = subtag.chars().all(|c| c.is_ascii_alphabetic());
            let is_digit = subtag.chars().all(|c| c.is_ascii_digit());

            if subtag.len() == 4 && is_alpha && !seen_script && !seen_region {
                // Script subtag, title case (Hant, Latn)
                let mut chars = subtag.chars();
                let first = chars.next().unwrap_or_default().to_ascii_uppercase();
                normalized.push('-');
                normalized.push(first);
                normalized.push_str(&chars.as_str().to_ascii_lowercase());
                seen_script = true;
            } else if ((subtag.len() == 2 && is_alpha) || (subtag.len() == 3 && is_digit))
                && !seen_region
            {
                normalized.push('-');
                normalized.push_str(&subtag.to_ascii_uppercase());
                seen_region = true;
            } else {
                return Err(TranslationError::InvalidLocale(tag.to_string()));
            }
        }

        Ok(Self(normalized))
    }

    /// The normalized tag
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Region subtag, if any
    pub fn region(&self) -> Option<&str> {
        self.0
            .split('-')
            .skip(1)
            .find(|s| s.len() == 2 || (s.len() == 3 && s.chars().all(|c| c.is_ascii_digit())))
    }

    /// The locale with its last subtag removed (`zh-Hant-TW` -> `zh-Hant` -> `zh`)
    pub fn parent(&self) -> Option<Locale> {
        self.0
            .rsplit_once('-')
            .map(|(parent, _)| Locale(parent.to_string()))
    }

    /// English name of the language, e.g. "French"
    pub fn language_name(&self) -> Result<String> {
        let part2t = language_to_part2t(self.language())
            .ok_or_else(|| TranslationError::InvalidLocale(self.0.clone()))?;
        let lang = Language::from_639_3(&part2t)
            .ok_or_else(|| TranslationError::InvalidLocale(self.0.clone()))?;
        Ok(lang.to_name().to_string())
    }

    /// Check if both locales name the same language (`fr`, `fra` and `fre` match)
    pub fn same_language(&self, other: &Locale) -> bool {
        match (
            language_to_part2t(self.language()),
            language_to_part2t(other.language()),
        ) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locale {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = TranslationError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ToSql for Locale {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Locale {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Locale::parse(text).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Request-scoped locale state consulted by translated accessors
#[derive(Debug, Clone)]
pub struct LocaleContext {
    locale: Locale,
    fallbacks: HashMap<Locale, Vec<Locale>>,
    parent_fallbacks: bool,
    /// Locales that may be switched to or written; empty accepts any
    available: Vec<Locale>,
}

impl LocaleContext {
    /// Context with the given current locale and no fallbacks
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            fallbacks: HashMap::new(),
            parent_fallbacks: false,
            available: Vec::new(),
        }
    }

    /// Build a context from the application configuration
    pub fn from_config(config: &crate::app_config::Config) -> Result<Self> {
        let mut ctx = Self::new(Locale::parse(&config.locales.default_locale)?);
        for (locale, chain) in &config.locales.fallbacks {
            let chain = chain
                .iter()
                .map(|l| Locale::parse(l))
                .collect::<Result<Vec<_>>>()?;
            ctx = ctx.with_fallbacks(Locale::parse(locale)?, chain);
        }
        let available = config
            .locales
            .available_locales
            .iter()
            .map(|l| Locale::parse(l))
            .collect::<Result<Vec<_>>>()?;
        ctx.with_parent_fallbacks(config.locales.parent_fallbacks)
            .with_available_locales(available)
    }

    /// Restrict switching and writing to `locales`; the current locale must be one of them
    pub fn with_available_locales(mut self, locales: Vec<Locale>) -> Result<Self> {
        self.available = locales;
        self.ensure_available(&self.locale)?;
        Ok(self)
    }

    /// Locales accepted by this context; empty when any locale is accepted
    pub fn available_locales(&self) -> &[Locale] {
        &self.available
    }

    /// Fail with `InvalidLocale` when `locale` is outside the available locales
    pub fn ensure_available(&self, locale: &Locale) -> Result<()> {
        if self.available.is_empty() || self.available.contains(locale) {
            Ok(())
        } else {
            Err(TranslationError::InvalidLocale(format!(
                "{} (available: {})",
                locale,
                self.available
                    .iter()
                    .map(Locale::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    /// Register the fallback chain used when reading in `locale`
    pub fn with_fallbacks(mut self, locale: Locale, chain: Vec<Locale>) -> Self {
        self.fallbacks.insert(locale, chain);
        self
    }

    /// Fall back from `fr-CA` to `fr` after the configured chain
    pub fn with_parent_fallbacks(mut self, enabled: bool) -> Self {
        self.parent_fallbacks = enabled;
        self
    }

    /// The current locale
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Switch the current locale; affects subsequent accessor calls only
    pub fn set_locale(&mut self, locale: Locale) -> Result<()> {
        self.ensure_available(&locale)?;
        self.locale = locale;
        Ok(())
    }

    /// Run `f` with a copy of this context switched to `locale`
    pub fn with_locale<R>(&self, locale: Locale, f: impl FnOnce(&LocaleContext) -> R) -> Result<R> {
        self.ensure_available(&locale)?;
        let scoped = Self {
            locale,
            ..self.clone()
        };
        Ok(f(&scoped))
    }

    /// Locales to try, in order, when reading in the current locale
    pub fn fallback_chain(&self) -> Vec<Locale> {
        self.fallback_chain_for(&self.locale)
    }

    /// Locales to try, in order, when reading in `locale`
    pub fn fallback_chain_for(&self, locale: &Locale) -> Vec<Locale> {
        let mut chain = vec![locale.clone()];

        if let Some(configured) = self.fallbacks.get(locale) {
            for fallback in configured {
                if !chain.contains(fallback) {
                    chain.push(fallback.clone());
                }
            }
        }

        if self.parent_fallbacks {
            let mut parent = locale.parent();
            while let Some(p) = parent {
                parent = p.parent();
                if !chain.contains(&p) {
                    chain.push(p);
                }
            }
        }

        chain
    }
}
