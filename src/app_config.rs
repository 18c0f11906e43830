use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::locale::Locale;

/// Application configuration module
/// This module handles loading, validating and saving the settings shared by
/// the library and the `translatable` command line tool.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Locale settings
    #[serde(default)]
    pub locales: LocaleConfig,

    /// Default options applied when registering translated attributes
    #[serde(default)]
    pub translation: TranslationDefaults,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Database configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite file; the user data directory is used when absent
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Use write-ahead logging for file databases
    #[serde(default = "default_true")]
    pub wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            wal: default_true(),
        }
    }
}

/// Locale configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocaleConfig {
    /// Locale used when the caller does not pick one
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Locales the application accepts; empty means any valid locale
    #[serde(default)]
    pub available_locales: Vec<String>,

    /// Fallback chains, e.g. `{"fr-CA": ["fr", "en"]}`
    #[serde(default)]
    pub fallbacks: HashMap<String, Vec<String>>,

    /// Fall back from a regional locale to its parent (`fr-CA` to `fr`)
    #[serde(default)]
    pub parent_fallbacks: bool,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            available_locales: Vec::new(),
            fallbacks: HashMap::new(),
            parent_fallbacks: false,
        }
    }
}

/// Fallback policy defaults for newly registered entity types
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TranslationDefaults {
    /// Return no value instead of failing when no translation row exists
    #[serde(default)]
    pub fallback_to_empty_on_missing: bool,

    /// Treat NULL or empty values as missing and keep walking the fallback chain
    #[serde(default)]
    pub fallbacks_for_empty_translations: bool,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_locale() -> String {
    "en".to_string()
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let default_locale = Locale::parse(&self.locales.default_locale)
            .map_err(|e| anyhow!("Invalid default locale: {}", e))?;

        let available = self
            .locales
            .available_locales
            .iter()
            .map(|l| Locale::parse(l).map_err(|e| anyhow!("Invalid available locale: {}", e)))
            .collect::<Result<Vec<_>>>()?;

        if !available.is_empty() && !available.contains(&default_locale) {
            return Err(anyhow!(
                "Default locale '{}' is not listed in available_locales",
                default_locale
            ));
        }

        for (locale, chain) in &self.locales.fallbacks {
            Locale::parse(locale).map_err(|e| anyhow!("Invalid fallback key: {}", e))?;
            for fallback in chain {
                Locale::parse(fallback)
                    .map_err(|e| anyhow!("Invalid fallback for '{}': {}", locale, e))?;
            }
        }

        Ok(())
    }

    /// Resolved database path
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => crate::database::DatabaseConnection::default_database_path(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig::default(),
            locales: LocaleConfig::default(),
            translation: TranslationDefaults::default(),
            log_level: LogLevel::default(),
        }
    }
}
