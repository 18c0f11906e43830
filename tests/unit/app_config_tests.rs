/*!
 * Tests for application configuration functionality
 */

use std::path::PathBuf;
use translatable::app_config::{Config, LogLevel};
use translatable::{LocaleContext, Translatable, TranslationError, TranslationOptions};

use crate::common::{create_temp_dir, loc, Post, PostField};

/// Test saving and loading a configuration file
#[test]
fn test_saveToFile_thenFromFile_shouldKeepSettings() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("translatable.json");

    let mut config = Config::default();
    config.locales.default_locale = "fr".to_string();
    config.locales.available_locales = vec!["fr".to_string(), "en".to_string()];
    config.locales.fallbacks.insert("fr".to_string(), vec!["en".to_string()]);
    config.translation.fallbacks_for_empty_translations = true;
    config.log_level = LogLevel::Warn;
    config.save_to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.locales.default_locale, "fr");
    assert_eq!(loaded.locales.fallbacks["fr"], vec!["en".to_string()]);
    assert!(loaded.translation.fallbacks_for_empty_translations);
    assert_eq!(loaded.log_level, LogLevel::Warn);
}

#[test]
fn test_fromFile_withInvalidContent_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    let invalid = dir.path().join("invalid.json");
    std::fs::write(&invalid, r#"{"locales": {"default_locale": "zz-ZZ-ZZ"}}"#).unwrap();

    assert!(Config::from_file(&broken).is_err());
    assert!(Config::from_file(&invalid).is_err());
    assert!(Config::from_file(dir.path().join("missing.json")).is_err());
}

#[test]
fn test_databasePath_withExplicitPath_shouldUseIt() {
    let mut config = Config::default();
    config.database.path = Some(PathBuf::from("/tmp/app/translations.db"));

    assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/app/translations.db"));
}

#[test]
fn test_localeContextFromConfig_shouldApplyLocalesAndFallbacks() {
    let mut config = Config::default();
    config.locales.default_locale = "fr-CA".to_string();
    config.locales.fallbacks.insert("fr-CA".to_string(), vec!["en".to_string()]);
    config.locales.parent_fallbacks = true;

    let ctx = LocaleContext::from_config(&config).unwrap();

    assert_eq!(ctx.locale(), &loc("fr-CA"));
    assert_eq!(ctx.fallback_chain(), vec![loc("fr-CA"), loc("en"), loc("fr")]);
}

#[test]
fn test_translationOptionsFromDefaults_shouldCopyPolicies() {
    let mut config = Config::default();
    config.translation.fallback_to_empty_on_missing = true;

    let options = TranslationOptions::from_defaults(&config.translation);

    assert!(options.fallback_to_empty_on_missing);
    assert!(!options.fallbacks_for_empty_translations);
    assert_eq!(options.table_name, None);
}

#[test]
fn test_logLevel_shouldMapToLevelFilter() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}

#[test]
fn test_localeContextFromConfig_withAvailableLocales_shouldRejectOtherLocales() {
    crate::common::register_post();
    let mut config = Config::default();
    config.locales.available_locales = vec!["en".to_string(), "fr".to_string()];
    let ctx = LocaleContext::from_config(&config).unwrap();
    let mut post = Post::new("restricted");

    let german = post.write_attribute_in(&ctx, &loc("de"), PostField::Title, Some("Hallo".into()));
    let french = post.write_attribute_in(&ctx, &loc("fr"), PostField::Title, Some("Salut".into()));

    assert!(matches!(german, Err(TranslationError::InvalidLocale(_))));
    assert!(french.is_ok());
    assert_eq!(post.translated_locales(), vec![loc("fr")]);
    assert_eq!(ctx.available_locales(), &[loc("en"), loc("fr")]);
}
