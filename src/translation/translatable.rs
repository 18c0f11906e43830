/*!
 * Typed accessors for translated attributes.
 *
 * Reads walk the fallback chain of the given `LocaleContext`; writes stage the
 * value in the in-memory row of the context's locale. Nothing touches the
 * store until the owning entity is saved through a `TranslatedRepository`.
 */

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

use super::attribute::TranslatedAttribute;
use super::collection::Translations;
use super::registry::{TranslationOptions, TranslationRegistration, TranslationRegistry};
use crate::app_config::Config;
use crate::database::entity::BaseEntity;
use crate::errors::{Result, TranslationError};
use crate::locale::{Locale, LocaleContext};

/// Read policy taken from the registration
#[derive(Debug, Clone, Copy)]
struct ReadPolicy {
    fallback_to_empty_on_missing: bool,
    fallbacks_for_empty_translations: bool,
}

fn read_policy<T: Translatable>(attribute: T::Attribute) -> Result<ReadPolicy> {
    let name = attribute.name();
    let policy = TranslationRegistry::global().with_registration::<T, _>(|registration| {
        registration.is_registered(name).then_some(ReadPolicy {
            fallback_to_empty_on_missing: registration.fallback_to_empty_on_missing,
            fallbacks_for_empty_translations: registration.fallbacks_for_empty_translations,
        })
    });

    match policy {
        Some(Some(policy)) => Ok(policy),
        Some(None) => Err(TranslationError::UnregisteredAttribute {
            entity: T::table_name().to_string(),
            attribute: name.to_string(),
        }),
        None => Err(not_translated::<T>()),
    }
}

fn not_translated<T: BaseEntity>() -> TranslationError {
    TranslationError::Configuration(format!(
        "'{}' has no translated attributes registered",
        T::table_name()
    ))
}

/// A base entity with per-locale translated attributes
pub trait Translatable: BaseEntity {
    type Attribute: TranslatedAttribute;

    fn translations(&self) -> &Translations;

    fn translations_mut(&mut self) -> &mut Translations;

    /// Register translated attributes on the global registry
    fn translates(
        attributes: &[Self::Attribute],
        options: TranslationOptions,
    ) -> Result<TranslationRegistration> {
        TranslationRegistry::global().register::<Self>(attributes, options)
    }

    /// Register with the fallback policies configured in `config.translation`
    fn translates_with_config(
        attributes: &[Self::Attribute],
        config: &Config,
    ) -> Result<TranslationRegistration> {
        Self::translates(attributes, TranslationOptions::from_defaults(&config.translation))
    }

    fn is_translated() -> bool {
        TranslationRegistry::global().is_registered::<Self>()
    }

    /// Current registration, or a configuration error if there is none
    fn translation_registration() -> Result<TranslationRegistration> {
        TranslationRegistry::global()
            .registration::<Self>()
            .ok_or_else(not_translated::<Self>)
    }

    fn translated_attribute_names() -> Vec<&'static str> {
        TranslationRegistry::global()
            .with_registration::<Self, _>(|r| r.attribute_names.clone())
            .unwrap_or_default()
    }

    /// Read an attribute in the context's current locale
    fn read_attribute(&self, ctx: &LocaleContext, attribute: Self::Attribute) -> Result<Option<String>> {
        self.read_attribute_in(ctx, ctx.locale(), attribute)
    }

    /// Read an attribute in `locale`, using the context's fallback chains
    fn read_attribute_in(
        &self,
        ctx: &LocaleContext,
        locale: &Locale,
        attribute: Self::Attribute,
    ) -> Result<Option<String>> {
        let policy = read_policy::<Self>(attribute)?;
        let name = attribute.name();
        let mut first_empty: Option<Option<String>> = None;

        for candidate in ctx.fallback_chain_for(locale) {
            let Some(record) = self.translations().get(&candidate) else {
                continue;
            };
            let value = record.get(name);
            let is_empty = value.is_none_or(str::is_empty);

            if !(policy.fallbacks_for_empty_translations && is_empty) {
                return Ok(value.map(str::to_string));
            }
            if first_empty.is_none() {
                first_empty = Some(value.map(str::to_string));
            }
        }

        if let Some(value) = first_empty {
            return Ok(value);
        }
        if policy.fallback_to_empty_on_missing {
            return Ok(None);
        }
        Err(TranslationError::lookup(name, locale))
    }

    /// Stage a value in the context's current locale
    fn write_attribute(
        &mut self,
        ctx: &LocaleContext,
        attribute: Self::Attribute,
        value: Option<String>,
    ) -> Result<()> {
        self.write_attribute_in(ctx, ctx.locale(), attribute, value)
    }

    /// Stage a value in `locale`, which must be available in the context
    fn write_attribute_in(
        &mut self,
        ctx: &LocaleContext,
        locale: &Locale,
        attribute: Self::Attribute,
        value: Option<String>,
    ) -> Result<()> {
        read_policy::<Self>(attribute)?;
        ctx.ensure_available(locale)?;
        self.translations_mut()
            .find_or_init_by_locale(locale)
            .set(attribute.name(), value);
        Ok(())
    }

    /// Values of one attribute in every locale present
    fn attribute_translations(&self, attribute: Self::Attribute) -> Result<BTreeMap<Locale, Option<String>>> {
        read_policy::<Self>(attribute)?;
        let name = attribute.name();
        Ok(self
            .translations()
            .records()
            .iter()
            .map(|r| (r.locale.clone(), r.get(name).map(str::to_string)))
            .collect())
    }

    /// Stage one attribute in several locales at once
    fn write_attribute_translations(
        &mut self,
        ctx: &LocaleContext,
        attribute: Self::Attribute,
        values: BTreeMap<Locale, Option<String>>,
    ) -> Result<()> {
        read_policy::<Self>(attribute)?;
        for locale in values.keys() {
            ctx.ensure_available(locale)?;
        }
        for (locale, value) in values {
            self.translations_mut()
                .find_or_init_by_locale(&locale)
                .set(attribute.name(), value);
        }
        Ok(())
    }

    fn translated_locales(&self) -> Vec<Locale> {
        self.translations().locales()
    }

    /// Read a serialized attribute and decode it from JSON
    fn read_serialized<V: DeserializeOwned>(
        &self,
        ctx: &LocaleContext,
        attribute: Self::Attribute,
    ) -> Result<Option<V>> {
        if !attribute.is_serialized() {
            return Err(TranslationError::NotSerialized(attribute.name().to_string()));
        }
        match self.read_attribute(ctx, attribute)? {
            Some(text) if !text.is_empty() => Ok(Some(serde_json::from_str(&text)?)),
            _ => Ok(None),
        }
    }

    /// Encode a value as JSON and stage it in the context's current locale
    fn write_serialized<V: Serialize>(
        &mut self,
        ctx: &LocaleContext,
        attribute: Self::Attribute,
        value: &V,
    ) -> Result<()> {
        if !attribute.is_serialized() {
            return Err(TranslationError::NotSerialized(attribute.name().to_string()));
        }
        let text = serde_json::to_string(value)?;
        self.write_attribute(ctx, attribute, Some(text))
    }
}
