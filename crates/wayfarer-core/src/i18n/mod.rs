//! Translation lookup.
//!
//! A [`Translate`] implementation maps a message key to display text and
//! returns the key itself when it has no entry. The built-in catalogs are
//! compiled into the binary from `en.json` and `ar.json`.

use std::collections::HashMap;

use wayfarer_store::models::Locale;

/// A `key -> text` lookup.
pub trait Translate: Send + Sync {
    /// Text for `key`, or `key` itself when unresolved.
    fn t(&self, key: &str) -> String;

    /// Like [`Translate::t`], then replaces each `{name}` placeholder.
    fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.t(key);
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

const EN_JSON: &str = include_str!("en.json");
const AR_JSON: &str = include_str!("ar.json");

/// A flat translation table for one locale.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    locale: Locale,
    entries: HashMap<String, String>,
}

impl Catalog {
    /// The catalog shipped with the binary for `locale`.
    pub fn builtin(locale: Locale) -> Self {
        let source = match locale {
            Locale::En => EN_JSON,
            Locale::Ar => AR_JSON,
        };
        match Self::from_json(locale, source) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(%locale, error = %e, "built-in catalog unreadable, using keys");
                Self {
                    locale,
                    entries: HashMap::new(),
                }
            }
        }
    }

    /// Build a catalog from a JSON object of string values.
    pub fn from_json(locale: Locale, json: &str) -> Result<Self, serde_json::Error> {
        let entries = serde_json::from_str(json)?;
        Ok(Self { locale, entries })
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl Translate for Catalog {
    fn t(&self, key: &str) -> String {
        match self.entries.get(key) {
            Some(text) if !text.is_empty() => text.clone(),
            _ => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalogs_load() {
        let en = Catalog::builtin(Locale::En);
        let ar = Catalog::builtin(Locale::Ar);
        assert!(!en.is_empty());
        assert_eq!(en.locale(), Locale::En);
        assert_eq!(ar.locale(), Locale::Ar);
        assert_ne!(en.t("errorTitle"), ar.t("errorTitle"));
    }

    #[test]
    fn catalogs_share_the_same_keys() {
        let en: HashMap<String, String> = serde_json::from_str(EN_JSON).unwrap();
        let ar: HashMap<String, String> = serde_json::from_str(AR_JSON).unwrap();
        let mut missing: Vec<&String> = en.keys().filter(|k| !ar.contains_key(*k)).collect();
        missing.sort();
        assert!(missing.is_empty(), "keys missing from ar.json: {missing:?}");
        assert_eq!(en.len(), ar.len());
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        let en = Catalog::builtin(Locale::En);
        assert_eq!(en.t("noSuchKey"), "noSuchKey");
    }

    #[test]
    fn placeholders_are_replaced() {
        let catalog =
            Catalog::from_json(Locale::En, r#"{"greet": "Top sights in {destination}"}"#).unwrap();
        assert_eq!(
            catalog.t_with("greet", &[("destination", "Rome")]),
            "Top sights in Rome"
        );
    }

    #[test]
    fn empty_entry_falls_back_to_key() {
        let catalog = Catalog::from_json(Locale::En, r#"{"blank": ""}"#).unwrap();
        assert_eq!(catalog.t("blank"), "blank");
    }
}
