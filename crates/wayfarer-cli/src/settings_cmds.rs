use std::sync::Arc;

use anyhow::{Context, Result, bail};

use wayfarer_core::gate::{CredentialGate, GateError};
use wayfarer_core::i18n::{Catalog, Translate};
use wayfarer_store::kv::KeyValueStore;
use wayfarer_store::queries::settings;

use crate::config::WayfarerConfig;
use crate::credential_prompt::{CredentialPrompt, LinePrompt};
use crate::plan_cmds::catalog_for;
use crate::session;
use crate::{KeyCommands, LocaleCommands};

// -----------------------------------------------------------------------
// wayfarer key
// -----------------------------------------------------------------------

pub fn run_key_command(command: KeyCommands, config: &WayfarerConfig) -> Result<()> {
    let kv: Arc<dyn KeyValueStore> = session::open_store(config)?;
    let catalog = catalog_for(kv.as_ref());
    let mut gate: CredentialGate<()> =
        CredentialGate::load(kv).context("failed to read stored API key")?;

    match command {
        KeyCommands::Set { key } => {
            let raw = match key {
                Some(key) => key,
                None => match LinePrompt::stdio().ask(&catalog)? {
                    Some(key) => key,
                    None => {
                        println!("{}", catalog.t("apiKeyCancelled"));
                        return Ok(());
                    }
                },
            };
            set_key(&mut gate, &raw)?;
            println!("{}", catalog.t("apiKeySaved"));
        }
        KeyCommands::Clear => {
            gate.invalidate().context("failed to remove API key")?;
            println!("{}", catalog.t("apiKeyCleared"));
        }
        KeyCommands::Status => {
            if gate.has_credential() {
                println!("{}", catalog.t("apiKeyStatusSet"));
            } else {
                println!("{}", catalog.t("apiKeyStatusUnset"));
            }
        }
    }
    Ok(())
}

fn set_key(gate: &mut CredentialGate<()>, raw: &str) -> Result<()> {
    match gate.submit(raw) {
        Ok(_) => Ok(()),
        Err(GateError::BlankCredential) => bail!("the API key must not be blank"),
        Err(e) => Err(e).context("failed to store API key"),
    }
}

// -----------------------------------------------------------------------
// wayfarer locale
// -----------------------------------------------------------------------

pub fn run_locale_command(command: LocaleCommands, config: &WayfarerConfig) -> Result<()> {
    let kv = session::open_store(config)?;
    match command {
        LocaleCommands::Set { locale } => {
            settings::set_locale(kv.as_ref(), locale).context("failed to save language")?;
            let catalog = Catalog::builtin(locale);
            println!(
                "{}",
                catalog.t_with("localeSet", &[("language", locale.language_name())])
            );
        }
        LocaleCommands::Show => {
            let locale = settings::get_locale(kv.as_ref()).context("failed to read language")?;
            let direction = if locale.is_rtl() { "rtl" } else { "ltr" };
            println!("{locale} ({}, {direction})", locale.language_name());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_store::kv::MemoryStore;

    #[test]
    fn set_key_stores_trimmed_value() {
        let kv = Arc::new(MemoryStore::new());
        let mut gate: CredentialGate<()> = CredentialGate::load(kv.clone()).unwrap();
        set_key(&mut gate, "  secret  ").unwrap();

        assert!(gate.has_credential());
        assert_eq!(
            settings::get_api_key(kv.as_ref()).unwrap().as_deref(),
            Some("secret")
        );
    }

    #[test]
    fn blank_key_is_refused() {
        let kv = Arc::new(MemoryStore::new());
        let mut gate: CredentialGate<()> = CredentialGate::load(kv.clone()).unwrap();
        assert!(set_key(&mut gate, "   ").is_err());
        assert_eq!(settings::get_api_key(kv.as_ref()).unwrap(), None);
    }
}
