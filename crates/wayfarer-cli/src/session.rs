//! Wiring between the resolved config and a [`Session`], plus the loop that
//! takes a dispatch through the key prompt and the network phase.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use url::Url;

use wayfarer_core::ai::GeminiClient;
use wayfarer_core::gate::GateError;
use wayfarer_core::i18n::Translate;
use wayfarer_core::share::MemoryAddressBar;
use wayfarer_core::store::ItineraryStore;
use wayfarer_core::{Dispatch, Session, Ticket};
use wayfarer_store::kv::FileStore;
use wayfarer_store::queries::settings;

use crate::config::WayfarerConfig;
use crate::credential_prompt::CredentialPrompt;

/// Open the on-disk store, applying `WAYFARER_API_KEY` if it is set.
pub fn open_store(config: &WayfarerConfig) -> Result<Arc<FileStore>> {
    let store = Arc::new(FileStore::open(&config.store_config));
    if let Some(key) = config.api_key.as_deref() {
        let stored = settings::get_api_key(store.as_ref())
            .with_context(|| format!("failed to read {}", store.path().display()))?;
        if stored.as_deref() != Some(key) {
            debug!("storing API key from WAYFARER_API_KEY");
            settings::set_api_key(store.as_ref(), key)?;
        }
    }
    Ok(store)
}

/// An itinerary store for commands that never call the AI service.
pub fn open_itinerary_store(config: &WayfarerConfig) -> Result<(Arc<FileStore>, ItineraryStore)> {
    let kv = open_store(config)?;
    let address = MemoryAddressBar::new(config.base_url.clone());
    let store = ItineraryStore::new(kv.clone(), Box::new(address), config.base_url.clone());
    Ok((kv, store))
}

/// A session whose address starts at `location`.
pub fn open_session(config: &WayfarerConfig, location: Url) -> Result<Session> {
    let kv = open_store(config)?;
    let client = GeminiClient::new(config.gemini.clone()).context("failed to build AI client")?;
    let session = Session::new(
        kv,
        Arc::new(client),
        Box::new(MemoryAddressBar::new(location)),
        config.session_config(),
    )
    .context("failed to open session")?;
    Ok(session)
}

// -----------------------------------------------------------------------
// Dispatch handling
// -----------------------------------------------------------------------

/// Take `dispatch` to a runnable ticket, asking for a key when the gate
/// holds the request back. `Ok(None)` means nothing will run.
pub fn obtain_ticket(
    session: &mut Session,
    dispatch: Dispatch,
    prompt: &mut dyn CredentialPrompt,
) -> Result<Option<Ticket>> {
    match dispatch {
        Dispatch::Ready(ticket) => Ok(Some(ticket)),
        Dispatch::AwaitingCredential => loop {
            let Some(raw) = prompt.ask(session.catalog())? else {
                session.cancel_credential();
                eprintln!("{}", session.catalog().t("apiKeyCancelled"));
                return Ok(None);
            };
            match session.submit_credential(&raw) {
                Ok(ticket) => return Ok(ticket),
                Err(GateError::BlankCredential) => continue,
                Err(e) => return Err(e).context("failed to store API key"),
            }
        },
        Dispatch::Rejected(_) | Dispatch::Skipped | Dispatch::Busy => Ok(None),
    }
}

/// Run `tickets` concurrently and apply each result as it lands.
///
/// Ctrl-C cancels every ticket; the paths then settle into `Failure`.
pub async fn drive(session: &mut Session, tickets: Vec<Ticket>) {
    let tokens: Vec<_> = tickets.iter().map(Ticket::cancel_token).collect();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupted, cancelling requests");
            for token in tokens {
                token.cancel();
            }
        }
    });

    let mut running = JoinSet::new();
    for ticket in tickets {
        running.spawn(ticket.run());
    }
    while let Some(joined) = running.join_next().await {
        match joined {
            Ok(completed) => {
                session.apply(completed);
            }
            Err(e) => warn!(error = %e, "request task failed"),
        }
    }
    interrupt.abort();
}

/// After an authentication failure the stored key is gone; offer to enter
/// a new one. The failed request is not replayed.
pub fn reprompt_after_auth(session: &mut Session, prompt: &mut dyn CredentialPrompt) -> Result<()> {
    let Some(raw) = prompt.ask(session.catalog())? else {
        return Ok(());
    };
    match session.submit_credential(&raw) {
        Ok(_) => {
            eprintln!("{}", session.catalog().t("apiKeySaved"));
            Ok(())
        }
        Err(GateError::BlankCredential) => Ok(()),
        Err(e) => Err(e).context("failed to store API key"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wayfarer_core::form::ItineraryForm;
    use wayfarer_core::gate::GateState;
    use wayfarer_core::{PathState, SessionConfig};
    use wayfarer_test_utils::{ScriptedCompletion, TempStore, sample_itinerary_reply};

    /// Answers from a fixed list, then declines.
    struct Answers(Vec<&'static str>);

    impl CredentialPrompt for Answers {
        fn ask(&mut self, _tr: &dyn Translate) -> Result<Option<String>> {
            if self.0.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.0.remove(0).to_string()))
            }
        }
    }

    fn session(tmp: &TempStore, completion: Arc<ScriptedCompletion>) -> Session {
        let base = Url::parse("https://plans.example/").unwrap();
        Session::new(
            tmp.store.clone(),
            completion,
            Box::new(MemoryAddressBar::new(base.clone())),
            SessionConfig::new(base),
        )
        .unwrap()
    }

    fn form() -> ItineraryForm {
        ItineraryForm {
            destination: "Lisbon".into(),
            duration: "2".into(),
            interests: "food".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn prompt_answer_releases_request() {
        let tmp = TempStore::new();
        let ai = ScriptedCompletion::with_texts([sample_itinerary_reply()]);
        let mut session = session(&tmp, ai.clone());

        let dispatch = session.generate(&form());
        let ticket = obtain_ticket(&mut session, dispatch, &mut Answers(vec!["key-1"]))
            .unwrap()
            .unwrap();
        drive(&mut session, vec![ticket]).await;

        assert!(session.itinerary().success().is_some());
        assert_eq!(ai.calls()[0].credential, "key-1");
        assert_eq!(
            settings::get_api_key(tmp.store.as_ref()).unwrap().as_deref(),
            Some("key-1")
        );
    }

    #[tokio::test]
    async fn declined_prompt_cancels_request() {
        let tmp = TempStore::new();
        let ai = ScriptedCompletion::new();
        let mut session = session(&tmp, ai.clone());

        let dispatch = session.generate(&form());
        let ticket = obtain_ticket(&mut session, dispatch, &mut Answers(vec![])).unwrap();

        assert!(ticket.is_none());
        assert_eq!(session.gate_state(), GateState::Idle);
        assert_eq!(session.itinerary(), &PathState::Idle);
        assert_eq!(ai.call_count(), 0);
    }

    #[tokio::test]
    async fn both_paths_run_together() {
        let tmp = TempStore::new();
        settings::set_api_key(tmp.store.as_ref(), "k").unwrap();
        let ai = ScriptedCompletion::with_texts([
            sample_itinerary_reply(),
            wayfarer_test_utils::SAMPLE_ATTRACTIONS_JSON.to_string(),
        ]);
        let mut session = session(&tmp, ai);

        let first = session.generate(&form());
        let itinerary = obtain_ticket(&mut session, first, &mut Answers(vec![]))
            .unwrap()
            .unwrap();
        let second = session.fetch_attractions("Lisbon");
        let attractions = obtain_ticket(&mut session, second, &mut Answers(vec![]))
            .unwrap()
            .unwrap();
        drive(&mut session, vec![itinerary, attractions]).await;

        // Replies are handed out in call order, so either path may have
        // received either reply; each must still settle.
        assert!(!session.itinerary().is_loading());
        assert!(!session.attractions().is_loading());
    }

    #[test]
    fn reprompt_stores_new_key() {
        let tmp = TempStore::new();
        let mut session = session(&tmp, ScriptedCompletion::new());
        reprompt_after_auth(&mut session, &mut Answers(vec!["fresh"])).unwrap();

        assert!(session.has_credential());
        assert_eq!(session.gate_state(), GateState::Idle);
        assert_eq!(
            settings::get_api_key(tmp.store.as_ref()).unwrap().as_deref(),
            Some("fresh")
        );
    }
}
