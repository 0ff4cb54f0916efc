//! `wayfarer generate` and `wayfarer attractions`: the two AI request paths.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use wayfarer_core::form::{ActivityLevel, Budget, ItineraryForm, TripStyle};
use wayfarer_core::i18n::Translate;
use wayfarer_core::{Dispatch, PathState, Session};

use crate::config::WayfarerConfig;
use crate::credential_prompt::{CredentialPrompt, LinePrompt};
use crate::plan_cmds::{print_itinerary, print_saved};
use crate::render::{self, report_failure};
use crate::session;

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Where to go (e.g. "Kyoto, Japan")
    pub destination: String,
    /// Trip length in days; a leading number is enough (e.g. "5 days")
    #[arg(long, short = 'd', allow_hyphen_values = true)]
    pub days: String,
    /// Comma-separated interests (e.g. "food, temples, hiking")
    #[arg(long, short = 'i')]
    pub interests: String,
    /// How full each day should be: relaxed, moderate or packed
    #[arg(long, default_value_t)]
    pub activity_level: ActivityLevel,
    /// Who is travelling: solo, couple, family or friends
    #[arg(long, default_value_t)]
    pub style: TripStyle,
    /// Spending level: budget, mid-range or luxury
    #[arg(long, default_value_t)]
    pub budget: Budget,
    /// Departure city, used for travel logistics tips
    #[arg(long, default_value = "")]
    pub origin: String,
    /// Also list top attractions for the destination
    #[arg(long)]
    pub attractions: bool,
    /// Save the itinerary and print its share link
    #[arg(long)]
    pub save: bool,
    /// Print the itinerary as JSON
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    fn form(&self) -> ItineraryForm {
        ItineraryForm {
            destination: self.destination.clone(),
            duration: self.days.clone(),
            interests: self.interests.clone(),
            activity_level: self.activity_level,
            trip_style: self.style,
            budget: self.budget,
            origin: self.origin.clone(),
        }
    }
}

// -----------------------------------------------------------------------
// wayfarer generate
// -----------------------------------------------------------------------

pub async fn run_generate(args: GenerateArgs, config: &WayfarerConfig) -> Result<()> {
    let mut session = session::open_session(config, config.base_url.clone())?;
    let mut prompt = LinePrompt::stdio();
    generate(&mut session, &args, &mut prompt).await
}

async fn generate(
    session: &mut Session,
    args: &GenerateArgs,
    prompt: &mut dyn CredentialPrompt,
) -> Result<()> {
    let dispatch = session.generate(&args.form());
    if let Dispatch::Rejected(info) = &dispatch {
        return Err(report_failure(info, session.catalog()));
    }
    let Some(ticket) = session::obtain_ticket(session, dispatch, prompt)? else {
        return Ok(());
    };

    let mut tickets = vec![ticket];
    if args.attractions {
        // The key is stored by now, so this lookup runs alongside.
        if let Dispatch::Ready(extra) = session.fetch_attractions(&args.destination) {
            tickets.push(extra);
        }
    }

    eprintln!("{}", session.catalog().t("loadingTitle"));
    session::drive(session, tickets).await;

    if let Some(info) = session.itinerary().failure().cloned() {
        if info.is_auth() {
            render::write_failure(&mut std::io::stderr().lock(), &info, session.catalog())?;
            session::reprompt_after_auth(session, prompt)?;
            return Err(anyhow::Error::new(render::Reported));
        }
        return Err(report_failure(&info, session.catalog()));
    }

    // A failed save still shows the plan; the error is reported last.
    let save_failure = if args.save {
        session.save_current().err()
    } else {
        None
    };

    let Some(data) = session.itinerary().success() else {
        return Ok(());
    };
    print_itinerary(session.store(), session.catalog(), data, args.json)?;
    if args.save && save_failure.is_none() && !args.json {
        println!();
        print_saved(session.store(), session.catalog(), data);
    }

    if args.attractions {
        println!();
        print_attractions(session, &args.destination, false)?;
    }

    match save_failure {
        Some(info) => Err(report_failure(&info, session.catalog())),
        None => Ok(()),
    }
}

// -----------------------------------------------------------------------
// wayfarer attractions
// -----------------------------------------------------------------------

pub async fn run_attractions(destination: &str, json: bool, config: &WayfarerConfig) -> Result<()> {
    let mut session = session::open_session(config, config.base_url.clone())?;
    let mut prompt = LinePrompt::stdio();
    attractions(&mut session, destination, json, &mut prompt).await
}

async fn attractions(
    session: &mut Session,
    destination: &str,
    json: bool,
    prompt: &mut dyn CredentialPrompt,
) -> Result<()> {
    let dispatch = session.fetch_attractions(destination);
    let Some(ticket) = session::obtain_ticket(session, dispatch, prompt)? else {
        return Ok(());
    };

    eprintln!("{}", session.catalog().t("fetchingAttractions"));
    session::drive(session, vec![ticket]).await;

    if let Some(info) = session.attractions().failure().cloned() {
        if info.is_auth() {
            render::write_failure(&mut std::io::stderr().lock(), &info, session.catalog())?;
            session::reprompt_after_auth(session, prompt)?;
            return Err(anyhow::Error::new(render::Reported));
        }
        return Err(report_failure(&info, session.catalog()));
    }
    print_attractions(session, destination, json)
}

fn print_attractions(session: &Session, destination: &str, json: bool) -> Result<()> {
    write_attractions_state(
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
        session,
        destination,
        json,
    )
}

/// Results go to `out`, a failure goes to `err`.
fn write_attractions_state(
    out: &mut dyn Write,
    err: &mut dyn Write,
    session: &Session,
    destination: &str,
    json: bool,
) -> Result<()> {
    match session.attractions() {
        PathState::Success(list) if json => {
            let text =
                serde_json::to_string_pretty(list).context("failed to serialize attractions")?;
            writeln!(out, "{text}")?;
        }
        PathState::Success(list) => {
            render::write_attractions(out, destination.trim(), list, session.catalog())?;
        }
        PathState::Failure(info) => {
            render::write_failure(err, info, session.catalog())?;
        }
        PathState::Idle | PathState::Loading => {}
    }
    Ok(())
}
