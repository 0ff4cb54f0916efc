use std::io::Write;

use anyhow::{Context, Result};
use tracing::warn;
use url::Url;

use wayfarer_core::classify;
use wayfarer_core::i18n::{Catalog, Translate};
use wayfarer_core::normalize;
use wayfarer_core::store::ItineraryStore;
use wayfarer_core::PathState;
use wayfarer_store::kv::KeyValueStore;
use wayfarer_store::models::{ItineraryData, Locale};
use wayfarer_store::queries::itineraries::LoadError;
use wayfarer_store::queries::settings;

use crate::PlanCommands;
use crate::config::WayfarerConfig;
use crate::export_cmd;
use crate::render::{self, report_failure};
use crate::resolve::resolve_itinerary_id;
use crate::session;

/// Dispatch a `wayfarer plan` subcommand.
pub fn run_plan_command(command: PlanCommands, config: &WayfarerConfig) -> Result<()> {
    let (kv, mut store) = session::open_itinerary_store(config)?;
    let catalog = catalog_for(kv.as_ref());

    match command {
        PlanCommands::Show { plan, json } => cmd_show(&store, &catalog, &plan, json),
        PlanCommands::List => cmd_list(&store, &catalog),
        PlanCommands::Share { plan } => cmd_share(&store, &catalog, &plan),
        PlanCommands::Export {
            plan,
            format,
            output,
        } => {
            let data = load(&store, &catalog, &plan)?;
            export_cmd::run_export(&data, format, output.as_deref(), &catalog)
        }
        PlanCommands::Import { file } => cmd_import(&mut store, &catalog, &file),
        PlanCommands::Remove { plan } => cmd_remove(&mut store, &catalog, &plan),
    }
}

/// The catalog for the stored language. An unreadable setting falls back
/// to the default language.
pub(crate) fn catalog_for(kv: &dyn KeyValueStore) -> Catalog {
    let locale = settings::get_locale(kv).unwrap_or_else(|e| {
        warn!(error = %e, "failed to read language setting");
        Locale::default()
    });
    Catalog::builtin(locale)
}

fn load(store: &ItineraryStore, catalog: &Catalog, plan: &str) -> Result<ItineraryData> {
    let id = resolve_itinerary_id(plan)?;
    store
        .load(&id)
        .map_err(|e| report_failure(&classify::classify_load(&e, catalog), catalog))
}

// -----------------------------------------------------------------------
// wayfarer plan show
// -----------------------------------------------------------------------

fn cmd_show(store: &ItineraryStore, catalog: &Catalog, plan: &str, json: bool) -> Result<()> {
    let data = load(store, catalog, plan)?;
    print_itinerary(store, catalog, &data, json)
}

pub(crate) fn print_itinerary(
    store: &ItineraryStore,
    catalog: &Catalog,
    data: &ItineraryData,
    json: bool,
) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(data).context("failed to serialize itinerary")?
        );
        return Ok(());
    }

    let mut out = std::io::stdout().lock();
    render::write_itinerary(&mut out, data, catalog)?;
    if let Some(link) = store.share_token(data) {
        writeln!(out)?;
        writeln!(out, "{}: {link}", catalog.t("shareLinkLabel"))?;
    }
    Ok(())
}

// -----------------------------------------------------------------------
// wayfarer plan list
// -----------------------------------------------------------------------

fn cmd_list(store: &ItineraryStore, catalog: &Catalog) -> Result<()> {
    let plans = store.list().map_err(|e| {
        report_failure(
            &classify::classify_load(&LoadError::Unreadable(e), catalog),
            catalog,
        )
    })?;

    if plans.is_empty() {
        println!("{}", catalog.t("savedPlansEmpty"));
        return Ok(());
    }

    println!("{}", catalog.t("savedPlansTitle"));
    println!("{:<10} {:>4} {:>10}  TITLE", "ID", "DAYS", "ACTIVITIES");
    println!("{}", "-".repeat(60));
    for plan in &plans {
        println!(
            "{:<10} {:>4} {:>10}  {}",
            plan.id.as_deref().unwrap_or("-"),
            plan.itinerary.len(),
            plan.activity_count(),
            plan.trip_title,
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// wayfarer plan share
// -----------------------------------------------------------------------

fn cmd_share(store: &ItineraryStore, catalog: &Catalog, plan: &str) -> Result<()> {
    let data = load(store, catalog, plan)?;
    if let Some(link) = store.share_token(&data) {
        println!("{link}");
    }
    Ok(())
}

// -----------------------------------------------------------------------
// wayfarer plan import
// -----------------------------------------------------------------------

/// Save an itinerary from a JSON file (an export, or a raw model reply).
/// The plan gets a fresh id.
fn cmd_import(store: &mut ItineraryStore, catalog: &Catalog, file: &str) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read itinerary file: {file}"))?;
    let data = normalize::normalize_itinerary(&raw)
        .with_context(|| format!("{file} does not contain a usable itinerary"))?;

    let saved = store
        .save(&data)
        .map_err(|e| report_failure(&classify::classify_save(e.store_error(), catalog), catalog))?;
    print_saved(store, catalog, &saved);
    Ok(())
}

pub(crate) fn print_saved(store: &ItineraryStore, catalog: &Catalog, saved: &ItineraryData) {
    println!("{}", catalog.t("itinerarySaveSuccess"));
    if let Some(id) = &saved.id {
        println!("  {}: {id}", catalog.t("itineraryId"));
    }
    if let Some(link) = store.share_token(saved) {
        println!("  {}: {link}", catalog.t("shareLinkLabel"));
    }
}

// -----------------------------------------------------------------------
// wayfarer plan remove
// -----------------------------------------------------------------------

fn cmd_remove(store: &mut ItineraryStore, catalog: &Catalog, plan: &str) -> Result<()> {
    let id = resolve_itinerary_id(plan)?;
    let removed = store
        .remove(&id)
        .map_err(|e| report_failure(&classify::classify_save(&e, catalog), catalog))?;
    if !removed {
        let missing = LoadError::NotFound { id };
        return Err(report_failure(
            &classify::classify_load(&missing, catalog),
            catalog,
        ));
    }
    println!("{}", catalog.t("itineraryRemoved"));
    Ok(())
}

// -----------------------------------------------------------------------
// wayfarer open
// -----------------------------------------------------------------------

/// Load the itinerary named by a share link, as a fresh start at that
/// address would.
pub fn run_open(config: &WayfarerConfig, link: &str, json: bool) -> Result<()> {
    let location = Url::parse(link.trim()).with_context(|| format!("invalid link: {link:?}"))?;
    let mut session = session::open_session(config, location)?;

    match session.rehydrate().clone() {
        PathState::Success(data) => {
            print_itinerary(session.store(), session.catalog(), &data, json)
        }
        PathState::Failure(info) => Err(report_failure(&info, session.catalog())),
        PathState::Idle | PathState::Loading => {
            anyhow::bail!("link {link:?} does not name a saved itinerary")
        }
    }
}
