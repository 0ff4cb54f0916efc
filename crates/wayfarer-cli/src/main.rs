mod config;
mod credential_prompt;
mod export_cmd;
mod generate_cmd;
mod plan_cmds;
mod render;
mod resolve;
mod session;
mod settings_cmds;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

use wayfarer_store::models::Locale;

use config::{Overrides, WayfarerConfig};
use export_cmd::ExportFormat;
use generate_cmd::GenerateArgs;
use render::Reported;

#[derive(Parser)]
#[command(name = "wayfarer", version, about = "AI travel itinerary planner")]
struct Cli {
    /// Data directory (overrides WAYFARER_DATA_DIR env var)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Gemini model name (overrides WAYFARER_MODEL env var)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Page address share links are built on (overrides WAYFARER_BASE_URL env var)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a wayfarer config file from the global flags
    Init {
        /// Upper bound on one AI request, in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Generate a day-by-day itinerary
    Generate(GenerateArgs),
    /// List top attractions for a destination, grouped by category
    Attractions {
        /// Destination to look up
        destination: String,
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Saved itinerary management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Open the itinerary named by a share link
    Open {
        /// Share link containing an itineraryId parameter
        link: String,
        /// Print the itinerary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Gemini API key management
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
    /// Language used for prompts and messages
    Locale {
        #[command(subcommand)]
        command: LocaleCommands,
    },
    /// Print a shell completion script
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show a saved itinerary
    Show {
        /// Itinerary ID or share link
        plan: String,
        /// Print the stored JSON record
        #[arg(long)]
        json: bool,
    },
    /// List saved itineraries
    List,
    /// Print the share link of a saved itinerary
    Share {
        /// Itinerary ID or share link
        plan: String,
    },
    /// Export a saved itinerary for printing or backup
    Export {
        /// Itinerary ID or share link
        plan: String,
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: ExportFormat,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Save an itinerary from a JSON file under a new ID
    Import {
        /// Path to the itinerary JSON file
        file: String,
    },
    /// Delete a saved itinerary
    Remove {
        /// Itinerary ID or share link
        plan: String,
    },
}

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Store an API key (prompts when omitted)
    Set {
        /// The API key
        key: Option<String>,
    },
    /// Remove the stored API key
    Clear,
    /// Report whether an API key is stored
    Status,
}

#[derive(Subcommand)]
pub enum LocaleCommands {
    /// Switch language: en or ar
    Set {
        /// Locale code
        locale: Locale,
    },
    /// Show the current language
    Show,
}

/// Execute the `wayfarer init` command: write config file.
fn cmd_init(overrides: Overrides<'_>, timeout_secs: Option<u64>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut cfg = config::ConfigFile::default();
    if let Some(model) = overrides.model {
        cfg.ai.model = model.to_string();
    }
    if let Some(secs) = timeout_secs {
        cfg.ai.timeout_secs = secs;
    }
    if let Some(base_url) = overrides.base_url {
        url::Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("invalid base URL {base_url:?}: {e}"))?;
        cfg.share.base_url = base_url.to_string();
    }
    cfg.storage.data_dir = overrides.data_dir.map(PathBuf::from);

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  ai.model = {}", cfg.ai.model);
    println!("  ai.timeout_secs = {}", cfg.ai.timeout_secs);
    println!("  share.base_url = {}", cfg.share.base_url);
    if let Some(dir) = &cfg.storage.data_dir {
        println!("  storage.data_dir = {}", dir.display());
    }
    println!();
    println!("Next: run `wayfarer key set` to store your Gemini API key.");

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        data_dir,
        model,
        base_url,
        command,
    } = cli;
    let overrides = Overrides {
        data_dir: data_dir.as_deref(),
        model: model.as_deref(),
        base_url: base_url.as_deref(),
    };
    let resolve = || WayfarerConfig::resolve(overrides);

    match command {
        Commands::Init {
            timeout_secs,
            force,
        } => cmd_init(overrides, timeout_secs, force),
        Commands::Generate(args) => generate_cmd::run_generate(args, &resolve()?).await,
        Commands::Attractions { destination, json } => {
            generate_cmd::run_attractions(&destination, json, &resolve()?).await
        }
        Commands::Plan { command } => plan_cmds::run_plan_command(command, &resolve()?),
        Commands::Open { link, json } => plan_cmds::run_open(&resolve()?, &link, json),
        Commands::Key { command } => settings_cmds::run_key_command(command, &resolve()?),
        Commands::Locale { command } => settings_cmds::run_locale_command(command, &resolve()?),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "wayfarer",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        if !e.is::<Reported>() {
            eprintln!("error: {e:#}");
        }
        std::process::exit(1);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "wayfarer",
            "generate",
            "Kyoto",
            "--days",
            "5 days",
            "--interests",
            "temples, food",
            "--budget",
            "luxury",
            "--style",
            "couple",
            "--save",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.destination, "Kyoto");
                assert_eq!(args.days, "5 days");
                assert_eq!(args.budget, wayfarer_core::form::Budget::Luxury);
                assert_eq!(args.style, wayfarer_core::form::TripStyle::Couple);
                assert!(args.save);
                assert!(!args.json);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn unknown_locale_is_rejected() {
        assert!(Cli::try_parse_from(["wayfarer", "locale", "set", "fr"]).is_err());
        assert!(Cli::try_parse_from(["wayfarer", "locale", "set", "ar"]).is_ok());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "wayfarer",
            "plan",
            "list",
            "--data-dir",
            "/tmp/w",
            "--model",
            "m",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/w")));
        assert_eq!(cli.model.as_deref(), Some("m"));
        assert_eq!(cli.base_url, None);
        assert!(matches!(
            cli.command,
            Commands::Plan {
                command: PlanCommands::List
            }
        ));
    }
}
