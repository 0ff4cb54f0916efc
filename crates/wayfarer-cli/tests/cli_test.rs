//! End-to-end tests for the `wayfarer` binary.
//!
//! Each test runs the binary against its own temporary data and config
//! directories. None of them reach the AI service: they cover the local
//! commands and the paths that stop before the network.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

use wayfarer_test_utils::SAMPLE_ITINERARY_JSON;

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_wayfarer"))
            .args(args)
            .env("WAYFARER_DATA_DIR", self.path().join("data"))
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("WAYFARER_BASE_URL", "https://plans.example/")
            .env_remove("WAYFARER_API_KEY")
            .env_remove("WAYFARER_MODEL")
            .env_remove("WAYFARER_ENDPOINT")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run wayfarer")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "wayfarer {args:?} failed\nstdout={}\nstderr={}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("stdout is utf-8")
    }

    /// Import the sample itinerary and return its new id.
    fn import_sample(&self) -> String {
        let file = self.path().join("plan.json");
        std::fs::write(&file, SAMPLE_ITINERARY_JSON).unwrap();
        let stdout = self.run_ok(&["plan", "import", file.to_str().unwrap()]);
        assert!(stdout.contains("Itinerary saved!"), "stdout={stdout}");
        stdout
            .lines()
            .find_map(|l| l.trim().strip_prefix("Plan ID: "))
            .expect("import prints the new id")
            .to_string()
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// -----------------------------------------------------------------------
// Key and locale
// -----------------------------------------------------------------------

#[test]
fn key_set_status_clear() {
    let sandbox = Sandbox::new();
    assert!(sandbox.run_ok(&["key", "status"]).contains("No API key is stored."));

    assert!(sandbox.run_ok(&["key", "set", "AIza-test"]).contains("API key saved."));
    assert!(sandbox.run_ok(&["key", "status"]).contains("An API key is stored."));

    assert!(sandbox.run_ok(&["key", "clear"]).contains("API key removed."));
    assert!(sandbox.run_ok(&["key", "status"]).contains("No API key is stored."));
}

#[test]
fn key_set_without_value_and_no_input_cancels() {
    let sandbox = Sandbox::new();
    let stdout = sandbox.run_ok(&["key", "set"]);
    assert!(stdout.contains("No API key entered."), "stdout={stdout}");
    assert!(sandbox.run_ok(&["key", "status"]).contains("No API key is stored."));
}

#[test]
fn locale_is_remembered() {
    let sandbox = Sandbox::new();
    assert_eq!(sandbox.run_ok(&["locale", "show"]).trim(), "en (English, ltr)");

    sandbox.run_ok(&["locale", "set", "ar"]);
    assert_eq!(sandbox.run_ok(&["locale", "show"]).trim(), "ar (Arabic, rtl)");

    assert!(!sandbox.run(&["locale", "set", "fr"]).status.success());
}

// -----------------------------------------------------------------------
// Saved plans
// -----------------------------------------------------------------------

#[test]
fn plan_list_empty() {
    let sandbox = Sandbox::new();
    assert!(sandbox.run_ok(&["plan", "list"]).contains("No saved plans yet."));
}

#[test]
fn import_show_list_share() {
    let sandbox = Sandbox::new();
    let id = sandbox.import_sample();
    assert_eq!(id.len(), 9);

    let list = sandbox.run_ok(&["plan", "list"]);
    assert!(list.contains(&id));
    assert!(list.contains("Lisbon Light"));

    let json = sandbox.run_ok(&["plan", "show", &id, "--json"]);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["id"], id.as_str());
    assert_eq!(value["tripTitle"], "Lisbon Light");
    assert_eq!(value["itinerary"].as_array().map(Vec::len), Some(2));

    let link = sandbox.run_ok(&["plan", "share", &id]);
    assert_eq!(link.trim(), format!("https://plans.example/?itineraryId={id}"));

    let text = sandbox.run_ok(&["plan", "show", link.trim()]);
    assert!(text.contains("Day 1: Alfama"));
    assert!(text.contains(&format!("Share link: https://plans.example/?itineraryId={id}")));
}

#[test]
fn open_share_link() {
    let sandbox = Sandbox::new();
    let id = sandbox.import_sample();

    let link = format!("https://plans.example/?itineraryId={id}");
    let text = sandbox.run_ok(&["open", &link]);
    assert!(text.starts_with("Lisbon Light\n"));

    let missing = sandbox.run(&["open", "https://plans.example/?itineraryId=zzzzzzzzz"]);
    assert!(!missing.status.success());
    assert!(stderr(&missing).contains("The requested itinerary was not found."));
}

#[test]
fn open_without_saved_plans() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["open", "https://plans.example/?itineraryId=abc"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("There are no saved plans on this device."));
}

#[test]
fn export_markdown_to_file() {
    let sandbox = Sandbox::new();
    let id = sandbox.import_sample();
    let out = sandbox.path().join("plan.md");

    sandbox.run_ok(&["plan", "export", &id, "--output", out.to_str().unwrap()]);
    let md = std::fs::read_to_string(&out).unwrap();
    assert!(md.starts_with("# Lisbon Light\n"));
    assert!(md.contains("## Day 2: Belém"));
    assert!(md.contains("[Visit website](https://lisbonwalker.example)"));
}

#[test]
fn remove_then_show_fails() {
    let sandbox = Sandbox::new();
    let id = sandbox.import_sample();

    assert!(sandbox.run_ok(&["plan", "remove", &id]).contains("Itinerary removed."));
    let output = sandbox.run(&["plan", "show", &id]);
    assert!(!output.status.success());

    let again = sandbox.run(&["plan", "remove", &id]);
    assert!(!again.status.success());
}

#[test]
fn corrupt_store_is_reported_and_kept() {
    let sandbox = Sandbox::new();
    let data = sandbox.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    let store = data.join("store.json");
    let corrupt = r#"{"ai-travel-planner-itineraries": "{not json"}"#;
    std::fs::write(&store, corrupt).unwrap();

    let file = sandbox.path().join("plan.json");
    std::fs::write(&file, SAMPLE_ITINERARY_JSON).unwrap();
    let output = sandbox.run(&["plan", "import", file.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Could not save the itinerary."));
    assert_eq!(std::fs::read_to_string(&store).unwrap(), corrupt);

    let list = sandbox.run(&["plan", "list"]);
    assert!(!list.status.success());
    assert!(stderr(&list).contains("Could not load the saved itinerary."));
}

#[test]
fn unreadable_store_file_does_not_block_key_setup() {
    let sandbox = Sandbox::new();
    let data = sandbox.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("store.json"), "{ broken").unwrap();

    assert!(sandbox.run_ok(&["key", "status"]).contains("No API key is stored."));
    assert!(sandbox.run_ok(&["key", "set", "AIza-test"]).contains("API key saved."));
    assert!(sandbox.run_ok(&["key", "status"]).contains("An API key is stored."));
    assert_eq!(
        std::fs::read_to_string(data.join("store.json.corrupt")).unwrap(),
        "{ broken"
    );
}

#[test]
fn invalid_plan_reference_is_rejected() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["plan", "show", "../../etc"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid itinerary ID"));
}

// -----------------------------------------------------------------------
// Generation paths that stop before the network
// -----------------------------------------------------------------------

#[test]
fn negative_duration_is_rejected_before_key_prompt() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["generate", "Lisbon", "--days", "-3", "--interests", "food"]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Please enter a valid number of days."), "stderr={err}");
    assert!(!err.contains("Enter your Gemini API key"));
}

#[test]
fn missing_interests_are_rejected() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["generate", "Lisbon", "--days", "3", "--interests", " "]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Please fill in the destination, duration, and interests."));
}

#[test]
fn generate_without_key_and_no_input_cancels() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["generate", "Lisbon", "--days", "3", "--interests", "food"]);

    assert!(output.status.success(), "stderr={}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("Enter your Gemini API key"));
    assert!(err.contains("No API key entered. Request cancelled."));
    assert!(output.stdout.is_empty());
}

#[test]
fn completions_are_generated() {
    let sandbox = Sandbox::new();
    let script = sandbox.run_ok(&["completions", "bash"]);
    assert!(script.contains("wayfarer"));
}
