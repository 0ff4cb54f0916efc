//! Response normalization: turning a raw model completion into typed data.
//!
//! The pipeline is:
//! 1. Reject empty text outright ([`ParseFailure::EmptyResponse`]).
//! 2. Pick a JSON candidate out of the text ([`extract`]).
//! 3. Parse the candidate as JSON.
//! 4. Check the parsed value has the shape expected for the payload kind.
//! 5. Decode it leniently: numbers stand in for text, optional fields of the
//!    wrong type are dropped, and an unusable day number falls back to the
//!    digits it contains or to the day's position.
//!
//! Nothing here logs or retries; callers decide what to do with a failure.
//! Only shape is checked. Day numbering, company counts and similar
//! semantic properties are left as the model produced them.

pub mod extract;

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use wayfarer_store::models::{Attraction, ItineraryData};

pub use extract::{BracketSpan, ExtractionStrategy, FencedBlock, extract_candidate};

/// Which schema a completion is expected to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Itinerary,
    Attractions,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Itinerary => "itinerary",
            Self::Attractions => "attractions",
        };
        f.write_str(s)
    }
}

/// A normalized completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Itinerary(ItineraryData),
    Attractions(Vec<Attraction>),
}

/// Why a completion could not be normalized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseFailure {
    /// The completion was blank, usually a content filter or quota
    /// condition upstream. Not worth retrying.
    #[error("the AI returned an empty response")]
    EmptyResponse,

    /// The completion did not contain a usable payload. Both the extracted
    /// candidate and the full original text are kept for diagnostics.
    #[error("the AI returned data in an unexpected format: {reason}")]
    MalformedPayload {
        candidate: String,
        raw: String,
        reason: String,
    },
}

/// Normalize `raw` into the payload described by `kind`.
pub fn normalize(raw: &str, kind: PayloadKind) -> Result<Normalized, ParseFailure> {
    match kind {
        PayloadKind::Itinerary => normalize_itinerary(raw).map(Normalized::Itinerary),
        PayloadKind::Attractions => normalize_attractions(raw).map(Normalized::Attractions),
    }
}

/// Normalize a completion that should hold an itinerary object.
///
/// A lone latitude or longitude on an activity is dropped. Any `id` the
/// model invented is discarded, since ids are only assigned on save.
pub fn normalize_itinerary(raw: &str) -> Result<ItineraryData, ParseFailure> {
    let mut data: ItineraryData = parse_payload(
        raw,
        PayloadKind::Itinerary,
        check_itinerary,
        repair_day_numbers,
    )?;
    data.id = None;
    data.normalize_coordinates();
    Ok(data)
}

/// Normalize a completion that should hold an array of attractions.
pub fn normalize_attractions(raw: &str) -> Result<Vec<Attraction>, ParseFailure> {
    parse_payload(raw, PayloadKind::Attractions, check_attractions, |_| {})
}

fn parse_payload<T: DeserializeOwned>(
    raw: &str,
    kind: PayloadKind,
    check_shape: fn(&Value) -> Result<(), String>,
    repair: fn(&mut Value),
) -> Result<T, ParseFailure> {
    if raw.trim().is_empty() {
        return Err(ParseFailure::EmptyResponse);
    }

    let candidate = extract_candidate(raw, kind);
    let malformed = |reason: String| ParseFailure::MalformedPayload {
        candidate: candidate.to_owned(),
        raw: raw.to_owned(),
        reason,
    };

    let mut value: Value =
        serde_json::from_str(candidate).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    check_shape(&value).map_err(&malformed)?;
    repair(&mut value);
    serde_json::from_value(value).map_err(|e| malformed(format!("invalid {kind}: {e}")))
}

// ---------------------------------------------------------------------------
// Shape checks
// ---------------------------------------------------------------------------

fn require_object<'a>(
    value: &'a Value,
    what: &str,
) -> Result<&'a serde_json::Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("{what} is not a JSON object"))
}

fn require_array<'a>(
    obj: &'a serde_json::Map<String, Value>,
    field: &str,
    what: &str,
) -> Result<&'a Vec<Value>, String> {
    match obj.get(field) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(format!("{what}.{field} is not an array")),
        None => Err(format!("{what} is missing {field:?}")),
    }
}

fn require_fields(
    obj: &serde_json::Map<String, Value>,
    fields: &[&str],
    what: &str,
) -> Result<(), String> {
    for field in fields {
        match obj.get(*field) {
            None | Some(Value::Null) => return Err(format!("{what} is missing {field:?}")),
            Some(_) => {}
        }
    }
    Ok(())
}

fn optional_array(
    obj: &serde_json::Map<String, Value>,
    field: &str,
    what: &str,
) -> Result<(), String> {
    match obj.get(field) {
        None | Some(Value::Null) | Some(Value::Array(_)) => Ok(()),
        Some(_) => Err(format!("{what}.{field} is not an array")),
    }
}

fn check_itinerary(value: &Value) -> Result<(), String> {
    let root = require_object(value, "itinerary")?;
    require_fields(root, &["tripTitle"], "itinerary")?;
    optional_array(root, "suggestedCompanies", "itinerary")?;
    optional_array(root, "tripRequirements", "itinerary")?;

    for (i, day) in require_array(root, "itinerary", "itinerary")?.iter().enumerate() {
        let what = format!("itinerary[{i}]");
        let day = require_object(day, &what)?;
        require_fields(day, &["day", "title", "description"], &what)?;
        for (j, activity) in require_array(day, "activities", &what)?.iter().enumerate() {
            let what = format!("{what}.activities[{j}]");
            let activity = require_object(activity, &what)?;
            require_fields(activity, &["time", "description", "icon"], &what)?;
        }
    }
    Ok(())
}

fn check_attractions(value: &Value) -> Result<(), String> {
    let items = value
        .as_array()
        .ok_or_else(|| "attractions payload is not a JSON array".to_string())?;
    for (i, item) in items.iter().enumerate() {
        let what = format!("attractions[{i}]");
        let item = require_object(item, &what)?;
        require_fields(item, &["name", "description", "category"], &what)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Repairs
// ---------------------------------------------------------------------------

/// Rewrite every `day` as a whole number. A value that is not one becomes
/// the first run of digits it contains, or else the 1-based position.
fn repair_day_numbers(value: &mut Value) {
    let Some(days) = value.get_mut("itinerary").and_then(Value::as_array_mut) else {
        return;
    };
    for (i, day) in days.iter_mut().enumerate() {
        let Some(day) = day.as_object_mut() else {
            continue;
        };
        let position = u32::try_from(i + 1).unwrap_or(u32::MAX);
        let number = day.get("day").and_then(day_number).unwrap_or(position);
        day.insert("day".to_string(), Value::from(number));
    }
}

fn day_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
            .map(|f| f as u32),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
