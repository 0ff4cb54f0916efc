//! Prompt construction for the two request kinds.
//!
//! Pure string assembly, no I/O. Each builder returns a ready
//! [`CompletionRequest`] carrying the options its path needs: the itinerary
//! prompt asks for free-form JSON and enables web search so suggested
//! companies are real; the attractions prompt is schema-constrained.

use serde_json::{Value, json};

use wayfarer_store::models::{AttractionCategory, Locale};

use crate::ai::{CompletionOptions, CompletionRequest, Tool};
use crate::form::TripParams;

// ---------------------------------------------------------------------------
// Itinerary
// ---------------------------------------------------------------------------

/// JSON layout the itinerary prompt asks for.
const ITINERARY_STRUCTURE: &str = r#"{
  "tripTitle": "A creative and catchy title for the trip.",
  "tripRequirements": [
    "Actionable tip 1 (e.g., Check visa requirements for your nationality).",
    "Actionable tip 2 (e.g., Book flights from origin to destination)."
  ],
  "itinerary": [
    {
      "day": 1,
      "title": "A short, engaging title for the day's plan.",
      "description": "A brief, one-sentence summary of the day's theme.",
      "activities": [
        {
          "time": "string",
          "description": "string",
          "icon": "emoji",
          "tip": "string (optional)",
          "estimatedCost": "string (optional)",
          "latitude": number (optional),
          "longitude": number (optional)
        }
      ]
    }
  ],
  "suggestedCompanies": [
    {
      "name": "Real Company Name",
      "description": "A brief description of the company.",
      "website": "https://www.realcompanywebsite.com"
    }
  ]
}"#;

/// Number of travel companies the model is asked to look up.
pub const SUGGESTED_COMPANY_COUNT: usize = 3;

fn language_instruction(locale: Locale) -> String {
    format!(
        "The entire JSON response, including all titles, descriptions, tips, \
         and company details, MUST be in {}.",
        locale.language_name()
    )
}

/// Build the itinerary prompt text.
pub fn build_itinerary_prompt(params: &TripParams, locale: Locale) -> String {
    let mut prompt = String::with_capacity(4096);

    prompt.push_str(
        "You are an expert travel planner. Create a detailed, practical, \
         and engaging travel itinerary.\n\n",
    );
    prompt.push_str(&format!(
        "**Primary Language for Response:** {}\n\n",
        language_instruction(locale)
    ));

    // Trip details.
    prompt.push_str("**Trip Details:**\n");
    prompt.push_str(&format!("- Destination: {}\n", params.destination));
    prompt.push_str(&format!("- Duration: {} days\n", params.duration_days));
    prompt.push_str(&format!("- Interests: {}\n", params.interests));
    prompt.push_str(&format!("- Trip Style: {}\n", params.trip_style));
    prompt.push_str(&format!("- Budget: {}\n", params.budget));
    prompt.push_str(&format!("- Activity Level: {}\n", params.activity_level));
    if let Some(origin) = &params.origin {
        prompt.push_str(&format!("- Origin: {origin}\n"));
    }
    prompt.push('\n');

    // Instructions.
    prompt.push_str("**Instructions:**\n");
    prompt.push_str(
        "1. **Generate a day-by-day itinerary.** For each activity, you MUST provide:\n\
         \x20  - A suggested time (e.g., '9:00 AM' or 'Afternoon').\n\
         \x20  - A detailed description.\n\
         \x20  - A single, relevant emoji icon.\n\
         \x20  - An optional \"tip\" with useful advice.\n\
         \x20  - An optional \"estimatedCost\" (e.g., \"$20\", \"Free\").\n\
         \x20  - The precise numerical \"latitude\" and \"longitude\" for the location.\n\n",
    );
    prompt.push_str(&format!(
        "2. **Find REAL travel companies.** Use your search tool to find exactly \
         {SUGGESTED_COMPANY_COUNT} **real** travel agencies or tour operators that are a \
         good fit for this specific trip (destination, budget, style). For each company, \
         provide its actual name, a short description of what makes it a good fit, and \
         its **real, official website URL**. Do not invent companies.\n\n"
    ));
    match &params.origin {
        Some(origin) => prompt.push_str(&format!(
            "3. **Create a Trip Preparation Checklist.** Because the user is traveling \
             from {origin}, create a \"tripRequirements\" list. This should be an array of \
             short, actionable strings covering essential pre-travel tasks like visa \
             checks, currency exchange, packing advice for the destination's climate, and \
             flight booking reminders.\n\n"
        )),
        None => prompt.push_str(
            "3. **Create a Trip Preparation Checklist.** If no origin is provided, create \
             a generic \"tripRequirements\" list with reminders to book flights and \
             accommodation.\n\n",
        ),
    }
    prompt.push_str(
        "4. **Format the entire output as a single, valid JSON object.** Do not include \
         any text or markdown formatting before or after the JSON. The JSON object must \
         have the following structure:\n",
    );
    prompt.push_str(ITINERARY_STRUCTURE);
    prompt.push('\n');

    prompt
}

/// The itinerary request: free-form JSON with web search enabled.
pub fn itinerary_request(params: &TripParams, locale: Locale) -> CompletionRequest {
    CompletionRequest::new(build_itinerary_prompt(params, locale)).with_options(
        CompletionOptions {
            tools: vec![Tool::WebSearch],
            ..Default::default()
        },
    )
}

// ---------------------------------------------------------------------------
// Attractions
// ---------------------------------------------------------------------------

/// Build the attractions prompt text.
pub fn build_attractions_prompt(destination: &str, locale: Locale) -> String {
    let categories = AttractionCategory::TAXONOMY
        .iter()
        .map(|c| format!("\"{}\"", c.label()))
        .collect::<Vec<_>>();
    let (last, rest) = categories.split_last().map_or(("", &[][..]), |(l, r)| (l.as_str(), r));

    format!(
        "You are a travel expert. Provide a list of the top 10-12 tourist attractions \
         for the destination: {destination}.\n\
         The entire response MUST be in {language}.\n\
         Categorize each attraction into one of the following exact categories: \
         {rest}, or {last}.\n\
         Provide a brief, one-sentence description for each attraction.\n\
         Return ONLY the JSON array.\n",
        language = locale.language_name(),
        rest = rest.join(", "),
    )
}

/// Response schema for the attractions request.
pub fn attractions_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "description": { "type": "STRING" },
                "category": { "type": "STRING" }
            },
            "required": ["name", "description", "category"]
        }
    })
}

/// The attractions request: a JSON array constrained by
/// [`attractions_schema`].
pub fn attractions_request(destination: &str, locale: Locale) -> CompletionRequest {
    CompletionRequest::new(build_attractions_prompt(destination, locale)).with_options(
        CompletionOptions {
            structured_output_schema: Some(attractions_schema()),
            response_mime_type: Some("application/json".to_string()),
            tools: Vec::new(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{ActivityLevel, Budget, TripStyle};

    fn params(origin: Option<&str>) -> TripParams {
        TripParams {
            destination: "Marrakech".into(),
            duration_days: 4,
            interests: "souks, architecture".into(),
            activity_level: ActivityLevel::Packed,
            trip_style: TripStyle::Couple,
            budget: Budget::MidRange,
            origin: origin.map(str::to_string),
        }
    }

    #[test]
    fn itinerary_prompt_includes_trip_details() {
        let prompt = build_itinerary_prompt(&params(None), Locale::En);
        assert!(prompt.contains("- Destination: Marrakech"));
        assert!(prompt.contains("- Duration: 4 days"));
        assert!(prompt.contains("- Budget: Mid-range"));
        assert!(prompt.contains("- Activity Level: Packed"));
        assert!(prompt.contains("MUST be in English"));
        assert!(!prompt.contains("- Origin:"));
        assert!(prompt.contains("generic \"tripRequirements\""));
        assert!(prompt.contains("\"suggestedCompanies\""));
    }

    #[test]
    fn itinerary_prompt_with_origin_asks_for_checklist() {
        let prompt = build_itinerary_prompt(&params(Some("Paris")), Locale::Ar);
        assert!(prompt.contains("- Origin: Paris"));
        assert!(prompt.contains("traveling from Paris"));
        assert!(prompt.contains("MUST be in Arabic"));
    }

    #[test]
    fn itinerary_request_enables_web_search() {
        let request = itinerary_request(&params(None), Locale::En);
        assert_eq!(request.options.tools, vec![Tool::WebSearch]);
        assert!(request.options.structured_output_schema.is_none());
    }

    #[test]
    fn attractions_prompt_lists_categories() {
        let prompt = build_attractions_prompt("Rome", Locale::En);
        assert!(prompt.contains("destination: Rome"));
        assert!(prompt.contains(
            "\"Landmarks & Monuments\", \"Museums & Galleries\", \"Nature & Parks\", \
             \"Shopping & Markets\", or \"Entertainment\""
        ));
        assert!(prompt.contains("MUST be in English"));
    }

    #[test]
    fn attractions_request_is_schema_constrained() {
        let request = attractions_request("Rome", Locale::En);
        assert_eq!(
            request.options.response_mime_type.as_deref(),
            Some("application/json")
        );
        let schema = request.options.structured_output_schema.unwrap();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["items"]["required"][2], "category");
        assert!(request.options.tools.is_empty());
    }
}
