use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Itinerary
// ---------------------------------------------------------------------------

/// A single scheduled activity within a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Suggested time, free text (e.g. "9:00 AM" or "Afternoon").
    #[serde(deserialize_with = "de_text")]
    pub time: String,
    #[serde(deserialize_with = "de_text")]
    pub description: String,
    /// A single emoji glyph.
    #[serde(deserialize_with = "de_text")]
    pub icon: String,
    #[serde(
        default,
        deserialize_with = "de_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub tip: Option<String>,
    /// Free text; a bare number from the model is kept as its decimal form.
    #[serde(
        default,
        deserialize_with = "de_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_cost: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<f64>,
    #[serde(
        default,
        deserialize_with = "de_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<f64>,
}

impl Activity {
    /// Return `(latitude, longitude)` only when both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    /// Drop a lone latitude or longitude so the pair is all-or-nothing.
    pub fn normalize_coordinates(&mut self) {
        if self.coordinates().is_none() {
            self.latitude = None;
            self.longitude = None;
        }
    }

    /// Google Maps link for the activity location, if it has coordinates.
    pub fn map_link(&self) -> Option<String> {
        self.coordinates()
            .map(|(lat, lng)| format!("https://www.google.com/maps?q={lat},{lng}"))
    }
}

/// One day of an itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlan {
    #[serde(deserialize_with = "de_day")]
    pub day: u32,
    #[serde(deserialize_with = "de_text")]
    pub title: String,
    #[serde(deserialize_with = "de_text")]
    pub description: String,
    pub activities: Vec<Activity>,
}

/// A real-world travel operator recommended for the trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedCompany {
    pub name: String,
    pub description: String,
    /// Website as returned by the model; the scheme may be missing.
    pub website: String,
}

impl SuggestedCompany {
    /// The website as an absolute URL, defaulting to `https` when the model
    /// omitted the scheme.
    pub fn website_url(&self) -> String {
        let site = self.website.trim();
        if site.starts_with("http") {
            site.to_owned()
        } else {
            format!("https://{site}")
        }
    }
}

/// A generated trip plan.
///
/// `id` stays `None` until the itinerary is first saved; after that it is
/// both the storage key and the share token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub trip_title: String,
    pub itinerary: Vec<DailyPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_companies: Option<Vec<SuggestedCompany>>,
    #[serde(
        default,
        deserialize_with = "de_text_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub trip_requirements: Option<Vec<String>>,
}

impl ItineraryData {
    /// Apply the coordinate pairing rule to every activity.
    pub fn normalize_coordinates(&mut self) {
        for plan in &mut self.itinerary {
            for activity in &mut plan.activities {
                activity.normalize_coordinates();
            }
        }
    }

    /// Total number of activities across all days.
    pub fn activity_count(&self) -> usize {
        self.itinerary.iter().map(|d| d.activities.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

/// A JSON scalar the model may emit as either a number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// Accept `3` or `"3"` for a day number.
fn de_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    use serde::de::Error;

    let value = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n,
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid day number: {s:?}")))?,
        NumberOrText::Other(v) => {
            return Err(D::Error::custom(format!("invalid day number: {v}")));
        }
    };
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(D::Error::custom(format!("invalid day number: {value}")));
    }
    Ok(value as u32)
}

/// Accept a string, or a number rendered as text.
fn de_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    use serde::de::Error;

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n.to_string()),
        NumberOrText::Text(s) => Ok(s),
        NumberOrText::Other(v) => Err(D::Error::custom(format!("expected text, found {v}"))),
    }
}

/// Like [`de_text`], but any other JSON type counts as absent.
fn de_opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Some(n.to_string()),
        NumberOrText::Text(s) => Some(s),
        NumberOrText::Other(_) => None,
    })
}

/// A list of text items; entries that are neither text nor numbers are
/// dropped, and a non-list counts as absent.
fn de_text_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    let Some(items) = Option::<Vec<serde_json::Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let items = items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();
    Ok(Some(items))
}

/// Accept a number or numeric string; anything else counts as absent.
fn de_coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Some(n),
        NumberOrText::Text(s) => s.trim().parse::<f64>().ok(),
        NumberOrText::Other(_) => None,
    };
    Ok(value.filter(|n| n.is_finite()))
}

// ---------------------------------------------------------------------------
// Attractions
// ---------------------------------------------------------------------------

/// Category of a tourist attraction.
///
/// Values outside the fixed taxonomy are preserved verbatim in
/// [`AttractionCategory::Other`] and sort after every known category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttractionCategory {
    Landmarks,
    Museums,
    Nature,
    Shopping,
    Entertainment,
    Other(String),
}

impl AttractionCategory {
    /// Known categories in display order.
    pub const TAXONOMY: [AttractionCategory; 5] = [
        Self::Landmarks,
        Self::Museums,
        Self::Nature,
        Self::Shopping,
        Self::Entertainment,
    ];

    /// Exact label the model is asked to use.
    pub fn label(&self) -> &str {
        match self {
            Self::Landmarks => "Landmarks & Monuments",
            Self::Museums => "Museums & Galleries",
            Self::Nature => "Nature & Parks",
            Self::Shopping => "Shopping & Markets",
            Self::Entertainment => "Entertainment",
            Self::Other(label) => label,
        }
    }

    /// Position in the display order; unknown categories sort last.
    pub fn rank(&self) -> usize {
        Self::TAXONOMY
            .iter()
            .position(|c| c == self)
            .unwrap_or(Self::TAXONOMY.len())
    }
}

impl fmt::Display for AttractionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for AttractionCategory {
    fn from(s: &str) -> Self {
        match s {
            "Landmarks & Monuments" => Self::Landmarks,
            "Museums & Galleries" => Self::Museums,
            "Nature & Parks" => Self::Nature,
            "Shopping & Markets" => Self::Shopping,
            "Entertainment" => Self::Entertainment,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl Serialize for AttractionCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for AttractionCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// A tourist attraction suggested for a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    pub name: String,
    pub description: String,
    pub category: AttractionCategory,
}

// ---------------------------------------------------------------------------
// Locale
// ---------------------------------------------------------------------------

/// UI and response language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    /// English name of the language, used in prompts.
    pub fn language_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ar => "Arabic",
        }
    }

    /// Whether text in this locale is laid out right-to-left.
    pub fn is_rtl(self) -> bool {
        matches!(self, Self::Ar)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::En => "en",
            Self::Ar => "ar",
        };
        f.write_str(s)
    }
}

impl FromStr for Locale {
    type Err = LocaleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "ar" => Ok(Self::Ar),
            other => Err(LocaleParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an unsupported [`Locale`] string.
#[derive(Debug, Clone)]
pub struct LocaleParseError(pub String);

impl fmt::Display for LocaleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported locale: {:?} (expected en or ar)", self.0)
    }
}

impl std::error::Error for LocaleParseError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(lat: Option<f64>, lng: Option<f64>) -> Activity {
        Activity {
            time: "Morning".to_string(),
            description: "Walk the old town".to_string(),
            icon: "🚶".to_string(),
            tip: None,
            estimated_cost: None,
            latitude: lat,
            longitude: lng,
        }
    }

    #[test]
    fn coordinates_require_both_halves() {
        assert_eq!(activity(Some(1.5), Some(2.5)).coordinates(), Some((1.5, 2.5)));
        assert_eq!(activity(Some(1.5), None).coordinates(), None);
        assert_eq!(activity(None, Some(2.5)).coordinates(), None);
    }

    #[test]
    fn normalize_coordinates_drops_lone_latitude() {
        let mut a = activity(Some(41.9), None);
        a.normalize_coordinates();
        assert_eq!(a.latitude, None);
        assert_eq!(a.longitude, None);
    }

    #[test]
    fn map_link_uses_lat_lng_query() {
        let a = activity(Some(41.9), Some(12.5));
        assert_eq!(
            a.map_link().as_deref(),
            Some("https://www.google.com/maps?q=41.9,12.5")
        );
    }

    #[test]
    fn website_url_defaults_to_https() {
        let mut c = SuggestedCompany {
            name: "Acme Tours".to_string(),
            description: "Small groups".to_string(),
            website: "www.acme.example".to_string(),
        };
        assert_eq!(c.website_url(), "https://www.acme.example");

        c.website = "http://acme.example".to_string();
        assert_eq!(c.website_url(), "http://acme.example");
    }

    #[test]
    fn itinerary_uses_camel_case_wire_names() {
        let data = ItineraryData {
            id: None,
            trip_title: "Roman Holiday".to_string(),
            itinerary: vec![],
            suggested_companies: None,
            trip_requirements: Some(vec!["Check visa".to_string()]),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["tripTitle"], "Roman Holiday");
        assert_eq!(json["tripRequirements"][0], "Check visa");
        assert!(json.get("id").is_none());
        assert!(json.get("suggestedCompanies").is_none());
    }

    #[test]
    fn day_and_coordinates_tolerate_strings() {
        let plan: DailyPlan = serde_json::from_str(
            r#"{"day": "2", "title": "t", "description": "d", "activities": [
                {"time": "9:00", "description": "x", "icon": "🏛", "latitude": "41.9", "longitude": null}
            ]}"#,
        )
        .unwrap();
        assert_eq!(plan.day, 2);
        assert_eq!(plan.activities[0].latitude, Some(41.9));
        assert_eq!(plan.activities[0].longitude, None);
        assert_eq!(plan.activities[0].coordinates(), None);
    }

    #[test]
    fn fractional_day_is_rejected() {
        let result: Result<DailyPlan, _> = serde_json::from_str(
            r#"{"day": 1.5, "title": "t", "description": "d", "activities": []}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_category_is_kept_verbatim_and_ranked_last() {
        let c: AttractionCategory = serde_json::from_str("\"Food & Drink\"").unwrap();
        assert_eq!(c, AttractionCategory::Other("Food & Drink".to_string()));
        assert_eq!(c.label(), "Food & Drink");
        assert!(c.rank() > AttractionCategory::Entertainment.rank());
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"Food & Drink\"");
    }

    #[test]
    fn known_category_round_trips_through_label() {
        for category in AttractionCategory::TAXONOMY {
            assert_eq!(AttractionCategory::from(category.label()), category);
        }
    }

    #[test]
    fn locale_from_str() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("ar".parse::<Locale>().unwrap(), Locale::Ar);
        assert!("fr".parse::<Locale>().is_err());
        assert!(Locale::Ar.is_rtl());
    }
}
