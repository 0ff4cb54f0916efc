//! Trip request form and its validation.
//!
//! The form holds raw user input. [`ItineraryForm::validate`] turns it into
//! [`TripParams`], the only thing the generation path accepts, so an invalid
//! duration can never reach the network.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Choice enums
// ---------------------------------------------------------------------------

/// Error returned when parsing one of the form's choice enums fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceParseError {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for ChoiceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.field, self.value)
    }
}

impl std::error::Error for ChoiceParseError {}

/// How full each day should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActivityLevel {
    Relaxed,
    #[default]
    Moderate,
    Packed,
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Relaxed => "Relaxed",
            Self::Moderate => "Moderate",
            Self::Packed => "Packed",
        };
        f.write_str(s)
    }
}

impl FromStr for ActivityLevel {
    type Err = ChoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relaxed" => Ok(Self::Relaxed),
            "moderate" => Ok(Self::Moderate),
            "packed" => Ok(Self::Packed),
            _ => Err(ChoiceParseError {
                field: "activity level",
                value: s.to_string(),
            }),
        }
    }
}

/// Who is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TripStyle {
    #[default]
    Solo,
    Couple,
    Family,
    Friends,
}

impl fmt::Display for TripStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Solo => "Solo",
            Self::Couple => "Couple",
            Self::Family => "Family",
            Self::Friends => "Friends",
        };
        f.write_str(s)
    }
}

impl FromStr for TripStyle {
    type Err = ChoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(Self::Solo),
            "couple" => Ok(Self::Couple),
            "family" => Ok(Self::Family),
            "friends" => Ok(Self::Friends),
            _ => Err(ChoiceParseError {
                field: "trip style",
                value: s.to_string(),
            }),
        }
    }
}

/// Spending bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Budget {
    Budget,
    #[default]
    MidRange,
    Luxury,
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Budget => "Budget",
            Self::MidRange => "Mid-range",
            Self::Luxury => "Luxury",
        };
        f.write_str(s)
    }
}

impl FromStr for Budget {
    type Err = ChoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "budget" => Ok(Self::Budget),
            "mid-range" | "midrange" | "mid" => Ok(Self::MidRange),
            "luxury" => Ok(Self::Luxury),
            _ => Err(ChoiceParseError {
                field: "budget",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// Why a form was rejected before any request was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Destination, duration or interests is blank.
    #[error("please fill in destination, duration and interests")]
    MissingFields,

    /// Duration does not start with a positive whole number.
    #[error("please enter a valid number of days (got {0:?})")]
    InvalidDuration(String),
}

/// Raw trip request as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItineraryForm {
    pub destination: String,
    /// Kept as text; parsed by [`ItineraryForm::validate`].
    pub duration: String,
    /// Comma-separated interests.
    pub interests: String,
    pub activity_level: ActivityLevel,
    pub trip_style: TripStyle,
    pub budget: Budget,
    /// Departure city. Blank means unknown.
    pub origin: String,
}

/// A validated trip request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripParams {
    pub destination: String,
    pub duration_days: u32,
    pub interests: String,
    pub activity_level: ActivityLevel,
    pub trip_style: TripStyle,
    pub budget: Budget,
    pub origin: Option<String>,
}

impl ItineraryForm {
    /// Validate the form.
    ///
    /// Required fields are checked first, then the duration. The duration
    /// takes its leading run of digits (`"5 days"` is 5) and must be
    /// greater than zero.
    pub fn validate(&self) -> Result<TripParams, FormError> {
        let destination = self.destination.trim();
        let duration = self.duration.trim();
        let interests = self.interests.trim();
        if destination.is_empty() || duration.is_empty() || interests.is_empty() {
            return Err(FormError::MissingFields);
        }

        let duration_days = parse_leading_int(duration)
            .filter(|d| *d > 0)
            .and_then(|d| u32::try_from(d).ok())
            .ok_or_else(|| FormError::InvalidDuration(duration.to_string()))?;

        let origin = Some(self.origin.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string);

        Ok(TripParams {
            destination: destination.to_string(),
            duration_days,
            interests: interests.to_string(),
            activity_level: self.activity_level,
            trip_style: self.trip_style,
            budget: self.budget,
            origin,
        })
    }

    /// Interests as a list, trimmed and without blanks.
    pub fn selected_interests(&self) -> Vec<String> {
        split_interests(&self.interests)
    }

    /// Add `name` to the interests, or remove it when already present.
    /// Returns `true` if the interest is selected afterwards.
    pub fn toggle_interest(&mut self, name: &str) -> bool {
        let name = name.trim();
        let mut selected = self.selected_interests();
        let now_selected = match selected.iter().position(|s| s == name) {
            Some(i) => {
                selected.remove(i);
                false
            }
            None => {
                if name.is_empty() {
                    return false;
                }
                selected.push(name.to_string());
                true
            }
        };
        self.interests = selected.join(", ");
        now_selected
    }
}

fn split_interests(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !out.iter().any(|s| s == item) {
            out.push(item.to_string());
        }
    }
    out
}

/// Parse an optional sign followed by the leading digits, ignoring the rest.
fn parse_leading_int(s: &str) -> Option<i64> {
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(duration: &str) -> ItineraryForm {
        ItineraryForm {
            destination: "Lisbon".into(),
            duration: duration.into(),
            interests: "food, fado".into(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_form_defaults() {
        let f = ItineraryForm::default();
        assert_eq!(f.activity_level, ActivityLevel::Moderate);
        assert_eq!(f.trip_style, TripStyle::Solo);
        assert_eq!(f.budget, Budget::MidRange);
        assert_eq!(f.budget.to_string(), "Mid-range");
    }

    #[test]
    fn valid_form_produces_params() {
        let mut f = form("4");
        f.origin = "  Madrid ".into();
        let params = f.validate().unwrap();
        assert_eq!(params.duration_days, 4);
        assert_eq!(params.origin.as_deref(), Some("Madrid"));
        assert_eq!(params.interests, "food, fado");
    }

    #[test]
    fn blank_origin_is_none() {
        assert_eq!(form("2").validate().unwrap().origin, None);
    }

    #[test]
    fn duration_uses_leading_digits() {
        assert_eq!(form("5 days").validate().unwrap().duration_days, 5);
        assert_eq!(form("3.7").validate().unwrap().duration_days, 3);
    }

    #[test]
    fn non_positive_or_non_numeric_duration_is_rejected() {
        for bad in ["-3", "0", "abc", "days 5", "-"] {
            assert_eq!(
                form(bad).validate(),
                Err(FormError::InvalidDuration(bad.to_string())),
                "duration {bad:?}"
            );
        }
    }

    #[test]
    fn missing_fields_are_reported_first() {
        let mut f = form("-3");
        f.interests = "   ".into();
        assert_eq!(f.validate(), Err(FormError::MissingFields));
    }

    #[test]
    fn toggle_interest_adds_and_removes() {
        let mut f = form("2");
        assert!(f.toggle_interest("Belem Tower"));
        assert_eq!(f.interests, "food, fado, Belem Tower");
        assert!(!f.toggle_interest("fado"));
        assert_eq!(f.selected_interests(), vec!["food", "Belem Tower"]);
    }

    #[test]
    fn choice_enums_parse_case_insensitively() {
        assert_eq!("PACKED".parse::<ActivityLevel>().unwrap(), ActivityLevel::Packed);
        assert_eq!("family".parse::<TripStyle>().unwrap(), TripStyle::Family);
        assert_eq!("mid-range".parse::<Budget>().unwrap(), Budget::MidRange);
        let err = "yacht".parse::<Budget>().unwrap_err();
        assert_eq!(err.to_string(), "invalid budget: \"yacht\"");
    }
}
