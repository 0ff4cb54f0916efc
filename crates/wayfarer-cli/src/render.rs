//! Terminal rendering of itineraries, attractions and failures.

use std::fmt;
use std::io::{self, Write};

use wayfarer_core::ErrorInfo;
use wayfarer_core::attractions::{self, category_heading};
use wayfarer_core::i18n::Translate;
use wayfarer_store::models::{Attraction, ItineraryData};

pub fn write_itinerary(
    out: &mut dyn Write,
    data: &ItineraryData,
    tr: &dyn Translate,
) -> io::Result<()> {
    writeln!(out, "{}", data.trip_title)?;
    writeln!(out, "{}", "=".repeat(data.trip_title.chars().count().max(1)))?;
    if let Some(id) = &data.id {
        writeln!(out, "{}: {id}", tr.t("itineraryId"))?;
    }

    for day in &data.itinerary {
        let day_number = day.day.to_string();
        writeln!(out)?;
        writeln!(
            out,
            "{}: {}",
            tr.t_with("dayLabel", &[("day", day_number.as_str())]),
            day.title
        )?;
        if !day.description.is_empty() {
            writeln!(out, "  {}", day.description)?;
        }
        for activity in &day.activities {
            writeln!(
                out,
                "  {:<10} {} {}",
                activity.time, activity.icon, activity.description
            )?;
            if let Some(tip) = &activity.tip {
                writeln!(out, "  {:<10}   {}: {tip}", "", tr.t("tipLabel"))?;
            }
            if let Some(cost) = &activity.estimated_cost {
                writeln!(out, "  {:<10}   {}: {cost}", "", tr.t("costLabel"))?;
            }
            if let Some(link) = activity.map_link() {
                writeln!(out, "  {:<10}   {}: {link}", "", tr.t("viewOnMap"))?;
            }
        }
    }

    if let Some(requirements) = data.trip_requirements.as_ref().filter(|r| !r.is_empty()) {
        writeln!(out)?;
        writeln!(out, "{}", tr.t("checklistTitle"))?;
        for item in requirements {
            writeln!(out, "  [ ] {item}")?;
        }
    }

    if let Some(companies) = data.suggested_companies.as_ref().filter(|c| !c.is_empty()) {
        writeln!(out)?;
        writeln!(out, "{}", tr.t("suggestedCompaniesTitle"))?;
        for company in companies {
            writeln!(out, "  {}: {}", company.name, company.description)?;
            writeln!(out, "    {}: {}", tr.t("visitWebsite"), company.website_url())?;
        }
    }
    Ok(())
}

/// Attractions grouped under translated category headings.
pub fn write_attractions(
    out: &mut dyn Write,
    destination: &str,
    list: &[Attraction],
    tr: &dyn Translate,
) -> io::Result<()> {
    let groups = attractions::group_by_category(list);
    if groups.is_empty() {
        writeln!(
            out,
            "{}",
            tr.t_with("attractionsEmpty", &[("destination", destination)])
        )?;
        return Ok(());
    }

    writeln!(
        out,
        "{}",
        tr.t_with("attractionsSectionTitle", &[("destination", destination)])
    )?;
    writeln!(out, "{}", tr.t("attractionsHelperText"))?;
    for group in &groups {
        writeln!(out)?;
        writeln!(out, "{}", category_heading(&group.category, tr))?;
        for attraction in &group.attractions {
            writeln!(out, "  - {}: {}", attraction.name, attraction.description)?;
        }
    }
    Ok(())
}

/// The failure view: title, then the user-facing message.
pub fn write_failure(out: &mut dyn Write, info: &ErrorInfo, tr: &dyn Translate) -> io::Result<()> {
    writeln!(out, "{}", tr.t("errorTitle"))?;
    writeln!(out, "{}", info.user_message)
}

/// An error whose message has already been shown to the user.
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failure already reported")
    }
}

impl std::error::Error for Reported {}

/// Show the failure view on stderr and return the error that ends the command.
pub fn report_failure(info: &ErrorInfo, tr: &dyn Translate) -> anyhow::Error {
    tracing::debug!(kind = %info.kind, detail = %info.detail, "command failed");
    let _ = write_failure(&mut io::stderr().lock(), info, tr);
    anyhow::Error::new(Reported)
}

#[cfg(test)]
mod tests {
    use super::*;

    use wayfarer_core::ErrorKind;
    use wayfarer_core::i18n::Catalog;
    use wayfarer_store::models::Locale;
    use wayfarer_test_utils::{SAMPLE_ATTRACTIONS_JSON, sample_itinerary};

    fn render_itinerary(data: &ItineraryData) -> String {
        let mut out = Vec::new();
        write_itinerary(&mut out, data, &Catalog::builtin(Locale::En)).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn itinerary_shows_days_links_and_companies() {
        let mut data = sample_itinerary();
        data.id = Some("abc123xyz".into());
        let text = render_itinerary(&data);

        assert!(text.starts_with("Lisbon Light\n"));
        assert!(text.contains("Plan ID: abc123xyz"));
        assert!(text.contains("Day 1: Alfama"));
        assert!(text.contains("Day 2: Belém"));
        assert!(text.contains("Tip: Go early"));
        assert!(text.contains("Cost: €15"));
        assert!(text.contains("View on map: https://www.google.com/maps?q=38.7139,-9.1335"));
        assert!(text.contains("[ ] Book flights to LIS"));
        assert!(text.contains("Visit website: https://lisbonwalker.example"));
        assert!(text.contains("Visit website: https://fadotours.example"));
    }

    #[test]
    fn optional_sections_are_omitted() {
        let mut data = sample_itinerary();
        data.trip_requirements = None;
        data.suggested_companies = Some(vec![]);
        let text = render_itinerary(&data);

        assert!(!text.contains("Plan ID"));
        assert!(!text.contains("Trip Preparation Checklist"));
        assert!(!text.contains("Suggested Travel Companies"));
        // The Fado dinner has no coordinates.
        assert_eq!(text.matches("View on map").count(), 2);
    }

    #[test]
    fn attractions_are_grouped_in_display_order() {
        let list: Vec<Attraction> = serde_json::from_str(SAMPLE_ATTRACTIONS_JSON).unwrap();
        let mut out = Vec::new();
        write_attractions(&mut out, "Lisbon", &list, &Catalog::builtin(Locale::En)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Top attractions in Lisbon\n"));
        let landmarks = text.find("Landmarks & Monuments").unwrap();
        let nature = text.find("Nature & Parks").unwrap();
        let street_art = text.find("Street Art").unwrap();
        assert!(landmarks < nature);
        assert!(nature < street_art);
        assert!(text.contains("  - LX Factory: Creative hub"));
    }

    #[test]
    fn empty_attractions_say_so() {
        let mut out = Vec::new();
        write_attractions(&mut out, "Nowhere", &[], &Catalog::builtin(Locale::En)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "No attractions found for Nowhere.\n"
        );
    }

    #[test]
    fn failure_view_has_title_and_message() {
        let catalog = Catalog::builtin(Locale::En);
        let info = ErrorInfo {
            kind: ErrorKind::Network,
            user_message: catalog.t("errorNetwork"),
            detail: "connection refused".into(),
        };
        let mut out = Vec::new();
        write_failure(&mut out, &info, &catalog).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Oops! Something went wrong.\n"));
        assert!(text.contains("network or server issue"));
        assert!(!text.contains("connection refused"));
    }

    #[test]
    fn reported_failure_is_recognizable() {
        let catalog = Catalog::builtin(Locale::En);
        let info = ErrorInfo {
            kind: ErrorKind::Storage,
            user_message: catalog.t("itineraryLoadError"),
            detail: "bad json".into(),
        };
        assert!(report_failure(&info, &catalog).is::<Reported>());
    }
}
