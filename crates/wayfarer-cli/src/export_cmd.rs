use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::ValueEnum;

use wayfarer_core::i18n::Translate;
use wayfarer_store::models::ItineraryData;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Printable Markdown document
    #[default]
    Markdown,
    /// The stored JSON record
    Json,
}

/// Write `data` to `output`, or stdout when no path is given.
pub fn run_export(
    data: &ItineraryData,
    format: ExportFormat,
    output: Option<&str>,
    tr: &dyn Translate,
) -> anyhow::Result<()> {
    let body = match format {
        ExportFormat::Markdown => render_markdown(data, tr, Local::now()),
        ExportFormat::Json => {
            serde_json::to_string_pretty(data).context("failed to serialize itinerary")? + "\n"
        }
    };

    let mut writer: Box<dyn Write> = if let Some(path) = output {
        Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("cannot create output file: {path}"))?,
        )
    } else {
        Box::new(std::io::stdout().lock())
    };
    writer.write_all(body.as_bytes())?;
    writer.flush()?;

    if let Some(path) = output {
        println!("Exported {:?} to {path}", data.trip_title);
    }
    Ok(())
}

/// A printable Markdown rendering of the itinerary.
pub fn render_markdown(data: &ItineraryData, tr: &dyn Translate, printed: DateTime<Local>) -> String {
    let mut md = String::new();
    md.push_str(&format!("# {}\n\n", data.trip_title));
    let date = printed.format("%Y-%m-%d").to_string();
    md.push_str(&format!("_{}_\n", tr.t_with("printedOn", &[("date", date.as_str())])));
    if let Some(id) = &data.id {
        md.push_str(&format!("\n{}: `{id}`\n", tr.t("itineraryId")));
    }

    for day in &data.itinerary {
        let day_number = day.day.to_string();
        md.push_str(&format!(
            "\n## {}: {}\n\n",
            tr.t_with("dayLabel", &[("day", day_number.as_str())]),
            day.title
        ));
        if !day.description.is_empty() {
            md.push_str(&format!("{}\n\n", day.description));
        }
        for activity in &day.activities {
            md.push_str(&format!(
                "- **{}** {} {}\n",
                activity.time, activity.icon, activity.description
            ));
            if let Some(tip) = &activity.tip {
                md.push_str(&format!("  - {}: {tip}\n", tr.t("tipLabel")));
            }
            if let Some(cost) = &activity.estimated_cost {
                md.push_str(&format!("  - {}: {cost}\n", tr.t("costLabel")));
            }
            if let Some(link) = activity.map_link() {
                md.push_str(&format!("  - [{}]({link})\n", tr.t("viewOnMap")));
            }
        }
    }

    if let Some(requirements) = data.trip_requirements.as_ref().filter(|r| !r.is_empty()) {
        md.push_str(&format!("\n## {}\n\n", tr.t("checklistTitle")));
        for item in requirements {
            md.push_str(&format!("- [ ] {item}\n"));
        }
    }

    if let Some(companies) = data.suggested_companies.as_ref().filter(|c| !c.is_empty()) {
        md.push_str(&format!("\n## {}\n\n", tr.t("suggestedCompaniesTitle")));
        for company in companies {
            md.push_str(&format!(
                "- **{}**: {} ([{}]({}))\n",
                company.name,
                company.description,
                tr.t("visitWebsite"),
                company.website_url()
            ));
        }
    }
    md
}
