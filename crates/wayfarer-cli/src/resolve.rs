//! Itinerary id resolution.
//!
//! Commands that name a saved plan accept either the bare id or a share
//! link carrying it in the `itineraryId` query parameter.

use anyhow::{Context, Result, anyhow, bail};
use url::Url;

use wayfarer_core::share::{self, SHARE_PARAM};

/// Return the itinerary id named by `input`.
///
/// Heuristic: anything containing `://` is parsed as a share link; anything
/// else must be a bare alphanumeric id.
pub fn resolve_itinerary_id(input: &str) -> Result<String> {
    let input = input.trim();
    if input.contains("://") {
        let url = Url::parse(input).with_context(|| format!("invalid share link: {input:?}"))?;
        return share::id_from_url(&url)
            .ok_or_else(|| anyhow!("share link {input:?} has no {SHARE_PARAM} parameter"));
    }
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_alphanumeric()) {
        bail!("invalid itinerary ID: {input:?} (expected an ID or a share link)");
    }
    Ok(input.to_string())
}
