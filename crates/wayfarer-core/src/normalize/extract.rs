//! Candidate extraction: locating the JSON payload inside free text.
//!
//! Each strategy looks at the raw completion and either returns the slice it
//! believes is the payload or declines. [`extract_candidate`] runs the
//! strategies in order and the first one that matches wins.

use super::PayloadKind;

/// One way of finding a JSON payload in model output.
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Return the candidate payload, or `None` if this strategy does not
    /// apply to `text`.
    fn extract<'a>(&self, text: &'a str, kind: PayloadKind) -> Option<&'a str>;
}

/// Takes the contents of the first triple-backtick fence.
///
/// An info string of `json` (any case) is skipped. Other info strings are
/// skipped only when they sit on their own line before the payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct FencedBlock;

const FENCE: &str = "```";

impl ExtractionStrategy for FencedBlock {
    fn name(&self) -> &'static str {
        "fenced_block"
    }

    fn extract<'a>(&self, text: &'a str, _kind: PayloadKind) -> Option<&'a str> {
        let open = text.find(FENCE)?;
        let after_open = &text[open + FENCE.len()..];
        let close = after_open.find(FENCE)?;
        let mut inner = &after_open[..close];

        if inner.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
            inner = &inner[4..];
        } else if let Some(newline) = inner.find('\n') {
            let info = inner[..newline].trim();
            if !info.is_empty() && !info.starts_with(['{', '[']) {
                inner = &inner[newline + 1..];
            }
        }

        let inner = inner.trim();
        if inner.is_empty() { None } else { Some(inner) }
    }
}

/// Takes everything from the first opening bracket to the last closing one.
///
/// Itineraries are objects (`{`..`}`), attraction lists are arrays
/// (`[`..`]`). Nesting balance is not checked; prose on either side of the
/// payload is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct BracketSpan;

impl ExtractionStrategy for BracketSpan {
    fn name(&self) -> &'static str {
        "bracket_span"
    }

    fn extract<'a>(&self, text: &'a str, kind: PayloadKind) -> Option<&'a str> {
        let (open, close) = match kind {
            PayloadKind::Itinerary => ('{', '}'),
            PayloadKind::Attractions => ('[', ']'),
        };
        let start = text.find(open)?;
        let end = text.rfind(close)?;
        if end <= start {
            return None;
        }
        Some(&text[start..=end])
    }
}

/// Strategies in the order they are tried.
pub static DEFAULT_STRATEGIES: [&dyn ExtractionStrategy; 2] = [&FencedBlock, &BracketSpan];

/// Run `strategies` in order and return the first candidate, or the trimmed
/// text itself when none applies.
pub fn extract_with<'a>(
    text: &'a str,
    kind: PayloadKind,
    strategies: &[&dyn ExtractionStrategy],
) -> &'a str {
    for strategy in strategies {
        if let Some(candidate) = strategy.extract(text, kind) {
            tracing::trace!(strategy = strategy.name(), "payload candidate extracted");
            return candidate;
        }
    }
    text.trim()
}

/// [`extract_with`] using [`DEFAULT_STRATEGIES`].
pub fn extract_candidate(text: &str, kind: PayloadKind) -> &str {
    extract_with(text, kind, &DEFAULT_STRATEGIES)
}
