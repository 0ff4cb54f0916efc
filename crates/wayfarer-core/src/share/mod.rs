//! Share links and the addressable location.
//!
//! A saved itinerary is shared as the page address with its id in the
//! `itineraryId` query parameter. The current location lives behind
//! [`AddressBar`], which may refuse to be rewritten; callers then keep the
//! location in memory instead.

use thiserror::Error;
use url::Url;

/// Query parameter carrying the itinerary id.
pub const SHARE_PARAM: &str = "itineraryId";

/// Default page address used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

/// `base` without query string or fragment.
pub fn bare(base: &Url) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Share link for `id` under `base`.
pub fn share_url(base: &Url, id: &str) -> Url {
    let mut url = bare(base);
    url.query_pairs_mut().append_pair(SHARE_PARAM, id);
    url
}

/// The itinerary id carried by `url`, if any. Blank values count as absent.
pub fn id_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == SHARE_PARAM)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("the address cannot be rewritten in this environment")]
    ReadOnly,
}

/// The current addressable location.
pub trait AddressBar: Send {
    fn current(&self) -> Url;

    /// Replace the current location.
    fn push(&mut self, url: Url) -> Result<(), AddressError>;
}

/// A location held in memory.
#[derive(Debug, Clone)]
pub struct MemoryAddressBar {
    url: Url,
    history: Vec<Url>,
}

impl MemoryAddressBar {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            history: Vec::new(),
        }
    }

    /// Locations replaced so far, oldest first.
    pub fn history(&self) -> &[Url] {
        &self.history
    }
}

impl AddressBar for MemoryAddressBar {
    fn current(&self) -> Url {
        self.url.clone()
    }

    fn push(&mut self, url: Url) -> Result<(), AddressError> {
        let previous = std::mem::replace(&mut self.url, url);
        self.history.push(previous);
        Ok(())
    }
}

/// A location fixed at startup that refuses every rewrite.
#[derive(Debug, Clone)]
pub struct ReadOnlyAddressBar {
    url: Url,
}

impl ReadOnlyAddressBar {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

impl AddressBar for ReadOnlyAddressBar {
    fn current(&self) -> Url {
        self.url.clone()
    }

    fn push(&mut self, _url: Url) -> Result<(), AddressError> {
        Err(AddressError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://plans.example/app?lang=ar#top").unwrap()
    }

    #[test]
    fn share_url_replaces_query() {
        let url = share_url(&base(), "k3j9x0abc");
        assert_eq!(url.as_str(), "https://plans.example/app?itineraryId=k3j9x0abc");
        assert_eq!(id_from_url(&url).as_deref(), Some("k3j9x0abc"));
    }

    #[test]
    fn missing_or_blank_param_is_none() {
        assert_eq!(id_from_url(&base()), None);
        let url = Url::parse("https://plans.example/?itineraryId=").unwrap();
        assert_eq!(id_from_url(&url), None);
    }

    #[test]
    fn memory_address_bar_records_history() {
        let mut bar = MemoryAddressBar::new(bare(&base()));
        bar.push(share_url(&base(), "abc")).unwrap();
        assert_eq!(id_from_url(&bar.current()).as_deref(), Some("abc"));
        assert_eq!(bar.history().len(), 1);
    }

    #[test]
    fn read_only_address_bar_refuses() {
        let mut bar = ReadOnlyAddressBar::new(base());
        assert_eq!(bar.push(bare(&base())), Err(AddressError::ReadOnly));
        assert_eq!(bar.current(), base());
    }
}
