use crate::url::normalize::normalize_url;
use crate::ConfigError;
use regex::Regex;
use std::fmt;
use url::Url;

/// Role of a page on the restaurant-listing site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRole {
    /// Top page of the section (e.g. `/tokyo`)
    Index,
    /// Paginated restaurant listing (e.g. `/tokyo/rstLst/2`)
    Listing,
    /// Restaurant detail page (e.g. `/tokyo/A1301/A130101/13000001`)
    Detail,
    /// Anything else; never fetched past the seed, never expanded
    Rejected,
}

impl PageRole {
    /// Returns true if the page's outbound links should be followed
    pub fn expands_links(&self) -> bool {
        matches!(self, Self::Index | Self::Listing)
    }

    /// Returns true if a record should be extracted from the page
    pub fn is_detail(&self) -> bool {
        matches!(self, Self::Detail)
    }

    /// Returns true for every role except `Rejected`
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Listing => "listing",
            Self::Detail => "detail",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies normalized URLs into page roles
///
/// Patterns are anchored on the section root (host, optional port, and path),
/// and the URL scheme is ignored. Rules are checked in priority order:
///
/// 1. `<root>/rstLst/<digits>` → [`PageRole::Listing`]
/// 2. `<root>/A<4 digits>/A<6 digits>/<8 digits>` → [`PageRole::Detail`]
/// 3. `<root>` → [`PageRole::Index`]
/// 4. anything else → [`PageRole::Rejected`]
///
/// # Examples
///
/// ```
/// use tabelog_crawler::url::{normalize_url, PageRole, UrlClassifier};
///
/// let classifier = UrlClassifier::new("https://tabelog.com/tokyo").unwrap();
/// let url = normalize_url("https://tabelog.com/tokyo/rstLst/3/").unwrap();
/// assert_eq!(classifier.classify(&url), PageRole::Listing);
/// ```
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    listing: Regex,
    detail: Regex,
    index: Regex,
}

impl UrlClassifier {
    /// Builds a classifier for the section rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base = normalize_url(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

        let mut root = match_target(&base);
        if root.ends_with('/') {
            root.pop();
        }
        let root = regex::escape(&root);

        Ok(Self {
            listing: compile(&format!(r"^{}/rstLst/[0-9]+$", root))?,
            detail: compile(&format!(r"^{}/A[0-9]{{4}}/A[0-9]{{6}}/[0-9]{{8}}$", root))?,
            index: compile(&format!(r"^{}/?$", root))?,
        })
    }

    /// Classifies an absolute, normalized URL
    pub fn classify(&self, url: &Url) -> PageRole {
        let target = match_target(url);

        if self.listing.is_match(&target) {
            PageRole::Listing
        } else if self.detail.is_match(&target) {
            PageRole::Detail
        } else if self.index.is_match(&target) {
            PageRole::Index
        } else {
            PageRole::Rejected
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))
}

/// Scheme-less form of a URL: `host[:port]/path[?query]`
fn match_target(url: &Url) -> String {
    let mut target = url.host_str().unwrap_or_default().to_string();
    if let Some(port) = url.port() {
        target.push_str(&format!(":{}", port));
    }
    target.push_str(url.path());
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}
