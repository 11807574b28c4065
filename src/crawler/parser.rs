//! HTML parser for extracting links
//!
//! This module parses a fetched body into a document tree and lists the
//! page's outbound links:
//! - Every `<a href>` is resolved against the page URL
//! - Resolved links are normalized into deduplication keys
//! - Unresolvable or non-HTTP links are skipped without failing the page

use crate::url::normalize_parsed;
use scraper::{Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Errors produced while turning a body into a document
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Empty document at {url}")]
    EmptyDocument { url: String },
}

/// A parsed page: the document tree plus its outbound links
///
/// `scraper::Html` is not `Send`, so a `ParsedPage` is built and consumed
/// without crossing an await point.
pub struct ParsedPage {
    /// The parsed document
    pub document: Html,

    /// Normalized absolute links, deduplicated in first-seen order
    pub links: Vec<Url>,
}

impl ParsedPage {
    /// Parses HTML content and extracts links
    ///
    /// # Link Extraction Rules
    ///
    /// **Include:** `<a href="...">` anywhere in the document, whether
    /// relative (`A1301/`), root-relative (`/tokyo/rstLst/2`),
    /// protocol-relative (`//tabelog.com/tokyo`) or absolute.
    ///
    /// **Exclude:**
    /// - `<a href="..." download>`
    /// - `javascript:`, `mailto:`, `tel:`, `data:` links
    /// - Fragment-only links (same-page anchors)
    /// - hrefs that fail to resolve or normalize
    ///
    /// # Example
    ///
    /// ```
    /// use tabelog_crawler::crawler::ParsedPage;
    /// use url::Url;
    ///
    /// let html = r#"<html><body><a href="/tokyo/rstLst/2/">Next</a></body></html>"#;
    /// let base_url = Url::parse("https://tabelog.com/tokyo/rstLst/1").unwrap();
    /// let parsed = ParsedPage::parse(html, &base_url).unwrap();
    /// assert_eq!(parsed.links[0].as_str(), "https://tabelog.com/tokyo/rstLst/2");
    /// ```
    pub fn parse(html: &str, base_url: &Url) -> Result<Self, ParseError> {
        if html.trim().is_empty() {
            return Err(ParseError::EmptyDocument {
                url: base_url.to_string(),
            });
        }

        let document = Html::parse_document(html);
        let links = extract_links(&document, base_url);

        Ok(Self { document, links })
    }
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match resolve_link(href, base_url) {
            Some(url) => {
                if seen.insert(url.as_str().to_string()) {
                    links.push(url);
                }
            }
            None => tracing::trace!("Skipping link {:?} on {}", href, base_url),
        }
    }

    links
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_parsed(absolute).ok()
}
