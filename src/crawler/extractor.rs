//! Restaurant record extraction from detail pages
//!
//! Extraction is total: every field selector either yields its trimmed text
//! or degrades to an empty value, and each degradation is reported alongside
//! the record so it can be counted.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Serialize;
use std::fmt;
use url::Url;

/// Text the site shows in place of a score for unrated restaurants
pub const NO_SCORE_MARKER: &str = "-";

static NAME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2 > a > span").expect("static selector"));
static SCORE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("span.rdheader-rating__score-val-dtl").expect("static selector")
});
static INFO_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.c-table > tbody > tr > td").expect("static selector"));

// Positions in the restaurant information table
const GENRE_CELL: usize = 2;
const PHONE_CELL: usize = 3;
const ADDRESS_CELL: usize = 5;
const HOURS_CELL: usize = 7;
const HOLIDAY_CELL: usize = 8;

/// One restaurant, as extracted from its detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantRecord {
    pub name: String,
    /// Rating; 0.0 when absent or unparsable
    pub score: f64,
    pub genre: String,
    pub phone: String,
    pub address: String,
    pub hours: String,
    pub holiday: String,
    pub source_url: String,
}

/// Record fields that come from a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Score,
    Genre,
    Phone,
    Address,
    Hours,
    Holiday,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Score => "score",
            Self::Genre => "genre",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Hours => "hours",
            Self::Holiday => "holiday",
        };
        f.write_str(name)
    }
}

/// A field that could not be extracted cleanly
#[derive(Debug, Clone, PartialEq)]
pub enum Degradation {
    /// The selector matched nothing, or only whitespace
    MissingField(Field),
    /// Score text was neither a number nor the no-score marker
    UnparsableScore(String),
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing {}", field),
            Self::UnparsableScore(text) => write!(f, "unparsable score {:?}", text),
        }
    }
}

/// Result of running the extractor over one document
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: RestaurantRecord,
    pub degraded: Vec<Degradation>,
}

impl Extraction {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Extracts a restaurant record from a parsed detail page
///
/// # Example
///
/// ```
/// use scraper::Html;
/// use tabelog_crawler::crawler::extract;
/// use url::Url;
///
/// let html = Html::parse_document(
///     r#"<h2><a href="/"><span> Sushi Ginza </span></a></h2>
///        <span class="rdheader-rating__score-val-dtl">-</span>"#,
/// );
/// let url = Url::parse("https://tabelog.com/tokyo/A1301/A130101/13000001").unwrap();
/// let extraction = extract(&html, &url);
/// assert_eq!(extraction.record.name, "Sushi Ginza");
/// assert_eq!(extraction.record.score, 0.0);
/// ```
pub fn extract(document: &Html, source_url: &Url) -> Extraction {
    let mut degraded = Vec::new();

    let mut text_field = |field: Field, value: Option<String>| match value {
        Some(text) => text,
        None => {
            degraded.push(Degradation::MissingField(field));
            String::new()
        }
    };

    let name = text_field(Field::Name, first_text(document, &NAME_SELECTOR));
    let score_text = text_field(Field::Score, first_text(document, &SCORE_SELECTOR));

    let cells: Vec<String> = document
        .select(&INFO_CELL_SELECTOR)
        .map(|cell| clean_text(cell.text()))
        .collect();
    let mut cell = |field: Field, index: usize| {
        text_field(field, cells.get(index).filter(|t| !t.is_empty()).cloned())
    };

    let genre = cell(Field::Genre, GENRE_CELL);
    let phone = cell(Field::Phone, PHONE_CELL);
    let address = cell(Field::Address, ADDRESS_CELL);
    let hours = cell(Field::Hours, HOURS_CELL);
    let holiday = cell(Field::Holiday, HOLIDAY_CELL);

    let score = match parse_score(&score_text) {
        Ok(score) => score,
        Err(text) => {
            degraded.push(Degradation::UnparsableScore(text));
            0.0
        }
    };

    Extraction {
        record: RestaurantRecord {
            name,
            score,
            genre,
            phone,
            address,
            hours,
            holiday,
            source_url: source_url.to_string(),
        },
        degraded,
    }
}

/// Parses score text
///
/// The no-score marker and empty text (already reported as missing) map to
/// 0.0. Anything else that is not a finite number is returned as `Err`.
pub fn parse_score(text: &str) -> Result<f64, String> {
    let text = text.trim();
    if text.is_empty() || text == NO_SCORE_MARKER {
        return Ok(0.0);
    }
    match text.parse::<f64>() {
        Ok(score) if score.is_finite() => Ok(score),
        _ => Err(text.to_string()),
    }
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| clean_text(element.text()))
        .filter(|text| !text.is_empty())
}

/// Joins text nodes and collapses whitespace runs into single spaces
fn clean_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
