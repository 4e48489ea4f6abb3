//! Title search results parser
//!
//! Locates result rows on the `/find/` page and resolves each row's variable
//! number of fields into a [`SearchHit`].

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::error::{Operation, ShapeError};
use crate::parser::{element_text, selector};
use crate::types::{SearchHit, DEFAULT_CONTENT_TYPE, NOT_AVAILABLE};

/// Where one canonical field of a search row comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Raw field at this index from the front
    At(usize),
    /// Raw field at this index from the back (1 is the last field)
    FromEnd(usize),
    /// Fixed value
    Literal(&'static str),
}

impl Slot {
    fn resolve(self, raw: &[String]) -> String {
        match self {
            Slot::At(i) => raw[i].clone(),
            Slot::FromEnd(i) => raw[raw.len() - i].clone(),
            Slot::Literal(value) => value.to_string(),
        }
    }
}

/// Resolution rule for one observed row length.
#[derive(Debug, Clone, Copy)]
pub struct SearchRowRule {
    pub arity: usize,
    pub title: Slot,
    pub release_date: Slot,
    pub content_type: Slot,
    pub cast: Slot,
}

/// Row layouts seen on the live result page, keyed by field count.
///
/// Field 0 is always the identifier and field 1 the title; the rest are the
/// row's metadata list items in page order. Which trailing item is the type
/// and which is the cast was inferred from sampled pages.
pub const SEARCH_ROW_RULES: [SearchRowRule; 7] = [
    // id, title, year, episode count, type, cast
    SearchRowRule {
        arity: 7,
        title: Slot::At(1),
        release_date: Slot::At(2),
        content_type: Slot::FromEnd(2),
        cast: Slot::FromEnd(1),
    },
    // id, title, year, ..., type; no cast line
    SearchRowRule {
        arity: 6,
        title: Slot::At(1),
        release_date: Slot::At(2),
        content_type: Slot::FromEnd(1),
        cast: Slot::Literal(""),
    },
    // Already canonical
    SearchRowRule {
        arity: 5,
        title: Slot::At(1),
        release_date: Slot::At(2),
        content_type: Slot::At(3),
        cast: Slot::At(4),
    },
    // Movies carry no type label
    SearchRowRule {
        arity: 4,
        title: Slot::At(1),
        release_date: Slot::At(2),
        content_type: Slot::Literal(DEFAULT_CONTENT_TYPE),
        cast: Slot::At(3),
    },
    SearchRowRule {
        arity: 3,
        title: Slot::At(1),
        release_date: Slot::Literal(NOT_AVAILABLE),
        content_type: Slot::Literal(NOT_AVAILABLE),
        cast: Slot::Literal(NOT_AVAILABLE),
    },
    SearchRowRule {
        arity: 2,
        title: Slot::At(1),
        release_date: Slot::Literal(NOT_AVAILABLE),
        content_type: Slot::Literal(NOT_AVAILABLE),
        cast: Slot::Literal(NOT_AVAILABLE),
    },
    SearchRowRule {
        arity: 1,
        title: Slot::Literal(NOT_AVAILABLE),
        release_date: Slot::Literal(NOT_AVAILABLE),
        content_type: Slot::Literal(NOT_AVAILABLE),
        cast: Slot::Literal(NOT_AVAILABLE),
    },
];

/// Extract the numeric IMDb ID from a title link.
///
/// # Examples
/// ```
/// use watchlist_core::parser::extract_imdb_id;
///
/// assert_eq!(extract_imdb_id("/title/tt0848228/?ref_=fn_tt_tt_1"), Some("0848228".to_string()));
/// assert_eq!(extract_imdb_id("/name/nm0000375/"), None);
/// ```
pub fn extract_imdb_id(href: &str) -> Option<String> {
    let re = regex_lite::Regex::new(r"/title/tt(\d+)").ok()?;
    let caps = re.captures(href)?;
    Some(caps.get(1)?.as_str().to_string())
}

/// Locate result rows and return each as its raw ordered field list.
///
/// # Errors
/// Fails when the page has no result rows or a row has no title link.
pub fn locate_search_rows(html: &str) -> Result<Vec<Vec<String>>, ShapeError> {
    let document = Html::parse_document(html);
    let row_selector = selector(
        Operation::TitleSearch,
        "div.ipc-metadata-list-summary-item__tc",
    )?;

    let rows: Vec<Vec<String>> = document
        .select(&row_selector)
        .map(|row| raw_search_row(&row))
        .collect::<Result<_, _>>()?;

    if rows.is_empty() {
        return Err(ShapeError::new(
            Operation::TitleSearch,
            "no result rows found",
        ));
    }

    Ok(rows)
}

fn raw_search_row(row: &ElementRef) -> Result<Vec<String>, ShapeError> {
    let link_selector = selector(Operation::TitleSearch, "a")?;
    let item_selector = selector(Operation::TitleSearch, "li")?;

    let link = row
        .select(&link_selector)
        .next()
        .ok_or_else(|| ShapeError::new(Operation::TitleSearch, "result row has no link"))?;
    let href = link.value().attr("href").unwrap_or_default();
    let imdb_id = extract_imdb_id(href).ok_or_else(|| {
        ShapeError::new(
            Operation::TitleSearch,
            format!("result link '{href}' carries no title id"),
        )
    })?;

    let mut fields = vec![imdb_id, element_text(&link)];
    fields.extend(row.select(&item_selector).map(|li| element_text(&li)));
    Ok(fields)
}

/// Resolve one raw row into the canonical five fields.
///
/// # Errors
/// Fails when no rule exists for the row's length.
pub fn normalize_search_row(raw: &[String]) -> Result<SearchHit, ShapeError> {
    let rule = SEARCH_ROW_RULES
        .iter()
        .find(|rule| rule.arity == raw.len())
        .ok_or_else(|| {
            ShapeError::new(
                Operation::TitleSearch,
                format!("result row has {} fields", raw.len()),
            )
        })?;
    debug!(arity = rule.arity, imdb_id = %raw[0], "normalizing search row");

    Ok(SearchHit {
        imdb_id: raw[0].clone(),
        title: rule.title.resolve(raw),
        release_date: rule.release_date.resolve(raw),
        content_type: rule.content_type.resolve(raw),
        cast: rule.cast.resolve(raw),
    })
}

/// Parse a title search page into normalized hits, in page order.
pub fn parse_search_results(html: &str) -> Result<Vec<SearchHit>, ShapeError> {
    locate_search_rows(html)?
        .iter()
        .map(|raw| normalize_search_row(raw))
        .collect()
}
