//! Title detail page parser
//!
//! Parses the hero block of `/title/tt{id}/` into a [`DetailRecord`]. The
//! metadata list under the title holds one to four items depending on the
//! content type, and its length decides which fields are present.

use scraper::{Html, Selector};
use tracing::debug;

use crate::error::{Operation, ShapeError};
use crate::parser::{element_text, selector};
use crate::types::{DetailRecord, DEFAULT_CONTENT_TYPE, NOT_AVAILABLE};

/// One `li` of the hero metadata list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataItem {
    /// Full text of the item
    pub text: String,
    /// Text of the item's first `span`, where dates are rendered
    pub span: Option<String>,
}

/// Raw fragments of a detail page, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailFragments {
    pub title: String,
    pub description: String,
    pub rating: Option<String>,
    pub metadata: Vec<MetadataItem>,
}

/// Where a detail field comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaSlot {
    /// Text of the metadata item at this index
    Text(usize),
    /// Span text of the metadata item at this index
    Span(usize),
    /// Fixed value
    Literal(&'static str),
}

impl MetaSlot {
    fn resolve(self, items: &[MetadataItem]) -> Result<String, ShapeError> {
        match self {
            MetaSlot::Text(i) => Ok(items[i].text.clone()),
            MetaSlot::Span(i) => items[i].span.clone().ok_or_else(|| {
                ShapeError::new(
                    Operation::DetailLookup,
                    format!("metadata item {i} ('{}') has no date span", items[i].text),
                )
            }),
            MetaSlot::Literal(value) => Ok(value.to_string()),
        }
    }
}

/// Resolution rule for one metadata item count.
#[derive(Debug, Clone, Copy)]
pub struct DetailShapeRule {
    pub count: usize,
    pub content_type: MetaSlot,
    pub release_date: MetaSlot,
    pub runtime: MetaSlot,
}

/// Metadata layouts keyed by item count.
pub const DETAIL_SHAPE_RULES: [DetailShapeRule; 4] = [
    // type, date, certificate, runtime
    DetailShapeRule {
        count: 4,
        content_type: MetaSlot::Text(0),
        release_date: MetaSlot::Span(1),
        runtime: MetaSlot::Text(3),
    },
    // date, certificate, runtime
    DetailShapeRule {
        count: 3,
        content_type: MetaSlot::Literal(DEFAULT_CONTENT_TYPE),
        release_date: MetaSlot::Span(0),
        runtime: MetaSlot::Text(2),
    },
    // type, date
    DetailShapeRule {
        count: 2,
        content_type: MetaSlot::Text(0),
        release_date: MetaSlot::Span(1),
        runtime: MetaSlot::Literal(NOT_AVAILABLE),
    },
    // date
    DetailShapeRule {
        count: 1,
        content_type: MetaSlot::Literal(DEFAULT_CONTENT_TYPE),
        release_date: MetaSlot::Span(0),
        runtime: MetaSlot::Literal(NOT_AVAILABLE),
    },
];

fn first_text(document: &Html, css: &str) -> Result<Option<String>, ShapeError> {
    let sel = selector(Operation::DetailLookup, css)?;
    Ok(document
        .select(&sel)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty()))
}

fn required_text(document: &Html, css: &str, what: &str) -> Result<String, ShapeError> {
    first_text(document, css)?
        .ok_or_else(|| ShapeError::new(Operation::DetailLookup, format!("{what} not found")))
}

/// Locate the hero block fragments of a detail page.
///
/// # Errors
/// Fails when the title, plot or metadata list is missing.
pub fn locate_detail(html: &str) -> Result<DetailFragments, ShapeError> {
    let document = Html::parse_document(html);

    let title = required_text(
        &document,
        r#"h1[data-testid="hero-title-block__title"]"#,
        "title",
    )?;
    let description = required_text(&document, r#"span[data-testid="plot-xl"]"#, "plot")?;
    let rating = first_text(
        &document,
        r#"div[data-testid="hero-rating-bar__aggregate-rating__score"]"#,
    )?;

    let list_selector = selector(
        Operation::DetailLookup,
        r#"ul[data-testid="hero-title-block__metadata"]"#,
    )?;
    let item_selector: Selector = selector(Operation::DetailLookup, "li")?;
    let span_selector: Selector = selector(Operation::DetailLookup, "span")?;

    let list = document.select(&list_selector).next().ok_or_else(|| {
        ShapeError::new(Operation::DetailLookup, "metadata list not found")
    })?;
    let metadata = list
        .select(&item_selector)
        .map(|li| MetadataItem {
            text: element_text(&li),
            span: li.select(&span_selector).next().map(|s| element_text(&s)),
        })
        .collect();

    Ok(DetailFragments {
        title,
        description,
        rating,
        metadata,
    })
}

/// Resolve located fragments into a [`DetailRecord`] for `imdb_id`.
///
/// # Errors
/// Fails when the metadata item count has no rule or a date slot lacks its span.
pub fn normalize_detail(
    imdb_id: &str,
    fragments: DetailFragments,
) -> Result<DetailRecord, ShapeError> {
    let items = &fragments.metadata;
    let rule = DETAIL_SHAPE_RULES
        .iter()
        .find(|rule| rule.count == items.len())
        .ok_or_else(|| {
            ShapeError::new(
                Operation::DetailLookup,
                format!("metadata list has {} items", items.len()),
            )
        })?;
    debug!(count = rule.count, imdb_id, "normalizing detail metadata");

    Ok(DetailRecord {
        imdb_id: imdb_id.to_string(),
        content_type: rule.content_type.resolve(items)?,
        release_date: rule.release_date.resolve(items)?,
        runtime: rule.runtime.resolve(items)?,
        rating: fragments
            .rating
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        title: fragments.title,
        description: fragments.description,
    })
}

/// Parse a detail page for `imdb_id`.
pub fn parse_detail(imdb_id: &str, html: &str) -> Result<DetailRecord, ShapeError> {
    normalize_detail(imdb_id, locate_detail(html)?)
}
