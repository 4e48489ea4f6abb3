//! Episode guide parser
//!
//! Parses `/title/tt{id}/episodes` pages: the guide header (show title and
//! season selector) and the per-episode rows of the selected season.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use scraper::{ElementRef, Html};

use crate::error::{Operation, ShapeError};
use crate::parser::{element_text, selector};
use crate::types::EpisodeEntry;

/// Air date layouts printed by the episode guide ("15 Jun. 2024", "15 May 2024").
const AIR_DATE_FORMATS: [&str; 2] = ["%d %b. %Y", "%d %b %Y"];

/// Header of an episode guide page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeGuide {
    pub show_title: String,
    /// Text of the selected season option, not yet validated
    pub selected_season: String,
    /// Numeric season options in page order
    pub seasons: Vec<String>,
}

/// One `div.info` block of a season page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRow {
    pub title: Option<String>,
    pub episode_number: Option<String>,
    /// Trimmed air date text, empty when the episode is unscheduled
    pub air_date: String,
}

/// Rows of one season page together with the season they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodePage {
    pub season: String,
    pub rows: Vec<EpisodeRow>,
}

fn selected_season(document: &Html, operation: Operation) -> Result<String, ShapeError> {
    let sel = selector(operation, "select#bySeason option[selected]")?;
    document
        .select(&sel)
        .next()
        .map(|option| element_text(&option))
        .ok_or_else(|| ShapeError::new(operation, "selected season not found"))
}

/// Locate the show title and season selector of an episode guide.
///
/// # Errors
/// Fails when the show title or the season selector is missing.
pub fn locate_episode_guide(html: &str) -> Result<EpisodeGuide, ShapeError> {
    let operation = Operation::UpcomingEpisodes;
    let document = Html::parse_document(html);

    let title_selector = selector(operation, r#"h3[itemprop="name"] a"#)?;
    let show_title = document
        .select(&title_selector)
        .next()
        .map(|a| element_text(&a))
        .filter(|title| !title.is_empty())
        .ok_or_else(|| ShapeError::new(operation, "show title not found"))?;

    let selected_season = selected_season(&document, operation)?;

    let option_selector = selector(operation, "select#bySeason option")?;
    let seasons = document
        .select(&option_selector)
        .map(|option| element_text(&option))
        .filter(|text| !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()))
        .collect();

    Ok(EpisodeGuide {
        show_title,
        selected_season,
        seasons,
    })
}

fn episode_row(info: &ElementRef, operation: Operation) -> Result<EpisodeRow, ShapeError> {
    let airdate_selector = selector(operation, "div.airdate")?;
    let link_selector = selector(operation, "a")?;
    let meta_selector = selector(operation, "meta")?;

    let air_date = info
        .select(&airdate_selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default();
    let title = info
        .select(&link_selector)
        .next()
        .and_then(|a| a.value().attr("title"))
        .map(|title| title.trim().to_string());
    let episode_number = info
        .select(&meta_selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|number| number.trim().to_string());

    Ok(EpisodeRow {
        title,
        episode_number,
        air_date,
    })
}

/// Locate the episode rows of a season page.
///
/// # Errors
/// Fails when the page has no selected season.
pub fn locate_episode_rows(html: &str, operation: Operation) -> Result<EpisodePage, ShapeError> {
    let document = Html::parse_document(html);
    let season = selected_season(&document, operation)?;

    let info_selector = selector(operation, "div.info")?;
    let rows = document
        .select(&info_selector)
        .map(|info| episode_row(&info, operation))
        .collect::<Result<_, _>>()?;

    Ok(EpisodePage { season, rows })
}

/// Parse an air date such as "15 Jun. 2024".
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use watchlist_core::parser::parse_air_date;
///
/// assert_eq!(
///     parse_air_date("15 Jun. 2024").unwrap(),
///     NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
/// );
/// assert!(parse_air_date("2024").is_err());
/// ```
pub fn parse_air_date(text: &str) -> Result<NaiveDate, ShapeError> {
    AIR_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .ok_or_else(|| {
            ShapeError::new(
                Operation::EpisodeListing,
                format!("unrecognized air date '{text}'"),
            )
        })
}

/// Whether an episode airing on `air_date` is still to come at `now`.
///
/// The air date counts from local midnight, so an episode airing today is
/// upcoming only at exactly midnight.
pub fn airs_at_or_after(air_date: NaiveDate, now: NaiveDateTime) -> bool {
    air_date.and_time(NaiveTime::MIN) >= now
}

/// Resolve a season page into episode entries.
///
/// Rows without an air date are skipped. With `upcoming_after` set, only
/// rows airing at or after that local time are kept and every air date must
/// parse.
///
/// # Errors
/// Fails on an unparsable air date or a kept row without title or number.
pub fn normalize_episode_rows(
    page: EpisodePage,
    upcoming_after: Option<NaiveDateTime>,
    operation: Operation,
) -> Result<Vec<EpisodeEntry>, ShapeError> {
    let mut entries = Vec::new();

    for row in page.rows {
        if row.air_date.is_empty() {
            continue;
        }

        if let Some(now) = upcoming_after {
            let date = parse_air_date(&row.air_date)
                .map_err(|e| ShapeError::new(operation, e.reason))?;
            if !airs_at_or_after(date, now) {
                continue;
            }
        }

        let title = row.title.ok_or_else(|| {
            ShapeError::new(
                operation,
                format!("episode airing {} has no title", row.air_date),
            )
        })?;
        let episode_number = row.episode_number.ok_or_else(|| {
            ShapeError::new(
                operation,
                format!("episode '{title}' has no episode number"),
            )
        })?;

        entries.push(EpisodeEntry {
            title,
            season: page.season.clone(),
            episode_number,
            air_date: row.air_date,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn row(title: &str, number: &str, air_date: &str) -> EpisodeRow {
        EpisodeRow {
            title: Some(title.to_string()),
            episode_number: Some(number.to_string()),
            air_date: air_date.to_string(),
        }
    }

    fn page(rows: Vec<EpisodeRow>) -> EpisodePage {
        EpisodePage {
            season: "3".to_string(),
            rows,
        }
    }

    const GUIDE: &str = r#"
        <html><body>
          <h3 itemprop="name"><a href="/title/tt0944947/">  Game of Thrones  </a></h3>
          <select id="bySeason">
            <option value="1">1</option>
            <option value="2" selected="selected">2</option>
            <option value="10">10</option>
            <option value="-1">Unknown</option>
          </select>
          <div class="list detail eplist">
            <div class="info">
              <meta itemprop="episodeNumber" content="1"/>
              <div class="airdate">
                 01 Jan. 2000
              </div>
              <strong><a href="/title/tt1/" title="Past Episode">Past Episode</a></strong>
            </div>
            <div class="info">
              <meta itemprop="episodeNumber" content="2"/>
              <div class="airdate">
                 20 Dec. 2099
              </div>
              <strong><a href="/title/tt2/" title="Future Episode">Future Episode</a></strong>
            </div>
            <div class="info">
              <meta itemprop="episodeNumber" content="3"/>
              <div class="airdate"> </div>
              <strong><a href="/title/tt3/" title="Unscheduled">Unscheduled</a></strong>
            </div>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_air_date_formats() {
        assert_eq!(
            parse_air_date("15 Jun. 2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
        assert_eq!(
            parse_air_date("05 May 2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 5).unwrap()
        );
        assert!(parse_air_date("Jun. 2024").is_err());
        assert!(parse_air_date("2024-06-15").is_err());
    }

    #[test]
    fn test_locate_episode_guide() {
        let guide = locate_episode_guide(GUIDE).unwrap();
        assert_eq!(guide.show_title, "Game of Thrones");
        assert_eq!(guide.selected_season, "2");
        assert_eq!(guide.seasons, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_locate_episode_guide_without_title() {
        let err = locate_episode_guide(r#"<select id="bySeason"><option selected>1</option></select>"#)
            .unwrap_err();
        assert_eq!(err.reason, "show title not found");
    }

    #[test]
    fn test_locate_episode_rows() {
        let page = locate_episode_rows(GUIDE, Operation::EpisodeListing).unwrap();
        assert_eq!(page.season, "2");
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.rows[0].air_date, "01 Jan. 2000");
        assert_eq!(page.rows[1].title.as_deref(), Some("Future Episode"));
        assert_eq!(page.rows[2].air_date, "");
    }

    #[test]
    fn test_normalize_all_dated_rows() {
        let page = locate_episode_rows(GUIDE, Operation::EpisodeListing).unwrap();
        let entries = normalize_episode_rows(page, None, Operation::EpisodeListing).unwrap();
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Past Episode", "Future Episode"]);
        assert!(entries.iter().all(|e| e.season == "2"));
    }

    #[test]
    fn test_normalize_upcoming_only() {
        let page = locate_episode_rows(GUIDE, Operation::EpisodeListing).unwrap();
        let entries =
            normalize_episode_rows(page, Some(at(2026, 10, 14)), Operation::UpcomingEpisodes)
                .unwrap();
        assert_eq!(
            entries,
            vec![EpisodeEntry {
                title: "Future Episode".to_string(),
                season: "2".to_string(),
                episode_number: "2".to_string(),
                air_date: "20 Dec. 2099".to_string(),
            }]
        );
    }

    #[test]
    fn test_past_date_excluded_next_day_included() {
        let now = at(2026, 10, 14);
        let rows = vec![
            row("Old", "1", "01 Jan. 2000"),
            row("Tomorrow", "2", "15 Oct. 2026"),
        ];
        let entries =
            normalize_episode_rows(page(rows), Some(now), Operation::UpcomingEpisodes).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Tomorrow");
        assert_eq!(entries[0].season, "3");
    }

    #[test]
    fn test_airs_today_is_past_after_midnight() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        assert!(!airs_at_or_after(today, at(2026, 10, 14)));
        assert!(airs_at_or_after(today, today.and_time(NaiveTime::MIN)));
    }

    #[test]
    fn test_unparsable_date_is_hard_failure() {
        let rows = vec![row("Soon", "1", "2027")];
        let err = normalize_episode_rows(
            page(rows),
            Some(at(2026, 10, 14)),
            Operation::UpcomingEpisodes,
        )
        .unwrap_err();
        assert_eq!(err.operation, Operation::UpcomingEpisodes);
        assert!(err.reason.contains("'2027'"));
    }

    #[test]
    fn test_kept_row_without_title_fails() {
        let rows = vec![EpisodeRow {
            title: None,
            episode_number: Some("1".to_string()),
            air_date: "01 Jan. 2099".to_string(),
        }];
        let err = normalize_episode_rows(page(rows), None, Operation::EpisodeListing)
            .unwrap_err();
        assert!(err.reason.contains("no title"));
    }
}
