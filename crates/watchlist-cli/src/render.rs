//! Text and JSON rendering of records

use chrono::DateTime;
use serde::Serialize;
use watchlist_core::{DetailRecord, EpisodeEntry, SearchHit, Upcoming, UpcomingEpisodes};
use watchlist_store::StoredTitle;

/// Title search rows shown at most
pub const DISPLAY_LIMIT: usize = 25;

/// JSON document for any serializable value.
pub fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

fn table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(header.to_vec())];
    out.extend(rows.iter().map(|row| line(row.iter().map(String::as_str).collect())));
    out.join("\n")
}

/// Title search hits, truncated to [`DISPLAY_LIMIT`].
pub fn search_hits(hits: &[SearchHit]) -> String {
    let rows: Vec<Vec<String>> = hits
        .iter()
        .take(DISPLAY_LIMIT)
        .map(|hit| {
            vec![
                hit.imdb_id.clone(),
                hit.title.clone(),
                hit.release_date.clone(),
                hit.content_type.clone(),
                hit.cast.clone(),
            ]
        })
        .collect();
    format!(
        "\n-- Search Results --\n\n{}\n\n-- End --\n",
        table(&["imdb_id", "title", "release_date", "type", "cast"], &rows)
    )
}

pub fn detail(record: &DetailRecord) -> String {
    format!(
        "\n-- Search Results --\n\
         IMDB ID: {}\n\
         Title: {}\n\
         Release Date: {}\n\
         Rating: {}\n\
         Runtime: {}\n\
         Type: {}\n\
         Description: {}\n\
         -- End --\n",
        record.imdb_id,
        record.title,
        record.release_date,
        record.rating,
        record.runtime,
        record.content_type,
        record.description,
    )
}

pub fn episodes(heading: &str, episodes: &[EpisodeEntry]) -> String {
    let rows: Vec<Vec<String>> = episodes
        .iter()
        .map(|e| {
            vec![
                e.title.clone(),
                e.season.clone(),
                e.episode_number.clone(),
                e.air_date.clone(),
            ]
        })
        .collect();
    format!(
        "\n-- {heading} --\n{}\n--------\n",
        table(&["title", "season", "episode", "airdate"], &rows)
    )
}

pub fn upcoming(result: &UpcomingEpisodes) -> String {
    match &result.outcome {
        Upcoming::Episodes(list) => episodes(&result.show_title, list),
        Upcoming::NoUpcoming => format!(
            "{}\n--------\n",
            result.message().unwrap_or_default()
        ),
    }
}

fn release_year(title: &StoredTitle) -> String {
    title
        .release_timestamp
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|start| start.format("%Y").to_string())
        .unwrap_or_else(|| title.release_date.clone())
}

/// Stored titles as `id (IMDB ID: '...'): 'title' (on year) - rating - runtime`.
pub fn stored_titles(heading: &str, titles: &[StoredTitle]) -> String {
    let mut out = format!("\n-- {heading} --\n");
    for title in titles {
        out.push_str(&format!(
            "{} (IMDB ID: {:?}): {:?} (on {}) - {} - {}\n",
            title.id,
            title.imdb_id,
            title.title,
            release_year(title),
            title.rating,
            title.runtime,
        ));
    }
    out.push_str("-- End --\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(n: usize) -> SearchHit {
        SearchHit {
            imdb_id: format!("{n:07}"),
            title: format!("Title {n}"),
            release_date: "2012".to_string(),
            content_type: "Movie".to_string(),
            cast: "NA".to_string(),
        }
    }

    #[test]
    fn test_search_hits_truncated_for_display() {
        let hits: Vec<SearchHit> = (0..40).map(hit).collect();
        let out = search_hits(&hits);
        assert!(out.contains("Title 24"));
        assert!(!out.contains("Title 25"));
    }

    #[test]
    fn test_table_alignment() {
        let out = table(
            &["a", "bb"],
            &[vec!["long".to_string(), "x".to_string()]],
        );
        assert_eq!(out, "a     bb\nlong  x");
    }

    #[test]
    fn test_no_upcoming_message() {
        let result = UpcomingEpisodes::new("Loki".to_string(), Vec::new());
        assert!(upcoming(&result).starts_with("Found no upcoming episodes for Loki."));
    }

    #[test]
    fn test_stored_titles_year() {
        let stored = StoredTitle {
            id: 3,
            imdb_id: "0848228".to_string(),
            title: "The Avengers".to_string(),
            release_date: "2012".to_string(),
            release_timestamp: Some(1_325_376_000),
            rating: "8.0".to_string(),
            content_type: "Movie".to_string(),
            runtime: "2h 23m".to_string(),
            description: String::new(),
        };
        let out = stored_titles("All Movies", &[stored]);
        assert!(out.contains("3 (IMDB ID: \"0848228\"): \"The Avengers\" (on 2012) - 8.0 - 2h 23m"));
    }
}
