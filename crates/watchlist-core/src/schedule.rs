//! Season selection for upcoming episodes
//!
//! Decides which season pages of a show have to be inspected. Upcoming
//! episodes of an in-progress season can sit on the selected season page
//! even when a later season already exists, so both are read in that case.

use crate::error::{Operation, ShapeError};
use crate::parser::EpisodeGuide;

/// Season selectors at or above this are treated as malformed.
pub const MAX_SEASON: u32 = 70;

/// Season pages to read for one show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeasonPlan {
    /// The guide's root page already shows the last season
    Root { season: u32 },
    /// Read the selected season page, then the last season page
    SelectedAndLast { selected: u32, last: u32 },
}

impl SeasonPlan {
    /// Seasons whose pages will be fetched, in concatenation order.
    pub fn seasons(&self) -> Vec<u32> {
        match *self {
            SeasonPlan::Root { season } => vec![season],
            SeasonPlan::SelectedAndLast { selected, last } => vec![selected, last],
        }
    }
}

fn season_number(token: &str) -> Option<u32> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Validate the guide's season selector and choose the pages to read.
///
/// # Errors
/// Fails when the selected season is not a number below [`MAX_SEASON`] or
/// the guide lists no numeric seasons.
pub fn plan_seasons(guide: &EpisodeGuide) -> Result<SeasonPlan, ShapeError> {
    let operation = Operation::UpcomingEpisodes;

    let selected = season_number(&guide.selected_season)
        .filter(|season| *season < MAX_SEASON)
        .ok_or_else(|| {
            ShapeError::new(
                operation,
                format!("selected season '{}' is not a valid season", guide.selected_season),
            )
        })?;

    let last = guide
        .seasons
        .last()
        .and_then(|token| season_number(token))
        .ok_or_else(|| ShapeError::new(operation, "season list is empty"))?;

    if selected == last {
        Ok(SeasonPlan::Root { season: selected })
    } else {
        Ok(SeasonPlan::SelectedAndLast { selected, last })
    }
}
