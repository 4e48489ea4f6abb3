//! Interactive menus

use std::io::Write;

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use watchlist_core::{DetailRecord, Scope, WatchlistError};
use watchlist_store::Storage;

use crate::app::{parse_local_id, App};

const MAIN_ITEMS: [&str; 4] = [
    "Movies watchlist",
    "TV shows watchlist",
    "Add user to the app",
    "Exit",
];

const MOVIE_ITEMS: [&str; 8] = [
    "Add to watchlist",
    "Search (local database only)",
    "View all movies in your watchlist",
    "View watched movies",
    "View upcoming movies in your watchlist",
    "Watch a movie from your watchlist",
    "Delete a movie",
    "Go back",
];

const SHOW_ITEMS: [&str; 6] = [
    "Add tv show",
    "Search (local database only)",
    "View all TV shows in your watchlist",
    "View upcoming episodes",
    "Delete tv show",
    "Go back",
];

const ADD_ITEMS: [&str; 3] = [
    "Search online by title",
    "Add to watchlist using an IMDB id (find it using the title search)",
    "Go back",
];

fn choose(prompt: &str, items: &[&str]) -> Result<usize> {
    Ok(Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()?)
}

fn ask(prompt: &str) -> Result<String> {
    Ok(Input::<String>::new().with_prompt(prompt).interact_text()?)
}

pub fn confirm_add(record: &DetailRecord) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!("Add '{}' to your watchlist?", record.title))
        .default(true)
        .interact()?)
}

pub fn confirm_delete(id: i64) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!("Delete entry {id}?"))
        .default(false)
        .interact()?)
}

/// Print a failed action and keep the menu running; an interrupt still ends it.
fn report(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if matches!(e.downcast_ref::<WatchlistError>(), Some(WatchlistError::Interrupted)) => {
            Err(e)
        }
        Err(e) => {
            eprintln!("\n{e}\n");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

pub async fn run<S: Storage, W: Write>(app: &mut App<S, W>) -> Result<()> {
    loop {
        match choose("Please select one of the following options", &MAIN_ITEMS)? {
            0 => watchlist(app, Scope::Movie).await?,
            1 => watchlist(app, Scope::Show).await?,
            2 => {
                let username = ask("Username")?;
                report(app.add_user(&username))?;
            }
            _ => return Ok(()),
        }
    }
}

/// Entries of the movie and TV watchlist menus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Add,
    Find,
    ListAll,
    Watched,
    ListUpcoming,
    Watch,
    UpcomingEpisodes,
    Delete,
    Back,
}

fn action_for(scope: Scope, choice: usize) -> Option<Action> {
    let action = match (scope, choice) {
        (_, 0) => Action::Add,
        (_, 1) => Action::Find,
        (_, 2) => Action::ListAll,
        (Scope::Movie, 3) => Action::Watched,
        (Scope::Movie, 4) => Action::ListUpcoming,
        (Scope::Movie, 5) => Action::Watch,
        (Scope::Movie, 6) | (Scope::Show, 4) => Action::Delete,
        (Scope::Movie, 7) | (Scope::Show, 5) => Action::Back,
        (Scope::Show, 3) => Action::UpcomingEpisodes,
        _ => return None,
    };
    Some(action)
}

async fn watchlist<S: Storage, W: Write>(app: &mut App<S, W>, scope: Scope) -> Result<()> {
    let items: &[&str] = match scope {
        Scope::Movie => &MOVIE_ITEMS,
        Scope::Show => &SHOW_ITEMS,
    };
    loop {
        let choice = choose("What would you like to do?", items)?;
        let action = action_for(scope, choice)
            .ok_or_else(|| anyhow::anyhow!("No {scope} menu entry {choice}"))?;
        if action == Action::Back {
            return Ok(());
        }
        report(watchlist_action(app, scope, action).await)?;
    }
}

async fn watchlist_action<S: Storage, W: Write>(
    app: &mut App<S, W>,
    scope: Scope,
    action: Action,
) -> Result<()> {
    match action {
        Action::Add => add(app, scope).await,
        Action::Find => app.find(scope, &ask("Title contains")?),
        Action::ListAll => app.list(scope, false),
        Action::Watched => app.watched(&ask("Username")?),
        Action::ListUpcoming => app.list(scope, true),
        Action::Watch => {
            let username = ask("Username")?;
            let movie_id = parse_local_id(&ask("Movie id")?)?;
            app.watch(&username, movie_id)
        }
        Action::UpcomingEpisodes => app.upcoming().await.map(|_| ()),
        Action::Delete => {
            let id = parse_local_id(&ask("Id to delete")?)?;
            app.delete(scope, id, confirm_delete)
        }
        Action::Back => Ok(()),
    }
}

async fn add<S: Storage, W: Write>(app: &mut App<S, W>, scope: Scope) -> Result<()> {
    loop {
        let result = match choose("Please select one of the following options", &ADD_ITEMS)? {
            0 => search_online(app, scope).await,
            1 => add_by_id(app, scope).await,
            _ => return Ok(()),
        };
        report(result)?;
    }
}

async fn search_online<S: Storage, W: Write>(app: &mut App<S, W>, scope: Scope) -> Result<()> {
    let title = ask("Title")?;
    app.search(scope, &title).await
}

async fn add_by_id<S: Storage, W: Write>(app: &mut App<S, W>, scope: Scope) -> Result<()> {
    eprintln!("\nWARNING: you need an IMDB id here. Copy it from the title search.\n");
    let id = ask("IMDB id")?;
    app.add(scope, &id, confirm_add).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_entries_map_to_actions() {
        assert_eq!(action_for(Scope::Movie, 6), Some(Action::Delete));
        assert_eq!(action_for(Scope::Show, 4), Some(Action::Delete));
        assert_eq!(action_for(Scope::Show, 3), Some(Action::UpcomingEpisodes));
        assert_eq!(action_for(Scope::Movie, 3), Some(Action::Watched));
    }

    #[test]
    fn test_last_entry_goes_back() {
        assert_eq!(action_for(Scope::Movie, MOVIE_ITEMS.len() - 1), Some(Action::Back));
        assert_eq!(action_for(Scope::Show, SHOW_ITEMS.len() - 1), Some(Action::Back));
    }

    #[test]
    fn test_unknown_entry_is_not_delete() {
        assert_eq!(action_for(Scope::Movie, MOVIE_ITEMS.len()), None);
        assert_eq!(action_for(Scope::Show, SHOW_ITEMS.len()), None);
        assert_eq!(action_for(Scope::Show, 42), None);
    }
}
