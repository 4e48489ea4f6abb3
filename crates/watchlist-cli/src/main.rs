use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use watchlist_core::client::{DEFAULT_USER_AGENT, IMDB_BASE_URL};
use watchlist_core::{ClientConfig, Scope, WatchlistError};
use watchlist_store::{open_storage, SqliteStorage};

mod app;
mod menu;
mod render;

use app::{parse_local_id, App};

/// Exit status after Ctrl-C, as a shell reports SIGINT
const INTERRUPTED_STATUS: u8 = 130;

/// Movie and TV show watchlist backed by IMDb
///
/// Titles are looked up on IMDb and kept in a local SQLite database.
/// Without a subcommand the interactive menu starts.
#[derive(Parser, Debug)]
#[command(name = "watchlist")]
#[command(version)]
#[command(about = "Movie and TV show watchlist backed by IMDb", long_about = None)]
struct Cli {
    /// Path to the SQLite watchlist database
    #[arg(long, env = "WATCHLIST_DB", default_value = "watchlist.db", global = true)]
    db: PathBuf,

    /// Request timeout in seconds
    #[arg(long, env = "WATCHLIST_TIMEOUT", default_value_t = 5, global = true)]
    timeout: u64,

    /// Site every request is sent to
    #[arg(long, env = "WATCHLIST_BASE_URL", default_value = IMDB_BASE_URL, hide = true, global = true)]
    base_url: String,

    /// Print records and errors as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug, Clone, Copy)]
struct ScopeArgs {
    /// Work on TV shows instead of movies
    #[arg(long)]
    show: bool,
}

impl ScopeArgs {
    fn scope(self) -> Scope {
        if self.show {
            Scope::Show
        } else {
            Scope::Movie
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search IMDb by title
    Search {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(required = true)]
        title: Vec<String>,
    },
    /// Show one title by IMDb id
    Lookup {
        #[command(flatten)]
        scope: ScopeArgs,
        id: String,
    },
    /// Look up a title and add it to the watchlist
    Add {
        #[command(flatten)]
        scope: ScopeArgs,
        id: String,
        /// Add without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// List the watchlist
    List {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Only titles releasing after today
        #[arg(long)]
        upcoming: bool,
    },
    /// Search the local watchlist by title
    Find {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(required = true)]
        term: Vec<String>,
    },
    /// Delete a title by local id
    Delete {
        #[command(flatten)]
        scope: ScopeArgs,
        id: String,
        /// Delete without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// List the episodes of one season of a show
    Episodes {
        id: String,
        #[arg(long)]
        season: Option<u32>,
    },
    /// Upcoming episodes of every show in the watchlist
    Upcoming,
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Mark a movie as watched by a user
    Watch { user: String, movie_id: String },
    /// List the movies a user has watched
    Watched { user: String },
    /// Start the interactive menu
    Menu,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Add a user
    Add { name: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let json = cli.json;
    match run(cli, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<WatchlistError>() {
            Some(WatchlistError::Interrupted) => {
                report_error(json, &e);
                ExitCode::from(INTERRUPTED_STATUS)
            }
            _ => {
                report_error(json, &e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    tracing::debug!("Opening watchlist database: {}", cli.db.display());
    let storage = open_storage(&cli.db)?;
    let config = ClientConfig {
        base_url: cli.base_url,
        user_agent: DEFAULT_USER_AGENT.to_string(),
        timeout_secs: cli.timeout,
    };
    let mut app = App::new(storage, config, cancel, cli.json, io::stdout());

    match cli.command.unwrap_or(Command::Menu) {
        Command::Search { scope, title } => app.search(scope.scope(), &title.join(" ")).await,
        Command::Lookup { scope, id } => app.lookup(scope.scope(), &id).await.map(|_| ()),
        Command::Add { scope, id, yes } => {
            app.add(scope.scope(), &id, |record| {
                if yes {
                    Ok(true)
                } else {
                    menu::confirm_add(record)
                }
            })
            .await
        }
        Command::List { scope, upcoming } => app.list(scope.scope(), upcoming),
        Command::Find { scope, term } => app.find(scope.scope(), &term.join(" ")),
        Command::Delete { scope, id, yes } => {
            let id = parse_local_id(&id)?;
            app.delete(scope.scope(), id, |id| {
                if yes {
                    Ok(true)
                } else {
                    menu::confirm_delete(id)
                }
            })
        }
        Command::Episodes { id, season } => app.episodes(&id, season).await,
        Command::Upcoming => app.upcoming().await.map(|_| ()),
        Command::User(UserCommand::Add { name }) => app.add_user(&name),
        Command::Watch { user, movie_id } => app.watch(&user, parse_local_id(&movie_id)?),
        Command::Watched { user } => app.watched(&user),
        Command::Menu => run_menu(&mut app).await,
    }
}

async fn run_menu(app: &mut App<SqliteStorage, io::Stdout>) -> Result<()> {
    tracing::info!("Starting interactive menu");
    menu::run(app).await
}

fn report_error(json: bool, error: &anyhow::Error) {
    if json {
        let message = serde_json::json!({ "error": format!("{error:#}") });
        println!("{message}");
    } else {
        eprintln!("Error: {error:#}");
    }
}

/// Cancels in-flight requests on Ctrl-C.
///
/// Prompts block on the terminal and never see the token, so the process
/// is ended after a grace period if nothing returns by then.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::info!("Interrupt received, cancelling");
        cancel.cancel();
        tokio::time::sleep(Duration::from_secs(2)).await;
        std::process::exit(i32::from(INTERRUPTED_STATUS));
    });
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence over the flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("warn"),
                1 => EnvFilter::new("watchlist=info,watchlist_core=info,watchlist_store=info,warn"),
                2 => EnvFilter::new("watchlist=debug,watchlist_core=debug,watchlist_store=debug,info"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_show_flag_selects_tv_scope() {
        let cli = Cli::try_parse_from(["watchlist", "search", "--show", "game", "of", "thrones"]).unwrap();
        match cli.command {
            Some(Command::Search { scope, title }) => {
                assert_eq!(scope.scope(), Scope::Show);
                assert_eq!(title.join(" "), "game of thrones");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["watchlist", "list", "--upcoming", "--json", "--db", "x.db"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.db, PathBuf::from("x.db"));
        assert!(matches!(cli.command, Some(Command::List { upcoming: true, .. })));
    }

    #[test]
    fn test_no_subcommand_means_menu() {
        let cli = Cli::try_parse_from(["watchlist"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_episodes_season() {
        let cli = Cli::try_parse_from(["watchlist", "episodes", "tt0944947", "--season", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Episodes { season: Some(3), .. })
        ));
    }
}
