use microhub_core::models::{Movie, MovieMetadata, WatchStatus};
use microhub_core::services::{MovieDbClient, MovieLookup};
use microhub_core::util::normalize_text_option;

use crate::cli::MovieCommands;
use crate::commands::common::{format_movie_line, required_words, resolve_id, short_id};
use crate::error::CliError;
use crate::session::Session;

pub async fn run_movie(command: MovieCommands, session: &Session) -> Result<(), CliError> {
    let hub = &session.hub;
    match command {
        MovieCommands::Search { query, limit } => {
            session.require_online()?;
            let query = required_words(&query, "Search query")?;
            let client = MovieDbClient::from_config(&session.config)?;
            let results = client.search_movies(&query, limit).await?;
            if results.is_empty() {
                println!("No matches.");
            }
            for movie in &results {
                println!(
                    "{}  ({})",
                    movie.title,
                    movie.year.as_deref().unwrap_or("Unknown")
                );
            }
        }
        MovieCommands::Add {
            title,
            manual,
            year,
            director,
        } => {
            let title = required_words(&title, "Movie title")?;
            let metadata = if manual {
                MovieMetadata {
                    title,
                    year: normalize_text_option(year),
                    director: normalize_text_option(director),
                    ..MovieMetadata::default()
                }
            } else {
                session.require_online()?;
                MovieDbClient::from_config(&session.config)?
                    .lookup_movie(&title)
                    .await?
            };
            let movie = hub.add_movie(Movie::from_metadata(metadata)).await?;
            println!("{}", format_movie_line(&movie));
        }
        MovieCommands::List { json } => {
            let movies = hub.movies().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&movies)?);
            } else if movies.is_empty() {
                println!("Watchlist is empty.");
            } else {
                for movie in &movies {
                    println!("{}", format_movie_line(movie));
                }
            }
        }
        MovieCommands::Watched { id } => set_status(&id, WatchStatus::Watched, session).await?,
        MovieCommands::Unwatch { id } => set_status(&id, WatchStatus::Watchlist, session).await?,
        MovieCommands::Delete { id } => {
            let id = resolve_id(&hub.state().await.movies, &id, "movie")?;
            let movie = hub.delete_movie(&id).await?;
            println!("{}", movie.id);
        }
    }
    Ok(())
}

async fn set_status(id: &str, status: WatchStatus, session: &Session) -> Result<(), CliError> {
    let hub = &session.hub;
    let id = resolve_id(&hub.state().await.movies, id, "movie")?;
    let movie = hub.set_movie_status(&id, status).await?;
    println!("{}  -> {}", short_id(&movie.id), movie.status);
    Ok(())
}
