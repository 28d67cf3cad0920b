//! microhub - command-line front end for the MicroHub apps

mod cli;
mod commands;
mod error;
mod session;


use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::assist::{run_ask, run_image};
use crate::commands::completions::run_completions;
use crate::commands::connect::{run_connect, run_disconnect, run_pull};
use crate::commands::journal::run_journal;
use crate::commands::movie::run_movie;
use crate::commands::profile::{run_route, run_theme, run_user};
use crate::commands::status::run_status;
use crate::commands::task::run_task;
use crate::commands::timer::{run_stopwatch, run_timer};
use crate::error::CliError;
use crate::session::Session;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "microhub=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help().map_err(CliError::Io)?;
        println!();
        return Ok(());
    };

    // Commands that never touch hub state.
    match command {
        Commands::Completions { shell, output } => return run_completions(shell, output.as_deref()),
        Commands::Image { prompt } => return run_image(&prompt).await,
        Commands::Timer { minutes } => return run_timer(minutes).await,
        Commands::Stopwatch => return run_stopwatch().await,
        _ => {}
    }

    let session = Session::open(cli.data_dir.as_deref(), cli.offline).await?;
    if needs_reconcile(&command) {
        session.reconcile().await;
    }
    let result = dispatch(command, &session).await;
    let closed = session.close().await;
    result?;
    closed
}

/// Commands that read or change synced data start from the remote snapshot.
const fn needs_reconcile(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Status { .. }
            | Commands::Task(_)
            | Commands::Journal(_)
            | Commands::Movie(_)
            | Commands::User(_)
    )
}

async fn dispatch(command: Commands, session: &Session) -> Result<(), CliError> {
    let hub = &session.hub;
    match command {
        Commands::Status { json } => run_status(json, session).await,
        Commands::Connect(args) => run_connect(args, session).await,
        Commands::Disconnect => run_disconnect(session).await,
        Commands::Pull => run_pull(session).await,
        Commands::Task(command) => run_task(command, hub).await,
        Commands::Journal(command) => run_journal(command, hub).await,
        Commands::Movie(command) => run_movie(command, session).await,
        Commands::User(command) => run_user(command, hub).await,
        Commands::Theme { primary, secondary } => run_theme(&primary, &secondary, hub).await,
        Commands::Route { route } => run_route(&route, hub).await,
        Commands::Ask { prompt } => run_ask(&prompt, session).await,
        Commands::Image { prompt } => run_image(&prompt).await,
        Commands::Timer { minutes } => run_timer(minutes).await,
        Commands::Stopwatch => run_stopwatch().await,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}
