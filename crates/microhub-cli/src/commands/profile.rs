use microhub_core::models::{Route, Theme};

use crate::cli::UserCommands;
use crate::commands::common::required_words;
use crate::error::CliError;
use crate::session::Hub;

pub async fn run_user(command: UserCommands, hub: &Hub) -> Result<(), CliError> {
    match command {
        UserCommands::SetName { name } => {
            let name = required_words(&name, "Name")?;
            hub.set_username(&name).await?;
            println!("Hello, {name}");
        }
    }
    Ok(())
}

pub async fn run_theme(primary: &str, secondary: &str, hub: &Hub) -> Result<(), CliError> {
    let theme = Theme::new(primary, secondary)?;
    hub.set_theme(theme.clone()).await?;
    println!("{} / {}", theme.primary, theme.secondary);
    Ok(())
}

pub async fn run_route(route: &str, hub: &Hub) -> Result<(), CliError> {
    let route = route.parse::<Route>()?;
    hub.set_route(route).await?;
    println!("{route}");
    Ok(())
}
