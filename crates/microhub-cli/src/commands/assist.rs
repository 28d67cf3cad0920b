use microhub_core::services::{
    GeminiClient, ImageGenerator, PlaceholderImageGenerator, TextGenerator,
};

use crate::commands::common::required_words;
use crate::error::CliError;
use crate::session::Session;

pub async fn run_ask(prompt: &[String], session: &Session) -> Result<(), CliError> {
    session.require_online()?;
    let prompt = required_words(prompt, "Prompt")?;
    let client = GeminiClient::from_config(&session.config)?;
    let answer = client.generate_text(&prompt).await?;
    println!("{answer}");
    Ok(())
}

pub async fn run_image(prompt: &[String]) -> Result<(), CliError> {
    let prompt = required_words(prompt, "Prompt")?;
    let url = PlaceholderImageGenerator.generate_image(&prompt).await?;
    println!("{url}");
    Ok(())
}
