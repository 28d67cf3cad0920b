use crate::cli::JournalCommands;
use crate::commands::common::{format_journal_line, join_words, resolve_id};
use crate::error::CliError;
use crate::session::Hub;

pub async fn run_journal(command: JournalCommands, hub: &Hub) -> Result<(), CliError> {
    match command {
        JournalCommands::Add { title, content } => {
            let content = join_words(&content).unwrap_or_default();
            let entry = hub.add_journal_entry(&title, &content).await?;
            println!("{}", entry.id);
        }
        JournalCommands::List { tag, json } => run_list(tag.as_deref(), json, hub).await?,
        JournalCommands::Edit { id, title, content } => {
            let id = resolve_id(&hub.state().await.journal, &id, "journal entry")?;
            let content = join_words(&content).unwrap_or_default();
            let entry = hub.update_journal_entry(&id, &title, &content).await?;
            println!("{}", format_journal_line(&entry));
        }
        JournalCommands::Delete { id } => {
            let id = resolve_id(&hub.state().await.journal, &id, "journal entry")?;
            let entry = hub.delete_journal_entry(&id).await?;
            println!("{}", entry.id);
        }
    }
    Ok(())
}

async fn run_list(tag: Option<&str>, as_json: bool, hub: &Hub) -> Result<(), CliError> {
    let wanted = tag.map(|tag| tag.trim().trim_start_matches('#').to_uppercase());
    let entries = hub
        .journal()
        .await
        .into_iter()
        .filter(|entry| {
            wanted
                .as_ref()
                .is_none_or(|tag| entry.tags.iter().any(|candidate| candidate == tag))
        })
        .collect::<Vec<_>>();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No journal entries.");
    } else {
        for entry in &entries {
            println!("{}", format_journal_line(entry));
        }
    }
    Ok(())
}
