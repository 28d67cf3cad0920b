use microhub_core::models::TaskStatus;

use crate::cli::{PriorityArg, StatusArg, TaskCommands};
use crate::commands::common::{format_task_line, required_words, resolve_id, short_id};
use crate::error::CliError;
use crate::session::Hub;

pub async fn run_task(command: TaskCommands, hub: &Hub) -> Result<(), CliError> {
    match command {
        TaskCommands::Add {
            title,
            description,
            priority,
        } => run_add(&title, &description, priority, hub).await,
        TaskCommands::List { status, json } => run_list(status, json, hub).await,
        TaskCommands::Move { id, status } => run_move(&id, status, hub).await,
        TaskCommands::Delete { id } => run_delete(&id, hub).await,
    }
}

async fn run_add(
    title: &[String],
    description: &str,
    priority: PriorityArg,
    hub: &Hub,
) -> Result<(), CliError> {
    let title = required_words(title, "Task title")?;
    let task = hub.add_task(&title, description, priority.into()).await?;
    println!("{}", task.id);
    Ok(())
}

async fn run_list(status: Option<StatusArg>, as_json: bool, hub: &Hub) -> Result<(), CliError> {
    let wanted = status.map(TaskStatus::from);
    let tasks = hub
        .tasks()
        .await
        .into_iter()
        .filter(|task| wanted.is_none_or(|status| task.status == status))
        .collect::<Vec<_>>();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else if tasks.is_empty() {
        println!("No tasks.");
    } else {
        for task in &tasks {
            println!("{}", format_task_line(task));
        }
    }
    Ok(())
}

async fn run_move(id: &str, status: StatusArg, hub: &Hub) -> Result<(), CliError> {
    let id = resolve_id(&hub.state().await.tasks, id, "task")?;
    let task = hub.move_task(&id, status.into()).await?;
    println!("{}  -> {}", short_id(&task.id), task.status);
    Ok(())
}

async fn run_delete(id: &str, hub: &Hub) -> Result<(), CliError> {
    let id = resolve_id(&hub.state().await.tasks, id, "task")?;
    let task = hub.delete_task(&id).await?;
    println!("{}", task.id);
    Ok(())
}
