use chrono::{Local, Timelike};
use microhub_core::sync::{SyncReport, SyncedCollection};
use microhub_core::util::greeting_for_hour;
use microhub_core::HubState;
use serde::Serialize;

use crate::error::CliError;
use crate::session::Session;

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub greeting: String,
    pub open_tasks: usize,
    pub journal_entries: usize,
    pub watchlist: usize,
    pub route: String,
    pub store_id: Option<String>,
    pub endpoint_url: Option<String>,
    pub sync: Vec<CollectionStatus>,
    pub needs_reconnect: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CollectionStatus {
    pub collection: &'static str,
    pub state: &'static str,
}

pub async fn run_status(as_json: bool, session: &Session) -> Result<(), CliError> {
    let state = session.hub.state().await;
    let view = status_view(&state, &session.hub.report(), Local::now().hour());

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    for line in format_status_lines(&view) {
        println!("{line}");
    }
    Ok(())
}

pub fn status_view(state: &HubState, report: &SyncReport, hour: u32) -> StatusView {
    let connection = state.connection.as_ref();
    StatusView {
        greeting: format!("{}, {}", greeting_for_hour(hour), state.display_name()),
        open_tasks: state.open_task_count(),
        journal_entries: state.journal.len(),
        watchlist: state
            .movies
            .iter()
            .filter(|movie| movie.status == microhub_core::models::WatchStatus::Watchlist)
            .count(),
        route: state.route.to_string(),
        store_id: connection.map(|c| c.store_id().to_string()),
        endpoint_url: connection.map(|c| c.endpoint_url().to_string()),
        sync: SyncedCollection::ALL
            .into_iter()
            .map(|collection| CollectionStatus {
                collection: collection.label(),
                state: report.state(collection).label(),
            })
            .collect(),
        needs_reconnect: report.needs_reconnect,
        last_error: report.last_error.clone(),
    }
}

pub fn format_status_lines(view: &StatusView) -> Vec<String> {
    let mut lines = vec![
        view.greeting.clone(),
        format!(
            "{} open task(s), {} journal entr{}, {} on the watchlist",
            view.open_tasks,
            view.journal_entries,
            if view.journal_entries == 1 { "y" } else { "ies" },
            view.watchlist
        ),
    ];

    match (&view.store_id, &view.endpoint_url) {
        (Some(store_id), Some(endpoint_url)) => {
            lines.push(format!("Remote: {store_id} via {endpoint_url}"));
            let states = view
                .sync
                .iter()
                .map(|entry| format!("{}={}", entry.collection, entry.state))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(format!("Sync: {states}"));
        }
        _ => lines.push("Remote: not connected (local only)".to_string()),
    }
    if view.needs_reconnect {
        lines.push("The remote rejected the stored key; run `microhub connect` again.".to_string());
    }
    if let Some(error) = &view.last_error {
        lines.push(format!("Last sync error: {error}"));
    }
    lines
}
