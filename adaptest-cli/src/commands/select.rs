//! Next-task selection commands

use anyhow::Result;
use comfy_table::Table;

use super::{Overrides, open_service, parse_session_id};

/// Print the next task, or nothing when no candidate remains
pub async fn next(session_id: &str, overrides: Overrides) -> Result<()> {
    let id = parse_session_id(session_id)?;
    let service = open_service(&overrides).await?;

    match service.next_task(id).await? {
        Some(task_id) => println!("{task_id}"),
        None => eprintln!("No eligible task remains"),
    }
    Ok(())
}

/// Print every scored candidate in candidate order, marking the pick
pub async fn explain(session_id: &str, overrides: Overrides) -> Result<()> {
    let id = parse_session_id(session_id)?;
    let service = open_service(&overrides).await?;

    let session = service.get_session(id).await?;
    let candidates = service.explain(id).await?;
    let selected = service.next_task(id).await?;

    println!("Strategy: {}", session.selection_strategy);
    if candidates.is_empty() {
        println!("No scored candidates");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["", "Task", "Score"]);
    for candidate in &candidates {
        let marker = if selected.as_ref() == Some(&candidate.task_id) {
            "*"
        } else {
            ""
        };
        table.add_row(vec![
            marker.to_string(),
            candidate.task_id.to_string(),
            format!("{:.4}", candidate.score),
        ]);
    }
    println!("{table}");
    Ok(())
}
