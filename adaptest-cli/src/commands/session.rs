//! Session management commands

use adaptest_core::{SelectionStrategy, Session, StudentId, TaskId};
use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use comfy_table::Table;

use super::{Overrides, open_service, parse_session_id};

/// Session management arguments
#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

/// Session subcommands
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Create a session over an ordered task list
    Create {
        /// Examinee identifier
        #[arg(long)]
        student: String,

        /// Comma-separated task IDs, in administration order
        #[arg(long, value_delimiter = ',', required = true)]
        tasks: Vec<String>,

        /// Selection strategy: fixed, irt, or bayesian-network
        #[arg(long)]
        strategy: Option<String>,
    },
    /// Show a session
    Show {
        /// Session ID
        session_id: String,

        /// Print the stored JSON document
        #[arg(long)]
        json: bool,
    },
    /// List stored sessions
    List,
    /// Finish a session and lock its responses
    Finish {
        /// Session ID
        session_id: String,
    },
}

/// Run session command
pub async fn run(args: SessionArgs, overrides: Overrides) -> Result<()> {
    match args.command {
        SessionCommands::Create {
            student,
            tasks,
            strategy,
        } => create(student, tasks, strategy, &overrides).await,
        SessionCommands::Show { session_id, json } => show(&session_id, json, &overrides).await,
        SessionCommands::List => list(&overrides).await,
        SessionCommands::Finish { session_id } => finish(&session_id, &overrides).await,
    }
}

fn parse_strategy(s: &str) -> Result<SelectionStrategy> {
    SelectionStrategy::parse(s).ok_or_else(|| {
        anyhow!("Unknown strategy '{s}' (expected fixed, irt, or bayesian-network)")
    })
}

async fn create(
    student: String,
    tasks: Vec<String>,
    strategy: Option<String>,
    overrides: &Overrides,
) -> Result<()> {
    let strategy = strategy.as_deref().map(parse_strategy).transpose()?;
    let service = open_service(overrides).await?;
    let session = service
        .create_session(
            StudentId::new(student),
            tasks.into_iter().map(TaskId::new).collect(),
            strategy,
        )
        .await?;
    println!("{}", session.id);
    Ok(())
}

async fn show(session_id: &str, json: bool, overrides: &Overrides) -> Result<()> {
    let id = parse_session_id(session_id)?;
    let service = open_service(overrides).await?;
    let session = service.get_session(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print_session(&session);
    }
    Ok(())
}

fn print_session(session: &Session) {
    let progress = session.progress();
    println!("Session:   {}", session.id);
    println!("Student:   {}", session.student_id);
    println!("Strategy:  {}", session.selection_strategy);
    println!(
        "Progress:  {}/{} answered{}",
        progress.answered,
        progress.total,
        if progress.is_completed { " (completed)" } else { "" }
    );
    match session.student_model.irt_theta {
        Some(theta) => println!("Theta:     {theta:.4}"),
        None => println!("Theta:     (no evidence)"),
    }

    if session.responses.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["#", "Task", "Score", "Observation", "Recorded"]);
    for (i, response) in session.responses.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            response.task_id.to_string(),
            response
                .scored_value
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".into()),
            response
                .observation_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".into()),
            response.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    println!("{table}");
}

async fn list(overrides: &Overrides) -> Result<()> {
    let service = open_service(overrides).await?;
    let ids = service.list_sessions().await?;
    if ids.is_empty() {
        println!("No sessions");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Session", "Student", "Strategy", "Answered", "Status"]);
    for id in ids {
        let session = service.get_session(id).await?;
        let progress = session.progress();
        table.add_row(vec![
            id.to_string(),
            session.student_id.to_string(),
            session.selection_strategy.to_string(),
            format!("{}/{}", progress.answered, progress.total),
            if progress.is_completed { "completed" } else { "active" }.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn finish(session_id: &str, overrides: &Overrides) -> Result<()> {
    let id = parse_session_id(session_id)?;
    let service = open_service(overrides).await?;
    let session = service.finish_session(id).await?;
    println!(
        "Finished session {} with {} responses",
        session.id,
        session.responses.len()
    );
    Ok(())
}
