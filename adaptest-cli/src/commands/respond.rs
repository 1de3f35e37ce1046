//! Response submission command

use adaptest_core::{EvidenceId, ObservationId, QuestionId, ResponseInput};
use anyhow::Result;
use clap::Args;

use super::{Overrides, open_service, parse_session_id};

/// Response arguments
#[derive(Args, Debug)]
pub struct RespondArgs {
    /// Session ID
    pub session_id: String,

    /// Task being answered
    #[arg(long)]
    pub task: String,

    /// Question answered within the task
    #[arg(long)]
    pub question: Option<String>,

    /// Observation the response provides evidence for
    #[arg(long)]
    pub observation: Option<String>,

    /// Evidence rule applied
    #[arg(long)]
    pub evidence: Option<String>,

    /// Rubric level awarded
    #[arg(long)]
    pub rubric_level: Option<String>,

    /// Scored value (1 correct, 0 incorrect)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub score: Option<u8>,

    /// Raw answer as JSON (plain text is stored as a string)
    #[arg(long)]
    pub answer: Option<String>,
}

impl RespondArgs {
    fn into_input(self) -> ResponseInput {
        let mut input = ResponseInput::new(self.task);
        input.question_id = self.question.map(QuestionId::new);
        input.observation_id = self.observation.map(ObservationId::new);
        input.evidence_id = self.evidence.map(EvidenceId::new);
        input.rubric_level = self.rubric_level;
        input.scored_value = self.score;
        if let Some(answer) = self.answer {
            input.raw_answer = parse_answer(answer);
        }
        input
    }
}

fn parse_answer(answer: String) -> serde_json::Value {
    serde_json::from_str(&answer).unwrap_or(serde_json::Value::String(answer))
}

/// Run respond command
pub async fn run(args: RespondArgs, overrides: Overrides) -> Result<()> {
    let id = parse_session_id(&args.session_id)?;
    let service = open_service(&overrides).await?;

    let session = service.submit_response(id, args.into_input()).await?;
    let progress = session.progress();
    println!(
        "Recorded response {}/{}",
        progress.answered, progress.total
    );
    if let Some(theta) = session.student_model.irt_theta {
        println!("Theta: {theta:.4}");
    }
    Ok(())
}
