//! Response recording.
//!
//! Validation runs to completion against the catalog before the session is
//! touched, so a rejected submission leaves the session exactly as it was.

use chrono::Utc;
use tracing::{debug, info};

use crate::catalog::{Catalog, EvidenceModel};
use crate::error::{AdaptestError, RecordKind, Result, ValidationError};
use crate::irt::IrtItem;
use crate::selector::SelectionStrategy;
use crate::session::{Response, ResponseInput, Session};

/// Validate `input` against `session` and the catalog, then append it.
///
/// On success the response is stamped with the server time, the position
/// advances by one (capped at the task count), and under the IRT strategy
/// theta takes one gradient step from the response's item. Node posteriors
/// are left untouched.
pub fn record_response<'s>(
    session: &'s mut Session,
    input: ResponseInput,
    catalog: &dyn Catalog,
) -> Result<&'s Response> {
    let item = validate(session, &input, catalog)?;

    let now = Utc::now();
    let correct = input.scored_value == Some(1);
    let task_id = input.task_id.clone();
    session.responses.push(input.into_response(now));
    session.current_task_index = (session.current_task_index + 1).min(session.task_ids.len());
    session.updated_at = now;

    if let Some(item) = item {
        let before = session.student_model.theta();
        let after = item.update(before, correct);
        session.student_model.set_theta(after);
        debug!(session_id = %session.id, task_id = %task_id, before, after, "Updated theta");
    }

    info!(
        session_id = %session.id,
        task_id = %task_id,
        responses = session.responses.len(),
        "Recorded response"
    );

    // Just pushed, so the sequence is non-empty
    let recorded = session.responses.len() - 1;
    Ok(&session.responses[recorded])
}

/// Check every precondition. Returns the item to update theta from, if any.
fn validate(
    session: &Session,
    input: &ResponseInput,
    catalog: &dyn Catalog,
) -> Result<Option<IrtItem>> {
    if session.is_completed {
        return Err(ValidationError::SessionCompleted(session.id).into());
    }
    if !session.contains_task(&input.task_id) {
        return Err(ValidationError::UnknownTask(input.task_id.clone()).into());
    }
    if let Some(score) = input.scored_value
        && score > 1
    {
        return Err(ValidationError::InvalidScore(score).into());
    }

    if input.observation_id.is_some() || input.evidence_id.is_some() {
        validate_evidence_refs(input, catalog)?;
    }

    let Some(question_id) = &input.question_id else {
        return Ok(None);
    };
    let question = catalog
        .question(question_id)
        .ok_or_else(|| AdaptestError::not_found(RecordKind::Question, question_id))?;

    if session.selection_strategy != SelectionStrategy::Irt {
        return Ok(None);
    }
    let item = IrtItem::from_parameters(&question.metadata);
    if item.is_none() {
        debug!(question_id = %question_id, "Item has no numeric difficulty, theta unchanged");
    }
    Ok(item)
}

fn validate_evidence_refs(input: &ResponseInput, catalog: &dyn Catalog) -> Result<()> {
    let task = catalog
        .task(&input.task_id)
        .ok_or_else(|| AdaptestError::not_found(RecordKind::Task, &input.task_id))?;
    let task_model = catalog
        .task_model(&task.task_model_id)
        .ok_or_else(|| AdaptestError::not_found(RecordKind::TaskModel, &task.task_model_id))?;
    let evidence_models: Vec<&EvidenceModel> = catalog.evidence_models_for(task_model);

    if let Some(observation_id) = &input.observation_id {
        let observation = evidence_models
            .iter()
            .find_map(|em| em.observation(observation_id))
            .ok_or_else(|| ValidationError::UnknownObservation {
                task_id: input.task_id.clone(),
                observation_id: observation_id.clone(),
            })?;

        if let Some(level) = &input.rubric_level {
            let declared = observation
                .rubric
                .as_ref()
                .is_some_and(|rubric| rubric.has_level(level));
            if !declared {
                return Err(ValidationError::UnknownRubricLevel {
                    observation_id: observation_id.clone(),
                    level: level.clone(),
                }
                .into());
            }
        }
    }

    if let Some(evidence_id) = &input.evidence_id
        && !evidence_models.iter().any(|em| em.has_evidence(evidence_id))
    {
        return Err(ValidationError::UnknownEvidence {
            task_id: input.task_id.clone(),
            evidence_id: evidence_id.clone(),
        }
        .into());
    }

    Ok(())
}
