//! Step navigation handlers.

use std::sync::RwLock;

use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;
use crate::wizard::{Advance, StepDefinition, StepTable, WizardKind};

use super::{with_session, SessionSnapshot, Sessions};

/// Result of a navigation command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResult<T> {
    pub result: T,
    pub session: SessionSnapshot,
}

// ── on_next ──────────────────────────────────────────────────────────────────

/// Testable inner logic for [`on_next`].
///
/// Fails with [`AppError::MissingRequiredFields`] naming what the current
/// step still needs. On the review step the result is
/// [`Advance::SubmissionTrigger`] and the caller should submit.
pub(crate) fn on_next_inner(
    id: &str,
    sessions_lock: &RwLock<Sessions>,
) -> Result<NavigationResult<Advance>, AppError> {
    with_session(id, sessions_lock, |session| {
        let result = session.next()?;
        Ok(NavigationResult {
            result,
            session: SessionSnapshot::from(&*session),
        })
    })
}

// ── on_previous ──────────────────────────────────────────────────────────────

pub(crate) fn on_previous_inner(
    id: &str,
    sessions_lock: &RwLock<Sessions>,
) -> Result<NavigationResult<Option<usize>>, AppError> {
    with_session(id, sessions_lock, |session| {
        let result = session.previous()?;
        Ok(NavigationResult {
            result,
            session: SessionSnapshot::from(&*session),
        })
    })
}

// ── jump_to_step ─────────────────────────────────────────────────────────────

/// `result` is `false` when the jump crossed a step not yet visited.
pub(crate) fn jump_to_step_inner(
    id: &str,
    step: usize,
    sessions_lock: &RwLock<Sessions>,
) -> Result<NavigationResult<bool>, AppError> {
    with_session(id, sessions_lock, |session| {
        let result = session.jump_to(step)?;
        Ok(NavigationResult {
            result,
            session: SessionSnapshot::from(&*session),
        })
    })
}

// ── Command wrappers ─────────────────────────────────────────────────────────

pub fn on_next(id: &str, state: &AppState) -> Result<NavigationResult<Advance>, AppError> {
    on_next_inner(id, &state.sessions)
}

pub fn on_previous(
    id: &str,
    state: &AppState,
) -> Result<NavigationResult<Option<usize>>, AppError> {
    on_previous_inner(id, &state.sessions)
}

/// Step indicator tap.
pub fn jump_to_step(
    id: &str,
    step: usize,
    state: &AppState,
) -> Result<NavigationResult<bool>, AppError> {
    jump_to_step_inner(id, step, &state.sessions)
}

/// The step table for a wizard kind, for drawing the step indicator.
pub fn list_steps(kind: WizardKind) -> Vec<StepDefinition> {
    StepTable::for_kind(kind).steps().to_vec()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fields::merge_fields;
    use crate::commands::session::create_session;
    use serde_json::json;

    #[test]
    fn next_on_incomplete_step_names_missing_fields() {
        let state = AppState::default();
        let snap = create_session(WizardKind::DailyEntry, None, &state).expect("create");
        let err = on_next(&snap.id, &state).expect_err("incomplete");
        let AppError::MissingRequiredFields(message) = err else {
            panic!("expected MissingRequiredFields, got {err:?}");
        };
        assert!(message.contains("step 1"));
        assert!(message.contains("projectId"));
        assert!(message.contains("location"));
    }

    #[test]
    fn next_then_previous_round_trip() {
        let state = AppState::default();
        let snap = create_session(WizardKind::DailyEntry, None, &state).expect("create");
        merge_fields(
            &snap.id,
            json!({
                "userId": "u", "projectId": "p",
                "selectedDate": "2026-10-19", "location": "Yard"
            })
            .as_object()
            .expect("object"),
            &state,
        )
        .expect("merge");

        let next = on_next(&snap.id, &state).expect("next");
        assert_eq!(next.result, Advance::NextStep(2));
        assert_eq!(next.session.current_step, 2);

        let back = on_previous(&snap.id, &state).expect("previous");
        assert_eq!(back.result, Some(1));
        assert_eq!(back.session.record, next.session.record);

        let first = on_previous(&snap.id, &state).expect("previous on first");
        assert_eq!(first.result, None);
    }

    #[test]
    fn jump_to_unvisited_step_is_rejected() {
        let state = AppState::default();
        let snap = create_session(WizardKind::DailyDiary, None, &state).expect("create");
        let jump = jump_to_step(&snap.id, 3, &state).expect("jump");
        assert!(!jump.result);
        assert_eq!(jump.session.current_step, 1);
    }

    #[test]
    fn list_steps_matches_kind() {
        assert_eq!(list_steps(WizardKind::DailyEntry).len(), 6);
        let diary = list_steps(WizardKind::DailyDiary);
        assert_eq!(
            diary.iter().map(|s| s.name).collect::<Vec<_>>(),
            vec!["projectDetails", "description", "review"]
        );
    }

    #[test]
    fn advance_serializes_with_type_tag() {
        let value = serde_json::to_value(Advance::NextStep(2)).expect("serialize");
        assert_eq!(value, json!({ "type": "nextStep", "step": 2 }));
        let value = serde_json::to_value(Advance::SubmissionTrigger).expect("serialize");
        assert_eq!(value, json!({ "type": "submissionTrigger" }));
    }
}
