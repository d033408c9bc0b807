//! Submission handlers.
//!
//! [`on_submit`] takes the session lock twice: once to start the submission
//! and once to apply the backend's answer. The lock is released while the
//! backend request is out, so other sessions stay usable and the same
//! session can be reset.

use std::sync::RwLock;

use serde_json::Value;

use crate::backend::{BackendApi, SubmissionError, SubmissionReceipt};
use crate::error::AppError;
use crate::state::AppState;
use crate::wizard::{assemble, SubmissionTicket, SubmitOutcome};

use super::{parse_session_id, read_sessions, with_session, write_sessions, Sessions};

// ── on_submit ────────────────────────────────────────────────────────────────

pub(crate) fn begin_submission_inner(
    id: &str,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SubmissionTicket, AppError> {
    with_session(id, sessions_lock, |session| Ok(session.begin_submission()?))
}

/// Apply `result` to the session the ticket was issued for. A session that
/// was disposed in the meantime makes the answer stale.
pub(crate) fn complete_submission_inner(
    ticket: &SubmissionTicket,
    result: Result<SubmissionReceipt, SubmissionError>,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SubmitOutcome, AppError> {
    let mut sessions = write_sessions(sessions_lock)?;
    match sessions.get_mut(&ticket.session_id()) {
        Some(session) => Ok(session.complete_submission(ticket, result)?),
        None => {
            tracing::warn!(session = %ticket.session_id(), "discarding response for disposed session");
            Ok(SubmitOutcome::Discarded)
        }
    }
}

/// Testable inner logic for [`on_submit`].
pub(crate) async fn on_submit_inner<B: BackendApi>(
    id: &str,
    sessions_lock: &RwLock<Sessions>,
    backend: &B,
) -> Result<SubmitOutcome, AppError> {
    let ticket = begin_submission_inner(id, sessions_lock)?;
    let result = backend.submit_entry(ticket.payload()).await;
    complete_submission_inner(&ticket, result, sessions_lock)
}

// ── preview_payload ──────────────────────────────────────────────────────────

/// The body that would be sent for the session's current record. Does not
/// change the session.
pub(crate) fn preview_payload_inner(
    id: &str,
    sessions_lock: &RwLock<Sessions>,
) -> Result<Value, AppError> {
    let uuid = parse_session_id(id)?;
    let sessions = read_sessions(sessions_lock)?;
    let session = sessions
        .get(&uuid)
        .ok_or_else(|| AppError::SessionNotFound(format!("session {id} not found")))?;
    let payload = assemble(session.kind(), session.record())?;
    payload.to_value().map_err(|e| AppError::Io(e.to_string()))
}

// ── Command wrappers ─────────────────────────────────────────────────────────

/// Submit the session's record through `backend`.
///
/// Returns [`SubmitOutcome::Discarded`] when the session was reset or
/// disposed before the backend answered.
pub async fn on_submit<B: BackendApi>(
    id: &str,
    state: &AppState,
    backend: &B,
) -> Result<SubmitOutcome, AppError> {
    on_submit_inner(id, &state.sessions, backend).await
}

pub fn preview_payload(id: &str, state: &AppState) -> Result<Value, AppError> {
    preview_payload_inner(id, &state.sessions)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fields::merge_fields;
    use crate::commands::navigation::on_next;
    use crate::commands::session::{create_session, dispose_session, get_session, reset_session};
    use crate::wizard::{SubmissionPayload, WizardKind, WizardStatus};
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers with a fixed result and records every fingerprint it saw.
    struct FakeBackend {
        result: Result<SubmissionReceipt, SubmissionError>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn answering(result: Result<SubmissionReceipt, SubmissionError>) -> Self {
            Self {
                result,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl BackendApi for FakeBackend {
        async fn submit_entry(
            &self,
            payload: &SubmissionPayload,
        ) -> Result<SubmissionReceipt, SubmissionError> {
            self.seen
                .lock()
                .expect("seen lock")
                .push(payload.fingerprint().to_string());
            self.result.clone()
        }
    }

    fn ready_diary(state: &AppState) -> String {
        let snap = create_session(WizardKind::DailyDiary, None, state).expect("create");
        merge_fields(
            &snap.id,
            json!({
                "userId": "u-1", "projectId": "p-1", "selectedDate": "2026-10-19",
                "contractNumber": "C-1", "reportNumber": "2", "contractor": "Acme",
                "ownerContact": "Sam", "ownerProjectManager": "Pat",
                "description": "Piling", "selectedLogoId": "logo-1"
            })
            .as_object()
            .expect("object"),
            state,
        )
        .expect("merge");
        on_next(&snap.id, state).expect("1 -> 2");
        on_next(&snap.id, state).expect("2 -> 3");
        snap.id
    }

    #[tokio::test]
    async fn successful_submit_marks_session_submitted() {
        let state = AppState::default();
        let id = ready_diary(&state);
        let backend = FakeBackend::answering(Ok(SubmissionReceipt {
            id: Some("srv-1".to_string()),
            message: Some("ok".to_string()),
        }));

        let outcome = on_submit(&id, &state, &backend).await.expect("submit");
        assert!(matches!(outcome, SubmitOutcome::Submitted { .. }));
        let snap = get_session(&id, &state).expect("get");
        assert_eq!(snap.status, WizardStatus::Submitted);
        assert_eq!(
            snap.receipt.and_then(|r| r.id).as_deref(),
            Some("srv-1")
        );
    }

    #[tokio::test]
    async fn failed_submit_keeps_record_and_retry_sends_same_payload() {
        let state = AppState::default();
        let id = ready_diary(&state);
        let failing = FakeBackend::answering(Err(SubmissionError::Network(
            "timed out".to_string(),
        )));

        let err = on_submit(&id, &state, &failing).await.expect_err("fails");
        assert!(matches!(err, AppError::Submission(_)));
        let snap = get_session(&id, &state).expect("get");
        assert_eq!(snap.status, WizardStatus::ReadyForReview);
        assert_eq!(snap.record.description, "Piling");
        assert!(snap.last_failure.is_some());

        let ok = FakeBackend::answering(Ok(SubmissionReceipt::default()));
        on_submit(&id, &state, &ok).await.expect("retry");
        let first = failing.seen.lock().expect("seen").clone();
        let second = ok.seen.lock().expect("seen").clone();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn submit_before_review_is_rejected() {
        let state = AppState::default();
        let snap = create_session(WizardKind::DailyDiary, None, &state).expect("create");
        let backend = FakeBackend::answering(Ok(SubmissionReceipt::default()));
        let err = on_submit(&snap.id, &state, &backend).await.expect_err("empty");
        assert!(matches!(err, AppError::IncompleteRecord(_)));
        assert!(backend.seen.lock().expect("seen").is_empty());
    }

    #[test]
    fn second_begin_while_in_flight_is_rejected() {
        let state = AppState::default();
        let id = ready_diary(&state);
        let _ticket = begin_submission_inner(&id, &state.sessions).expect("first");
        let err = begin_submission_inner(&id, &state.sessions).expect_err("second");
        assert!(matches!(err, AppError::SubmissionInFlight));
    }

    #[test]
    fn response_after_reset_is_discarded() {
        let state = AppState::default();
        let id = ready_diary(&state);
        let ticket = begin_submission_inner(&id, &state.sessions).expect("begin");
        reset_session(&id, &state).expect("reset");
        let outcome = complete_submission_inner(
            &ticket,
            Ok(SubmissionReceipt::default()),
            &state.sessions,
        )
        .expect("complete");
        assert_eq!(outcome, SubmitOutcome::Discarded);
        assert_eq!(
            get_session(&id, &state).expect("get").status,
            WizardStatus::Empty
        );
    }

    #[test]
    fn response_after_dispose_is_discarded() {
        let state = AppState::default();
        let id = ready_diary(&state);
        let ticket = begin_submission_inner(&id, &state.sessions).expect("begin");
        dispose_session(&id, &state).expect("dispose");
        let outcome = complete_submission_inner(
            &ticket,
            Ok(SubmissionReceipt::default()),
            &state.sessions,
        )
        .expect("complete");
        assert_eq!(outcome, SubmitOutcome::Discarded);
    }

    #[test]
    fn preview_shows_body_without_changing_status() {
        let state = AppState::default();
        let id = ready_diary(&state);
        let body = preview_payload(&id, &state).expect("preview");
        assert_eq!(body["reportNumber"], "2");
        assert_eq!(
            get_session(&id, &state).expect("get").status,
            WizardStatus::ReadyForReview
        );
    }
}
