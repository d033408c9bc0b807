//! Session lifecycle and user/project context handlers.

use std::sync::RwLock;

use serde::Serialize;

use crate::backend::SubmissionReceipt;
use crate::error::AppError;
use crate::models::WizardRecord;
use crate::registry::FieldMode;
use crate::state::{AppState, ProjectSelection, UserContext};
use crate::wizard::{WizardKind, WizardSession, WizardStatus};

use super::{
    parse_session_id, read_context, read_sessions, with_session, write_context, write_sessions,
    Sessions,
};

// ── Output type ──────────────────────────────────────────────────────────────

/// Everything a screen needs to render a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub kind: WizardKind,
    pub status: WizardStatus,
    pub current_step: usize,
    pub visited_steps: Vec<usize>,
    pub record: WizardRecord,
    pub revision: u64,
    pub submission_in_flight: bool,
    pub last_failure: Option<String>,
    pub receipt: Option<SubmissionReceipt>,
    pub created_at: String,
}

impl From<&WizardSession> for SessionSnapshot {
    fn from(s: &WizardSession) -> Self {
        Self {
            id: s.id().to_string(),
            kind: s.kind(),
            status: s.status(),
            current_step: s.current_step(),
            visited_steps: s.sequencer().visited().iter().copied().collect(),
            record: s.store().snapshot(),
            revision: s.store().revision(),
            submission_in_flight: s.submission_in_flight(),
            last_failure: s.last_failure().map(str::to_string),
            receipt: s.receipt().cloned(),
            created_at: s.created_at().to_string(),
        }
    }
}

// ── create_session ───────────────────────────────────────────────────────────

/// Testable inner logic for [`create_session`].
///
/// With no `seed` the record starts from the user/project context.
pub(crate) fn create_session_inner(
    kind: WizardKind,
    seed: Option<WizardRecord>,
    mode: FieldMode,
    sessions_lock: &RwLock<Sessions>,
    context_lock: &RwLock<UserContext>,
) -> Result<SessionSnapshot, AppError> {
    let seed = match seed {
        Some(record) => record,
        None => read_context(context_lock)?.seed_record(),
    };
    let session = WizardSession::seeded(kind, mode, seed);
    let snapshot = SessionSnapshot::from(&session);
    tracing::info!(session = %session.id(), %kind, "session created");
    write_sessions(sessions_lock)?.insert(session.id(), session);
    Ok(snapshot)
}

// ── get_session ──────────────────────────────────────────────────────────────

pub(crate) fn get_session_inner(
    id: &str,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SessionSnapshot, AppError> {
    let uuid = parse_session_id(id)?;
    let sessions = read_sessions(sessions_lock)?;
    sessions
        .get(&uuid)
        .map(SessionSnapshot::from)
        .ok_or_else(|| AppError::SessionNotFound(format!("session {id} not found")))
}

// ── dispose_session ──────────────────────────────────────────────────────────

/// Close a session. Its in-flight submission, if any, will be discarded
/// when it returns.
pub(crate) fn dispose_session_inner(
    id: &str,
    sessions_lock: &RwLock<Sessions>,
) -> Result<(), AppError> {
    let uuid = parse_session_id(id)?;
    let removed = write_sessions(sessions_lock)?.remove(&uuid);
    match removed {
        Some(_) => {
            tracing::info!(session = %uuid, "session disposed");
            Ok(())
        }
        None => Err(AppError::SessionNotFound(format!("session {id} not found"))),
    }
}

// ── reset_session ────────────────────────────────────────────────────────────

pub(crate) fn reset_session_inner(
    id: &str,
    sessions_lock: &RwLock<Sessions>,
) -> Result<SessionSnapshot, AppError> {
    with_session(id, sessions_lock, |session| {
        session.reset();
        Ok(SessionSnapshot::from(&*session))
    })
}

// ── user / project context ───────────────────────────────────────────────────

pub(crate) fn set_user_inner(
    user_id: &str,
    context_lock: &RwLock<UserContext>,
) -> Result<UserContext, AppError> {
    let mut ctx = write_context(context_lock)?;
    ctx.user_id = (!user_id.is_empty()).then(|| user_id.to_string());
    Ok(ctx.clone())
}

pub(crate) fn select_project_inner(
    project: ProjectSelection,
    context_lock: &RwLock<UserContext>,
) -> Result<UserContext, AppError> {
    if project.project_id.is_empty() {
        return Err(AppError::InvalidField(
            "projectId must not be empty".to_string(),
        ));
    }
    let mut ctx = write_context(context_lock)?;
    tracing::info!(project = %project.project_id, "project selected");
    ctx.select_project(project);
    Ok(ctx.clone())
}

pub(crate) fn get_context_inner(
    context_lock: &RwLock<UserContext>,
) -> Result<UserContext, AppError> {
    Ok(read_context(context_lock)?.clone())
}

// ── Command wrappers ─────────────────────────────────────────────────────────

/// Open a new wizard session. `seed` replaces the context-derived initial
/// record, e.g. when editing a saved entry.
pub fn create_session(
    kind: WizardKind,
    seed: Option<WizardRecord>,
    state: &AppState,
) -> Result<SessionSnapshot, AppError> {
    create_session_inner(
        kind,
        seed,
        state.config.wizard.field_mode,
        &state.sessions,
        &state.context,
    )
}

pub fn get_session(id: &str, state: &AppState) -> Result<SessionSnapshot, AppError> {
    get_session_inner(id, &state.sessions)
}

pub fn dispose_session(id: &str, state: &AppState) -> Result<(), AppError> {
    dispose_session_inner(id, &state.sessions)
}

/// Discard the record and return to the first step.
pub fn reset_session(id: &str, state: &AppState) -> Result<SessionSnapshot, AppError> {
    reset_session_inner(id, &state.sessions)
}

pub fn set_user(user_id: &str, state: &AppState) -> Result<UserContext, AppError> {
    set_user_inner(user_id, &state.context)
}

pub fn select_project(
    project: ProjectSelection,
    state: &AppState,
) -> Result<UserContext, AppError> {
    select_project_inner(project, &state.context)
}

pub fn get_context(state: &AppState) -> Result<UserContext, AppError> {
    get_context_inner(&state.context)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn new_session_is_seeded_from_context() {
        let state = AppState::default();
        set_user("u-5", &state).expect("set user");
        select_project(
            ProjectSelection {
                project_id: "p-2".to_string(),
                project_name: "Quay Wall".to_string(),
                project_number: "QW-7".to_string(),
                owner: "Port Authority".to_string(),
            },
            &state,
        )
        .expect("select project");

        let snap = create_session(WizardKind::DailyEntry, None, &state).expect("create");
        assert_eq!(snap.record.user_id, "u-5");
        assert_eq!(snap.record.project_id, "p-2");
        assert_eq!(snap.record.owner, "Port Authority");
        assert_eq!(snap.status, WizardStatus::InProgress);
        assert_eq!(snap.current_step, 1);
    }

    #[test]
    fn session_without_context_starts_empty() {
        let state = AppState::default();
        let snap = create_session(WizardKind::DailyDiary, None, &state).expect("create");
        assert_eq!(snap.status, WizardStatus::Empty);
        assert_eq!(snap.record, WizardRecord::default());
        assert_eq!(snap.visited_steps, vec![1]);
    }

    #[test]
    fn later_context_changes_do_not_reach_open_sessions() {
        let state = AppState::default();
        set_user("first", &state).expect("set user");
        let snap = create_session(WizardKind::DailyDiary, None, &state).expect("create");
        set_user("second", &state).expect("change user");
        let again = get_session(&snap.id, &state).expect("get");
        assert_eq!(again.record.user_id, "first");
    }

    #[test]
    fn explicit_seed_wins_over_context() {
        let state = AppState::default();
        set_user("ctx-user", &state).expect("set user");
        let seed = WizardRecord {
            user_id: "saved-user".to_string(),
            description: "Saved draft".to_string(),
            ..WizardRecord::default()
        };
        let snap = create_session(WizardKind::DailyDiary, Some(seed), &state).expect("create");
        assert_eq!(snap.record.user_id, "saved-user");
        assert_eq!(snap.record.description, "Saved draft");
    }

    #[test]
    fn dispose_removes_session() {
        let state = AppState::default();
        let snap = create_session(WizardKind::DailyEntry, None, &state).expect("create");
        dispose_session(&snap.id, &state).expect("dispose");
        assert!(matches!(
            get_session(&snap.id, &state),
            Err(AppError::SessionNotFound(_))
        ));
        assert!(matches!(
            dispose_session(&snap.id, &state),
            Err(AppError::SessionNotFound(_))
        ));
    }

    #[test]
    fn get_unknown_session_is_not_found() {
        let state = AppState::default();
        let result = get_session(&Uuid::new_v4().to_string(), &state);
        assert!(matches!(result, Err(AppError::SessionNotFound(_))));
    }

    #[test]
    fn select_project_rejects_empty_id() {
        let state = AppState::default();
        let result = select_project(ProjectSelection::default(), &state);
        assert!(matches!(result, Err(AppError::InvalidField(_))));
        assert!(get_context(&state)
            .expect("context")
            .recent_projects
            .is_empty());
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let state = AppState::default();
        let snap = create_session(WizardKind::DailyEntry, None, &state).expect("create");
        let value = serde_json::to_value(&snap).expect("serialize");
        assert_eq!(value["kind"], "dailyEntry");
        assert_eq!(value["status"], "empty");
        assert_eq!(value["currentStep"], 1);
        assert_eq!(value["submissionInFlight"], false);
    }
}
