//! Headless replay of screen events against one wizard session.
//!
//! A script names the wizard kind, optionally the user and project to seed
//! from, and a list of events as the screens would send them:
//!
//! ```json
//! {
//!   "kind": "dailyEntry",
//!   "userId": "u-1",
//!   "project": { "projectId": "p-1", "projectName": "Quay Wall" },
//!   "events": [
//!     { "event": "fieldChange", "name": "location", "value": "Pier 4" },
//!     { "event": "addItem", "entry": { "list": "equipments", "item": { "equipmentName": "Loader" } } },
//!     { "event": "next" },
//!     { "event": "submit" }
//!   ]
//! }
//! ```
//!
//! Every event's outcome is recorded; a failing event does not stop the run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::backend::{BackendApi, SubmissionError, SubmissionReceipt};
use crate::commands::{fields, navigation, session, submit, SessionSnapshot};
use crate::error::AppError;
use crate::models::{LabourRole, ListItem, WizardRecord};
use crate::registry::ListField;
use crate::state::{AppState, ProjectSelection};
use crate::wizard::{SubmissionPayload, WizardKind};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    pub kind: WizardKind,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectSelection>,
    /// Replaces the context-derived initial record.
    #[serde(default)]
    pub seed: Option<WizardRecord>,
    pub events: Vec<ReplayEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ReplayEvent {
    FieldChange { name: String, value: Value },
    Merge { fields: Map<String, Value> },
    AddItem { entry: ListItem },
    UpdateItem {
        list: ListField,
        index: usize,
        fields: Map<String, Value>,
    },
    RemoveItem { list: ListField, index: usize },
    AddRole { labour: usize, role: LabourRole },
    UpdateRole {
        labour: usize,
        role: usize,
        fields: Map<String, Value>,
    },
    RemoveRole { labour: usize, role: usize },
    Next,
    Previous,
    Jump { step: usize },
    Preview,
    Submit,
    Reset,
}

impl ReplayEvent {
    fn name(&self) -> &'static str {
        match self {
            ReplayEvent::FieldChange { .. } => "fieldChange",
            ReplayEvent::Merge { .. } => "merge",
            ReplayEvent::AddItem { .. } => "addItem",
            ReplayEvent::UpdateItem { .. } => "updateItem",
            ReplayEvent::RemoveItem { .. } => "removeItem",
            ReplayEvent::AddRole { .. } => "addRole",
            ReplayEvent::UpdateRole { .. } => "updateRole",
            ReplayEvent::RemoveRole { .. } => "removeRole",
            ReplayEvent::Next => "next",
            ReplayEvent::Previous => "previous",
            ReplayEvent::Jump { .. } => "jump",
            ReplayEvent::Preview => "preview",
            ReplayEvent::Submit => "submit",
            ReplayEvent::Reset => "reset",
        }
    }
}

/// Outcome of one event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReport {
    pub index: usize,
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AppError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub events: Vec<EventReport>,
    pub session: SessionSnapshot,
}

impl ReplayReport {
    pub fn failures(&self) -> usize {
        self.events.iter().filter(|e| e.error.is_some()).count()
    }
}

/// Accepts every payload without sending it anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunBackend;

impl BackendApi for DryRunBackend {
    async fn submit_entry(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        tracing::info!(kind = %payload.kind(), body = payload.as_json(), "dry run submission");
        Ok(SubmissionReceipt {
            id: Some(format!("dry-run-{}", &payload.fingerprint()[..12])),
            message: Some("not sent".to_string()),
        })
    }
}

/// Run `script` against a fresh session in `state`.
pub async fn replay<B: BackendApi>(
    script: ReplayScript,
    state: &AppState,
    backend: &B,
) -> Result<ReplayReport, AppError> {
    if let Some(user_id) = &script.user_id {
        session::set_user(user_id, state)?;
    }
    if let Some(project) = script.project {
        session::select_project(project, state)?;
    }
    let created = session::create_session(script.kind, script.seed, state)?;
    let id = created.id;
    tracing::info!(session = %id, events = script.events.len(), "replay started");

    let mut reports = Vec::with_capacity(script.events.len());
    for (index, event) in script.events.into_iter().enumerate() {
        let name = event.name();
        let outcome = apply_event(&id, event, state, backend).await;
        let report = match outcome {
            Ok(result) => EventReport {
                index,
                event: name,
                result: Some(result),
                error: None,
            },
            Err(error) => {
                tracing::warn!(index, event = name, %error, "replay event failed");
                EventReport {
                    index,
                    event: name,
                    result: None,
                    error: Some(error),
                }
            }
        };
        reports.push(report);
    }

    Ok(ReplayReport {
        events: reports,
        session: session::get_session(&id, state)?,
    })
}

async fn apply_event<B: BackendApi>(
    id: &str,
    event: ReplayEvent,
    state: &AppState,
    backend: &B,
) -> Result<Value, AppError> {
    let value = match event {
        ReplayEvent::FieldChange { name, value } => {
            to_value(fields::on_field_change(id, &name, value, state)?.revision)?
        }
        ReplayEvent::Merge { fields: f } => to_value(fields::merge_fields(id, &f, state)?.revision)?,
        ReplayEvent::AddItem { entry } => to_value(fields::add_list_item(id, entry, state)?.revision)?,
        ReplayEvent::UpdateItem {
            list,
            index,
            fields: f,
        } => to_value(fields::update_list_item(id, list, index, &f, state)?.revision)?,
        ReplayEvent::RemoveItem { list, index } => {
            to_value(fields::remove_list_item(id, list, index, state)?.revision)?
        }
        ReplayEvent::AddRole { labour, role } => {
            to_value(fields::add_labour_role(id, labour, role, state)?.revision)?
        }
        ReplayEvent::UpdateRole {
            labour,
            role,
            fields: f,
        } => to_value(fields::update_labour_role(id, labour, role, &f, state)?.revision)?,
        ReplayEvent::RemoveRole { labour, role } => {
            to_value(fields::remove_labour_role(id, labour, role, state)?.revision)?
        }
        ReplayEvent::Next => to_value(navigation::on_next(id, state)?.result)?,
        ReplayEvent::Previous => to_value(navigation::on_previous(id, state)?.result)?,
        ReplayEvent::Jump { step } => to_value(navigation::jump_to_step(id, step, state)?.result)?,
        ReplayEvent::Preview => submit::preview_payload(id, state)?,
        ReplayEvent::Submit => to_value(submit::on_submit(id, state, backend).await?)?,
        ReplayEvent::Reset => to_value(session::reset_session(id, state)?.status)?,
    };
    Ok(value)
}

fn to_value<T: Serialize>(value: T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::WizardStatus;
    use serde_json::json;

    fn script(value: Value) -> ReplayScript {
        serde_json::from_value(value).expect("valid script")
    }

    #[tokio::test]
    async fn diary_script_runs_to_submitted() {
        let state = AppState::default();
        let s = script(json!({
            "kind": "dailyDiary",
            "userId": "u-1",
            "project": { "projectId": "p-1", "projectName": "Quay Wall" },
            "events": [
                { "event": "merge", "fields": {
                    "selectedDate": "2026-10-19", "contractNumber": "C-1",
                    "reportNumber": "8", "contractor": "Acme",
                    "ownerContact": "Sam", "ownerProjectManager": "Pat"
                } },
                { "event": "next" },
                { "event": "fieldChange", "name": "description", "value": "Deck pour" },
                { "event": "next" },
                { "event": "fieldChange", "name": "selectedLogoId", "value": "logo-2" },
                { "event": "next" },
                { "event": "submit" }
            ]
        }));
        let report = replay(s, &state, &DryRunBackend).await.expect("replay");
        assert_eq!(report.failures(), 0);
        assert_eq!(report.session.status, WizardStatus::Submitted);
        assert_eq!(report.session.record.project_name, "Quay Wall");
        assert_eq!(
            report.events[5].result,
            Some(json!({ "type": "submissionTrigger" }))
        );
    }

    #[tokio::test]
    async fn failing_events_are_reported_and_run_continues() {
        let state = AppState::default();
        let s = script(json!({
            "kind": "dailyEntry",
            "events": [
                { "event": "next" },
                { "event": "removeItem", "list": "equipments", "index": 0 },
                { "event": "fieldChange", "name": "location", "value": "Gate 3" }
            ]
        }));
        let report = replay(s, &state, &DryRunBackend).await.expect("replay");
        assert_eq!(report.failures(), 2);
        let first = serde_json::to_value(&report.events[0]).expect("serialize");
        assert_eq!(first["error"]["kind"], "MissingRequiredFields");
        assert_eq!(report.session.record.location, "Gate 3");
    }

    #[test]
    fn entry_events_deserialize() {
        let s = script(json!({
            "kind": "dailyEntry",
            "events": [
                { "event": "addItem", "entry": { "list": "labours", "item": { "contractorName": "Acme" } } },
                { "event": "addRole", "labour": 0, "role": { "roleName": "Rigger" } },
                { "event": "updateRole", "labour": 0, "role": 0, "fields": { "hours": "8" } },
                { "event": "updateItem", "list": "labours", "index": 0, "fields": { "contractorName": "Bolt" } },
                { "event": "jump", "step": 1 },
                { "event": "preview" },
                { "event": "reset" }
            ]
        }));
        assert_eq!(s.events.len(), 7);
        assert!(matches!(s.events[1], ReplayEvent::AddRole { labour: 0, .. }));
    }
}
