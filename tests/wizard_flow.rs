use std::sync::Mutex;

use serde_json::{json, Map, Value};
use sitelog_lib::backend::{BackendApi, SubmissionError, SubmissionReceipt};
use sitelog_lib::commands::{fields, navigation, session, submit};
use sitelog_lib::error::AppError;
use sitelog_lib::models::{Equipment, Labour, LabourRole, ListItem};
use sitelog_lib::registry::ListField;
use sitelog_lib::state::{AppState, ProjectSelection};
use sitelog_lib::wizard::{Advance, SubmissionPayload, SubmitOutcome, WizardKind, WizardStatus};

/// Fails the first `failures` submissions, then accepts.
struct FlakyBackend {
    failures: Mutex<usize>,
    bodies: Mutex<Vec<String>>,
}

impl FlakyBackend {
    fn new(failures: usize) -> Self {
        Self {
            failures: Mutex::new(failures),
            bodies: Mutex::new(Vec::new()),
        }
    }
}

impl BackendApi for FlakyBackend {
    async fn submit_entry(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.bodies
            .lock()
            .expect("bodies lock")
            .push(payload.as_json().to_string());
        let mut failures = self.failures.lock().expect("failures lock");
        if *failures > 0 {
            *failures -= 1;
            return Err(SubmissionError::Rejected {
                status: 503,
                message: None,
            });
        }
        Ok(SubmissionReceipt {
            id: Some("entry-1".to_string()),
            message: Some("Daily entry saved".to_string()),
        })
    }
}

fn obj(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

fn signed_in_state() -> AppState {
    let state = AppState::default();
    session::set_user("u-100", &state).expect("set user");
    session::select_project(
        ProjectSelection {
            project_id: "p-200".to_string(),
            project_name: "Harbour Bridge".to_string(),
            project_number: "HB-01".to_string(),
            owner: "City of Port".to_string(),
        },
        &state,
    )
    .expect("select project");
    state
}

/// Walks a daily entry through every step up to review.
fn walk_daily_entry(state: &AppState) -> String {
    let id = session::create_session(WizardKind::DailyEntry, None, state)
        .expect("create")
        .id;

    // step 1: project details
    fields::merge_fields(
        &id,
        &obj(json!({ "selectedDate": "2026-10-19", "location": "North abutment" })),
        state,
    )
    .expect("details");
    assert_eq!(
        navigation::on_next(&id, state).expect("1 -> 2").result,
        Advance::NextStep(2)
    );

    // step 2: equipment
    fields::add_list_item(&id, ListItem::Equipment(Equipment::default()), state).expect("add");
    let snap = fields::update_list_item(
        &id,
        ListField::Equipments,
        0,
        &obj(json!({ "equipmentName": "Jane's excavator", "quantity": "3", "hours": "2" })),
        state,
    )
    .expect("update equipment");
    assert_eq!(snap.record.equipments[0].total_hours, "6");
    navigation::on_next(&id, state).expect("2 -> 3");

    // step 3: labour
    fields::add_list_item(
        &id,
        ListItem::Labour(Labour {
            contractor_name: "Acme Civil".to_string(),
            roles: vec![LabourRole {
                role_name: "Carpenter".to_string(),
                quantity: "2".to_string(),
                hours: "8".to_string(),
                total_hours: String::new(),
            }],
        }),
        state,
    )
    .expect("add labour");
    navigation::on_next(&id, state).expect("3 -> 4");

    // steps 4 and 5 are optional
    navigation::on_next(&id, state).expect("4 -> 5");
    fields::on_field_change(&id, "description", json!("Poured pier cap"), state)
        .expect("description");
    navigation::on_next(&id, state).expect("5 -> 6");

    // step 6: review
    let snap = fields::on_field_change(&id, "selectedLogoId", json!("logo-1"), state)
        .expect("logo");
    assert_eq!(snap.status, WizardStatus::ReadyForReview);
    assert_eq!(
        navigation::on_next(&id, state).expect("review").result,
        Advance::SubmissionTrigger
    );
    id
}

#[tokio::test]
async fn daily_entry_end_to_end() {
    let state = signed_in_state();
    let id = walk_daily_entry(&state);
    let backend = FlakyBackend::new(0);

    let outcome = submit::on_submit(&id, &state, &backend)
        .await
        .expect("submit");
    let SubmitOutcome::Submitted { receipt } = outcome else {
        panic!("expected Submitted, got {outcome:?}");
    };
    assert_eq!(receipt.id.as_deref(), Some("entry-1"));

    let bodies = backend.bodies.lock().expect("bodies").clone();
    let body: Value = serde_json::from_str(&bodies[0]).expect("json body");
    assert_eq!(body["userId"], "u-100");
    assert_eq!(body["projectName"], "Harbour Bridge");
    assert_eq!(body["equipments"][0]["totalHours"], "6");
    assert_eq!(body["labours"][0]["roles"][0]["totalHours"], "16");

    let snap = session::get_session(&id, &state).expect("get");
    assert_eq!(snap.status, WizardStatus::Submitted);
    assert!(matches!(
        fields::on_field_change(&id, "weather", json!("Rain"), &state),
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn failed_submit_then_retry_sends_identical_body() {
    let state = signed_in_state();
    let id = walk_daily_entry(&state);
    let backend = FlakyBackend::new(1);

    let err = submit::on_submit(&id, &state, &backend)
        .await
        .expect_err("first attempt fails");
    assert!(matches!(err, AppError::Submission(_)));
    let snap = session::get_session(&id, &state).expect("get");
    assert_eq!(snap.status, WizardStatus::ReadyForReview);
    assert_eq!(snap.record.description, "Poured pier cap");

    submit::on_submit(&id, &state, &backend)
        .await
        .expect("retry succeeds");
    let bodies = backend.bodies.lock().expect("bodies").clone();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0], bodies[1]);
}

#[test]
fn blank_labour_blocks_the_labour_step() {
    let state = signed_in_state();
    let id = session::create_session(WizardKind::DailyEntry, None, &state)
        .expect("create")
        .id;
    fields::merge_fields(
        &id,
        &obj(json!({ "selectedDate": "2026-10-19", "location": "Yard" })),
        &state,
    )
    .expect("details");
    navigation::on_next(&id, &state).expect("1 -> 2");
    navigation::on_next(&id, &state).expect("2 -> 3");

    fields::add_list_item(&id, ListItem::Labour(Labour::default()), &state).expect("add");
    let err = navigation::on_next(&id, &state).expect_err("blank labour");
    let AppError::MissingRequiredFields(message) = err else {
        panic!("expected MissingRequiredFields, got {err:?}");
    };
    assert!(message.contains("labours[0].contractorName"));
    assert!(message.contains("labours[0].roles"));
    assert_eq!(
        session::get_session(&id, &state).expect("get").current_step,
        3
    );
}

#[test]
fn identical_merges_are_idempotent() {
    let state = AppState::default();
    let id = session::create_session(WizardKind::DailyDiary, None, &state)
        .expect("create")
        .id;
    let form = obj(json!({ "contractNumber": "C-1", "reportNumber": "5" }));
    let first = fields::merge_fields(&id, &form, &state).expect("first");
    let second = fields::merge_fields(&id, &form, &state).expect("second");
    assert_eq!(first.record, second.record);
    assert_eq!(first.revision, second.revision);
}

#[test]
fn reset_returns_to_an_empty_first_step() {
    let state = signed_in_state();
    let id = walk_daily_entry(&state);
    let snap = session::reset_session(&id, &state).expect("reset");
    assert_eq!(snap.status, WizardStatus::Empty);
    assert_eq!(snap.current_step, 1);
    assert_eq!(snap.visited_steps, vec![1]);
    assert!(snap.record.equipments.is_empty());
    assert_eq!(snap.record.user_id, "");
}
