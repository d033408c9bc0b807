//! One running wizard: store, sequencer, lifecycle and the submission guard.
//!
//! Submission is split in two so no lock is held while the backend works:
//! [`WizardSession::begin_submission`] hands out a [`SubmissionTicket`]
//! carrying the payload, the session epoch and the attempt number, and
//! [`WizardSession::complete_submission`] applies the backend's answer only
//! if that exact attempt is still in flight. `reset` bumps the epoch, so an
//! answer for a record the user has since thrown away is dropped, and a
//! ticket whose attempt already resolved cannot resolve it twice.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::assembler::{assemble, SubmissionPayload};
use super::presence::missing_fields;
use super::sequencer::{Advance, StepSequencer};
use super::steps::StepTable;
use super::store::{ListenerId, WizardStore};
use super::{WizardError, WizardKind};
use crate::backend::{SubmissionError, SubmissionReceipt};
use crate::models::{LabourRole, ListItem, WizardPatch, WizardRecord};
use crate::registry::{FieldError, FieldMode, ListField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStatus {
    Empty,
    InProgress,
    ReadyForReview,
    Submitting,
    Submitted,
}

/// Proof that one submission attempt was started. Fields are read-only so a
/// ticket cannot be forged for an attempt that never happened.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    session_id: Uuid,
    epoch: u64,
    attempt: u64,
    payload: SubmissionPayload,
}

impl SubmissionTicket {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn payload(&self) -> &SubmissionPayload {
        &self.payload
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SubmitOutcome {
    Submitted { receipt: SubmissionReceipt },
    /// The session was reset or replaced while the request was out, or the
    /// attempt had already been resolved.
    Discarded,
}

#[derive(Debug)]
pub struct WizardSession {
    id: Uuid,
    store: WizardStore,
    sequencer: StepSequencer,
    status: WizardStatus,
    touched: bool,
    submission_in_flight: bool,
    epoch: u64,
    attempt: u64,
    cached_payload: Option<(u64, SubmissionPayload)>,
    last_failure: Option<String>,
    receipt: Option<SubmissionReceipt>,
    created_at: String,
}

impl WizardSession {
    pub fn new(kind: WizardKind, mode: FieldMode) -> Self {
        Self::with_store(WizardStore::new(kind, mode))
    }

    /// A session whose record starts from `seed`. Seeded values count as
    /// user input for the lifecycle.
    pub fn seeded(kind: WizardKind, mode: FieldMode, seed: WizardRecord) -> Self {
        let touched = seed != WizardRecord::default();
        let mut session = Self::with_store(WizardStore::seeded(kind, mode, seed));
        session.touched = touched;
        session.refresh_status();
        session
    }

    fn with_store(store: WizardStore) -> Self {
        let sequencer = StepSequencer::new(StepTable::for_kind(store.kind()));
        Self {
            id: Uuid::new_v4(),
            store,
            sequencer,
            status: WizardStatus::Empty,
            touched: false,
            submission_in_flight: false,
            epoch: 0,
            attempt: 0,
            cached_payload: None,
            last_failure: None,
            receipt: None,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> WizardKind {
        self.store.kind()
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    pub fn store(&self) -> &WizardStore {
        &self.store
    }

    pub fn record(&self) -> &WizardRecord {
        self.store.get()
    }

    pub fn sequencer(&self) -> &StepSequencer {
        &self.sequencer
    }

    pub fn current_step(&self) -> usize {
        self.sequencer.current()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn submission_in_flight(&self) -> bool {
        self.submission_in_flight
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    // ── editing ───────────────────────────────────────────────────────────

    pub fn merge(&mut self, patch: WizardPatch) -> Result<bool, WizardError> {
        self.edit(|store| store.merge(patch))
    }

    pub fn merge_json(&mut self, fields: &Map<String, Value>) -> Result<bool, WizardError> {
        self.edit(|store| store.merge_json(fields))
    }

    pub fn set_field(&mut self, name: &str, value: Value) -> Result<bool, WizardError> {
        self.edit(|store| store.set_field(name, value))
    }

    pub fn add_list_item(&mut self, item: ListItem) -> Result<bool, WizardError> {
        self.edit(|store| store.add_list_item(item))
    }

    pub fn remove_list_item(&mut self, list: ListField, index: usize) -> Result<bool, WizardError> {
        self.edit(|store| store.remove_list_item(list, index))
    }

    pub fn update_list_item(
        &mut self,
        list: ListField,
        index: usize,
        fields: &Map<String, Value>,
    ) -> Result<bool, WizardError> {
        self.edit(|store| store.update_list_item(list, index, fields))
    }

    pub fn add_labour_role(
        &mut self,
        labour_index: usize,
        role: LabourRole,
    ) -> Result<bool, WizardError> {
        self.edit(|store| store.add_labour_role(labour_index, role))
    }

    pub fn remove_labour_role(
        &mut self,
        labour_index: usize,
        role_index: usize,
    ) -> Result<bool, WizardError> {
        self.edit(|store| store.remove_labour_role(labour_index, role_index))
    }

    pub fn update_labour_role(
        &mut self,
        labour_index: usize,
        role_index: usize,
        fields: &Map<String, Value>,
    ) -> Result<bool, WizardError> {
        self.edit(|store| store.update_labour_role(labour_index, role_index, fields))
    }

    fn edit<F>(&mut self, op: F) -> Result<bool, WizardError>
    where
        F: FnOnce(&mut WizardStore) -> Result<bool, FieldError>,
    {
        self.ensure_editable()?;
        let changed = op(&mut self.store)?;
        if changed {
            self.touched = true;
            self.refresh_status();
        }
        Ok(changed)
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        match self.status {
            WizardStatus::Submitting => Err(WizardError::InvalidState(
                "the report is being submitted".to_string(),
            )),
            WizardStatus::Submitted => Err(WizardError::InvalidState(
                "the report was already submitted; reset to start a new one".to_string(),
            )),
            _ => Ok(()),
        }
    }

    // ── listeners ─────────────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&WizardRecord) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    // ── navigation ────────────────────────────────────────────────────────

    /// `onNext`: advance past the current step, or report that the review
    /// step wants to submit.
    pub fn next(&mut self) -> Result<Advance, WizardError> {
        self.ensure_editable()?;
        let advance = self.sequencer.advance(self.store.get())?;
        if let Advance::NextStep(step) = advance {
            tracing::debug!(session = %self.id, step, "advanced");
        }
        self.refresh_status();
        Ok(advance)
    }

    /// `onPrevious`. `None` on the first step.
    pub fn previous(&mut self) -> Result<Option<usize>, WizardError> {
        self.ensure_editable()?;
        Ok(self.sequencer.retreat())
    }

    pub fn jump_to(&mut self, step: usize) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        Ok(self.sequencer.jump_to(step))
    }

    // ── submission ────────────────────────────────────────────────────────

    /// Assemble the payload and mark the session as submitting.
    pub fn begin_submission(&mut self) -> Result<SubmissionTicket, WizardError> {
        if self.submission_in_flight {
            return Err(WizardError::SubmissionInFlight);
        }
        match self.status {
            WizardStatus::ReadyForReview => {}
            WizardStatus::Submitted => {
                return Err(WizardError::InvalidState(
                    "the report was already submitted; reset to start a new one".to_string(),
                ))
            }
            _ => {
                // Surface the missing fields when there are any.
                assemble(self.kind(), self.store.get())?;
                return Err(WizardError::InvalidState(
                    "every step must be reviewed before submitting".to_string(),
                ));
            }
        }

        let revision = self.store.revision();
        let payload = match &self.cached_payload {
            Some((rev, payload)) if *rev == revision => payload.clone(),
            _ => {
                let payload = assemble(self.kind(), self.store.get())?;
                self.cached_payload = Some((revision, payload.clone()));
                payload
            }
        };

        self.attempt += 1;
        self.submission_in_flight = true;
        self.status = WizardStatus::Submitting;
        tracing::info!(
            session = %self.id,
            kind = %self.kind(),
            attempt = self.attempt,
            fingerprint = payload.fingerprint(),
            "submission started"
        );
        Ok(SubmissionTicket {
            session_id: self.id,
            epoch: self.epoch,
            attempt: self.attempt,
            payload,
        })
    }

    /// Apply the backend's answer for `ticket`.
    ///
    /// A ticket from an earlier epoch, or for an attempt that is no longer
    /// in flight, is discarded without touching the session. A failure returns the session to review with the record
    /// intact and the failure text kept for the screen.
    pub fn complete_submission(
        &mut self,
        ticket: &SubmissionTicket,
        result: Result<SubmissionReceipt, SubmissionError>,
    ) -> Result<SubmitOutcome, WizardError> {
        if ticket.session_id != self.id
            || ticket.epoch != self.epoch
            || ticket.attempt != self.attempt
            || !self.submission_in_flight
        {
            tracing::warn!(
                session = %self.id,
                ticket_epoch = ticket.epoch,
                epoch = self.epoch,
                ticket_attempt = ticket.attempt,
                attempt = self.attempt,
                in_flight = self.submission_in_flight,
                "discarding stale submission response"
            );
            return Ok(SubmitOutcome::Discarded);
        }

        self.submission_in_flight = false;
        match result {
            Ok(receipt) => {
                tracing::info!(session = %self.id, id = ?receipt.id, "submission succeeded");
                self.status = WizardStatus::Submitted;
                self.last_failure = None;
                self.receipt = Some(receipt.clone());
                Ok(SubmitOutcome::Submitted { receipt })
            }
            Err(err) => {
                tracing::warn!(session = %self.id, error = %err, "submission failed");
                self.status = WizardStatus::ReadyForReview;
                self.last_failure = Some(err.user_message());
                Err(err.into())
            }
        }
    }

    /// Discard the record and start over on the first step. Any submission
    /// still out is orphaned.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.store.reset();
        self.sequencer.restart();
        self.status = WizardStatus::Empty;
        self.touched = false;
        self.submission_in_flight = false;
        self.cached_payload = None;
        self.last_failure = None;
        self.receipt = None;
        tracing::info!(session = %self.id, epoch = self.epoch, "session reset");
    }

    fn refresh_status(&mut self) {
        if matches!(
            self.status,
            WizardStatus::Submitting | WizardStatus::Submitted
        ) {
            return;
        }
        let required = self.sequencer.table().all_required();
        let complete = missing_fields(self.store.get(), &required).is_empty();
        let next = if self.sequencer.all_visited() && complete {
            WizardStatus::ReadyForReview
        } else if self.touched {
            WizardStatus::InProgress
        } else {
            WizardStatus::Empty
        };
        if next != self.status {
            tracing::info!(session = %self.id, from = ?self.status, to = ?next, "status changed");
            self.status = next;
        }
    }
}
