//! Step transitions over a [`StepTable`].
//!
//! Moving forward is gated by [`can_advance`]; moving back never is, and
//! never touches the record. Jumps through the step indicator are only
//! allowed across steps the user has already seen.

use std::collections::BTreeSet;

use serde::Serialize;

use super::presence::missing_fields;
use super::steps::{StepDefinition, StepTable};
use crate::models::WizardRecord;

/// Result of a successful forward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "step", rename_all = "camelCase")]
pub enum Advance {
    /// The wizard moved to this step.
    NextStep(usize),
    /// The current step is the review step; the caller should submit.
    SubmissionTrigger,
}

/// A step's required fields that the record does not satisfy yet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("step {step} is missing required fields: {}", .missing.join(", "))]
pub struct MissingRequiredFields {
    pub step: usize,
    pub missing: Vec<String>,
}

/// Check that every required field of `step` is present in `record`.
pub fn can_advance(
    step: &StepDefinition,
    record: &WizardRecord,
) -> Result<(), MissingRequiredFields> {
    let missing = missing_fields(record, &step.required_fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MissingRequiredFields {
            step: step.index,
            missing,
        })
    }
}

/// Cursor over a step table with the set of steps visited so far.
#[derive(Debug, Clone)]
pub struct StepSequencer {
    table: StepTable,
    current: usize,
    visited: BTreeSet<usize>,
}

impl StepSequencer {
    pub fn new(table: StepTable) -> Self {
        let first = table.first().index;
        Self {
            table,
            current: first,
            visited: BTreeSet::from([first]),
        }
    }

    pub fn table(&self) -> &StepTable {
        &self.table
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> &StepDefinition {
        self.table
            .get(self.current)
            .unwrap_or_else(|| self.table.first())
    }

    pub fn visited(&self) -> &BTreeSet<usize> {
        &self.visited
    }

    pub fn all_visited(&self) -> bool {
        self.table
            .steps()
            .iter()
            .all(|s| self.visited.contains(&s.index))
    }

    /// Move to the next step if the current one is complete.
    pub fn advance(&mut self, record: &WizardRecord) -> Result<Advance, MissingRequiredFields> {
        let step = self.current_step();
        can_advance(step, record)?;
        let next = step.next;
        match next {
            Some(next) => {
                self.current = next;
                self.visited.insert(next);
                Ok(Advance::NextStep(next))
            }
            None => Ok(Advance::SubmissionTrigger),
        }
    }

    /// Move to the previous step. Returns `None` on the first step.
    pub fn retreat(&mut self) -> Option<usize> {
        let previous = self.current_step().previous?;
        self.current = previous;
        Some(previous)
    }

    /// Jump straight to `target`. Allowed only when every step between the
    /// current one and `target`, inclusive, has been visited; otherwise
    /// nothing changes and `false` is returned.
    pub fn jump_to(&mut self, target: usize) -> bool {
        if self.table.get(target).is_none() {
            tracing::warn!(step = target, "rejected jump to unknown step");
            return false;
        }
        let (lo, hi) = if target < self.current {
            (target, self.current)
        } else {
            (self.current, target)
        };
        if (lo..=hi).all(|i| self.visited.contains(&i)) {
            self.current = target;
            true
        } else {
            tracing::warn!(from = self.current, to = target, "rejected jump across unvisited steps");
            false
        }
    }

    /// Back to the first step with nothing visited beyond it.
    pub fn restart(&mut self) {
        let first = self.table.first().index;
        self.current = first;
        self.visited = BTreeSet::from([first]);
    }
}
