//! Multi-step wizard core.
//!
//! ```text
//! wizard/
//! ├── presence.rs  - which required fields a record is still missing
//! ├── steps.rs     - static step tables per wizard kind
//! ├── sequencer.rs - advance / retreat / jump over a step table
//! ├── store.rs     - the single mutable record of a session
//! ├── assembler.rs - record → backend payload
//! └── session.rs   - store + sequencer + lifecycle + submission guard
//! ```

pub mod assembler;
pub mod presence;
pub mod sequencer;
pub mod session;
pub mod steps;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::SubmissionError;
use crate::registry::FieldError;

pub use assembler::{assemble, AssembleError, IncompleteRecordError, SubmissionPayload};
pub use sequencer::{can_advance, Advance, MissingRequiredFields, StepSequencer};
pub use session::{SubmissionTicket, SubmitOutcome, WizardSession, WizardStatus};
pub use steps::{StepDefinition, StepTable};
pub use store::{ListenerId, WizardStore};

/// The two wizard flows of the field app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardKind {
    /// Daily entry: project details, equipment, labour, visitors,
    /// description, review.
    DailyEntry,
    /// Daily diary: project details, description, review.
    DailyDiary,
}

impl fmt::Display for WizardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardKind::DailyEntry => f.write_str("daily entry"),
            WizardKind::DailyDiary => f.write_str("daily diary"),
        }
    }
}

/// Errors raised by wizard sessions. Mapped to `AppError` at the command
/// boundary.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    MissingRequired(#[from] MissingRequiredFields),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("a submission is already in flight for this session")]
    SubmissionInFlight,
    #[error("{0}")]
    InvalidState(String),
}
