//! Application-level error type returned by every command handler.
//!
//! `AppError` is serialized to `{ kind, message }` so the screen layer can
//! match on a stable `kind` string.

use crate::backend::SubmissionError;
use crate::config::ConfigError;
use crate::registry::FieldError;
use crate::wizard::{AssembleError, WizardError};

/// Top-level error returned by command handlers.
///
/// Serialized with serde's adjacently-tagged representation:
/// `{ "kind": "<variant>", "message": "<human-readable text>" }`
#[derive(Debug, thiserror::Error, serde::Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum AppError {
    /// Unknown key in strict mode, wrong value type, or list index out of
    /// range.
    #[error("{0}")]
    InvalidField(String),

    /// The current step cannot be left yet.
    #[error("{0}")]
    MissingRequiredFields(String),

    /// The record cannot be submitted yet.
    #[error("{0}")]
    IncompleteRecord(String),

    /// Submit was pressed while an earlier submission is still out.
    #[error("a submission is already in progress")]
    SubmissionInFlight,

    /// The operation is not allowed in the session's current status.
    #[error("{0}")]
    InvalidState(String),

    /// The backend call failed; the message is meant for the user.
    #[error("{0}")]
    Submission(String),

    /// No session with the given id exists, or the id is not a UUID.
    #[error("{0}")]
    SessionNotFound(String),

    /// A lock was poisoned by a panicking thread.
    #[error("{0}")]
    State(String),

    /// The config could not be read or validated, or the HTTP client could
    /// not be built from it.
    #[error("{0}")]
    Config(String),

    /// A generic I/O error, stringified so it stays serializable.
    #[error("{0}")]
    Io(String),
}

impl From<FieldError> for AppError {
    fn from(e: FieldError) -> Self {
        Self::InvalidField(e.to_string())
    }
}

impl From<SubmissionError> for AppError {
    fn from(e: SubmissionError) -> Self {
        Self::Submission(e.user_message())
    }
}

impl From<AssembleError> for AppError {
    fn from(e: AssembleError) -> Self {
        match e {
            AssembleError::Incomplete(inner) => Self::IncompleteRecord(inner.to_string()),
            AssembleError::Encode(inner) => Self::Io(inner.to_string()),
        }
    }
}

impl From<WizardError> for AppError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::Field(inner) => inner.into(),
            WizardError::MissingRequired(inner) => Self::MissingRequiredFields(inner.to_string()),
            WizardError::Assemble(inner) => inner.into(),
            WizardError::Submission(inner) => inner.into(),
            WizardError::SubmissionInFlight => Self::SubmissionInFlight,
            WizardError::InvalidState(msg) => Self::InvalidState(msg),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::{IncompleteRecordError, MissingRequiredFields};

    #[test]
    fn io_error_serializes_to_kind_message() {
        let err = AppError::Io("disk full".to_string());
        let value = serde_json::to_value(&err).expect("serialize AppError::Io");
        assert_eq!(value["kind"], "Io");
        assert_eq!(value["message"], "disk full");
    }

    #[test]
    fn unit_variant_serializes_kind_only() {
        let value = serde_json::to_value(AppError::SubmissionInFlight).expect("serialize");
        assert_eq!(value["kind"], "SubmissionInFlight");
    }

    #[test]
    fn missing_required_names_step_and_fields() {
        let err: AppError = WizardError::from(MissingRequiredFields {
            step: 1,
            missing: vec!["projectId".to_string(), "location".to_string()],
        })
        .into();
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["kind"], "MissingRequiredFields");
        assert_eq!(
            value["message"],
            "step 1 is missing required fields: projectId, location"
        );
    }

    #[test]
    fn incomplete_record_maps_through_assemble_error() {
        let err: AppError = WizardError::from(AssembleError::from(IncompleteRecordError {
            missing_fields: vec!["selectedLogoId".to_string()],
        }))
        .into();
        assert!(matches!(err, AppError::IncompleteRecord(msg) if msg.contains("selectedLogoId")));
    }

    #[test]
    fn field_error_maps_to_invalid_field() {
        let err: AppError = FieldError::Unknown("colour".to_string()).into();
        assert!(matches!(err, AppError::InvalidField(msg) if msg == "unknown field `colour`"));
    }

    #[test]
    fn submission_error_carries_user_message() {
        let err: AppError = SubmissionError::Rejected {
            status: 409,
            message: Some("Duplicate report".to_string()),
        }
        .into();
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["kind"], "Submission");
        assert_eq!(
            value["message"],
            "Failed to submit the report. Please try again. Duplicate report"
        );
    }

    #[test]
    fn config_error_maps_to_config_kind() {
        let err: AppError = ConfigError::Invalid("timeout_secs must be > 0".to_string()).into();
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["kind"], "Config");
        assert_eq!(value["message"], "config error: timeout_secs must be > 0");
    }
}
