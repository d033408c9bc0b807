//! The seam between wizard sessions and the reporting backend.
//!
//! Sessions never talk to the network themselves. The command layer takes a
//! [`SubmissionTicket`](crate::wizard::SubmissionTicket) from the session,
//! hands its payload to a [`BackendApi`], and reports the result back.

pub mod http;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::wizard::SubmissionPayload;

pub use http::HttpBackend;

/// What the backend returned for an accepted submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("network error: {0}")]
    Network(String),
    #[error("backend rejected the submission with status {status}")]
    Rejected { status: u16, message: Option<String> },
    #[error("unreadable backend response: {0}")]
    InvalidResponse(String),
}

impl SubmissionError {
    /// Text for the screen: a retry prompt plus the server's own message
    /// when it sent one.
    pub fn user_message(&self) -> String {
        const RETRY: &str = "Failed to submit the report. Please try again.";
        match self {
            SubmissionError::Rejected {
                message: Some(message),
                ..
            } if !message.is_empty() => format!("{RETRY} {message}"),
            _ => RETRY.to_string(),
        }
    }
}

/// Something that accepts assembled payloads.
pub trait BackendApi {
    fn submit_entry(
        &self,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<SubmissionReceipt, SubmissionError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_appends_server_text() {
        let err = SubmissionError::Rejected {
            status: 422,
            message: Some("Report number already used".to_string()),
        };
        assert_eq!(
            err.user_message(),
            "Failed to submit the report. Please try again. Report number already used"
        );
    }

    #[test]
    fn user_message_is_generic_without_server_text() {
        let err = SubmissionError::Network("connection refused".to_string());
        assert_eq!(
            err.user_message(),
            "Failed to submit the report. Please try again."
        );
    }
}
