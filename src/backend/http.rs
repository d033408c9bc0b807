//! [`BackendApi`] over HTTP with `reqwest`.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use serde::Deserialize;

use super::{BackendApi, SubmissionError, SubmissionReceipt};
use crate::config::{ApiConfig, ConfigError};
use crate::wizard::{SubmissionPayload, WizardKind};

/// Posts payloads as JSON to `{base_url}{path}`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    api: ApiConfig,
}

/// Response body fields we read; everything else is ignored.
#[derive(Debug, Default, Deserialize)]
struct ResponseBody {
    #[serde(rename = "_id", alias = "id")]
    id: Option<String>,
    message: Option<String>,
}

impl HttpBackend {
    pub fn from_config(config: &ApiConfig) -> Result<Self, ConfigError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api: config.clone(),
        })
    }

    fn url_for(&self, kind: WizardKind) -> String {
        format!(
            "{}{}",
            self.api.base_url.trim_end_matches('/'),
            self.api.path_for(kind)
        )
    }

    #[tracing::instrument(name = "Submitting report to backend.", skip(self, payload), fields(kind = %payload.kind()))]
    async fn post(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, SubmissionError> {
        let mut request = self
            .client
            .post(self.url_for(payload.kind()))
            .header("Content-Type", "application/json")
            .header("Idempotency-Key", payload.fingerprint())
            .body(payload.as_json().to_string());
        if let Some(token) = &self.api.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        // Bodies are read leniently: an empty or non-JSON body on a 2xx still
        // counts as accepted.
        let body: ResponseBody = serde_json::from_str(&text).unwrap_or_default();

        if status.is_success() {
            tracing::info!(status = status.as_u16(), id = ?body.id, "submission accepted");
            Ok(SubmissionReceipt {
                id: body.id,
                message: body.message,
            })
        } else {
            tracing::warn!(status = status.as_u16(), server_message = ?body.message, "submission rejected");
            Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message: body.message,
            })
        }
    }
}

impl BackendApi for HttpBackend {
    fn submit_entry(
        &self,
        payload: &SubmissionPayload,
    ) -> impl std::future::Future<Output = Result<SubmissionReceipt, SubmissionError>> + Send {
        self.post(payload)
    }
}
