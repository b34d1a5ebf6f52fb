use reqwest::Client;

use crate::domain::{
    common::entities::app_errors::CoreError,
    consultation::{ports::Deidentifier, value_objects::PatientRecord},
};

/// HTTP client for the de-identification service. Sends a full record and
/// receives the same shape with sensitive fields scrubbed.
#[derive(Debug, Clone)]
pub struct HttpDeidentifier {
    base_url: String,
    client: Client,
}

impl HttpDeidentifier {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }
}

impl Deidentifier for HttpDeidentifier {
    async fn redact(&self, record: PatientRecord) -> Result<PatientRecord, CoreError> {
        let url = format!("{}/redact", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&record)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("De-identification request failed: {}", e);
                CoreError::ExternalServiceError(format!("De-identification service error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("De-identification service error: {} - {}", status, error_text);
            return Err(CoreError::ExternalServiceError(format!(
                "De-identification service returned error: {} - {}",
                status, error_text
            )));
        }

        response.json::<PatientRecord>().await.map_err(|e| {
            tracing::error!("Failed to parse de-identified record: {}", e);
            CoreError::ExternalServiceError(format!(
                "Failed to parse de-identified record: {}",
                e
            ))
        })
    }
}
