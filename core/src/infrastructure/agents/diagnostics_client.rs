use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    consultation::{
        ports::SuggestionClient,
        value_objects::{RecordFields, Suggestions},
    },
};

/// HTTP client for the AI diagnostics service. The engine itself is
/// opaque; this adapter only ships the request and maps failures.
#[derive(Debug, Clone)]
pub struct HttpSuggestionClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct DifferentialRequest {
    patient: RecordFields,
    language: String,
    session_id: Uuid,
}

#[derive(Debug, Serialize)]
struct ExamsRequest {
    selected_diagnoses: Vec<String>,
    language: String,
    session_id: Uuid,
}

impl HttpSuggestionClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    async fn post_suggestions<T: Serialize>(
        &self,
        path: &str,
        request: &T,
    ) -> Result<Suggestions, CoreError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Diagnostics request failed: {}", e);
                CoreError::ExternalServiceError(format!("Diagnostics service error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Diagnostics service error: {} - {}", status, error_text);
            return Err(CoreError::ExternalServiceError(format!(
                "Diagnostics service returned error: {} - {}",
                status, error_text
            )));
        }

        response.json::<Suggestions>().await.map_err(|e| {
            tracing::error!("Failed to parse diagnostics response: {}", e);
            CoreError::ExternalServiceError(format!("Failed to parse diagnostics response: {}", e))
        })
    }
}

impl SuggestionClient for HttpSuggestionClient {
    async fn differential(
        &self,
        fields: RecordFields,
        language: String,
        session_id: Uuid,
    ) -> Result<Suggestions, CoreError> {
        self.post_suggestions(
            "differential",
            &DifferentialRequest {
                patient: fields,
                language,
                session_id,
            },
        )
        .await
    }

    async fn exams(
        &self,
        selected_diagnoses: Vec<String>,
        language: String,
        session_id: Uuid,
    ) -> Result<Suggestions, CoreError> {
        self.post_suggestions(
            "exams",
            &ExamsRequest {
                selected_diagnoses,
                language,
                session_id,
            },
        )
        .await
    }
}
