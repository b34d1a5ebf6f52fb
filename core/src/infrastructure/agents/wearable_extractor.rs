use bytes::Bytes;
use reqwest::Client;

use crate::domain::{common::entities::app_errors::CoreError, reports::ports::WearableExtractor};

/// HTTP client for the wearable-data extraction service.
#[derive(Debug, Clone)]
pub struct HttpWearableExtractor {
    base_url: String,
    client: Client,
}

impl HttpWearableExtractor {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }
}

impl WearableExtractor for HttpWearableExtractor {
    async fn extract(&self, data: Bytes) -> Result<serde_json::Value, CoreError> {
        let url = format!("{}/wearable/extract", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Wearable extraction request failed: {}", e);
                CoreError::ExternalServiceError(format!("Extraction service error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Extraction service error: {} - {}", status, error_text);
            return Err(CoreError::ExternalServiceError(format!(
                "Extraction service returned error: {} - {}",
                status, error_text
            )));
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            tracing::error!("Failed to parse extraction response: {}", e);
            CoreError::ExternalServiceError(format!("Failed to parse extraction response: {}", e))
        })
    }
}
